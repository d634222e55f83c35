//! The interpreter context.
//!
//! A [`Machine`] owns everything the interpreter shares across subsystems:
//! the two semispace heaps, the process symbol table, the global
//! environment, the cached special-form symbols and the lambda id counter.
//! All state is per-machine; there is no process-global state, so a host can
//! run several machines side by side (though a single machine is strictly
//! single-threaded).

use std::time::Instant;

use indexmap::IndexMap;
use karst_util::Result;

use crate::config::MachineConfig;
use crate::env;
use crate::gc::Collector;
use crate::heap::Heap;
use crate::stats::GcStats;
use crate::symbol;
use crate::value::{PrimFn, Value};

/// Interned symbols for the forms the evaluator recognizes directly.
///
/// Comparing a list head against these is block identity, which interning
/// makes equivalent to a case-insensitive name match. The machine relocates
/// them as roots on every collection.
#[derive(Clone, Copy, Debug)]
pub struct Specials {
    pub if_: Value,
    pub begin: Value,
    pub quote: Value,
    pub define: Value,
    pub set_bang: Value,
    pub lambda: Value,
}

/// One interpreter instance.
pub struct Machine {
    from: Heap,
    to: Heap,
    symbols: Value,
    globals: Value,
    specials: Specials,
    next_lambda_id: u64,
    config: MachineConfig,
    stats: GcStats,
}

impl Machine {
    /// Creates a machine with the given configuration.
    pub fn new(config: MachineConfig) -> Result<Self> {
        config.validate()?;
        let mut from = Heap::new(config.page_size);
        let to = Heap::new(config.page_size);

        let symbols = from.alloc_table(config.symbol_table_capacity);
        let specials = Specials {
            if_: symbol::intern(&mut from, symbols, "if"),
            begin: symbol::intern(&mut from, symbols, "begin"),
            quote: symbol::intern(&mut from, symbols, "quote"),
            define: symbol::intern(&mut from, symbols, "define"),
            set_bang: symbol::intern(&mut from, symbols, "set!"),
            lambda: symbol::intern(&mut from, symbols, "lambda"),
        };
        let global_frame = from.alloc_table(config.global_frame_capacity);
        let globals = from.alloc_pair(global_frame, Value::Null);

        Ok(Self {
            from,
            to,
            symbols,
            globals,
            specials,
            next_lambda_id: 0,
            config,
            stats: GcStats::default(),
        })
    }

    /// Creates a machine with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MachineConfig::default()).expect("default configuration is valid")
    }

    pub fn heap(&self) -> &Heap {
        &self.from
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.from
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// The global environment (a one-frame chain until the host extends it).
    pub fn globals(&self) -> Value {
        self.globals
    }

    /// The process symbol table.
    pub fn symbols(&self) -> Value {
        self.symbols
    }

    pub fn specials(&self) -> Specials {
        self.specials
    }

    /// Interns `name` in this machine's symbol table.
    pub fn intern(&mut self, name: &str) -> Value {
        symbol::intern(&mut self.from, self.symbols, name)
    }

    /// Hands out the next lambda id.
    pub fn next_lambda_id(&mut self) -> u64 {
        let id = self.next_lambda_id;
        self.next_lambda_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Host constructors
    // ------------------------------------------------------------------

    pub fn cons(&mut self, car: Value, cdr: Value) -> Value {
        self.from.alloc_pair(car, cdr)
    }

    pub fn make_string(&mut self, text: &str) -> Value {
        self.from.alloc_string(text)
    }

    pub fn make_list(&mut self, items: &[Value]) -> Value {
        self.from.list_from_slice(items)
    }

    /// Binds `name` in the head frame of the global environment.
    pub fn global_define(&mut self, name: &str, value: Value) {
        let sym = self.intern(name);
        env::define(&mut self.from, self.globals, sym, value);
    }

    /// Registers a host callback under `name`.
    pub fn define_primitive(&mut self, name: &str, f: PrimFn) {
        self.global_define(name, Value::Primitive(f));
    }

    /// Resolves `name` in the global environment.
    pub fn global_lookup(&mut self, name: &str) -> Result<Value> {
        let sym = self.intern(name);
        env::lookup(&self.from, self.globals, sym)
    }

    // ------------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------------

    /// Runs a full collection and returns the relocated `root`.
    ///
    /// Everything reachable from the symbol table, the global environment,
    /// the cached special symbols or `root` survives; all other blocks are
    /// discarded. Any other value the host still holds is invalid after
    /// this call. Legal only between top-level evaluations.
    pub fn collect(&mut self, root: Value) -> Value {
        let started = Instant::now();
        let (load_min, load_max) = (self.config.table_load_min, self.config.table_load_max);

        let mut gc = Collector::new(&mut self.from, &mut self.to, load_min, load_max);
        let symbols = gc.move_value(self.symbols);
        let globals = gc.move_value(self.globals);
        let specials = Specials {
            if_: gc.move_value(self.specials.if_),
            begin: gc.move_value(self.specials.begin),
            quote: gc.move_value(self.specials.quote),
            define: gc.move_value(self.specials.define),
            set_bang: gc.move_value(self.specials.set_bang),
            lambda: gc.move_value(self.specials.lambda),
        };
        let root = gc.move_value(root);
        gc.scan();

        self.symbols = symbols;
        self.globals = globals;
        self.specials = specials;
        std::mem::swap(&mut self.from, &mut self.to);

        let live = self.from.used_bytes();
        let freed = self.to.reset_to(live);
        self.stats.record(live, freed, started.elapsed());
        log::debug!(
            "gc cycle {}: {} live bytes, {} pages freed, {:?}",
            self.stats.cycles,
            live,
            freed,
            self.stats.last_pause
        );
        root
    }

    /// Ordered snapshot of machine state for host-side inspection.
    pub fn diagnostics(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        map.insert("heap_used".to_string(), self.from.used_bytes().to_string());
        map.insert("heap_pages".to_string(), self.from.page_count().to_string());
        map.insert(
            "reserve_pages".to_string(),
            self.to.page_count().to_string(),
        );
        map.insert(
            "symbols".to_string(),
            self.from.table_size(self.symbols).to_string(),
        );
        map.insert("gc_cycles".to_string(), self.stats.cycles.to_string());
        map.insert("live_bytes".to_string(), self.stats.live_bytes.to_string());
        map
    }
}
