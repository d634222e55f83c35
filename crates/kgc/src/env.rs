//! Lexical environments.
//!
//! An environment is a list of frames (tables), innermost first. Extension
//! conses a fresh frame onto the existing chain without touching it, which is
//! what lets a closure keep a stable view of its capture while callers keep
//! extending their own chains.

use karst_util::{KarstError, Result};

use crate::heap::Heap;
use crate::table;
use crate::value::Value;

/// Conses a fresh empty frame onto `env`.
pub fn extend(heap: &mut Heap, env: Value, frame_capacity: usize) -> Value {
    let frame = heap.alloc_table(frame_capacity);
    heap.alloc_pair(frame, env)
}

/// The innermost frame of `env`.
pub fn head_frame(heap: &Heap, env: Value) -> Value {
    heap.car(env)
}

/// Resolves `sym`, walking frames outward.
pub fn lookup(heap: &Heap, env: Value, sym: Value) -> Result<Value> {
    let mut frames = env;
    while let Value::Pair(_) = frames {
        let frame = heap.car(frames);
        let entry = table::get(heap, frame, sym);
        if entry.is_pair() {
            return Ok(heap.cdr(entry));
        }
        frames = heap.cdr(frames);
    }
    let name = heap.symbol_name(sym).to_string();
    log::warn!("unknown variable: {name}");
    Err(KarstError::UnknownVar(name))
}

/// Binds `sym` in the innermost frame, shadowing any outer binding.
pub fn define(heap: &mut Heap, env: Value, sym: Value, value: Value) {
    let frame = heap.car(env);
    table::set(heap, frame, sym, value);
}

/// Stores into the nearest frame that already binds `sym`.
///
/// Returns false when no frame binds it; the caller decides whether that is
/// a diagnostic or an error.
pub fn set(heap: &mut Heap, env: Value, sym: Value, value: Value) -> bool {
    let mut frames = env;
    while let Value::Pair(_) = frames {
        let frame = heap.car(frames);
        let entry = table::get(heap, frame, sym);
        if entry.is_pair() {
            heap.set_cdr(entry, value);
            return true;
        }
        frames = heap.cdr(frames);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::DEFAULT_PAGE_SIZE;
    use crate::symbol;

    fn fixture() -> (Heap, Value, Value) {
        let mut heap = Heap::new(DEFAULT_PAGE_SIZE);
        let symtab = heap.alloc_table(8);
        let frame = heap.alloc_table(4);
        let env = heap.alloc_pair(frame, Value::Null);
        (heap, symtab, env)
    }

    #[test]
    fn define_then_lookup() {
        let (mut heap, symtab, env) = fixture();
        let x = symbol::intern(&mut heap, symtab, "x");
        define(&mut heap, env, x, Value::Int(5));
        assert_eq!(lookup(&heap, env, x).unwrap(), Value::Int(5));
    }

    #[test]
    fn lookup_walks_outer_frames() {
        let (mut heap, symtab, outer) = fixture();
        let x = symbol::intern(&mut heap, symtab, "x");
        define(&mut heap, outer, x, Value::Int(1));
        let inner = extend(&mut heap, outer, 4);
        assert_eq!(lookup(&heap, inner, x).unwrap(), Value::Int(1));
    }

    #[test]
    fn define_writes_head_frame_only() {
        let (mut heap, symtab, outer) = fixture();
        let x = symbol::intern(&mut heap, symtab, "x");
        define(&mut heap, outer, x, Value::Int(1));
        let inner = extend(&mut heap, outer, 4);
        define(&mut heap, inner, x, Value::Int(2));
        assert_eq!(lookup(&heap, inner, x).unwrap(), Value::Int(2));
        assert_eq!(lookup(&heap, outer, x).unwrap(), Value::Int(1));
    }

    #[test]
    fn set_writes_nearest_binding_frame() {
        let (mut heap, symtab, outer) = fixture();
        let x = symbol::intern(&mut heap, symtab, "x");
        define(&mut heap, outer, x, Value::Int(1));
        let inner = extend(&mut heap, outer, 4);
        assert!(set(&mut heap, inner, x, Value::Int(9)));
        assert_eq!(lookup(&heap, outer, x).unwrap(), Value::Int(9));
    }

    #[test]
    fn set_of_unbound_reports_false() {
        let (mut heap, symtab, env) = fixture();
        let x = symbol::intern(&mut heap, symtab, "x");
        assert!(!set(&mut heap, env, x, Value::Int(1)));
    }

    #[test]
    fn unbound_lookup_names_the_symbol() {
        let (mut heap, symtab, env) = fixture();
        let ghost = symbol::intern(&mut heap, symtab, "ghost");
        let err = lookup(&heap, env, ghost).unwrap_err();
        assert_eq!(err, KarstError::UnknownVar("GHOST".into()));
    }

    #[test]
    fn extension_leaves_original_chain_intact() {
        let (mut heap, symtab, outer) = fixture();
        let x = symbol::intern(&mut heap, symtab, "x");
        let inner = extend(&mut heap, outer, 4);
        define(&mut heap, inner, x, Value::Int(3));
        assert!(lookup(&heap, outer, x).is_err());
    }
}
