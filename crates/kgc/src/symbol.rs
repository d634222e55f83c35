//! Symbol interning.
//!
//! The symbol table is itself a heap table whose entries pair each symbol
//! with itself, so the collector relocates it like any other table. Interning
//! probes by the Adler-32 of the case-folded name and compares stored names;
//! once interned, symbol equality is block identity everywhere else.

use karst_util::{adler32, fold_case};

use crate::heap::Heap;
use crate::value::Value;

/// Interns `name`, returning the unique symbol for its case-folded form.
pub fn intern(heap: &mut Heap, symtab: Value, name: &str) -> Value {
    let folded = fold_case(name);
    let hash = adler32(folded.as_bytes());
    let bucket = hash as usize % heap.table_capacity(symtab);

    let mut link = heap.table_bucket(symtab, bucket);
    while let Value::Pair(_) = link {
        let entry = heap.car(link);
        let sym = heap.car(entry);
        if heap.symbol_hash(sym) == hash && heap.symbol_name(sym) == folded {
            return sym;
        }
        link = heap.cdr(link);
    }

    let sym = heap.alloc_symbol(hash, &folded);
    let head = heap.table_bucket(symtab, bucket);
    let entry = heap.alloc_pair(sym, sym);
    let chain = heap.alloc_pair(entry, head);
    heap.set_table_bucket(symtab, bucket, chain);
    heap.bump_table_size(symtab);
    sym
}
