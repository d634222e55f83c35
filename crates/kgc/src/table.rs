//! Open hash table over heap storage.
//!
//! A table is a heap block holding bucket heads; each bucket is a list of
//! `(key . value)` entry pairs. Keys are interned symbols, so key comparison
//! is block identity and the bucket index comes from the hash stored in the
//! symbol at intern time.
//!
//! Tables never resize here. Resizing happens opportunistically while the
//! collector relocates a table (see `gc`), so a long stretch of mutation
//! without a collection can push a table past its ideal load factor.

use crate::heap::Heap;
use crate::value::Value;

/// Looks up `key`, returning the `(key . value)` entry pair or Null.
///
/// Returning the entry rather than the value lets callers mutate the binding
/// in place with `set_cdr`.
pub fn get(heap: &Heap, table: Value, key: Value) -> Value {
    let bucket = heap.symbol_hash(key) as usize % heap.table_capacity(table);
    let mut link = heap.table_bucket(table, bucket);
    while let Value::Pair(_) = link {
        let entry = heap.car(link);
        if heap.car(entry) == key {
            return entry;
        }
        link = heap.cdr(link);
    }
    Value::Null
}

/// Binds `key` to `value`, overwriting an existing entry in place or
/// prepending a fresh one to the key's bucket.
pub fn set(heap: &mut Heap, table: Value, key: Value, value: Value) {
    let entry = get(heap, table, key);
    if entry.is_pair() {
        heap.set_cdr(entry, value);
        return;
    }
    let bucket = heap.symbol_hash(key) as usize % heap.table_capacity(table);
    let head = heap.table_bucket(table, bucket);
    let entry = heap.alloc_pair(key, value);
    let link = heap.alloc_pair(entry, head);
    heap.set_table_bucket(table, bucket, link);
    heap.bump_table_size(table);
}
