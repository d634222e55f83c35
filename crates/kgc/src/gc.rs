//! Cheney-style copying collector.
//!
//! Collection runs in three steps: relocate the roots into to-space, scan
//! to-space linearly (blocks appended during the scan extend the frontier,
//! so the single pass reaches everything live), then swap the semispaces.
//!
//! Relocating a block stores its to-space index in the source header and
//! raises `GC_MOVED`; any later reference to the same block resolves through
//! that forwarding slot, which is what preserves sharing and cycles.
//!
//! Tables are the one block kind that changes shape in flight: when a
//! table's load factor has drifted out of bounds it is rebuilt at capacity
//! `max(1, 3*size - 1)`, rehashing every entry by the key symbol's stored
//! hash. The rebuilt table and its fresh bucket chain pairs are born with
//! `GC_VISITED` raised because their interiors already point into to-space;
//! the entry pairs themselves are moved normally and the scan fixes their
//! key and value like any other pair.

use crate::block::{BlockData, GC_MOVED, GC_VISITED};
use crate::heap::Heap;
use crate::value::{BlockRef, Value};

pub(crate) struct Collector<'h> {
    from: &'h mut Heap,
    to: &'h mut Heap,
    load_min: f64,
    load_max: f64,
}

impl<'h> Collector<'h> {
    pub(crate) fn new(from: &'h mut Heap, to: &'h mut Heap, load_min: f64, load_max: f64) -> Self {
        Self {
            from,
            to,
            load_min,
            load_max,
        }
    }

    /// Relocates one value: immediates pass through, heap values are moved
    /// (or resolved through their forwarding slot) and re-tagged.
    pub(crate) fn move_value(&mut self, v: Value) -> Value {
        match v {
            Value::Pair(r) => Value::Pair(self.move_block(r)),
            Value::Symbol(r) => Value::Symbol(self.move_block(r)),
            Value::Str(r) => Value::Str(self.move_block(r)),
            Value::Lambda(r) => Value::Lambda(self.move_block(r)),
            Value::Table(r) => Value::Table(self.move_block(r)),
            _ => v,
        }
    }

    fn move_block(&mut self, r: BlockRef) -> BlockRef {
        if self.from.get(r).flags & GC_MOVED != 0 {
            return self
                .from
                .get(r)
                .forward
                .expect("moved block carries a forwarding ref");
        }
        if matches!(self.from.get(r).data, BlockData::Table { .. }) {
            return self.move_table(r);
        }
        let data = self.from.get(r).data.clone();
        let nr = self.to.alloc_raw(data, 0);
        let src = self.from.get_mut(r);
        src.flags |= GC_MOVED;
        src.forward = Some(nr);
        nr
    }

    fn move_table(&mut self, r: BlockRef) -> BlockRef {
        let (size, old_buckets) = match &self.from.get(r).data {
            BlockData::Table { size, buckets } => (*size, buckets.clone()),
            _ => unreachable!("move_table on non-table block"),
        };

        let old_capacity = old_buckets.len();
        let load = size as f64 / old_capacity as f64;
        let new_capacity = if load < self.load_min || load > self.load_max {
            (3 * size).saturating_sub(1).max(1)
        } else {
            old_capacity
        };

        let nr = self.to.alloc_raw(
            BlockData::Table {
                size,
                buckets: vec![Value::Null; new_capacity],
            },
            GC_VISITED,
        );
        {
            let src = self.from.get_mut(r);
            src.flags |= GC_MOVED;
            src.forward = Some(nr);
        }

        for head in old_buckets {
            let mut link = head;
            while link.is_pair() {
                let entry = self.from.car(link);
                let next = self.from.cdr(link);

                // The source entry pair still holds the from-space key even
                // if the pair itself has been forwarded, so its hash is
                // always readable here.
                let key = self.from.car(entry);
                let hash = self.from.symbol_hash(key);

                let entry_ref = match entry {
                    Value::Pair(e) => e,
                    _ => unreachable!("table entry is a pair"),
                };
                let moved_entry = Value::Pair(self.move_block(entry_ref));

                let bucket = hash as usize % new_capacity;
                let old_head = match &self.to.get(nr).data {
                    BlockData::Table { buckets, .. } => buckets[bucket],
                    _ => unreachable!(),
                };
                let chain = self.to.alloc_raw(
                    BlockData::Pair {
                        car: moved_entry,
                        cdr: old_head,
                    },
                    GC_VISITED,
                );
                match &mut self.to.get_mut(nr).data {
                    BlockData::Table { buckets, .. } => buckets[bucket] = Value::Pair(chain),
                    _ => unreachable!(),
                }

                link = next;
            }
        }

        nr
    }

    /// Walks to-space in allocation order, relocating the interiors of
    /// every block whose `GC_VISITED` bit is clear.
    pub(crate) fn scan(&mut self) {
        let mut page = 0usize;
        let mut slot = 0usize;
        loop {
            if page >= self.to.page_count() {
                break;
            }
            if slot >= self.to.page_blocks(page) {
                page += 1;
                slot = 0;
                continue;
            }
            let r = BlockRef {
                page: page as u32,
                slot: slot as u32,
            };
            slot += 1;
            if self.to.get(r).flags & GC_VISITED != 0 {
                continue;
            }
            self.to.get_mut(r).flags |= GC_VISITED;
            self.relocate_interior(r);
        }
    }

    fn relocate_interior(&mut self, r: BlockRef) {
        enum Shape {
            Pair(Value, Value),
            Lambda(Value, Value, Value),
            Leaf,
        }

        let shape = match &self.to.get(r).data {
            BlockData::Pair { car, cdr } => Shape::Pair(*car, *cdr),
            BlockData::Lambda {
                params, body, env, ..
            } => Shape::Lambda(*params, *body, *env),
            BlockData::Table { .. } => {
                unreachable!("tables are relocated by move_table and born VISITED")
            }
            _ => Shape::Leaf,
        };

        match shape {
            Shape::Pair(car, cdr) => {
                let car = self.move_value(car);
                let cdr = self.move_value(cdr);
                if let BlockData::Pair { car: c, cdr: d } = &mut self.to.get_mut(r).data {
                    *c = car;
                    *d = cdr;
                }
            }
            Shape::Lambda(params, body, env) => {
                let params = self.move_value(params);
                let body = self.move_value(body);
                let env = self.move_value(env);
                if let BlockData::Lambda {
                    params: p,
                    body: b,
                    env: e,
                    ..
                } = &mut self.to.get_mut(r).data
                {
                    *p = params;
                    *b = body;
                    *e = env;
                }
            }
            Shape::Leaf => {}
        }
    }
}
