//! Paged bump-allocating heap.
//!
//! A heap is an ordered sequence of fixed-capacity pages; allocation bumps a
//! byte cursor within the current page. When a request does not fit, the
//! allocator advances to the next retained page, or appends a fresh page
//! whose capacity is `max(default, request)`. The allocator never moves a
//! block once placed; only the collector relocates, and it does so by
//! copying into the sibling heap.
//!
//! After a collection the dead semispace is reset: pages beyond the live
//! size are freed, pages within it are retained with their cursors at zero.

use crate::block::{Block, BlockData, HEADER_SIZE};
use crate::value::{BlockRef, Value};

/// Default page capacity in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 8 * 1024;

/// One fixed-capacity page of blocks.
#[derive(Debug)]
pub(crate) struct Page {
    capacity: usize,
    used: usize,
    blocks: Vec<Block>,
}

impl Page {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            blocks: Vec::new(),
        }
    }

    fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}

/// A semispace: ordered pages with a bump cursor.
#[derive(Debug)]
pub struct Heap {
    pages: Vec<Page>,
    cur: usize,
    page_size: usize,
}

impl Heap {
    pub fn new(page_size: usize) -> Self {
        Self {
            pages: Vec::new(),
            cur: 0,
            page_size,
        }
    }

    /// Allocates a block, advancing to the next page (or appending a new
    /// one) when the current page cannot hold the request.
    pub(crate) fn alloc_raw(&mut self, data: BlockData, flags: u8) -> BlockRef {
        let need = HEADER_SIZE + data.data_size();
        loop {
            if self.cur < self.pages.len() {
                if self.pages[self.cur].remaining() >= need {
                    break;
                }
                self.cur += 1;
            } else {
                self.pages.push(Page::new(self.page_size.max(need)));
            }
        }
        let page = &mut self.pages[self.cur];
        page.used += need;
        page.blocks.push(Block {
            flags,
            forward: None,
            data,
        });
        BlockRef {
            page: self.cur as u32,
            slot: (page.blocks.len() - 1) as u32,
        }
    }

    pub(crate) fn get(&self, r: BlockRef) -> &Block {
        &self.pages[r.page as usize].blocks[r.slot as usize]
    }

    pub(crate) fn get_mut(&mut self, r: BlockRef) -> &mut Block {
        &mut self.pages[r.page as usize].blocks[r.slot as usize]
    }

    /// Total bytes accounted to live blocks.
    pub fn used_bytes(&self) -> usize {
        self.pages.iter().map(|p| p.used).sum()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn page_blocks(&self, page: usize) -> usize {
        self.pages[page].blocks.len()
    }

    /// Resets the heap after its contents have been evacuated.
    ///
    /// Keeps the shortest page prefix covering `live` bytes (cursors reset
    /// to zero), frees the rest. Returns the number of pages freed.
    pub(crate) fn reset_to(&mut self, live: usize) -> usize {
        let mut covered = 0usize;
        let mut keep = 0usize;
        for page in &self.pages {
            if covered >= live {
                break;
            }
            covered += page.capacity;
            keep += 1;
        }
        let freed = self.pages.len() - keep;
        self.pages.truncate(keep);
        for page in &mut self.pages {
            page.blocks.clear();
            page.used = 0;
        }
        self.cur = 0;
        freed
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn alloc_pair(&mut self, car: Value, cdr: Value) -> Value {
        Value::Pair(self.alloc_raw(BlockData::Pair { car, cdr }, 0))
    }

    pub fn alloc_string(&mut self, text: &str) -> Value {
        Value::Str(self.alloc_raw(
            BlockData::Str {
                text: text.into(),
            },
            0,
        ))
    }

    /// Raw symbol constructor. Callers must go through interning; a symbol
    /// that bypasses the symbol table breaks identity-based equality.
    pub(crate) fn alloc_symbol(&mut self, hash: u32, folded_name: &str) -> Value {
        Value::Symbol(self.alloc_raw(
            BlockData::Symbol {
                hash,
                name: folded_name.into(),
            },
            0,
        ))
    }

    pub fn alloc_lambda(&mut self, id: u64, params: Value, body: Value, env: Value) -> Value {
        Value::Lambda(self.alloc_raw(
            BlockData::Lambda {
                id,
                params,
                body,
                env,
            },
            0,
        ))
    }

    /// Allocates an empty table. `capacity` must be >= 1.
    pub fn alloc_table(&mut self, capacity: usize) -> Value {
        debug_assert!(capacity >= 1);
        Value::Table(self.alloc_raw(
            BlockData::Table {
                size: 0,
                buckets: vec![Value::Null; capacity],
            },
            0,
        ))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------
    // These panic when handed the wrong variant: a mistyped access is an
    // interpreter bug, not a user error.

    /// Panics if `v` is not a Pair.
    pub fn car(&self, v: Value) -> Value {
        match v {
            Value::Pair(r) => match &self.get(r).data {
                BlockData::Pair { car, .. } => *car,
                _ => panic!("pair ref to non-pair block"),
            },
            _ => panic!("car of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a Pair.
    pub fn cdr(&self, v: Value) -> Value {
        match v {
            Value::Pair(r) => match &self.get(r).data {
                BlockData::Pair { cdr, .. } => *cdr,
                _ => panic!("pair ref to non-pair block"),
            },
            _ => panic!("cdr of {}", v.type_name()),
        }
    }

    pub fn set_car(&mut self, v: Value, new: Value) {
        match v {
            Value::Pair(r) => match &mut self.get_mut(r).data {
                BlockData::Pair { car, .. } => *car = new,
                _ => panic!("pair ref to non-pair block"),
            },
            _ => panic!("set-car of {}", v.type_name()),
        }
    }

    pub fn set_cdr(&mut self, v: Value, new: Value) {
        match v {
            Value::Pair(r) => match &mut self.get_mut(r).data {
                BlockData::Pair { cdr, .. } => *cdr = new,
                _ => panic!("pair ref to non-pair block"),
            },
            _ => panic!("set-cdr of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a Symbol.
    pub fn symbol_name(&self, v: Value) -> &str {
        match v {
            Value::Symbol(r) => match &self.get(r).data {
                BlockData::Symbol { name, .. } => name,
                _ => panic!("symbol ref to non-symbol block"),
            },
            _ => panic!("symbol name of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a Symbol.
    pub fn symbol_hash(&self, v: Value) -> u32 {
        match v {
            Value::Symbol(r) => match &self.get(r).data {
                BlockData::Symbol { hash, .. } => *hash,
                _ => panic!("symbol ref to non-symbol block"),
            },
            _ => panic!("symbol hash of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a String.
    pub fn string_text(&self, v: Value) -> &str {
        match v {
            Value::Str(r) => match &self.get(r).data {
                BlockData::Str { text } => text,
                _ => panic!("string ref to non-string block"),
            },
            _ => panic!("string text of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a Lambda. Returns (id, params, body, env).
    pub fn lambda_parts(&self, v: Value) -> (u64, Value, Value, Value) {
        match v {
            Value::Lambda(r) => match &self.get(r).data {
                BlockData::Lambda {
                    id,
                    params,
                    body,
                    env,
                } => (*id, *params, *body, *env),
                _ => panic!("lambda ref to non-lambda block"),
            },
            _ => panic!("lambda parts of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a Table.
    pub fn table_capacity(&self, v: Value) -> usize {
        match v {
            Value::Table(r) => match &self.get(r).data {
                BlockData::Table { buckets, .. } => buckets.len(),
                _ => panic!("table ref to non-table block"),
            },
            _ => panic!("table capacity of {}", v.type_name()),
        }
    }

    /// Panics if `v` is not a Table.
    pub fn table_size(&self, v: Value) -> usize {
        match v {
            Value::Table(r) => match &self.get(r).data {
                BlockData::Table { size, .. } => *size,
                _ => panic!("table ref to non-table block"),
            },
            _ => panic!("table size of {}", v.type_name()),
        }
    }

    pub fn table_bucket(&self, v: Value, bucket: usize) -> Value {
        match v {
            Value::Table(r) => match &self.get(r).data {
                BlockData::Table { buckets, .. } => buckets[bucket],
                _ => panic!("table ref to non-table block"),
            },
            _ => panic!("table bucket of {}", v.type_name()),
        }
    }

    pub(crate) fn set_table_bucket(&mut self, v: Value, bucket: usize, head: Value) {
        match v {
            Value::Table(r) => match &mut self.get_mut(r).data {
                BlockData::Table { buckets, .. } => buckets[bucket] = head,
                _ => panic!("table ref to non-table block"),
            },
            _ => panic!("set table bucket of {}", v.type_name()),
        }
    }

    pub(crate) fn bump_table_size(&mut self, v: Value) {
        match v {
            Value::Table(r) => match &mut self.get_mut(r).data {
                BlockData::Table { size, .. } => *size += 1,
                _ => panic!("table ref to non-table block"),
            },
            _ => panic!("bump table size of {}", v.type_name()),
        }
    }

    // ------------------------------------------------------------------
    // List helpers
    // ------------------------------------------------------------------

    /// Builds a proper list from `items`.
    pub fn list_from_slice(&mut self, items: &[Value]) -> Value {
        self.list_with_tail(items, Value::Null)
    }

    /// Builds `(items[0] items[1] ... . tail)`.
    pub fn list_with_tail(&mut self, items: &[Value], tail: Value) -> Value {
        let mut acc = tail;
        for &item in items.iter().rev() {
            acc = self.alloc_pair(item, acc);
        }
        acc
    }

    /// Length of a proper list; `None` for dotted tails.
    pub fn list_length(&self, v: Value) -> Option<usize> {
        let mut n = 0;
        let mut cur = v;
        loop {
            match cur {
                Value::Null => return Some(n),
                Value::Pair(_) => {
                    n += 1;
                    cur = self.cdr(cur);
                }
                _ => return None,
            }
        }
    }

    /// Elements of a proper list; `None` for dotted tails.
    pub fn list_items(&self, v: Value) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut cur = v;
        loop {
            match cur {
                Value::Null => return Some(items),
                Value::Pair(_) => {
                    items.push(self.car(cur));
                    cur = self.cdr(cur);
                }
                _ => return None,
            }
        }
    }
}
