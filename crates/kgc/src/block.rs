//! Heap block layout.
//!
//! Every heap object is a [`Block`]: a small header (GC flag bits and a
//! forwarding slot) followed by the typed payload. The flag bits are owned
//! exclusively by the collector; the allocator writes them once at birth and
//! never looks again.

use crate::value::{BlockRef, Value};

/// Block has been relocated; `forward` holds its to-space index.
pub const GC_MOVED: u8 = 1 << 0;

/// Block's interior values are already to-space references; the scan pass
/// must skip it.
pub const GC_VISITED: u8 = 1 << 1;

/// Accounted size of a block header, in bytes.
pub const HEADER_SIZE: usize = 16;

/// Nominal accounted size of one [`Value`], in bytes.
pub const VALUE_SIZE: usize = 16;

/// A heap object: header plus typed payload.
#[derive(Debug)]
pub struct Block {
    pub(crate) flags: u8,
    pub(crate) forward: Option<BlockRef>,
    pub(crate) data: BlockData,
}

/// Typed payload of a heap block.
#[derive(Clone, Debug)]
pub enum BlockData {
    Pair {
        car: Value,
        cdr: Value,
    },
    /// Interned symbol; `name` is stored case-folded and `hash` is the
    /// Adler-32 of those bytes, computed once at intern time.
    Symbol {
        hash: u32,
        name: Box<str>,
    },
    Str {
        text: Box<str>,
    },
    Lambda {
        id: u64,
        params: Value,
        body: Value,
        env: Value,
    },
    /// Open hash table. `buckets.len()` is the capacity (always >= 1); each
    /// bucket head is Null or a chain of pairs whose car is a
    /// `(key . value)` entry pair.
    Table {
        size: usize,
        buckets: Vec<Value>,
    },
}

impl BlockData {
    /// Accounted payload size in bytes.
    ///
    /// Pages bill blocks by this figure (plus [`HEADER_SIZE`]); strings are
    /// counted with their terminating NUL.
    pub fn data_size(&self) -> usize {
        match self {
            BlockData::Pair { .. } => 2 * VALUE_SIZE,
            BlockData::Symbol { name, .. } => 4 + name.len(),
            BlockData::Str { text } => text.len() + 1,
            BlockData::Lambda { .. } => 8 + 3 * VALUE_SIZE,
            BlockData::Table { buckets, .. } => 16 + VALUE_SIZE * buckets.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounted_sizes() {
        let pair = BlockData::Pair {
            car: Value::Null,
            cdr: Value::Null,
        };
        assert_eq!(pair.data_size(), 32);

        let s = BlockData::Str {
            text: "abc".into(),
        };
        assert_eq!(s.data_size(), 4);

        let t = BlockData::Table {
            size: 0,
            buckets: vec![Value::Null; 4],
        };
        assert_eq!(t.data_size(), 16 + 4 * VALUE_SIZE);
    }
}
