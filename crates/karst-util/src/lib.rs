//! karst-util - Foundation Types for the Karst Interpreter
//!
//! This crate holds the pieces every other Karst crate leans on: the single
//! error channel shared by the reader, expander, evaluator and collector, the
//! Adler-32 checksum used for symbol hashing, and the case-folding rule that
//! defines symbol identity.
//!
//! Nothing here touches the heap; the types are plain data so that the lexer
//! can depend on this crate without pulling in the value representation.

pub mod error;
pub mod hash;

pub use error::{ErrorKind, KarstError, Result};
pub use hash::adler32;

/// Folds a symbol name to its canonical form (ASCII upper case).
///
/// Symbol identity in Karst is case-insensitive: `foo`, `Foo` and `FOO`
/// intern to the same symbol. Folding happens exactly once, on the way into
/// the symbol table; every stored name is already folded.
pub fn fold_case(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Case-insensitive comparison of a raw name against an already-folded one.
pub fn eq_folded(raw: &str, folded: &str) -> bool {
    raw.len() == folded.len() && raw.to_ascii_uppercase() == folded
}
