//! karst-lex - Lexical Analyzer
//!
//! Turns Karst source into tokens: parens, the quote mark, symbols, string
//! literals, ints and floats. Two input modes share one scanner:
//!
//! - in-memory text, walked by a plain byte [`cursor::Cursor`];
//! - byte streams (files), walked through two fixed ping-pong buffers by
//!   [`stream::StreamCursor`]. A token may span both buffers at once; one
//!   that would need a third refill is reported as a bad token ("token too
//!   long"), so the buffer size bounds token length, never correctness of
//!   shorter input.
//!
//! Matching order is significant and fixed: atmosphere, punctuation,
//! strings, float before int, then symbols. A sign is only numeric when a
//! digit follows it, so `+` and `-` lex as symbols.

pub mod cursor;
pub mod lexer;
pub mod stream;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::Token;
