//! Stream Lexing Tests - Ping-Pong Buffer Behavior
//!
//! The streamed lexer must produce exactly the tokens the in-memory lexer
//! produces, for any buffer size, except when a single token outgrows the
//! two buffers - that case must fail with "token too long" rather than
//! mis-lex.

use std::io;

use karst_lex::{tokenize, Lexer, Token};
use karst_util::{ErrorKind, KarstError, Result};

fn stream_tokens(source: &str, buffer_size: usize) -> Result<Vec<Token>> {
    let reader = Box::new(io::Cursor::new(source.to_string()));
    Lexer::from_reader(reader, buffer_size)?.collect()
}

#[test]
fn stream_matches_text_for_many_buffer_sizes() {
    let source = "(define (square x) (* x x)) ; comment\n'(a . b) \"str\" 12 -3 4.5";
    let expected = tokenize(source).unwrap();
    for buffer_size in [16, 17, 23, 64, 4096] {
        assert_eq!(
            stream_tokens(source, buffer_size).unwrap(),
            expected,
            "buffer size {buffer_size}"
        );
    }
}

#[test]
fn token_may_span_both_buffers() {
    // 24-byte symbol over 16-byte buffers: one refill mid-token, permitted.
    let source = format!("({})", "s".repeat(24));
    let tokens = stream_tokens(&source, 16).unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::LParen,
            Token::Symbol("s".repeat(24)),
            Token::RParen
        ]
    );
}

#[test]
fn token_needing_a_third_buffer_fails() {
    let source = "x".repeat(40);
    let err = stream_tokens(&source, 16).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadToken);
    assert!(err.to_string().contains("token too long"), "{err}");
}

#[test]
fn long_string_literal_hits_the_same_bound() {
    let source = format!("\"{}\"", "y".repeat(40));
    let err = stream_tokens(&source, 16).unwrap_err();
    assert!(err.to_string().contains("token too long"), "{err}");
}

#[test]
fn short_tokens_pass_through_tiny_buffers() {
    // Every token fits a single 16-byte buffer even though the input is long.
    let source = "(a b c) ".repeat(64);
    let tokens = stream_tokens(&source, 16).unwrap();
    assert_eq!(tokens.len(), 64 * 5);
}

#[test]
fn missing_file_reports_file_open() {
    let err = Lexer::from_path(std::path::Path::new("/no/such/karst/file"), 4096).unwrap_err();
    assert!(matches!(err, KarstError::FileOpen(_)));
    assert!(err.to_string().contains("/no/such/karst/file"));
}
