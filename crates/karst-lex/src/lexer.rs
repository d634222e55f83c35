//! The tokenizer.
//!
//! One lexer serves both input kinds: in-memory text and byte streams
//! behind the double-buffered cursor. Matching is ordered: atmosphere
//! (whitespace and `;` comments) is skipped first, then punctuation, then
//! strings, then numbers with float tried before int, and finally symbols.
//! A leading sign is only numeric when a digit follows; `+` alone is a
//! symbol.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use karst_util::{KarstError, Result};

use crate::cursor::Cursor;
use crate::stream::StreamCursor;
use crate::token::{is_symbol_byte, Token};

enum Input<'a> {
    Text(Cursor<'a>),
    Stream(StreamCursor),
}

impl Input<'_> {
    fn current(&mut self) -> Result<Option<u8>> {
        match self {
            Input::Text(c) => Ok(c.current()),
            Input::Stream(s) => s.current().map_err(read_failed),
        }
    }

    fn peek_next(&mut self) -> Result<Option<u8>> {
        match self {
            Input::Text(c) => Ok(c.peek(1)),
            Input::Stream(s) => s.peek_next().map_err(read_failed),
        }
    }

    fn advance(&mut self) {
        match self {
            Input::Text(c) => c.advance(),
            Input::Stream(s) => s.advance(),
        }
    }

    fn begin_token(&mut self) {
        if let Input::Stream(s) = self {
            s.begin_token();
        }
    }

    /// In-memory text never overflows; only streamed tokens are bounded by
    /// the two buffers.
    fn overflowed(&self) -> bool {
        match self {
            Input::Text(_) => false,
            Input::Stream(s) => s.token_overflowed(),
        }
    }

    fn line(&self) -> u32 {
        match self {
            Input::Text(c) => c.line(),
            Input::Stream(s) => s.line(),
        }
    }
}

fn read_failed(e: std::io::Error) -> KarstError {
    KarstError::BadToken(format!("stream read failed: {e}"))
}

/// Lexer for Karst source.
pub struct Lexer<'a> {
    input: Input<'a>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer").finish_non_exhaustive()
    }
}

impl<'a> Lexer<'a> {
    /// Lexes an in-memory string.
    pub fn from_str(source: &'a str) -> Self {
        Self {
            input: Input::Text(Cursor::new(source)),
        }
    }

    /// Lexes a byte stream through the two ping-pong buffers.
    ///
    /// `buffer_size` bounds the longest token to two buffers' worth.
    pub fn from_reader(reader: Box<dyn Read>, buffer_size: usize) -> Result<Self> {
        let cursor = StreamCursor::new(reader, buffer_size).map_err(read_failed)?;
        Ok(Self {
            input: Input::Stream(cursor),
        })
    }

    /// Opens and lexes a file.
    pub fn from_path(path: &Path, buffer_size: usize) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| KarstError::FileOpen(format!("{}: {e}", path.display())))?;
        Self::from_reader(Box::new(file), buffer_size)
    }

    /// Current line number (1-based), for diagnostics.
    pub fn line(&self) -> u32 {
        self.input.line()
    }

    /// Returns the next token, or [`Token::Eof`] at end of input.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_atmosphere()?;
        self.input.begin_token();

        let c = match self.input.current()? {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };
        match c {
            b'(' => {
                self.input.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.input.advance();
                Ok(Token::RParen)
            }
            b'\'' => {
                self.input.advance();
                Ok(Token::Quote)
            }
            b'"' => self.lex_string(),
            b'+' | b'-' => {
                if matches!(self.input.peek_next()?, Some(d) if d.is_ascii_digit()) {
                    self.lex_number()
                } else {
                    self.lex_symbol()
                }
            }
            b'0'..=b'9' => self.lex_number(),
            c if is_symbol_byte(c) => self.lex_symbol(),
            c => Err(KarstError::BadToken(format!(
                "unexpected character {:?} on line {}",
                c as char,
                self.input.line()
            ))),
        }
    }

    /// Skips whitespace and `;`-to-end-of-line comments.
    fn skip_atmosphere(&mut self) -> Result<()> {
        loop {
            match self.input.current()? {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.input.advance(),
                Some(b';') => loop {
                    match self.input.current()? {
                        None | Some(b'\n') => break,
                        Some(_) => self.input.advance(),
                    }
                },
                _ => return Ok(()),
            }
        }
    }

    /// Consumes the current byte into `lexeme`, failing once the token has
    /// outgrown the two stream buffers.
    fn consume(&mut self, lexeme: &mut String, c: u8) -> Result<()> {
        if self.input.overflowed() {
            return Err(self.token_too_long());
        }
        lexeme.push(c as char);
        self.input.advance();
        Ok(())
    }

    fn token_too_long(&self) -> KarstError {
        KarstError::BadToken(format!("token too long on line {}", self.input.line()))
    }

    /// Lexes an integer or float. Float is matched first: a `.` after the
    /// integer digits commits the token to float form.
    fn lex_number(&mut self) -> Result<Token> {
        let mut lexeme = String::new();

        if let Some(c @ (b'+' | b'-')) = self.input.current()? {
            self.consume(&mut lexeme, c)?;
        }
        while let Some(c) = self.input.current()? {
            if !c.is_ascii_digit() {
                break;
            }
            self.consume(&mut lexeme, c)?;
        }

        let mut is_float = false;
        if let Some(b'.') = self.input.current()? {
            is_float = true;
            self.consume(&mut lexeme, b'.')?;
            while let Some(c) = self.input.current()? {
                if !c.is_ascii_digit() {
                    break;
                }
                self.consume(&mut lexeme, c)?;
            }
        }

        if is_float {
            lexeme
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| KarstError::BadToken(format!("bad float literal '{lexeme}'")))
        } else {
            lexeme
                .parse::<i64>()
                .map(Token::Int)
                .map_err(|_| KarstError::BadToken(format!("bad int literal '{lexeme}'")))
        }
    }

    fn lex_symbol(&mut self) -> Result<Token> {
        let mut lexeme = String::new();
        while let Some(c) = self.input.current()? {
            if !is_symbol_byte(c) {
                break;
            }
            self.consume(&mut lexeme, c)?;
        }
        Ok(Token::Symbol(lexeme))
    }

    /// Lexes a string literal: quoted bytes with no interior newline and no
    /// escape sequences.
    fn lex_string(&mut self) -> Result<Token> {
        self.input.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.input.current()? {
                None => {
                    return Err(KarstError::BadToken(format!(
                        "unterminated string on line {}",
                        self.input.line()
                    )))
                }
                Some(b'"') => {
                    self.input.advance();
                    break;
                }
                Some(b'\n') => {
                    return Err(KarstError::BadToken(format!(
                        "newline in string literal on line {}",
                        self.input.line()
                    )))
                }
                Some(c) => {
                    if self.input.overflowed() {
                        return Err(self.token_too_long());
                    }
                    bytes.push(c);
                    self.input.advance();
                }
            }
        }
        Ok(Token::Str(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token::Eof) => None,
            other => Some(other),
        }
    }
}

/// Lexes a whole in-memory source to a token vector (without the trailing
/// [`Token::Eof`]).
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::from_str(source).collect()
}
