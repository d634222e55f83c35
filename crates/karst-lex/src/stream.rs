//! Double-buffered stream cursor.
//!
//! File input is scanned through two fixed-size buffers in a ping-pong: when
//! the cursor runs off the end of the active buffer, the other buffer is
//! refilled from the reader and the cursor flips into it. A single token may
//! span the two buffers at once; a token that would need a third refill is
//! too long for this scheme and the lexer reports it as a bad token.
//!
//! Flips are performed lazily, on the read that actually needs the next
//! byte, so a token ending exactly at a buffer boundary is not charged for
//! the flip that fetches its terminator.

use std::io::{self, Read};

/// Cursor over a byte stream, refilled through two fixed buffers.
pub struct StreamCursor {
    reader: Box<dyn Read>,
    bufs: [Vec<u8>; 2],
    active: usize,
    pos: usize,
    /// The inactive buffer holds the next chunk, ready to flip into.
    other_ready: bool,
    /// The reader has reported end of stream.
    eof: bool,
    refills_in_token: u32,
    buffer_size: usize,
    line: u32,
}

impl StreamCursor {
    /// Creates a cursor and fills the first buffer.
    pub fn new(reader: Box<dyn Read>, buffer_size: usize) -> io::Result<Self> {
        let mut cursor = Self {
            reader,
            bufs: [Vec::new(), Vec::new()],
            active: 0,
            pos: 0,
            other_ready: false,
            eof: false,
            refills_in_token: 0,
            buffer_size,
            line: 1,
        };
        let first = cursor.read_chunk()?;
        cursor.bufs[0] = first;
        Ok(cursor)
    }

    /// Reads one full chunk (short only at end of stream).
    fn read_chunk(&mut self) -> io::Result<Vec<u8>> {
        let mut chunk = vec![0u8; self.buffer_size];
        let mut filled = 0;
        while filled < self.buffer_size {
            let n = self.reader.read(&mut chunk[filled..])?;
            if n == 0 {
                self.eof = true;
                break;
            }
            filled += n;
        }
        chunk.truncate(filled);
        Ok(chunk)
    }

    fn fill_other(&mut self) -> io::Result<()> {
        if self.other_ready || self.eof {
            return Ok(());
        }
        let chunk = self.read_chunk()?;
        if !chunk.is_empty() {
            self.bufs[1 - self.active] = chunk;
            self.other_ready = true;
        }
        Ok(())
    }

    /// Flips into the other buffer if the active one is exhausted.
    fn normalize(&mut self) -> io::Result<()> {
        while self.pos >= self.bufs[self.active].len() {
            self.fill_other()?;
            if !self.other_ready {
                return Ok(()); // true end of input
            }
            self.active = 1 - self.active;
            self.pos = 0;
            self.other_ready = false;
            self.refills_in_token += 1;
        }
        Ok(())
    }

    /// The byte at the cursor, or `None` at end of input.
    pub fn current(&mut self) -> io::Result<Option<u8>> {
        self.normalize()?;
        Ok(self.bufs[self.active].get(self.pos).copied())
    }

    /// The byte after the current one, read without flipping the cursor.
    pub fn peek_next(&mut self) -> io::Result<Option<u8>> {
        self.normalize()?;
        if self.pos + 1 < self.bufs[self.active].len() {
            return Ok(Some(self.bufs[self.active][self.pos + 1]));
        }
        self.fill_other()?;
        if self.other_ready {
            Ok(self.bufs[1 - self.active].first().copied())
        } else {
            Ok(None)
        }
    }

    /// Advances past the current byte. Callers only advance after `current`
    /// returned a byte, so the position is always in range here.
    pub fn advance(&mut self) {
        if let Some(&c) = self.bufs[self.active].get(self.pos) {
            if c == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    /// Marks the start of a token; refill accounting restarts here.
    pub fn begin_token(&mut self) {
        self.refills_in_token = 0;
    }

    /// True once the current token has required more than the two buffers.
    pub fn token_overflowed(&self) -> bool {
        self.refills_in_token >= 2
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor_over(text: &str, buffer_size: usize) -> StreamCursor {
        StreamCursor::new(Box::new(io::Cursor::new(text.to_string())), buffer_size)
            .expect("in-memory reader cannot fail")
    }

    #[test]
    fn reads_all_bytes_across_refills() {
        let mut c = cursor_over("abcdefghij", 3);
        let mut seen = Vec::new();
        while let Some(b) = c.current().unwrap() {
            seen.push(b);
            c.advance();
        }
        assert_eq!(seen, b"abcdefghij");
    }

    #[test]
    fn peek_crosses_buffer_boundary() {
        let mut c = cursor_over("abcd", 2);
        assert_eq!(c.current().unwrap(), Some(b'a'));
        c.advance();
        // 'b' is the last byte of the first buffer; peeking 'c' must not flip.
        assert_eq!(c.current().unwrap(), Some(b'b'));
        assert_eq!(c.peek_next().unwrap(), Some(b'c'));
        assert_eq!(c.current().unwrap(), Some(b'b'));
    }

    #[test]
    fn refill_accounting_per_token() {
        let mut c = cursor_over("abcdefgh", 3);
        c.begin_token();
        for _ in 0..4 {
            c.current().unwrap();
            c.advance();
        }
        // One flip so far: the token spans two buffers, which is permitted.
        assert!(!c.token_overflowed());
        for _ in 0..3 {
            c.current().unwrap();
            c.advance();
        }
        assert!(c.token_overflowed());
        c.begin_token();
        assert!(!c.token_overflowed());
    }

    #[test]
    fn empty_input_is_immediately_exhausted() {
        let mut c = cursor_over("", 4);
        assert_eq!(c.current().unwrap(), None);
        assert_eq!(c.peek_next().unwrap(), None);
    }

    #[test]
    fn line_tracking() {
        let mut c = cursor_over("a\nb\nc", 2);
        assert_eq!(c.line(), 1);
        while c.current().unwrap().is_some() {
            c.advance();
        }
        assert_eq!(c.line(), 3);
    }
}
