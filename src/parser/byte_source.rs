//! Cursor over a fully buffered input file.
//!
//! Tree and sequence files of a scoring session are read whole, so a source
//! only has to expose its bytes and a cursor. Everything else ([ByteSource::peek],
//! line/column lookup for diagnostics) is derived from those two.

use std::fmt;
use std::io::{self, Read};

/// Line and column (both 1-based) of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================#=
/// Buffered bytes plus a cursor.
///
/// Implementors provide [ByteSource::buffer], [ByteSource::position] and
/// [ByteSource::set_position]; the cursor may sit past the end of the buffer,
/// which reads as EOF.
pub trait ByteSource {
    /// The complete input.
    fn buffer(&self) -> &[u8];

    /// Byte offset of the cursor.
    fn position(&self) -> usize;

    /// Moves the cursor to `pos`.
    fn set_position(&mut self, pos: usize);

    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.buffer().get(self.position()).copied()
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.set_position(self.position() + 1);
        Some(byte)
    }

    /// Up to `k` bytes starting at the cursor; shorter near the end.
    fn peek_slice(&self, k: usize) -> &[u8] {
        let buffer = self.buffer();
        let start = self.position().min(buffer.len());
        let end = start.saturating_add(k).min(buffer.len());
        &buffer[start..end]
    }

    fn is_eof(&self) -> bool {
        self.position() >= self.buffer().len()
    }

    /// Line and column of the cursor. `\r\n` counts as a single line break.
    fn location(&self) -> TextLocation {
        let buffer = self.buffer();
        let consumed = &buffer[..self.position().min(buffer.len())];
        let line_start = consumed
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        TextLocation {
            line: 1 + consumed.iter().filter(|&&b| b == b'\n').count(),
            column: 1 + consumed.len() - line_start,
        }
    }
}

// =#========================================================================#=
// READ BUFFER
// =#========================================================================#=
/// Owned input with a cursor, the source behind every reader in this crate.
#[derive(Debug, Clone, Default)]
pub struct ReadBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl ReadBuffer {
    /// Drains `reader` into a new buffer.
    ///
    /// # Errors
    /// Any I/O error of the reader.
    pub fn read_all<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from(data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for ReadBuffer {
    fn from(data: Vec<u8>) -> Self {
        ReadBuffer { data, cursor: 0 }
    }
}

impl From<&str> for ReadBuffer {
    fn from(text: &str) -> Self {
        ReadBuffer::from(text.as_bytes().to_vec())
    }
}

impl ByteSource for ReadBuffer {
    #[inline(always)]
    fn buffer(&self) -> &[u8] {
        &self.data
    }

    #[inline(always)]
    fn position(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    fn set_position(&mut self, pos: usize) {
        self.cursor = pos;
    }
}
