//! Low-level byte-by-byte parser for ASCII text.
//!
//! This module provides [ByteParser] for text-based formats with support
//! for peeking, consuming, comment skipping, and quote-aware label parsing. Used as
//! the foundation of the Newick, FASTA and PHYLIP readers.

use crate::parser::byte_source::{ByteSource, ReadBuffer, TextLocation};
use crate::parser::parsing_error::ParsingError;
use std::io::{self, Read};
use std::str::FromStr;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser for ASCII text with support for peeking, consuming, and pattern matching.
///
/// # Features
/// - Works with any [ByteSource]
/// - Case-insensitive single byte matching
/// - Whitespace and `[...]` comment skipping
/// - Quote-aware label parsing (single quotes with `''` escaping)
/// - Context extraction for error reporting
///
/// # Example
/// ```
/// use treeshrew::parser::byte_parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("[&R] (A:1.0,B:1.0);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",:;()").unwrap(), "A");
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
}

impl ByteParser<ReadBuffer> {
    /// Creates a new `ByteParser` from a string by copying it.
    pub fn for_str(input: &str) -> Self {
        Self::new(ReadBuffer::from(input))
    }

    /// Creates a new `ByteParser` reading the whole reader into memory.
    ///
    /// # Errors
    /// Any I/O error of the reader.
    pub fn for_reader<R: Read>(reader: R) -> io::Result<Self> {
        Ok(Self::new(ReadBuffer::read_all(reader)?))
    }
}

impl<S: ByteSource> ByteParser<S> {
    /// Creates a new `ByteParser` from a byte source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Peeks at the current byte without consuming it.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.source.peek()
    }

    /// Gets the current byte and advances the position (consumes it).
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        self.source.next_byte()
    }

    /// Skips (consumes) all consecutive whitespace, including line breaks.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.next_byte();
            } else {
                break;
            }
        }
    }

    /// Skips spaces and tabs, stopping at line breaks.
    pub fn skip_inline_whitespace(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.next_byte();
        }
    }

    /// Skips (consumes) a `[...]` comment if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// Returns an error if a comment starts with `[` but doesn't have a closing `]`.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        self.take_while(|b| b != b']');
        match self.next_byte() {
            Some(_) => Ok(true),
            None => Err(ParsingError::unclosed_comment(self)),
        }
    }

    /// Skips (consumes) all consecutive whitespace and `[...]` comments.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();

        while self.skip_comment()? {
            self.skip_whitespace();
        }

        Ok(())
    }

    /// Checks if the current byte matches the target byte (case-insensitive for ASCII).
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek()
            .is_some_and(|b| b.eq_ignore_ascii_case(&ch))
    }

    /// Consumes the current byte if it matches the target byte (case-insensitive).
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Consumes bytes while `keep` holds and returns them.
    pub fn take_while<F: Fn(u8) -> bool>(&mut self, keep: F) -> Vec<u8> {
        let mut taken = Vec::new();
        while let Some(b) = self.peek().filter(|&b| keep(b)) {
            taken.push(b);
            self.next_byte();
        }
        taken
    }

    /// Returns the rest of the current line and consumes the line break.
    ///
    /// A trailing `\r` is dropped. Returns `None` at EOF.
    pub fn read_line(&mut self) -> Option<String> {
        if self.is_eof() {
            return None;
        }
        let mut line = Vec::new();
        while let Some(b) = self.next_byte() {
            if b == b'\n' {
                break;
            }
            line.push(b);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    /// Returns the current parser position in the input.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Sets the position in the byte stream.
    pub fn set_position(&mut self, pos: usize) {
        self.source.set_position(pos);
    }

    /// Line and column of the current position.
    pub fn location(&self) -> TextLocation {
        self.source.location()
    }

    /// Returns a string from up to `k` bytes from the current position for error context.
    ///
    /// Invalid UTF-8 sequences are replaced with the Unicode replacement character.
    pub fn get_context_as_string(&self, k: usize) -> String {
        String::from_utf8_lossy(self.source.peek_slice(k)).into_owned()
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set.
    ///
    /// # Arguments
    /// * `delimiters` - Bytes that end an unquoted label
    ///
    /// # Errors
    /// Returns an error on an unclosed comment or quote.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a quoted label enclosed in single quotes with escape support.
    ///
    /// Assumes the opening quote has not been consumed yet. Single quotes within
    /// the label are escaped by doubling them (e.g., `'Belanger''s'` becomes `Belanger's`).
    ///
    /// # Errors
    /// Returns an error if the closing quote is missing.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // opening '

        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                None => return Err(ParsingError::unexpected_eof(self)),
                Some(b'\'') if self.peek() == Some(b'\'') => {
                    label.push(b'\'');
                    self.next_byte();
                }
                Some(b'\'') => break,
                Some(b) => label.push(b),
            }
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an unquoted label until any of the given delimiters (or EOF).
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let label = self.take_while(|b| !delimiters.contains(&b));
        String::from_utf8_lossy(&label).into_owned()
    }

    /// Parses a floating point number, including scientific notation (e.g. `1.5e-10`).
    ///
    /// # Errors
    /// Returns an error if the bytes at the current position do not form a number.
    pub fn parse_f64(&mut self) -> Result<f64, ParsingError> {
        self.parse_number(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
    }

    /// Parses an unsigned integer.
    ///
    /// # Errors
    /// Returns an error if there is no digit at the current position.
    pub fn parse_usize(&mut self) -> Result<usize, ParsingError> {
        self.parse_number(|b| b.is_ascii_digit())
    }

    fn parse_number<T: FromStr, F: Fn(u8) -> bool>(&mut self, accept: F) -> Result<T, ParsingError> {
        let text = String::from_utf8_lossy(&self.take_while(accept)).into_owned();
        text.parse()
            .map_err(|_| ParsingError::invalid_number(self, text))
    }
}
