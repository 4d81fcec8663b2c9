//! Located syntax errors of the Newick, FASTA and PHYLIP readers.

use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::{ByteSource, TextLocation};
use std::fmt;

/// Number of upcoming input bytes quoted in an error message.
const SNIPPET_LEN: usize = 40;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParsingErrorType {
    #[error("unexpected end of input")]
    UnexpectedEOF,
    #[error("comment opened with '[' is never closed")]
    UnclosedComment,
    #[error("{0:?} is not a number")]
    InvalidNumber(String),
    #[error("malformed Newick tree: {0}")]
    InvalidNewickString(String),
    #[error("malformed FASTA: {0}")]
    InvalidFasta(String),
    #[error("malformed PHYLIP: {0}")]
    InvalidPhylip(String),
    #[error("malformed NEXUS: {0}")]
    InvalidNexus(String),
}

/// A [ParsingErrorType] together with where it happened and a snippet of the
/// input that follows.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    location: TextLocation,
    snippet: String,
}

impl ParsingError {
    /// Captures the parser's current position for `kind`.
    pub fn from_parser<S: ByteSource>(kind: ParsingErrorType, parser: &ByteParser<S>) -> Self {
        ParsingError {
            kind,
            position: parser.position(),
            location: parser.location(),
            snippet: parser.get_context_as_string(SNIPPET_LEN),
        }
    }

    pub fn unexpected_eof<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::UnexpectedEOF, parser)
    }

    pub fn unclosed_comment<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorType::UnclosedComment, parser)
    }

    pub fn invalid_number<S: ByteSource>(parser: &ByteParser<S>, text: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNumber(text), parser)
    }

    pub fn invalid_newick_string<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNewickString(msg), parser)
    }

    pub fn invalid_fasta<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidFasta(msg), parser)
    }

    pub fn invalid_phylip<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidPhylip(msg), parser)
    }

    pub fn invalid_nexus<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorType::InvalidNexus(msg), parser)
    }

    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Byte offset into the input.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn location(&self) -> TextLocation {
        self.location
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.location)?;
        match self.snippet.lines().next() {
            Some(line) if !line.trim().is_empty() => write!(f, " near {:?}", line.trim_end()),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for ParsingError {}
