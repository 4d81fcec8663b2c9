//! Low-level text parsing shared by the tree and sequence readers.
//!
//! This module provides a byte-level parser over in-memory input, a
//! position-carrying error type, and label escaping for the writers.

pub mod byte_parser;
pub mod byte_source;
pub mod parsing_error;
pub mod utils;

pub use parsing_error::{ParsingError, ParsingErrorType};
