//! Newick reading and writing for gene trees; NEXUS tree input is delegated to [crate::nexus].
//!
//! This module provides:
//! - [NewickParser] - reads one or more Newick strings into [GeneTree]s
//! - [to_newick] / [write_newick] - rooted Newick output with `label:length` on every node
//! - [TreeFormat] - the tree format tag accepted by the session
//!
//! # Quick API
//! - [`parse_str`] - parses a single Newick string
//! - [`read_trees`] - parses every tree from a reader, given a format tag

mod defs;
mod parser;
mod writer;

pub use self::parser::NewickParser;
pub use self::writer::{to_newick, write_newick};

use crate::error::{Error, Result};
use crate::model::GeneTree;
use crate::parser::byte_parser::ByteParser;
use std::io::Read;
use std::str::FromStr;

/// Tree input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    Newick,
    Nexus,
}

impl FromStr for TreeFormat {
    type Err = Error;

    /// Parses a format tag, case-insensitively.
    fn from_str(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "newick" => Ok(TreeFormat::Newick),
            "nexus" => Ok(TreeFormat::Nexus),
            _ => Err(Error::UnsupportedFormat(tag.to_string())),
        }
    }
}

// ============================================================================
// QUICK PARSING API (public)
// ============================================================================
/// Parses a single Newick string, sizing the tree from its own tip count.
///
/// # Errors
/// Parsing and tree arity errors, see [NewickParser].
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<GeneTree> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new().parse_tree(&mut byte_parser)
}

/// Reads every tree from `reader` in the given format.
///
/// # Arguments
/// * `reader` - source of the tree text
/// * `format` - format tag, `"newick"` or `"nexus"`
/// * `max_tips` - tip capacity of every tree; inferred per tree if `None`
///
/// # Errors
/// [Error::UnsupportedFormat] for unknown tags, otherwise I/O, parsing and arity errors.
pub fn read_trees<R: Read>(reader: R, format: &str, max_tips: Option<usize>) -> Result<Vec<GeneTree>> {
    let format = format.parse::<TreeFormat>()?;
    let mut byte_parser = ByteParser::for_reader(reader)?;
    match format {
        TreeFormat::Nexus => crate::nexus::parse_nexus_trees(&mut byte_parser, max_tips),
        TreeFormat::Newick => {
            let mut parser = NewickParser::new();
            if let Some(max_tips) = max_tips {
                parser = parser.with_max_tips(max_tips);
            }
            parser.parse_all(byte_parser)
        }
    }
}
