//! Sequence readers producing [NucleotideSequences].
//!
//! Format tags: `fasta`, `phylip` / `dnaphylip` / `rnaphylip` for relaxed
//! sequential PHYLIP, and `nexus` for the MATRIX of DATA/CHARACTERS blocks.
//! Labels are kept verbatim so they match tree tip labels.

mod fasta;
mod phylip;

pub use fasta::parse_fasta;
pub use phylip::parse_phylip;

use crate::character::NucleotideSequences;
use crate::error::{Error, Result};
use crate::parser::byte_parser::ByteParser;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Sequence input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    Phylip,
    Nexus,
}

impl FromStr for SequenceFormat {
    type Err = Error;

    /// Parses a format tag, case-insensitively.
    fn from_str(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "fasta" => Ok(SequenceFormat::Fasta),
            "phylip" | "dnaphylip" | "rnaphylip" => Ok(SequenceFormat::Phylip),
            "nexus" => Ok(SequenceFormat::Nexus),
            _ => Err(Error::UnsupportedFormat(tag.to_string())),
        }
    }
}

/// Reads all sequences from `reader` in the given format.
///
/// # Errors
/// [Error::UnsupportedFormat] for unknown tags, otherwise I/O, parsing and symbol errors.
pub fn read_sequences<R: Read>(reader: R, format: &str) -> Result<NucleotideSequences> {
    let format = format.parse::<SequenceFormat>()?;
    let mut parser = ByteParser::for_reader(reader)?;
    let sequences = match format {
        SequenceFormat::Fasta => parse_fasta(&mut parser)?,
        SequenceFormat::Phylip => parse_phylip(&mut parser)?,
        SequenceFormat::Nexus => crate::nexus::parse_nexus_characters(&mut parser)?,
    };
    log::debug!(
        "Read {} sequences of up to {} sites",
        sequences.len(),
        sequences.num_sites()
    );
    Ok(sequences)
}

/// Reads all sequences from the file at `path`.
pub fn read_sequences_from_path<P: AsRef<Path>>(path: P, format: &str) -> Result<NucleotideSequences> {
    read_sequences(File::open(path)?, format)
}
