//! NEXUS reading of gene trees and alignments, and output for cross-checking
//! likelihood scores with PAUP*.
//!
//! [parse_nexus_trees] and [parse_nexus_characters] read the TREES and
//! DATA/CHARACTERS blocks of a NEXUS file. [NexusWriter] writes the taxa,
//! the active alignment columns and the tree of a session, followed by PAUP
//! commands that score the tree under Jukes-Cantor with the given branch lengths.

mod defs;
mod reader;
mod writer;

pub use self::reader::{parse_nexus_characters, parse_nexus_trees};
pub use self::writer::NexusWriter;

use crate::character::NucleotideAlignment;
use crate::error::Result;
use crate::model::GeneTree;
use std::fs::File;
use std::path::Path;

/// Writes `tree` and `alignment` as a PAUP validation file at `path`.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_file<P: AsRef<Path>>(path: P, tree: &GeneTree, alignment: &NucleotideAlignment) -> Result<()> {
    let file = File::create(path)?;
    NexusWriter::new(file).write_phylogenetic_data(tree, alignment)
}
