//! Treeshrew scores rooted binary gene trees against nucleotide alignments
//! under the Jukes-Cantor model, and short sequencing reads against the
//! sequences at the tips.
//!
//! Core functionality provided:
//! - Tree model: arena-backed [GeneTree] with preorder, postorder, leaf and
//!   children iterators. Nodes are addressed by index, never by reference.
//!   See [crate::model] for details.
//! - Characters: IUPAC nucleotide state tables, growable sequences and a
//!   fixed-capacity [NucleotideAlignment] whose rows are bound to tree nodes.
//! - Likelihood: a [LikelihoodEngine] that turns a postorder traversal into
//!   transition-matrix updates and peeling operations for a
//!   [LikelihoodKernel](likelihood::LikelihoodKernel). [CpuKernel](likelihood::CpuKernel)
//!   is the built-in kernel.
//! - Short reads: sliding-window mismatch probabilities (binomial or Poisson).
//! - Formats: Newick trees, FASTA and relaxed PHYLIP sequences, NEXUS output
//!   for cross-checking scores with PAUP*.
//!
//! Limitations:
//! - Only strictly bifurcating trees (every node has 0 or 2 children)
//! - Only the Jukes-Cantor model with a single rate category
//! - Capacities (tips, sequences, sites) are fixed when a session is created
//!
//! # Usage patterns
//! 1. [StateSpace] bundles a tree, its alignment and an engine into one
//!    scoring session and is the usual entry point.
//! 2. The building blocks can be used directly for custom drivers, e.g.
//!    repeated rescoring after [GeneTree::set_edge_length].
//!
//! ## Example
//! ```
//! use treeshrew::StateSpace;
//!
//! let tree = "((A:0.1,B:0.2):0.05,(C:0.1,D:0.1):0.05);";
//! let fasta = ">A\nACGT\n>B\nACGA\n>C\nACTT\n>D\nTCTT\n";
//!
//! let mut state_space = StateSpace::new(4, 16);
//! state_space
//!     .initialize_with_tree_and_alignment(tree.as_bytes(), fasta.as_bytes(), "newick", "fasta")?;
//! let ln_l = state_space.calc_ln_probability()?;
//! assert!(ln_l.is_finite() && ln_l < 0.0);
//! # Ok::<(), treeshrew::Error>(())
//! ```

pub mod character;
pub mod error;
pub mod likelihood;
pub mod model;
pub mod newick;
pub mod nexus;
pub mod parser;
pub mod seqio;
pub mod state_space;

pub use crate::character::{NucleotideAlignment, NucleotideSequence, NucleotideSequences};
pub use crate::error::{Error, Result};
pub use crate::likelihood::LikelihoodEngine;
pub use crate::model::GeneTree;
pub use crate::state_space::{StateSpace, StateSpaceBuilder};

use std::fs::File;
use std::path::Path;

// ============================================================================
// Quick API
// ============================================================================
/// Parses a single Newick string into a [GeneTree] sized to its own tips.
///
/// See [`newick::parse_str`] for full documentation.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<GeneTree> {
    newick::parse_str(newick)
}

/// Scores the single Newick tree in `tree_path` against the alignment in
/// `alignment_path` with default session capacities.
///
/// # Arguments
/// * `tree_path` - file holding exactly one Newick tree
/// * `alignment_path` - sequence file whose labels match the tree's tips
/// * `alignment_format` - `fasta`, `phylip`, `dnaphylip`, `rnaphylip` or `nexus`
///
/// # Errors
/// Any error of [StateSpace::initialize_with_tree_and_alignment] or
/// [StateSpace::calc_ln_probability].
pub fn score_files<P: AsRef<Path>, Q: AsRef<Path>>(
    tree_path: P,
    alignment_path: Q,
    alignment_format: &str,
) -> Result<f64> {
    let mut state_space = StateSpace::new(
        state_space::DEFAULT_MAX_SEQUENCES,
        state_space::DEFAULT_MAX_SITES,
    );
    state_space.initialize_with_tree_and_alignment(
        File::open(tree_path)?,
        File::open(alignment_path)?,
        "newick",
        alignment_format,
    )?;
    state_space.calc_ln_probability()
}
