//! Scoring session owning one gene tree, its alignment and a likelihood engine.

use crate::character::{
    MismatchModel, NucleotideAlignment, ShortReadSequence, ShortReadSequences,
};
use crate::error::{Error, Result};
use crate::likelihood::{EngineConfig, LikelihoodEngine};
use crate::model::{GeneTree, NodeId};
use crate::newick::read_trees;
use crate::nexus::NexusWriter;
use crate::seqio::read_sequences;
use std::io::{Read, Write};

/// Default number of alignment rows
pub const DEFAULT_MAX_SEQUENCES: usize = 100;

/// Default number of alignment columns
pub const DEFAULT_MAX_SITES: usize = 50_000;

// =#========================================================================#=
// STATE SPACE BUILDER
// =#========================================================================#=
/// Builder for a [StateSpace].
///
/// # Example
/// ```
/// use treeshrew::StateSpaceBuilder;
///
/// let state_space = StateSpaceBuilder::new()
///     .with_max_sequences(8)
///     .with_max_sites(1_000)
///     .with_incremental_rescoring(true)
///     .build();
/// assert_eq!(state_space.alignment().max_sequences(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct StateSpaceBuilder {
    max_sequences: usize,
    max_sites: usize,
    engine_config: EngineConfig,
    mismatch_model: MismatchModel,
}

impl StateSpaceBuilder {
    pub fn new() -> Self {
        StateSpaceBuilder {
            max_sequences: DEFAULT_MAX_SEQUENCES,
            max_sites: DEFAULT_MAX_SITES,
            engine_config: EngineConfig::default(),
            mismatch_model: MismatchModel::default(),
        }
    }

    /// Sets the number of alignment rows, which is also the tip capacity of the gene tree.
    pub fn with_max_sequences(mut self, max_sequences: usize) -> Self {
        self.max_sequences = max_sequences;
        self
    }

    pub fn with_max_sites(mut self, max_sites: usize) -> Self {
        self.max_sites = max_sites;
        self
    }

    /// Recompute only edges and subtrees changed since the last score.
    pub fn with_incremental_rescoring(mut self, incremental: bool) -> Self {
        self.engine_config.incremental = incremental;
        self
    }

    /// Load tips as compact states instead of partials. Ambiguity codes then count as missing.
    pub fn with_compact_tip_states(mut self) -> Self {
        self.engine_config.use_tip_partials = false;
        self
    }

    pub fn with_mismatch_model(mut self, model: MismatchModel) -> Self {
        self.mismatch_model = model;
        self
    }

    pub fn build(self) -> StateSpace {
        StateSpace {
            max_sequences: self.max_sequences,
            alignment: NucleotideAlignment::new(self.max_sequences, self.max_sites),
            gene_tree: None,
            engine: None,
            engine_config: self.engine_config,
            short_reads: ShortReadSequences::new(),
            mismatch_model: self.mismatch_model,
        }
    }
}

impl Default for StateSpaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =#========================================================================#=
// STATE SPACE
// =#========================================================================#=
/// One scoring session: a gene tree, the alignment rows bound to its leaves,
/// the likelihood engine scoring it and a set of short reads.
///
/// Everything is owned exclusively by the session; independent sessions share nothing.
#[derive(Debug)]
pub struct StateSpace {
    max_sequences: usize,
    alignment: NucleotideAlignment,
    gene_tree: Option<GeneTree>,
    engine: Option<LikelihoodEngine>,
    engine_config: EngineConfig,
    short_reads: ShortReadSequences,
    mismatch_model: MismatchModel,
}

impl StateSpace {
    /// Creates a session with the default engine configuration and mismatch model.
    pub fn new(max_sequences: usize, max_sites: usize) -> Self {
        StateSpaceBuilder::new()
            .with_max_sequences(max_sequences)
            .with_max_sites(max_sites)
            .build()
    }

    /// Reads exactly one gene tree and an alignment, binds every leaf to the
    /// sequence with the same label and loads the tips into a fresh engine.
    ///
    /// Any previous tree, bindings and engine are discarded first.
    ///
    /// # Errors
    /// - [Error::EmptyTreeSource] / [Error::MultipleTrees] unless the source holds one tree
    /// - [Error::MissingSequence] if a leaf label has no sequence
    /// - [Error::SequenceTooLong] / [Error::TooManySequences] on capacity violations
    /// - parsing, format and kernel errors
    pub fn initialize_with_tree_and_alignment<T: Read, A: Read>(
        &mut self,
        tree_src: T,
        alignment_src: A,
        tree_format: &str,
        alignment_format: &str,
    ) -> Result<()> {
        self.dispose_gene_tree()?;
        self.dispose_alignment();

        let mut trees = read_trees(tree_src, tree_format, Some(self.max_sequences))?;
        let tree = match trees.len() {
            0 => return Err(Error::EmptyTreeSource),
            1 => trees.remove(0),
            n => return Err(Error::MultipleTrees(n)),
        };

        let sequences = read_sequences(alignment_src, alignment_format)?;
        self.alignment.set_num_active_sites(sequences.num_sites())?;
        for leaf in tree.leaf_iter(tree.head()) {
            let label = leaf.data().label();
            let source = sequences
                .get(label)
                .ok_or_else(|| Error::MissingSequence(label.to_string()))?;
            self.alignment.new_sequence(leaf.id(), label, Some(source))?;
        }

        let mut engine = LikelihoodEngine::new(tree.max_tips(), self.engine_config);
        engine.create_instance(self.alignment.num_active_sites())?;
        engine.set_tip_data(&tree, &self.alignment)?;

        log::info!(
            "Session initialized: {} tips, {} sites",
            tree.num_leaves(),
            self.alignment.num_active_sites()
        );
        self.gene_tree = Some(tree);
        self.engine = Some(engine);
        Ok(())
    }

    /// Reads short reads from `src`, appending them to those already loaded.
    ///
    /// # Returns
    /// The number of reads read.
    pub fn load_short_reads<R: Read>(&mut self, src: R, format: &str) -> Result<usize> {
        let sequences = read_sequences(src, format)?;
        for sequence in &sequences {
            self.short_reads.push(ShortReadSequence::from(sequence));
        }
        log::info!("Loaded {} short reads", sequences.len());
        Ok(sequences.len())
    }

    /// Returns the natural-log likelihood of the gene tree given the alignment.
    ///
    /// # Errors
    /// [Error::NoGeneTree] before initialization, otherwise see [LikelihoodEngine::calc_ln_probability].
    pub fn calc_ln_probability(&mut self) -> Result<f64> {
        let (Some(tree), Some(engine)) = (self.gene_tree.as_mut(), self.engine.as_mut()) else {
            return Err(Error::NoGeneTree);
        };
        engine.calc_ln_probability(tree)
    }

    /// Scores the loaded short reads against the sequences bound to the leaves.
    ///
    /// For each read, the mismatch probabilities against every leaf sequence are
    /// summed and the log of that sum is added to the total. Every leaf is an
    /// equally weighted candidate origin of every read.
    ///
    /// # Errors
    /// - [Error::NoGeneTree] before initialization
    /// - [Error::ReadLongerThanReference] if a read exceeds the active alignment width
    /// - [Error::InvalidErrorRate] for a rate the mismatch model rejects
    pub fn calc_ln_probability_of_short_reads(&self, mean_errors_per_site: f64) -> Result<f64> {
        let tree = self.gene_tree.as_ref().ok_or(Error::NoGeneTree)?;

        let mut ln_probability = 0.0;
        for read in &self.short_reads {
            let mut probability = 0.0;
            for leaf in tree.leaf_iter(tree.head()) {
                let reference = self
                    .alignment
                    .active_states(leaf.id())
                    .ok_or(Error::NodeNotBound(leaf.id()))?;
                probability += read.calc_probability_with_model(
                    reference,
                    mean_errors_per_site,
                    self.mismatch_model,
                )?;
            }
            ln_probability += probability.ln();
        }
        Ok(ln_probability)
    }

    /// Sets the edge length of `node`, marking it and its ancestors dirty.
    ///
    /// # Errors
    /// [Error::NoGeneTree] before initialization.
    pub fn set_edge_length(&mut self, node: NodeId, edge_length: f64) -> Result<()> {
        let tree = self.gene_tree.as_mut().ok_or(Error::NoGeneTree)?;
        tree.set_edge_length(node, edge_length);
        Ok(())
    }

    /// Writes the tree and alignment as a NEXUS file that PAUP* can score.
    ///
    /// # Errors
    /// [Error::NoGeneTree] before initialization; I/O errors.
    pub fn write_phylogenetic_data<W: Write>(&self, out: W) -> Result<()> {
        let tree = self.gene_tree.as_ref().ok_or(Error::NoGeneTree)?;
        NexusWriter::new(out).write_phylogenetic_data(tree, &self.alignment)
    }

    /// Releases the gene tree, its row bindings and the likelihood engine.
    ///
    /// Does nothing if no tree is set.
    pub fn dispose_gene_tree(&mut self) -> Result<()> {
        if let Some(mut engine) = self.engine.take() {
            engine.dispose()?;
        }
        if let Some(mut tree) = self.gene_tree.take() {
            for leaf in tree.leaf_iter(tree.head()) {
                if self.alignment.slot_of(leaf.id()).is_some() {
                    self.alignment.release_sequence(leaf.id())?;
                }
            }
            tree.clear();
            log::debug!("Gene tree disposed");
        }
        Ok(())
    }

    /// Releases every alignment row.
    pub fn dispose_alignment(&mut self) {
        self.alignment.clear();
    }

    pub fn gene_tree(&self) -> Option<&GeneTree> {
        self.gene_tree.as_ref()
    }

    pub fn alignment(&self) -> &NucleotideAlignment {
        &self.alignment
    }

    pub fn short_reads(&self) -> &ShortReadSequences {
        &self.short_reads
    }

    pub fn engine(&self) -> Option<&LikelihoodEngine> {
        self.engine.as_ref()
    }
}
