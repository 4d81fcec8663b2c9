//! Likelihood engine: drives a [LikelihoodKernel] over a [GeneTree].
//!
//! Lifecycle:
//! `Uninitialized --create_instance--> Ready --set_tip_*--> TipsLoaded
//! --calc_ln_probability--> Scored --dispose--> Disposed`.
//! Scoring may be repeated after changing edge lengths without reloading tips.

use crate::character::{NucleotideAlignment, StateCode};
use crate::error::{Error, Result};
use crate::likelihood::cpu::CpuKernel;
use crate::likelihood::kernel::{KernelConfig, LikelihoodKernel, PeelOperation};
use crate::likelihood::model::{
    JC_EIGENVALUES, JC_EIGENVECTORS, JC_FREQUENCIES, JC_INVERSE_EIGENVECTORS,
};
use crate::model::GeneTree;

const EIGEN_INDEX: usize = 0;
const CATEGORY_WEIGHTS_INDEX: usize = 0;
const FREQUENCIES_INDEX: usize = 0;

/// Engine options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Recompute only dirty edges and re-peel only dirty internal nodes
    pub incremental: bool,
    /// Load tips as partials (ambiguity-aware) rather than compact states
    pub use_tip_partials: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            incremental: false,
            use_tip_partials: true,
        }
    }
}

/// Lifecycle state of a [LikelihoodEngine].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
    TipsLoaded,
    Scored,
    Disposed,
}

impl EngineState {
    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Ready => "ready",
            EngineState::TipsLoaded => "tips-loaded",
            EngineState::Scored => "scored",
            EngineState::Disposed => "disposed",
        }
    }
}

/// Computes gene tree log-likelihoods under Jukes-Cantor through a kernel `K`.
#[derive(Debug)]
pub struct LikelihoodEngine<K = CpuKernel> {
    config: EngineConfig,
    max_tips: usize,
    num_sites: usize,
    kernel: Option<K>,
    state: EngineState,
    /// Tip data changed since the last score; forces a full pass
    tips_changed: bool,
    matrix_indices: Vec<usize>,
    edge_lengths: Vec<f64>,
    operations: Vec<PeelOperation>,
}

impl<K: LikelihoodKernel> LikelihoodEngine<K> {
    /// Creates an engine for gene trees of at most `max_tips` tips.
    pub fn new(max_tips: usize, config: EngineConfig) -> Self {
        LikelihoodEngine {
            config,
            max_tips,
            num_sites: 0,
            kernel: None,
            state: EngineState::Uninitialized,
            tips_changed: true,
            matrix_indices: Vec::new(),
            edge_lengths: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    /// Returns the kernel, once created and until disposed.
    pub fn kernel(&self) -> Option<&K> {
        self.kernel.as_ref()
    }

    fn require(&self, operation: &'static str, allowed: &[EngineState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidEngineState {
                operation,
                state: self.state.name(),
            })
        }
    }

    fn kernel_mut(&mut self, operation: &'static str) -> Result<&mut K> {
        let state = self.state.name();
        self.kernel
            .as_mut()
            .ok_or(Error::InvalidEngineState { operation, state })
    }

    /// Creates the kernel instance for `num_sites` sites and loads the Jukes-Cantor model.
    ///
    /// # Errors
    /// [Error::InvalidEngineState] unless uninitialized; [Error::Kernel] if the kernel refuses.
    pub fn create_instance(&mut self, num_sites: usize) -> Result<()> {
        self.require("create instance", &[EngineState::Uninitialized])?;

        let config = KernelConfig::for_gene_tree(self.max_tips, num_sites);
        let mut kernel = K::create(&config).map_err(|e| Error::kernel("create", e))?;

        kernel
            .set_pattern_weights(&vec![1.0; num_sites])
            .map_err(|e| Error::kernel("set pattern weights", e))?;
        kernel
            .set_state_frequencies(FREQUENCIES_INDEX, &JC_FREQUENCIES)
            .map_err(|e| Error::kernel("set state frequencies", e))?;
        kernel
            .set_category_weights(CATEGORY_WEIGHTS_INDEX, &[1.0])
            .map_err(|e| Error::kernel("set category weights", e))?;
        kernel
            .set_category_rates(&[1.0])
            .map_err(|e| Error::kernel("set category rates", e))?;
        kernel
            .set_eigen_decomposition(
                EIGEN_INDEX,
                &JC_EIGENVECTORS,
                &JC_INVERSE_EIGENVECTORS,
                &JC_EIGENVALUES,
            )
            .map_err(|e| Error::kernel("set eigen decomposition", e))?;

        log::debug!(
            "Likelihood instance created for {} tips over {} sites",
            self.max_tips,
            num_sites
        );
        self.kernel = Some(kernel);
        self.num_sites = num_sites;
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Loads compact states into the tip buffer `index`.
    pub fn set_tip_states(&mut self, index: usize, states: &[StateCode]) -> Result<()> {
        const OP: &str = "set tip states";
        self.require(OP, &[EngineState::Ready, EngineState::TipsLoaded, EngineState::Scored])?;
        self.kernel_mut(OP)?
            .set_tip_states(index, states)
            .map_err(|e| Error::kernel(OP, e))?;
        self.tips_loaded();
        Ok(())
    }

    /// Loads partials into the tip buffer `index`.
    pub fn set_tip_partials(&mut self, index: usize, partials: &[f64]) -> Result<()> {
        const OP: &str = "set tip partials";
        self.require(OP, &[EngineState::Ready, EngineState::TipsLoaded, EngineState::Scored])?;
        self.kernel_mut(OP)?
            .set_tip_partials(index, partials)
            .map_err(|e| Error::kernel(OP, e))?;
        self.tips_loaded();
        Ok(())
    }

    fn tips_loaded(&mut self) {
        self.tips_changed = true;
        self.state = EngineState::TipsLoaded;
    }

    /// Loads the bound row of every leaf of `tree` into its tip buffer.
    ///
    /// Uses partials or compact states according to [EngineConfig::use_tip_partials].
    ///
    /// # Errors
    /// [Error::NodeNotBound] if a leaf has no row in `alignment`.
    pub fn set_tip_data(&mut self, tree: &GeneTree, alignment: &NucleotideAlignment) -> Result<()> {
        for leaf in tree.leaf_iter(tree.head()) {
            let index = leaf.data().index();
            if self.config.use_tip_partials {
                let partials = alignment
                    .active_partials(leaf.id())
                    .ok_or(Error::NodeNotBound(leaf.id()))?;
                self.set_tip_partials(index, partials)?;
            } else {
                let states = alignment
                    .active_states(leaf.id())
                    .ok_or(Error::NodeNotBound(leaf.id()))?;
                self.set_tip_states(index, states)?;
            }
        }
        Ok(())
    }

    /// Scores `tree` and returns its natural-log likelihood.
    ///
    /// 1. one batched transition-matrix update over all (or all dirty) nodes, in post-order
    /// 2. one peeling operation per (dirty) internal node, in post-order
    /// 3. root integration over the uniform frequencies and the single category
    ///
    /// Dirty flags are cleared after a successful score in incremental mode.
    ///
    /// # Errors
    /// - [Error::InvalidEngineState] unless tips are loaded
    /// - [Error::InvalidTreeArity] for an internal node without exactly two children
    /// - [Error::Kernel] on any kernel failure
    pub fn calc_ln_probability(&mut self, tree: &mut GeneTree) -> Result<f64> {
        const OP: &str = "calculate log-likelihood";
        self.require(OP, &[EngineState::TipsLoaded, EngineState::Scored])?;
        let full = !self.config.incremental || self.tips_changed;

        self.matrix_indices.clear();
        self.edge_lengths.clear();
        self.operations.clear();
        for node in tree.postorder_iter() {
            let data = node.data();
            if !(full || data.is_dirty()) {
                continue;
            }
            self.matrix_indices.push(data.index());
            self.edge_lengths.push(data.edge_length());

            if node.is_internal() {
                let mut children = tree.children_iter(node.id());
                match (children.next(), children.next(), children.next()) {
                    (Some(first), Some(second), None) => self.operations.push(PeelOperation::new(
                        data.index(),
                        first.data().index(),
                        second.data().index(),
                    )),
                    _ => {
                        return Err(Error::InvalidTreeArity {
                            label: data.label().to_string(),
                            children: tree.num_children(node.id()),
                        });
                    }
                }
            }
        }
        let root = tree.data(tree.head()).index();
        log::debug!(
            "Scoring: {} matrices, {} peel operations",
            self.matrix_indices.len(),
            self.operations.len()
        );

        let kernel = self
            .kernel
            .as_mut()
            .ok_or(Error::InvalidEngineState { operation: OP, state: "without kernel" })?;
        kernel
            .update_transition_matrices(EIGEN_INDEX, &self.matrix_indices, &self.edge_lengths)
            .map_err(|e| Error::kernel("update transition matrices", e))?;
        kernel
            .update_partials(&self.operations)
            .map_err(|e| Error::kernel("update partials", e))?;
        let ln_probability = kernel
            .calculate_root_log_likelihood(root, CATEGORY_WEIGHTS_INDEX, FREQUENCIES_INDEX)
            .map_err(|e| Error::kernel("calculate root log-likelihood", e))?;

        if self.config.incremental {
            tree.clear_dirty();
        }
        self.tips_changed = false;
        self.state = EngineState::Scored;
        Ok(ln_probability)
    }

    /// Releases the kernel instance. The engine cannot be used afterwards.
    pub fn dispose(&mut self) -> Result<()> {
        if self.state == EngineState::Disposed {
            return Err(Error::InvalidEngineState {
                operation: "dispose",
                state: self.state.name(),
            });
        }
        if let Some(mut kernel) = self.kernel.take() {
            kernel.finalize().map_err(|e| Error::kernel("finalize", e))?;
        }
        self.state = EngineState::Disposed;
        Ok(())
    }
}
