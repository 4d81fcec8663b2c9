//! Contract of the numeric likelihood kernel driven by the [engine](crate::likelihood::engine).
//!
//! A kernel owns indexed buffers (tip data, partials, transition matrices, one
//! eigen-decomposition, frequencies, category weights and rates) and exposes
//! buffer population plus three computations: transition matrix updates, a
//! batch of pairwise peeling operations, and root log-likelihood integration.
//! Every call reports failure as a [KernelError].

use crate::character::StateCode;

/// Result alias for kernel calls.
pub type KernelResult<T> = std::result::Result<T, KernelError>;

/// Failure category reported by a kernel.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelErrorKind {
    #[error("index out of range")]
    OutOfRange,
    #[error("buffer used before being set")]
    UninitializedBuffer,
    #[error("buffer size mismatch")]
    SizeMismatch,
    #[error("could not allocate instance")]
    ResourceExhausted,
    #[error("numerical failure")]
    NumericalFailure,
    #[error("instance already finalized")]
    Finalized,
}

/// Non-zero status of a kernel call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{kind} ({detail})")]
pub struct KernelError {
    pub kind: KernelErrorKind,
    pub detail: String,
}

impl KernelError {
    pub fn new(kind: KernelErrorKind, detail: impl Into<String>) -> Self {
        KernelError {
            kind,
            detail: detail.into(),
        }
    }
}

/// Buffer counts and dimensions requested at instance creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Number of tip buffers; tips use buffer indices `0..tip_count`
    pub tip_count: usize,
    /// Number of partials buffers beyond the compact tip buffers
    pub partials_buffer_count: usize,
    /// Number of compact (state-coded) tip buffers
    pub compact_buffer_count: usize,
    pub state_count: usize,
    pub pattern_count: usize,
    pub eigen_buffer_count: usize,
    pub matrix_buffer_count: usize,
    pub category_count: usize,
    pub scale_buffer_count: usize,
}

impl KernelConfig {
    /// Sizes an instance for a gene tree of at most `max_tips` tips over `num_sites` sites
    /// under a 4-state, single-category model.
    ///
    /// Buffer and matrix indices then cover every node id of such a tree.
    pub fn for_gene_tree(max_tips: usize, num_sites: usize) -> Self {
        KernelConfig {
            tip_count: 2 * max_tips,
            partials_buffer_count: 2 * max_tips + 1,
            compact_buffer_count: 2 * max_tips,
            state_count: 4,
            pattern_count: num_sites,
            eigen_buffer_count: 1,
            matrix_buffer_count: 4 * max_tips + 1,
            category_count: 1,
            scale_buffer_count: 0,
        }
    }

    /// Total number of addressable buffers (tips and partials).
    pub fn buffer_count(&self) -> usize {
        self.partials_buffer_count + self.compact_buffer_count
    }
}

/// One peeling step: combine two child buffers through their transition
/// matrices into the destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeelOperation {
    pub destination: usize,
    pub child1: usize,
    pub child1_matrix: usize,
    pub child2: usize,
    pub child2_matrix: usize,
}

impl PeelOperation {
    /// Builds an operation where every matrix index equals its buffer index.
    pub fn new(destination: usize, child1: usize, child2: usize) -> Self {
        PeelOperation {
            destination,
            child1,
            child1_matrix: child1,
            child2,
            child2_matrix: child2,
        }
    }
}

/// Numeric back end for Felsenstein pruning.
///
/// Implementations are not required to be thread-safe; one instance serves one session.
pub trait LikelihoodKernel: Sized {
    /// Creates an instance with the requested buffers.
    fn create(config: &KernelConfig) -> KernelResult<Self>;

    /// Sets tip buffer `tip` from one state code per pattern.
    fn set_tip_states(&mut self, tip: usize, states: &[StateCode]) -> KernelResult<()>;

    /// Sets tip buffer `tip` from `state_count` partials per pattern.
    fn set_tip_partials(&mut self, tip: usize, partials: &[f64]) -> KernelResult<()>;

    fn set_pattern_weights(&mut self, weights: &[f64]) -> KernelResult<()>;

    fn set_state_frequencies(&mut self, index: usize, frequencies: &[f64]) -> KernelResult<()>;

    fn set_category_weights(&mut self, index: usize, weights: &[f64]) -> KernelResult<()>;

    fn set_category_rates(&mut self, rates: &[f64]) -> KernelResult<()>;

    /// Sets eigenvectors, inverse eigenvectors (both row-major `state_count`
    /// squared) and eigenvalues of the rate matrix at slot `index`.
    fn set_eigen_decomposition(
        &mut self,
        index: usize,
        eigenvectors: &[f64],
        inverse_eigenvectors: &[f64],
        eigenvalues: &[f64],
    ) -> KernelResult<()>;

    /// Recomputes the matrices at `matrix_indices` for the paired edge lengths.
    fn update_transition_matrices(
        &mut self,
        eigen_index: usize,
        matrix_indices: &[usize],
        edge_lengths: &[f64],
    ) -> KernelResult<()>;

    /// Executes peeling operations in the given order.
    fn update_partials(&mut self, operations: &[PeelOperation]) -> KernelResult<()>;

    /// Integrates buffer `root` over frequencies and category weights and
    /// returns the pattern-weighted sum of site log-likelihoods.
    fn calculate_root_log_likelihood(
        &mut self,
        root: usize,
        category_weights_index: usize,
        state_frequencies_index: usize,
    ) -> KernelResult<f64>;

    /// Releases the instance. Any later call fails.
    fn finalize(&mut self) -> KernelResult<()>;
}
