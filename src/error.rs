//! Crate-wide error type.
//!
//! Every failure the core can report is a violated invariant or an exceeded
//! fixed capacity: the inputs reaching this layer are assumed to be
//! structurally valid. Callers that want fail-fast behaviour can route any
//! [Error] through [fatal].

use crate::character::StateCode;
use crate::likelihood::kernel::KernelError;
use crate::parser::ParsingError;
use std::io;

/// Errors raised by the tree, character, likelihood and session layers.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid state symbol '{0}'")]
    InvalidSymbol(char),
    #[error("invalid state code {0}")]
    InvalidState(StateCode),
    #[error("node reserves exhausted (capacity {capacity})")]
    ArenaExhausted { capacity: usize },
    #[error("maximum number of sequences exceeded (max {max})")]
    TooManySequences { max: usize },
    #[error("sequence of length {len} exceeds maximum number of sites {max}")]
    SequenceTooLong { len: usize, max: usize },
    #[error("node {0} already has a sequence bound to it")]
    NodeAlreadyBound(usize),
    #[error("node {0} has no sequence bound to it")]
    NodeNotBound(usize),
    #[error("no sequence for taxon '{0}'")]
    MissingSequence(String),
    #[error("tree has node '{label}' with {children} children (expected 0 or 2)")]
    InvalidTreeArity { label: String, children: usize },
    #[error("no trees found in data source")]
    EmptyTreeSource,
    #[error("multiple trees found in data source ({0})")]
    MultipleTrees(usize),
    #[error("no gene tree has been set")]
    NoGeneTree,
    #[error("likelihood kernel failed during {operation}: {source}")]
    Kernel {
        operation: &'static str,
        #[source]
        source: KernelError,
    },
    #[error("cannot {operation} while likelihood engine is {state}")]
    InvalidEngineState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("short read of length {read} is longer than reference of length {reference}")]
    ReadLongerThanReference { read: usize, reference: usize },
    #[error("invalid per-site error rate {0}")]
    InvalidErrorRate(f64),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps a kernel status with the name of the operation that produced it.
    pub(crate) fn kernel(operation: &'static str, source: KernelError) -> Self {
        Error::Kernel { operation, source }
    }
}

/// Terminates on an unrecoverable error.
///
/// Logs the error and panics. There is no continuation past a violated
/// invariant; this is the boundary for code that prefers the abort
/// semantics over propagating [Result]s.
#[track_caller]
pub fn fatal(err: Error) -> ! {
    let location = std::panic::Location::caller();
    log::error!("{} ({}:{})", err, location.file(), location.line());
    panic!("treeshrew: {err}");
}
