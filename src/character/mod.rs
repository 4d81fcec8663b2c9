//! Nucleotide character data: state tables, sequences, the alignment buffer and short reads.

pub mod alignment;
pub mod sequence;
pub mod short_read;
pub mod state;

pub use alignment::NucleotideAlignment;
pub use sequence::{NucleotideSequence, NucleotideSequences};
pub use short_read::{MismatchModel, ShortReadSequence, ShortReadSequences};
pub use state::{
    get_partials_from_state, get_state_from_symbol, get_symbol_from_state, StateCode,
    MISSING_STATE, NUM_STATES,
};
