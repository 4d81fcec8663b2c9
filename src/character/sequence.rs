//! Nucleotide sequences: states plus their partials, and a named collection of them.

use crate::character::state::{
    get_partials_from_state, get_state_from_symbol, get_symbol_from_state, StateCode,
    MISSING_STATE, NUM_STATES,
};
use crate::error::Result;
use std::collections::HashMap;
use std::io::Write;

// =#========================================================================#=
// NUCLEOTIDE SEQUENCE
// =#========================================================================#=
/// A labelled row of character states with a parallel, flattened partials array.
///
/// # Invariant
/// `partials().len() == 4 * states().len()`; every append pushes the state and
/// its quadruple together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NucleotideSequence {
    label: String,
    states: Vec<StateCode>,
    partials: Vec<f64>,
}

impl NucleotideSequence {
    /// Creates an empty sequence.
    pub fn new(label: impl Into<String>) -> Self {
        NucleotideSequence {
            label: label.into(),
            states: Vec::new(),
            partials: Vec::new(),
        }
    }

    /// Creates an empty sequence with room for `num_sites` columns.
    pub fn with_capacity(label: impl Into<String>, num_sites: usize) -> Self {
        NucleotideSequence {
            label: label.into(),
            states: Vec::with_capacity(num_sites),
            partials: Vec::with_capacity(NUM_STATES * num_sites),
        }
    }

    /// Creates a sequence of `num_sites` missing states.
    pub fn missing(label: impl Into<String>, num_sites: usize) -> Self {
        let mut sequence = Self::with_capacity(label, num_sites);
        sequence.states.resize(num_sites, MISSING_STATE);
        sequence.partials.resize(NUM_STATES * num_sites, 1.0);
        sequence
    }

    /// Creates a sequence from a symbol string.
    ///
    /// # Errors
    /// [crate::Error::InvalidSymbol] on the first unrecognised symbol.
    pub fn from_symbols(label: impl Into<String>, symbols: &str) -> Result<Self> {
        let mut sequence = Self::with_capacity(label, symbols.len());
        sequence.append_states_by_symbols(symbols)?;
        Ok(sequence)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Returns the number of sites.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[StateCode] {
        &self.states
    }

    /// Returns the flattened partials, four per site.
    pub fn partials(&self) -> &[f64] {
        &self.partials
    }

    /// Reserves room for `additional` more sites.
    pub fn reserve(&mut self, additional: usize) {
        self.states.reserve(additional);
        self.partials.reserve(NUM_STATES * additional);
    }

    /// Appends one state together with its partials.
    ///
    /// # Errors
    /// [crate::Error::InvalidState] for an unknown code.
    pub fn append_state(&mut self, state: StateCode) -> Result<()> {
        let partials = get_partials_from_state(state)?;
        self.states.push(state);
        self.partials.extend_from_slice(partials);
        Ok(())
    }

    /// Appends the state denoted by `symbol`.
    ///
    /// # Errors
    /// [crate::Error::InvalidSymbol] for an unrecognised symbol.
    pub fn append_state_by_symbol(&mut self, symbol: char) -> Result<()> {
        self.append_state(get_state_from_symbol(symbol)?)
    }

    /// Appends all symbols of a string. Whitespace is skipped.
    ///
    /// Nothing is appended if any symbol is invalid.
    ///
    /// # Errors
    /// [crate::Error::InvalidSymbol] on the first unrecognised symbol.
    pub fn append_states_by_symbols(&mut self, symbols: &str) -> Result<()> {
        let states = symbols
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(get_state_from_symbol)
            .collect::<Result<Vec<_>>>()?;
        self.reserve(states.len());
        for state in states {
            self.append_state(state)?;
        }
        Ok(())
    }

    /// Removes all sites, keeping the label and allocation.
    pub fn clear(&mut self) {
        self.states.clear();
        self.partials.clear();
    }

    /// Renders the states as their canonical symbols.
    ///
    /// # Errors
    /// [crate::Error::InvalidState] if a stored state has no symbol.
    pub fn states_as_symbols(&self) -> Result<String> {
        self.states.iter().map(|&s| get_symbol_from_state(s)).collect()
    }

    /// Writes the states as their canonical symbols, without a trailing newline.
    pub fn write_states_as_symbols<W: Write>(&self, out: &mut W) -> Result<()> {
        let symbols = self.states_as_symbols()?;
        out.write_all(symbols.as_bytes())?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Slot helpers for fixed-size rows (crate)
    // ------------------------------------------------------------------------
    /// Copies `source` into the first `source.len()` columns and fills the
    /// remaining columns with the missing state. Row length is unchanged.
    pub(crate) fn overwrite_padded(&mut self, source: &NucleotideSequence) {
        let n = source.len();
        debug_assert!(n <= self.len());
        self.states[..n].copy_from_slice(&source.states);
        self.partials[..NUM_STATES * n].copy_from_slice(&source.partials);
        self.fill_missing_from(n);
    }

    /// Resets every column from `site` on to the missing state.
    pub(crate) fn fill_missing_from(&mut self, site: usize) {
        self.states[site..].fill(MISSING_STATE);
        self.partials[NUM_STATES * site..].fill(1.0);
    }
}

// =#========================================================================#=
// NUCLEOTIDE SEQUENCES
// =#========================================================================#=
/// Ordered, label-indexed collection of sequences as produced by the sequence readers.
#[derive(Debug, Clone, Default)]
pub struct NucleotideSequences {
    sequences: Vec<NucleotideSequence>,
    by_label: HashMap<String, usize>,
}

impl NucleotideSequences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sequence; a sequence with the same label is replaced in place.
    pub fn push(&mut self, sequence: NucleotideSequence) {
        match self.by_label.get(sequence.label()) {
            Some(&i) => self.sequences[i] = sequence,
            None => {
                self.by_label
                    .insert(sequence.label().to_string(), self.sequences.len());
                self.sequences.push(sequence);
            }
        }
    }

    /// Returns the sequence with the given label, creating an empty one if needed.
    pub fn get_or_insert(&mut self, label: &str) -> &mut NucleotideSequence {
        let i = match self.by_label.get(label) {
            Some(&i) => i,
            None => {
                self.push(NucleotideSequence::new(label));
                self.sequences.len() - 1
            }
        };
        &mut self.sequences[i]
    }

    pub fn get(&self, label: &str) -> Option<&NucleotideSequence> {
        self.by_label.get(label).map(|&i| &self.sequences[i])
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Returns the length of the longest sequence.
    pub fn num_sites(&self) -> usize {
        self.sequences.iter().map(NucleotideSequence::len).max().unwrap_or(0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NucleotideSequence> {
        self.sequences.iter()
    }
}

impl<'a> IntoIterator for &'a NucleotideSequences {
    type Item = &'a NucleotideSequence;
    type IntoIter = std::slice::Iter<'a, NucleotideSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

impl FromIterator<NucleotideSequence> for NucleotideSequences {
    fn from_iter<I: IntoIterator<Item = NucleotideSequence>>(iter: I) -> Self {
        let mut sequences = NucleotideSequences::new();
        for sequence in iter {
            sequences.push(sequence);
        }
        sequences
    }
}
