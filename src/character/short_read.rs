//! Short reads and the sliding-window mismatch model scoring them against a longer sequence.
//!
//! A read of length `m` is slid over every offset of a reference of length
//! `n >= m`; at each of the `n - m + 1` offsets the positional mismatches are
//! counted and turned into a probability mass under a [MismatchModel]. The
//! masses are summed over all offsets. The sum is neither normalised nor
//! logged here; aggregation across reads and references is up to the caller.

use crate::character::sequence::{NucleotideSequence, NucleotideSequences};
use crate::character::state::StateCode;
use crate::error::{Error, Result};
use statrs::distribution::{Binomial, Discrete, Poisson};

/// Distribution of the mismatch count between a read and one reference window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MismatchModel {
    /// Binomial with the read length as trials and the mean error rate per site
    /// as success probability.
    #[default]
    Binomial,
    /// Poisson with mean `errors_per_site * read length`, independent of the
    /// error rate passed at scoring time.
    Poisson { errors_per_site: f64 },
}

enum MismatchPmf {
    Binomial(Binomial),
    Poisson(Poisson),
    /// Empty read: zero mismatches with certainty
    NoSites,
}

impl MismatchPmf {
    fn new(model: MismatchModel, read_len: usize, mean_errors_per_site: f64) -> Result<Self> {
        match model {
            MismatchModel::Binomial => Binomial::new(mean_errors_per_site, read_len as u64)
                .map(MismatchPmf::Binomial)
                .map_err(|_| Error::InvalidErrorRate(mean_errors_per_site)),
            MismatchModel::Poisson { errors_per_site } if read_len == 0 => {
                if errors_per_site.is_finite() && errors_per_site > 0.0 {
                    Ok(MismatchPmf::NoSites)
                } else {
                    Err(Error::InvalidErrorRate(errors_per_site))
                }
            }
            MismatchModel::Poisson { errors_per_site } => {
                Poisson::new(errors_per_site * read_len as f64)
                    .map(MismatchPmf::Poisson)
                    .map_err(|_| Error::InvalidErrorRate(errors_per_site))
            }
        }
    }

    fn pmf(&self, mismatches: usize) -> f64 {
        match self {
            MismatchPmf::Binomial(d) => d.pmf(mismatches as u64),
            MismatchPmf::Poisson(d) => d.pmf(mismatches as u64),
            MismatchPmf::NoSites => {
                if mismatches == 0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

// =#========================================================================#=
// HAMMING HELPERS
// =#========================================================================#=
/// Counts positions at which two equally long state slices differ.
///
/// # Panics
/// Panics if the slices differ in length.
pub fn hamming_distance(a: &[StateCode], b: &[StateCode]) -> usize {
    assert_eq!(a.len(), b.len(), "Hamming distance needs equal lengths");
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Sums the Hamming distance of `short` against every window of `long`.
///
/// This is the total over all `long.len() - short.len() + 1` offsets, not the
/// minimum over them.
///
/// # Panics
/// Panics if `short` is longer than `long`.
pub fn sliding_hamming_distance(short: &[StateCode], long: &[StateCode]) -> usize {
    assert!(
        short.len() <= long.len(),
        "Short sequence ({}) longer than long sequence ({})",
        short.len(),
        long.len()
    );
    (0..=long.len() - short.len())
        .map(|offset| hamming_distance(short, &long[offset..offset + short.len()]))
        .sum()
}

// =#========================================================================#=
// SHORT READ SEQUENCE
// =#========================================================================#=
/// Immutable snapshot of a sequence's states, without partials.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortReadSequence {
    label: String,
    states: Box<[StateCode]>,
}

impl ShortReadSequence {
    pub fn new(label: impl Into<String>, states: &[StateCode]) -> Self {
        ShortReadSequence {
            label: label.into(),
            states: states.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn states(&self) -> &[StateCode] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Sums the binomial mismatch probability of this read over every window of `long_read`.
    ///
    /// # Arguments
    /// * `long_read` - reference states, at least as long as this read
    /// * `mean_errors_per_site` - per-site error probability in `[0, 1]`
    ///
    /// # Errors
    /// - [Error::ReadLongerThanReference] if the reference is shorter than the read
    /// - [Error::InvalidErrorRate] if the rate is not a probability
    pub fn calc_probability_of_sequence(
        &self,
        long_read: &[StateCode],
        mean_errors_per_site: f64,
    ) -> Result<f64> {
        self.calc_probability_with_model(long_read, mean_errors_per_site, MismatchModel::Binomial)
    }

    /// Same as [ShortReadSequence::calc_probability_of_sequence] with an explicit mismatch model.
    pub fn calc_probability_with_model(
        &self,
        long_read: &[StateCode],
        mean_errors_per_site: f64,
        model: MismatchModel,
    ) -> Result<f64> {
        if self.len() > long_read.len() {
            return Err(Error::ReadLongerThanReference {
                read: self.len(),
                reference: long_read.len(),
            });
        }
        let pmf = MismatchPmf::new(model, self.len(), mean_errors_per_site)?;
        let num_offsets = long_read.len() - self.len() + 1;

        let probability = (0..num_offsets)
            .map(|offset| {
                let window = &long_read[offset..offset + self.len()];
                pmf.pmf(hamming_distance(&self.states, window))
            })
            .sum();
        Ok(probability)
    }
}

impl From<&NucleotideSequence> for ShortReadSequence {
    fn from(sequence: &NucleotideSequence) -> Self {
        ShortReadSequence::new(sequence.label(), sequence.states())
    }
}

/// Collection of short reads, owned independently of their source sequences.
#[derive(Debug, Clone, Default)]
pub struct ShortReadSequences {
    reads: Vec<ShortReadSequence>,
}

impl ShortReadSequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, read: ShortReadSequence) {
        self.reads.push(read);
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    pub fn clear(&mut self) {
        self.reads.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShortReadSequence> {
        self.reads.iter()
    }
}

impl From<&NucleotideSequences> for ShortReadSequences {
    fn from(sequences: &NucleotideSequences) -> Self {
        ShortReadSequences {
            reads: sequences.iter().map(ShortReadSequence::from).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ShortReadSequences {
    type Item = &'a ShortReadSequence;
    type IntoIter = std::slice::Iter<'a, ShortReadSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.reads.iter()
    }
}
