//! Jukes-Cantor substitution model.
//!
//! Rate matrix normalised to one expected substitution per site per unit
//! edge length. The eigen-decomposition is given row-major in the layout the
//! kernel expects: `P(t) = E * diag(exp(lambda * t)) * E^-1`.

use crate::character::NUM_STATES;

/// Equilibrium frequencies of A, C, G, T.
pub const JC_FREQUENCIES: [f64; NUM_STATES] = [0.25; NUM_STATES];

/// Right eigenvectors, one per column.
#[rustfmt::skip]
pub const JC_EIGENVECTORS: [f64; NUM_STATES * NUM_STATES] = [
    1.0,  2.0,  0.0,  0.5,
    1.0, -2.0,  0.5,  0.0,
    1.0,  2.0,  0.0, -0.5,
    1.0, -2.0, -0.5,  0.0,
];

/// Inverse of [JC_EIGENVECTORS].
#[rustfmt::skip]
pub const JC_INVERSE_EIGENVECTORS: [f64; NUM_STATES * NUM_STATES] = [
    0.25,   0.25,  0.25,   0.25,
    0.125, -0.125, 0.125, -0.125,
    0.0,    1.0,   0.0,   -1.0,
    1.0,    0.0,  -1.0,    0.0,
];

pub const JC_EIGENVALUES: [f64; NUM_STATES] = [0.0, -4.0 / 3.0, -4.0 / 3.0, -4.0 / 3.0];

/// Closed-form JC transition probability over an edge of length `t`.
///
/// # Arguments
/// * `same_state` - whether start and end state coincide
/// * `t` - edge length in expected substitutions per site
pub fn jc_transition_probability(same_state: bool, t: f64) -> f64 {
    let decay = (-4.0 * t / 3.0).exp();
    if same_state {
        0.25 + 0.75 * decay
    } else {
        0.25 - 0.25 * decay
    }
}
