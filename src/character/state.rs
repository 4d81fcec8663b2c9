//! Nucleotide state tables.
//!
//! Symbols map onto a closed set of 15 state codes: the four bases (0-3),
//! a single missing/gap code (4) and the ten two- and three-base IUPAC
//! ambiguity codes (5-14). Each code has a canonical display symbol and a
//! partials quadruple over `{A, C, G, T}`.

use crate::error::{Error, Result};

/// Integer code of a nucleotide character state.
pub type StateCode = u8;

/// Number of unambiguous states (A, C, G, T).
pub const NUM_STATES: usize = 4;

/// Code shared by gaps, unknowns and full ambiguity (`-`, `?`, `N`, `X`).
pub const MISSING_STATE: StateCode = 4;

/// Number of distinct state codes.
pub const NUM_STATE_CODES: usize = 15;

/// Display symbol per state code.
const STATE_SYMBOLS: [char; NUM_STATE_CODES] = [
    'A', 'C', 'G', 'T', '-', 'R', 'Y', 'M', 'W', 'S', 'K', 'V', 'H', 'D', 'B',
];

/// Partials quadruple per state code.
const STATE_PARTIALS: [[f64; NUM_STATES]; NUM_STATE_CODES] = [
    [1.0, 0.0, 0.0, 0.0], // A
    [0.0, 1.0, 0.0, 0.0], // C
    [0.0, 0.0, 1.0, 0.0], // G
    [0.0, 0.0, 0.0, 1.0], // T
    [1.0, 1.0, 1.0, 1.0], // -
    [1.0, 0.0, 1.0, 0.0], // R
    [0.0, 1.0, 0.0, 1.0], // Y
    [1.0, 1.0, 0.0, 0.0], // M
    [1.0, 0.0, 0.0, 1.0], // W
    [0.0, 1.0, 1.0, 0.0], // S
    [0.0, 0.0, 1.0, 1.0], // K
    [1.0, 1.0, 1.0, 0.0], // V
    [1.0, 1.0, 0.0, 1.0], // H
    [1.0, 0.0, 1.0, 1.0], // D
    [0.0, 1.0, 1.0, 1.0], // B
];

/// Every symbol accepted by [get_state_from_symbol] (uppercase form).
pub const SYMBOLS: &str = "ACGTUNX-?RYMWSKVHDB";

/// Looks up the state code of a nucleotide symbol, case-insensitively.
///
/// `U` is read as `T`; `N`, `X`, `-` and `?` all map to [MISSING_STATE].
///
/// # Errors
/// [Error::InvalidSymbol] for any other character.
pub fn get_state_from_symbol(symbol: char) -> Result<StateCode> {
    let state = match symbol.to_ascii_uppercase() {
        'A' => 0,
        'C' => 1,
        'G' => 2,
        'T' | 'U' => 3,
        'N' | 'X' | '-' | '?' => MISSING_STATE,
        'R' => 5,
        'Y' => 6,
        'M' => 7,
        'W' => 8,
        'S' => 9,
        'K' => 10,
        'V' => 11,
        'H' => 12,
        'D' => 13,
        'B' => 14,
        _ => return Err(Error::InvalidSymbol(symbol)),
    };
    Ok(state)
}

/// Returns the canonical display symbol of a state code.
///
/// # Errors
/// [Error::InvalidState] for codes outside `0..15`.
pub fn get_symbol_from_state(state: StateCode) -> Result<char> {
    STATE_SYMBOLS
        .get(state as usize)
        .copied()
        .ok_or(Error::InvalidState(state))
}

/// Returns the partials quadruple of a state code.
///
/// # Errors
/// [Error::InvalidState] for codes outside `0..15`.
pub fn get_partials_from_state(state: StateCode) -> Result<&'static [f64; NUM_STATES]> {
    STATE_PARTIALS
        .get(state as usize)
        .ok_or(Error::InvalidState(state))
}

/// Returns whether the code denotes exactly one base.
pub fn is_unambiguous(state: StateCode) -> bool {
    (state as usize) < NUM_STATES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partials_agree_with_symbol_sets() {
        // Each ambiguity code covers the bases whose symbols it stands for
        let expected = [
            ('R', "AG"),
            ('Y', "CT"),
            ('M', "AC"),
            ('W', "AT"),
            ('S', "CG"),
            ('K', "GT"),
            ('V', "ACG"),
            ('H', "ACT"),
            ('D', "AGT"),
            ('B', "CGT"),
        ];
        for (code, bases) in expected {
            let partials = get_partials_from_state(get_state_from_symbol(code).unwrap()).unwrap();
            for (i, base) in "ACGT".chars().enumerate() {
                let covered = if bases.contains(base) { 1.0 } else { 0.0 };
                assert_eq!(partials[i], covered, "{code} at {base}");
            }
        }
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert!(matches!(get_symbol_from_state(15), Err(Error::InvalidState(15))));
        assert!(get_partials_from_state(200).is_err());
        assert!(matches!(get_state_from_symbol('Z'), Err(Error::InvalidSymbol('Z'))));
    }
}
