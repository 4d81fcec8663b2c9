use treeshrew::character::state::{
    get_partials_from_state, get_state_from_symbol, get_symbol_from_state, is_unambiguous,
    MISSING_STATE, SYMBOLS,
};
use treeshrew::character::{NucleotideSequence, NucleotideSequences};
use treeshrew::Error;

// --- TESTS STATE TABLES ---
#[test]
fn test_symbol_round_trip_is_canonical() {
    for symbol in SYMBOLS.chars() {
        let state = get_state_from_symbol(symbol).unwrap();
        let canonical = get_symbol_from_state(state).unwrap();
        let expected = match symbol {
            'N' | 'X' | '?' | '-' => '-',
            'U' => 'T',
            other => other,
        };
        assert_eq!(canonical, expected, "symbol {symbol}");

        // Lowercase maps to the same state
        let lower = symbol.to_ascii_lowercase();
        assert_eq!(get_state_from_symbol(lower).unwrap(), state);
    }
}

#[test]
fn test_missing_symbols_share_one_state() {
    for symbol in ['N', 'n', 'X', '?', '-'] {
        assert_eq!(get_state_from_symbol(symbol).unwrap(), MISSING_STATE);
    }
    assert_eq!(get_partials_from_state(MISSING_STATE).unwrap(), &[1.0; 4]);
    assert!(!is_unambiguous(MISSING_STATE));
    assert!(is_unambiguous(get_state_from_symbol('G').unwrap()));
}

#[test]
fn test_unknown_symbol_and_state_rejected() {
    assert!(matches!(get_state_from_symbol('Z'), Err(Error::InvalidSymbol('Z'))));
    assert!(matches!(get_state_from_symbol('*'), Err(Error::InvalidSymbol('*'))));
    assert!(matches!(get_symbol_from_state(15), Err(Error::InvalidState(15))));
    assert!(get_partials_from_state(200).is_err());
}

#[test]
fn test_ambiguity_partials() {
    let r = get_state_from_symbol('R').unwrap();
    assert_eq!(get_partials_from_state(r).unwrap(), &[1.0, 0.0, 1.0, 0.0]);
    let b = get_state_from_symbol('b').unwrap();
    assert_eq!(get_partials_from_state(b).unwrap(), &[0.0, 1.0, 1.0, 1.0]);
}

// --- TESTS SEQUENCES ---
#[test]
fn test_partials_stay_four_per_state() {
    let mut sequence = NucleotideSequence::new("t1");
    for (i, symbol) in "ACGTNRYKMSWBDHV?-".chars().enumerate() {
        sequence.append_state_by_symbol(symbol).unwrap();
        assert_eq!(sequence.len(), i + 1);
        assert_eq!(sequence.partials().len(), 4 * sequence.len());
    }
    sequence.append_states_by_symbols("ac gt\n").unwrap();
    assert_eq!(sequence.partials().len(), 4 * sequence.len());
}

#[test]
fn test_invalid_string_appends_nothing() {
    let mut sequence = NucleotideSequence::from_symbols("t1", "ACG").unwrap();
    assert!(sequence.append_states_by_symbols("TTJT").is_err());
    assert_eq!(sequence.len(), 3);
    assert_eq!(sequence.partials().len(), 12);
}

#[test]
fn test_states_as_symbols() {
    let sequence = NucleotideSequence::from_symbols("t1", "acgu nx?r").unwrap();
    assert_eq!(sequence.states_as_symbols().unwrap(), "ACGT---R");

    let mut out = Vec::new();
    sequence.write_states_as_symbols(&mut out).unwrap();
    assert_eq!(out, b"ACGT---R");
}

#[test]
fn test_sequences_by_label() {
    let mut sequences = NucleotideSequences::new();
    sequences.push(NucleotideSequence::from_symbols("a", "ACGT").unwrap());
    sequences.push(NucleotideSequence::from_symbols("b", "AC").unwrap());
    sequences.get_or_insert("c").append_states_by_symbols("GGGGG").unwrap();
    sequences.push(NucleotideSequence::from_symbols("a", "T").unwrap());

    assert_eq!(sequences.len(), 3);
    assert_eq!(sequences.get("a").unwrap().len(), 1);
    assert_eq!(sequences.num_sites(), 5);
    let labels: Vec<&str> = sequences.iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["a", "b", "c"]);
}
