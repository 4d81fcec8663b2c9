//! Relaxed sequential PHYLIP reader.

use crate::character::{NucleotideSequence, NucleotideSequences};
use crate::error::Result;
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;

/// Label delimiters: any whitespace
const PHYLIP_LABEL_DELIMITERS: &[u8] = b" \t\r\n";

/// Reads relaxed sequential PHYLIP: a `ntax nchar` header, then per taxon a
/// whitespace-free label followed by `nchar` symbols, which may be spread
/// over several lines and contain blanks.
///
/// # Errors
/// - [ParsingError] for a malformed header or a truncated matrix
/// - [crate::Error::InvalidSymbol] for a symbol outside the nucleotide alphabet
pub fn parse_phylip<B: ByteSource>(parser: &mut ByteParser<B>) -> Result<NucleotideSequences> {
    parser.skip_whitespace();
    let num_taxa = parser.parse_usize()?;
    parser.skip_inline_whitespace();
    let num_sites = parser.parse_usize()?;
    log::debug!("PHYLIP matrix of {num_taxa} taxa x {num_sites} sites");

    let mut sequences = NucleotideSequences::new();
    for _ in 0..num_taxa {
        parser.skip_whitespace();
        let label = parser.parse_label(PHYLIP_LABEL_DELIMITERS)?;
        if label.is_empty() {
            return Err(ParsingError::unexpected_eof(parser).into());
        }

        let mut sequence = NucleotideSequence::with_capacity(label, num_sites);
        while sequence.len() < num_sites {
            parser.skip_whitespace();
            match parser.next_byte() {
                Some(symbol) => sequence.append_state_by_symbol(char::from(symbol))?,
                None => {
                    return Err(ParsingError::invalid_phylip(
                        parser,
                        format!(
                            "taxon '{}' has {} of {} sites",
                            sequence.label(),
                            sequence.len(),
                            num_sites
                        ),
                    )
                    .into());
                }
            }
        }
        sequences.push(sequence);
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_with_wrapped_rows() {
        let input = " 2 6\nalpha ACG TTA\nbeta  ACG\nT-A\n";
        let mut parser = ByteParser::for_str(input);
        let sequences = parse_phylip(&mut parser).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences.get("alpha").unwrap().states_as_symbols().unwrap(), "ACGTTA");
        assert_eq!(sequences.get("beta").unwrap().states_as_symbols().unwrap(), "ACGT-A");
    }

    #[test]
    fn test_truncated_matrix() {
        let mut parser = ByteParser::for_str("1 5\nalpha ACG\n");
        assert!(parse_phylip(&mut parser).is_err());
    }
}
