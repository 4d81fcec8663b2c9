//! FASTA reader.

use crate::character::{NucleotideSequence, NucleotideSequences};
use crate::error::Result;
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;

/// Reads FASTA records (`>label` line, then any number of sequence lines).
///
/// The label is the whole header line after `>`, trimmed. Blank lines are
/// ignored. Symbols go through the nucleotide state table.
///
/// # Errors
/// - [ParsingError] if data appears before the first header
/// - [crate::Error::InvalidSymbol] for a symbol outside the nucleotide alphabet
pub fn parse_fasta<B: ByteSource>(parser: &mut ByteParser<B>) -> Result<NucleotideSequences> {
    let mut sequences = NucleotideSequences::new();
    let mut current: Option<NucleotideSequence> = None;

    loop {
        parser.skip_whitespace();
        if parser.is_eof() {
            break;
        }
        if parser.consume_if(b'>') {
            if let Some(done) = current.take() {
                sequences.push(done);
            }
            let label = parser.read_line().unwrap_or_default();
            current = Some(NucleotideSequence::new(label.trim()));
            continue;
        }

        let Some(sequence) = current.as_mut() else {
            return Err(ParsingError::invalid_fasta(
                parser,
                "sequence data before first '>' header".to_string(),
            )
            .into());
        };
        let line = parser.read_line().unwrap_or_default();
        sequence.append_states_by_symbols(&line)?;
    }

    if let Some(done) = current {
        sequences.push(done);
    }
    Ok(sequences)
}
