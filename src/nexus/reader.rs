//! NEXUS block reader for gene trees (TAXA, TREES) and nucleotide matrices (DATA, CHARACTERS).
//!
//! Blocks and commands the readers do not need are skipped. Keywords are
//! case-insensitive; labels may be quoted.

use crate::character::{get_symbol_from_state, NucleotideSequences};
use crate::error::{Error, Result};
use crate::model::{GeneTree, NodeId};
use crate::newick::NewickParser;
use crate::nexus::defs::{NEXUS_HEADER, NEXUS_LABEL_DELIMITERS, NEXUS_WORD_DELIMITERS};
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;
use std::collections::HashMap;

// =#========================================================================#=
// API (pub)
// =#========================================================================#=
/// Reads every tree of every TREES block.
///
/// Leaf labels are resolved through the block's TRANSLATE table or, without
/// one, as 1-based indices into the TAXLABELS of the TAXA block. Labels that
/// resolve to nothing are kept verbatim.
///
/// # Arguments
/// * `max_tips` - tip capacity of every tree; sized per tree from its Newick string if `None`
///
/// # Errors
/// Parsing errors for a missing `#NEXUS` header or malformed blocks, plus
/// every error of [NewickParser].
pub fn parse_nexus_trees<B: ByteSource>(
    parser: &mut ByteParser<B>,
    max_tips: Option<usize>,
) -> Result<Vec<GeneTree>> {
    let mut newick = NewickParser::new();
    if let Some(max_tips) = max_tips {
        newick = newick.with_max_tips(max_tips);
    }

    let mut taxa: Vec<String> = Vec::new();
    let mut trees = Vec::new();
    parse_header(parser)?;
    while let Some(block) = next_block(parser)? {
        match block.as_str() {
            "taxa" => read_block(parser, |parser, command| match command {
                "taxlabels" => {
                    taxa = read_labels(parser)?;
                    Ok(true)
                }
                _ => Ok(false),
            })?,
            "trees" => {
                let mut translate = HashMap::new();
                read_block(parser, |parser, command| match command {
                    "translate" => {
                        translate = read_translate(parser)?;
                        Ok(true)
                    }
                    "tree" | "utree" => {
                        let mut tree = read_tree_command(parser, &mut newick)?;
                        resolve_leaf_labels(&mut tree, &translate, &taxa);
                        trees.push(tree);
                        Ok(true)
                    }
                    _ => Ok(false),
                })?;
            }
            _ => skip_block(parser)?,
        }
    }
    log::debug!("Parsed {} NEXUS tree(s)", trees.len());
    Ok(trees)
}

/// Reads the MATRIX of every DATA or CHARACTERS block.
///
/// Sequential and interleaved matrices are supported. The FORMAT command's
/// `missing` and `gap` symbols become missing data, and its `matchchar`
/// repeats the state of the first taxon at that site.
///
/// # Errors
/// - parsing errors for malformed blocks or a row shorter than `nchar`
/// - [Error::UnsupportedFormat] for a datatype other than DNA, RNA or nucleotide
/// - [Error::InvalidSymbol] for a symbol outside the nucleotide alphabet
pub fn parse_nexus_characters<B: ByteSource>(parser: &mut ByteParser<B>) -> Result<NucleotideSequences> {
    let mut sequences = NucleotideSequences::new();
    parse_header(parser)?;
    while let Some(block) = next_block(parser)? {
        match block.as_str() {
            "data" | "characters" => {
                let mut format = MatrixFormat::default();
                read_block(parser, |parser, command| match command {
                    "dimensions" => {
                        for (key, value) in read_arguments(parser)? {
                            if key == "nchar" {
                                let nchar = value
                                    .parse::<usize>()
                                    .map_err(|_| ParsingError::invalid_number(parser, value))?;
                                format.nchar = Some(nchar);
                            }
                        }
                        Ok(true)
                    }
                    "format" => {
                        format.update(read_arguments(parser)?)?;
                        Ok(true)
                    }
                    "matrix" => {
                        read_matrix(parser, &format, &mut sequences)?;
                        Ok(true)
                    }
                    _ => Ok(false),
                })?;
            }
            _ => skip_block(parser)?,
        }
    }
    log::debug!("Parsed {} NEXUS sequence(s)", sequences.len());
    Ok(sequences)
}

// =#========================================================================#=
// BLOCK STRUCTURE
// =#========================================================================#=
fn parse_header<B: ByteSource>(parser: &mut ByteParser<B>) -> std::result::Result<(), ParsingError> {
    parser.skip_comment_and_whitespace()?;
    let word = parser.parse_label(NEXUS_WORD_DELIMITERS)?;
    if word.as_bytes().eq_ignore_ascii_case(NEXUS_HEADER) {
        Ok(())
    } else {
        Err(ParsingError::invalid_nexus(
            parser,
            format!("expected '#NEXUS' but found {word:?}"),
        ))
    }
}

/// Reads `Begin <name>;` and returns the lowercase block name, or `None` at EOF.
fn next_block<B: ByteSource>(parser: &mut ByteParser<B>) -> std::result::Result<Option<String>, ParsingError> {
    parser.skip_comment_and_whitespace()?;
    if parser.is_eof() {
        return Ok(None);
    }
    let begin = read_word(parser)?;
    if begin != "begin" {
        return Err(ParsingError::invalid_nexus(
            parser,
            format!("expected 'Begin' but found {begin:?}"),
        ));
    }
    let name = read_word(parser)?;
    expect_semicolon(parser, &name)?;
    Ok(Some(name))
}

/// Hands each command of the current block to `on_command` until `End;`.
///
/// `on_command` receives the lowercase command name and returns whether it
/// consumed the rest of the command, `;` included. Unconsumed commands are skipped.
fn read_block<B, F>(parser: &mut ByteParser<B>, mut on_command: F) -> Result<()>
where
    B: ByteSource,
    F: FnMut(&mut ByteParser<B>, &str) -> Result<bool>,
{
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.consume_if(b';') {
            continue;
        }
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser).into());
        }
        let command = read_word(parser)?;
        match command.as_str() {
            "" => {
                let found = parser.peek().map(char::from);
                return Err(ParsingError::invalid_nexus(
                    parser,
                    format!("expected a command but found {found:?}"),
                )
                .into());
            }
            "end" | "endblock" => {
                expect_semicolon(parser, &command)?;
                return Ok(());
            }
            _ => {
                if !on_command(parser, &command)? {
                    skip_command(parser)?;
                }
            }
        }
    }
}

fn skip_block<B: ByteSource>(parser: &mut ByteParser<B>) -> Result<()> {
    read_block(parser, |_, _| Ok(false))
}

/// Consumes everything up to and including the next `;` outside quotes and comments.
fn skip_command<B: ByteSource>(parser: &mut ByteParser<B>) -> std::result::Result<(), ParsingError> {
    loop {
        match parser.peek() {
            None => return Err(ParsingError::unexpected_eof(parser)),
            Some(b';') => {
                parser.next_byte();
                return Ok(());
            }
            Some(b'[') => {
                parser.skip_comment()?;
            }
            Some(b'\'') => {
                parser.parse_quoted_label()?;
            }
            Some(_) => {
                parser.next_byte();
            }
        }
    }
}

fn read_word<B: ByteSource>(parser: &mut ByteParser<B>) -> std::result::Result<String, ParsingError> {
    Ok(parser.parse_label(NEXUS_WORD_DELIMITERS)?.to_ascii_lowercase())
}

fn expect_semicolon<B: ByteSource>(parser: &mut ByteParser<B>, after: &str) -> std::result::Result<(), ParsingError> {
    parser.skip_comment_and_whitespace()?;
    if parser.consume_if(b';') {
        Ok(())
    } else {
        Err(ParsingError::invalid_nexus(parser, format!("expected ';' after '{after}'")))
    }
}

/// Reads `key[=value] ...;` with lowercase keys; a bare key has an empty value.
fn read_arguments<B: ByteSource>(
    parser: &mut ByteParser<B>,
) -> std::result::Result<Vec<(String, String)>, ParsingError> {
    let mut arguments = Vec::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.consume_if(b';') {
            return Ok(arguments);
        }
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser));
        }
        let key = parser.parse_label(NEXUS_LABEL_DELIMITERS)?.to_ascii_lowercase();
        parser.skip_comment_and_whitespace()?;
        let value = if parser.consume_if(b'=') {
            parser.parse_label(NEXUS_LABEL_DELIMITERS)?
        } else {
            String::new()
        };
        if key.is_empty() && value.is_empty() {
            // stray separator
            parser.next_byte();
            continue;
        }
        arguments.push((key, value));
    }
}

// =#========================================================================#=
// TAXA & TREES
// =#========================================================================#=
fn read_labels<B: ByteSource>(parser: &mut ByteParser<B>) -> std::result::Result<Vec<String>, ParsingError> {
    let mut labels = Vec::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.consume_if(b';') {
            return Ok(labels);
        }
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser));
        }
        let label = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        if label.is_empty() {
            let found = parser.peek().map(char::from);
            return Err(ParsingError::invalid_nexus(
                parser,
                format!("expected a taxon label but found {found:?}"),
            ));
        }
        labels.push(label);
    }
}

/// Reads `key label, key label, ...;`.
fn read_translate<B: ByteSource>(
    parser: &mut ByteParser<B>,
) -> std::result::Result<HashMap<String, String>, ParsingError> {
    let mut table = HashMap::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.consume_if(b';') {
            return Ok(table);
        }
        let key = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        let label = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        if key.is_empty() || label.is_empty() {
            return Err(ParsingError::invalid_nexus(
                parser,
                "expected '<key> <label>' pairs in TRANSLATE".to_string(),
            ));
        }
        table.insert(key, label);

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b',') && !parser.peek_is(b';') {
            let found = parser.peek().map(char::from);
            return Err(ParsingError::invalid_nexus(
                parser,
                format!("expected ',' or ';' in TRANSLATE but found {found:?}"),
            ));
        }
    }
}

/// Reads `[*] name = [&R] <newick>;` after the `tree` keyword.
fn read_tree_command<B: ByteSource>(parser: &mut ByteParser<B>, newick: &mut NewickParser) -> Result<GeneTree> {
    parser.skip_comment_and_whitespace()?;
    parser.consume_if(b'*');
    let name = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if(b'=') {
        return Err(ParsingError::invalid_nexus(parser, format!("expected '=' after tree name {name:?}")).into());
    }
    let tree = newick.parse_tree(parser)?;
    log::debug!("Read NEXUS tree '{name}' with {} tips", tree.num_leaves());
    Ok(tree)
}

fn resolve_leaf_labels(tree: &mut GeneTree, translate: &HashMap<String, String>, taxa: &[String]) {
    let leaves: Vec<NodeId> = tree.leaf_iter(tree.head()).map(|leaf| leaf.id()).collect();
    for leaf in leaves {
        let key = tree.data(leaf).label();
        let resolved = if translate.is_empty() {
            key.parse::<usize>()
                .ok()
                .and_then(|number| number.checked_sub(1))
                .and_then(|i| taxa.get(i))
                .cloned()
        } else {
            translate.get(key).cloned()
        };
        if let Some(label) = resolved {
            tree.data_mut(leaf).set_label(label);
        }
    }
}

// =#========================================================================#=
// CHARACTERS
// =#========================================================================#=
#[derive(Debug, Default)]
struct MatrixFormat {
    nchar: Option<usize>,
    interleave: bool,
    missing: Option<u8>,
    gap: Option<u8>,
    matchchar: Option<u8>,
}

impl MatrixFormat {
    fn update(&mut self, arguments: Vec<(String, String)>) -> Result<()> {
        for (key, value) in arguments {
            let symbol = value.bytes().next();
            match key.as_str() {
                "datatype" => {
                    if !matches!(value.to_ascii_lowercase().as_str(), "dna" | "rna" | "nucleotide") {
                        return Err(Error::UnsupportedFormat(format!("NEXUS datatype {value}")));
                    }
                }
                "interleave" => self.interleave = !value.eq_ignore_ascii_case("no"),
                "missing" => self.missing = symbol,
                "gap" => self.gap = symbol,
                "matchchar" => self.matchchar = symbol,
                _ => {}
            }
        }
        Ok(())
    }
}

fn read_matrix<B: ByteSource>(
    parser: &mut ByteParser<B>,
    format: &MatrixFormat,
    sequences: &mut NucleotideSequences,
) -> Result<()> {
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.consume_if(b';') {
            return Ok(());
        }
        if parser.is_eof() {
            return Err(ParsingError::unexpected_eof(parser).into());
        }
        let label = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        if label.is_empty() {
            let found = parser.peek().map(char::from);
            return Err(ParsingError::invalid_nexus(
                parser,
                format!("expected a taxon label in MATRIX but found {found:?}"),
            )
            .into());
        }

        let offset = sequences.get(&label).map_or(0, |sequence| sequence.len());
        let row_len = match (format.interleave, format.nchar) {
            (false, Some(nchar)) => Some(nchar.saturating_sub(offset)),
            _ => None,
        };
        let row = read_row(parser, row_len)?;
        if let Some(expected) = row_len.filter(|&expected| row.len() < expected) {
            return Err(ParsingError::invalid_nexus(
                parser,
                format!("taxon '{label}' has {} of {} sites", row.len(), expected),
            )
            .into());
        }

        let symbols = resolve_symbols(parser, format, sequences, &label, offset, &row)?;
        sequences.get_or_insert(&label).append_states_by_symbols(&symbols)?;
    }
}

/// Reads `len` symbols, possibly across lines, or the rest of the line if `len` is `None`.
fn read_row<B: ByteSource>(
    parser: &mut ByteParser<B>,
    len: Option<usize>,
) -> std::result::Result<Vec<u8>, ParsingError> {
    let mut row = Vec::new();
    while len.is_none_or(|len| row.len() < len) {
        parser.skip_inline_whitespace();
        match parser.peek() {
            None => return Err(ParsingError::unexpected_eof(parser)),
            Some(b';') => break,
            Some(b'[') => {
                parser.skip_comment()?;
            }
            Some(b'\n' | b'\r') if len.is_none() => break,
            Some(b'\n' | b'\r') => {
                parser.next_byte();
            }
            Some(symbol) => {
                row.push(symbol);
                parser.next_byte();
            }
        }
    }
    Ok(row)
}

/// Replaces match characters by the first taxon's symbol and missing/gap symbols by `-`.
fn resolve_symbols<B: ByteSource>(
    parser: &ByteParser<B>,
    format: &MatrixFormat,
    sequences: &NucleotideSequences,
    label: &str,
    offset: usize,
    row: &[u8],
) -> Result<String> {
    let first = sequences.iter().next().filter(|first| first.label() != label);
    row.iter()
        .enumerate()
        .map(|(i, &symbol)| -> Result<char> {
            if Some(symbol) == format.matchchar {
                let site = offset + i;
                let state = first
                    .and_then(|first| first.states().get(site))
                    .copied()
                    .ok_or_else(|| {
                        ParsingError::invalid_nexus(
                            parser,
                            format!("match character at site {} of '{label}' has no reference", site + 1),
                        )
                    })?;
                get_symbol_from_state(state)
            } else if Some(symbol) == format.missing || Some(symbol) == format.gap {
                Ok('-')
            } else {
                Ok(char::from(symbol))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_table_and_taxon_indices() {
        let input = "#NEXUS\n\
            Begin taxa; Dimensions ntax=3; Taxlabels Tupaia 'Belanger''s treeshrew' Mus; End;\n\
            BEGIN TREES;\n\
            \tTranslate 1 Tupaia, 2 'Belanger''s treeshrew', 3 Mus;\n\
            \ttree one = [&R] ((1:0.1,2:0.2):0.05,3:0.3);\n\
            End;\n\
            begin trees; tree two = [&U] (3,(2,1));\nend;\n";
        let mut parser = ByteParser::for_str(input);
        let trees = parse_nexus_trees(&mut parser, None).unwrap();
        assert_eq!(trees.len(), 2);

        for tree in &trees {
            assert!(tree.find_leaf("Belanger's treeshrew").is_some());
            assert!(tree.find_leaf("Mus").is_some());
            assert!(tree.find_leaf("Tupaia").is_some());
        }
        let tupaia = trees[0].find_leaf("Tupaia").unwrap();
        assert_eq!(trees[0].data(tupaia).edge_length(), 0.1);
    }

    #[test]
    fn test_unknown_blocks_and_commands_are_skipped() {
        let input = "#nexus [written by hand]\n\
            begin assumptions; options deftype=unord 'odd;name'; end;\n\
            begin trees; title 'x;y'; tree t = (A,B); endblock;\n";
        let mut parser = ByteParser::for_str(input);
        let trees = parse_nexus_trees(&mut parser, Some(4)).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].max_tips(), 4);
    }

    #[test]
    fn test_missing_header() {
        let mut parser = ByteParser::for_str("begin trees; end;");
        assert!(matches!(parse_nexus_trees(&mut parser, None), Err(Error::Parsing(_))));
    }

    #[test]
    fn test_interleaved_matrix_with_match_characters() {
        let input = "#NEXUS\n\
            Begin data;\n\
            \tDimensions ntax=2 nchar=6;\n\
            \tFormat datatype=DNA interleave missing=N gap=- matchchar=.;\n\
            \tMatrix\n\
            \t\talpha ACG\n\
            \t\tbeta  .T-\n\
            \n\
            \t\talpha TNA\n\
            \t\tbeta  ..R\n\
            \t;\n\
            End;\n";
        let mut parser = ByteParser::for_str(input);
        let sequences = parse_nexus_characters(&mut parser).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences.get("alpha").unwrap().states_as_symbols().unwrap(), "ACGT-A");
        assert_eq!(sequences.get("beta").unwrap().states_as_symbols().unwrap(), "AT-T-R");
    }

    #[test]
    fn test_sequential_rows_may_wrap_but_not_fall_short() {
        let input = "#NEXUS\nbegin characters; dimensions nchar=5; matrix\n a ACG\n TA\n b AC;\nend;";
        let mut parser = ByteParser::for_str(input);
        assert!(matches!(parse_nexus_characters(&mut parser), Err(Error::Parsing(_))));

        let input = "#NEXUS\nbegin characters; dimensions nchar=5; matrix\n a ACG\n TA\n b ACGTT;\nend;";
        let mut parser = ByteParser::for_str(input);
        let sequences = parse_nexus_characters(&mut parser).unwrap();
        assert_eq!(sequences.get("a").unwrap().len(), 5);
    }

    #[test]
    fn test_protein_matrix_is_unsupported() {
        let input = "#NEXUS\nbegin data; format datatype=protein; matrix a MK; end;";
        let mut parser = ByteParser::for_str(input);
        assert!(matches!(
            parse_nexus_characters(&mut parser),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
