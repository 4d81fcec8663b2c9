//! Newick reader building [GeneTree]s through the node arenas.

use crate::error::{Error, Result};
use crate::model::{GeneTree, NodeId};
use crate::newick::defs::NEWICK_LABEL_DELIMITERS;
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use crate::parser::parsing_error::ParsingError;

// =#========================================================================#=
// NEWICK PARSER
// =#========================================================================#=
/// Parser (configuration) for Newick trees with 0 or 2 children per node.
///
/// # Configuration
/// * [`with_max_tips(max_tips)`](Self::with_max_tips)
///     - Sizes every parsed tree for the given number of tips. Otherwise each
///       tree is sized from a pre-scan of its own Newick string.
///
/// # Behaviour
/// * `[...]` comments (including the `[&R]` root marker) are skipped
/// * Labels may be quoted (`'Belanger''s'`) or unquoted; internal labels are kept
/// * Branch lengths are optional; missing ones are 0, negative ones are clamped to 0
/// * The root's branch length is ignored and set to 0
/// * A node with 1 or more than 2 children is an [Error::InvalidTreeArity]
///
/// # Example
/// ```
/// use treeshrew::newick::NewickParser;
/// use treeshrew::parser::byte_parser::ByteParser;
///
/// let mut byte_parser = ByteParser::for_str("[&R] ((A:0.1,B:0.2):0.05,C:0.3);");
/// let tree = NewickParser::new().parse_tree(&mut byte_parser).unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(tree.node_count(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NewickParser {
    max_tips: Option<usize>,
}

// ============================================================================
// Construction & Configuration (pub)
// ============================================================================
impl NewickParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tip capacity of every parsed tree.
    pub fn with_max_tips(mut self, max_tips: usize) -> Self {
        self.max_tips = Some(max_tips);
        self
    }
}

// ============================================================================
// API Parsing (pub)
// ============================================================================
impl NewickParser {
    /// Parses all Newick trees from the byte source until EOF.
    ///
    /// # Errors
    /// The first error of any tree.
    pub fn parse_all<B: ByteSource>(&mut self, mut byte_parser: ByteParser<B>) -> Result<Vec<GeneTree>> {
        let mut trees = Vec::new();
        loop {
            byte_parser.skip_comment_and_whitespace()?;
            if byte_parser.is_eof() {
                break;
            }
            trees.push(self.parse_tree(&mut byte_parser)?);
        }
        log::debug!("Parsed {} Newick tree(s)", trees.len());
        Ok(trees)
    }

    /// Parses a single Newick tree into a freshly allocated [GeneTree].
    pub fn parse_tree<B: ByteSource>(&mut self, parser: &mut ByteParser<B>) -> Result<GeneTree> {
        parser.skip_comment_and_whitespace()?;
        let max_tips = match self.max_tips {
            Some(max_tips) => max_tips,
            None => count_tips(parser)?,
        };
        let mut tree = GeneTree::new(max_tips.max(1));
        self.parse_into(parser, &mut tree)?;
        Ok(tree)
    }

    /// Parses a single Newick tree into `tree`, replacing its previous content.
    ///
    /// Nodes come from `tree`'s arenas, so a tree can be rebuilt repeatedly
    /// without allocation.
    pub fn parse_into<B: ByteSource>(&mut self, parser: &mut ByteParser<B>, tree: &mut GeneTree) -> Result<()> {
        tree.clear();
        let head = tree.head();
        self.parse_node(parser, tree, head)?;
        tree.set_edge_length(head, 0.0);

        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            let next_char = parser.peek().map(char::from);
            return Err(ParsingError::invalid_newick_string(
                parser,
                format!("Expected ';' at end of tree but found {next_char:?}"),
            )
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// Parsing
// ============================================================================
impl NewickParser {
    /// Parses `(child,child,...)label:length` or `label:length` into the already allocated `node`.
    fn parse_node<B: ByteSource>(
        &mut self,
        parser: &mut ByteParser<B>,
        tree: &mut GeneTree,
        node: NodeId,
    ) -> Result<()> {
        parser.skip_comment_and_whitespace()?;

        let mut num_children = 0;
        if parser.consume_if(b'(') {
            loop {
                parser.skip_comment_and_whitespace()?;
                let child = if parser.peek_is(b'(') {
                    tree.allocate_internal_node()?
                } else {
                    tree.allocate_leaf_node()?
                };
                tree.add_child(node, child);
                self.parse_node(parser, tree, child)?;
                num_children += 1;

                parser.skip_comment_and_whitespace()?;
                if parser.consume_if(b',') {
                    continue;
                }
                if parser.consume_if(b')') {
                    break;
                }
                let next_char = parser.peek().map(char::from);
                return Err(ParsingError::invalid_newick_string(
                    parser,
                    format!("Expected ',' or ')' after child but found {next_char:?}"),
                )
                .into());
            }
        }

        let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
        if num_children != 0 && num_children != 2 {
            return Err(Error::InvalidTreeArity {
                label,
                children: num_children,
            });
        }

        let edge_length = parse_branch_length(parser)?.unwrap_or(0.0);
        let edge_length = if edge_length < 0.0 {
            log::warn!("Clamping negative branch length {edge_length} of '{label}' to 0");
            0.0
        } else {
            edge_length
        };

        tree.data_mut(node).set_label(label);
        tree.set_edge_length(node, edge_length);
        Ok(())
    }
}

/// Parses optional branch length `[:number]`, skipping comments/whitespace around `:`.
fn parse_branch_length<B: ByteSource>(parser: &mut ByteParser<B>) -> Result<Option<f64>> {
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if(b':') {
        return Ok(None);
    }
    parser.skip_comment_and_whitespace()?;
    let length = parser.parse_f64()?;
    if !length.is_finite() {
        return Err(ParsingError::invalid_number(parser, length.to_string()).into());
    }
    Ok(Some(length))
}

/// Counts tips of the tree at the current position as one more than its commas, then rewinds.
fn count_tips<B: ByteSource>(parser: &mut ByteParser<B>) -> Result<usize> {
    let start = parser.position();
    let mut commas = 0;
    loop {
        match parser.peek() {
            None | Some(b';') => break,
            Some(b'[') => {
                parser.skip_comment()?;
            }
            Some(b'\'') => {
                parser.parse_quoted_label()?;
            }
            Some(b',') => {
                commas += 1;
                parser.next_byte();
            }
            Some(_) => {
                parser.next_byte();
            }
        }
    }
    parser.set_position(start);
    Ok(commas + 1)
}
