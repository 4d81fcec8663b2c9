//! Newick output for gene trees.

use crate::model::{GeneTree, NodeId};
use crate::newick::defs::{CHARS_PER_NODE, ROOTED_MARKER};
use crate::parser::utils::escape_label;
use std::io::{self, Write};

/// Returns the Newick representation of `tree`, prefixed with the rooted marker
/// and terminated by a semicolon.
///
/// Every node, including internal ones and the root, is written as
/// `label:edge_length`.
///
/// # Example
/// ```
/// use treeshrew::newick::{parse_str, to_newick};
///
/// let tree = parse_str("(A:0.1,B:0.2);").unwrap();
/// assert_eq!(to_newick(&tree), "[&R] (A:0.1,B:0.2):0;");
/// ```
pub fn to_newick(tree: &GeneTree) -> String {
    // Recursive helper for building the Newick string
    fn build_newick(tree: &GeneTree, newick: &mut String, id: NodeId) {
        let node = tree.node(id);
        if node.is_internal() {
            newick.push('(');
            for (i, child) in tree.children_iter(id).enumerate() {
                if i > 0 {
                    newick.push(',');
                }
                build_newick(tree, newick, child.id());
            }
            newick.push(')');
        }
        newick.push_str(&escape_label(node.data().label()));
        newick.push(':');
        newick.push_str(&node.data().edge_length().to_string());
    }

    let estimated_capacity = ROOTED_MARKER.len() + tree.node_count() * CHARS_PER_NODE;
    let mut newick = String::with_capacity(estimated_capacity);
    newick.push_str(ROOTED_MARKER);
    build_newick(tree, &mut newick, tree.head());
    newick.push(';');
    newick
}

/// Writes [to_newick] of `tree` followed by a newline.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick<W: Write>(tree: &GeneTree, out: &mut W) -> io::Result<()> {
    out.write_all(to_newick(tree).as_bytes())?;
    out.write_all(b"\n")
}
