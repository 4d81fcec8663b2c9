//! Tree model: node arena, generic tree with traversal iterators, and the gene tree payload.

/// Fixed-capacity node pool
pub mod arena;
/// Gene tree node payload and gene tree helpers
pub mod gene_tree;
/// Rooted tree structure and iterators
pub mod tree;

pub use gene_tree::{GeneNodeData, GeneTree};
pub use tree::{NodeData, NodeId, Tree, TreeNode};
