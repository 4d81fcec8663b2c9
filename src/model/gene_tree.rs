//! Gene tree: a [Tree] whose nodes carry a buffer index, an edge length,
//! a label and a dirty flag.

use crate::model::tree::{NodeData, NodeId, Tree};

/// Payload of every gene tree node.
///
/// `index` equals the node's id and doubles as the buffer index of the
/// likelihood engine: tip buffers use the leaf-class range, partial buffers
/// the internal-class range.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneNodeData {
    index: usize,
    edge_length: f64,
    label: String,
    is_dirty: bool,
}

impl Default for GeneNodeData {
    fn default() -> Self {
        GeneNodeData {
            index: 0,
            edge_length: 0.0,
            label: String::new(),
            is_dirty: true,
        }
    }
}

impl NodeData for GeneNodeData {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    fn clear(&mut self) {
        self.edge_length = 0.0;
        self.label.clear();
        self.is_dirty = true;
    }
}

impl GeneNodeData {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Distance to the parent; 0 for the root.
    pub fn edge_length(&self) -> f64 {
        self.edge_length
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Returns whether cached likelihood terms for this node are stale.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn set_dirty(&mut self, is_dirty: bool) {
        self.is_dirty = is_dirty;
    }
}

/// Tree of [GeneNodeData], the input of the likelihood engine.
pub type GeneTree = Tree<GeneNodeData>;

impl GeneTree {
    /// Sets the edge length of `id` and marks it and all its ancestors dirty.
    ///
    /// # Panics
    /// Panics if `edge_length` is negative or not finite.
    pub fn set_edge_length(&mut self, id: NodeId, edge_length: f64) {
        assert!(
            edge_length.is_finite() && edge_length >= 0.0,
            "Edge length must be non-negative and finite, got {edge_length}"
        );
        self.data_mut(id).edge_length = edge_length;
        self.mark_dirty_path(id);
    }

    /// Marks `id` and every ancestor up to the head dirty.
    pub fn mark_dirty_path(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.data_mut(node).is_dirty = true;
            current = self.parent(node);
        }
    }

    /// Marks every node of the tree dirty.
    pub fn mark_all_dirty(&mut self) {
        let ids: Vec<NodeId> = self.postorder_iter().map(|node| node.id()).collect();
        for id in ids {
            self.data_mut(id).is_dirty = true;
        }
    }

    /// Clears the dirty flag of every node of the tree.
    pub fn clear_dirty(&mut self) {
        let ids: Vec<NodeId> = self.postorder_iter().map(|node| node.id()).collect();
        for id in ids {
            self.data_mut(id).is_dirty = false;
        }
    }

    /// Finds the leaf carrying the given label.
    pub fn find_leaf(&self, label: &str) -> Option<NodeId> {
        self.leaf_iter(self.head())
            .find(|leaf| leaf.data().label() == label)
            .map(|leaf| leaf.id())
    }

    /// Returns the sum of all edge lengths.
    pub fn total_edge_length(&self) -> f64 {
        self.postorder_iter().map(|node| node.data().edge_length()).sum()
    }
}
