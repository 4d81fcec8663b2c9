//! Tree module for rooted, ordered phylogenetic trees.
//!
//! This module provides the core data structures for representing gene trees:
//! - `Tree<D>`: tree of [TreeNode]s drawn from two fixed-capacity [NodeArena]s.
//! - `NodeId` is used to index nodes across both arenas.
//! - `NodeData` is the payload hook every node carries.
//!
//! Children are encoded as a first-child/last-child/next-sibling chain rather
//! than a fixed-arity array. The root is the `head` node; its next-sibling slot
//! always points at a reserved `stop` node, which bounds whole-tree traversals.

use crate::error::Result;
use crate::model::arena::{ArenaSlot, NodeArena};

/// Index of a node in a tree (across leaf and internal arena).
pub type NodeId = usize;

/// Sentinel for an unset link.
const NO_NODE: NodeId = usize::MAX;

/// Payload attached to every node of a [Tree].
pub trait NodeData: Default {
    /// Receives the node's global index once, when the arena slot is created.
    fn set_index(&mut self, _index: usize) {}

    /// Restores a cleared state when the node is returned to its arena.
    fn clear(&mut self) {}
}

impl NodeData for () {}

impl NodeData for String {
    fn clear(&mut self) {
        String::clear(self);
    }
}

// =#========================================================================#=
// TREE NODE
// =#========================================================================#=
/// A node of a [Tree]: navigation links plus a payload of type `D`.
///
/// Links are indices into the owning tree; an unset link reads as `None`.
#[derive(Debug, Clone)]
pub struct TreeNode<D> {
    id: NodeId,
    parent: NodeId,
    first_child: NodeId,
    last_child: NodeId,
    next_sibling: NodeId,
    data: D,
}

impl<D: Default> Default for TreeNode<D> {
    fn default() -> Self {
        TreeNode {
            id: NO_NODE,
            parent: NO_NODE,
            first_child: NO_NODE,
            last_child: NO_NODE,
            next_sibling: NO_NODE,
            data: D::default(),
        }
    }
}

impl<D: NodeData> ArenaSlot for TreeNode<D> {
    fn assign_index(&mut self, index: usize) {
        self.id = index;
        self.data.set_index(index);
    }

    fn reset(&mut self) {
        self.unlink();
        self.data.clear();
    }
}

impl<D> TreeNode<D> {
    /// Returns the id of this node within its tree.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        link(self.parent)
    }

    pub fn first_child(&self) -> Option<NodeId> {
        link(self.first_child)
    }

    pub fn last_child(&self) -> Option<NodeId> {
        link(self.last_child)
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        link(self.next_sibling)
    }

    /// Returns whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.first_child == NO_NODE
    }

    pub fn is_internal(&self) -> bool {
        !self.is_leaf()
    }

    /// Returns a reference to the attached payload.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Returns a mutable reference to the attached payload.
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    fn unlink(&mut self) {
        self.parent = NO_NODE;
        self.first_child = NO_NODE;
        self.last_child = NO_NODE;
        self.next_sibling = NO_NODE;
    }
}

fn link(index: NodeId) -> Option<NodeId> {
    if index == NO_NODE { None } else { Some(index) }
}

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A rooted tree with ordered children, backed by two fixed-capacity arenas.
///
/// # Structure
/// - Leaf-class nodes come from an arena of `2 * max_tips` slots with ids `0..2*max_tips`
/// - Internal-class nodes come from an arena of `2 * max_tips + 1` slots,
///   ids starting at `2 * max_tips`
/// - `head` (the root) and `stop` (the traversal sentinel) are drawn from the
///   internal arena at construction and live as long as the tree
/// - `head`'s next sibling is always `stop`; `stop` is never part of any traversal
///
/// # Construction
/// Allocate nodes with [Tree::allocate_leaf_node] / [Tree::allocate_internal_node]
/// and attach them top-down with [Tree::add_child], starting at [Tree::head].
/// `add_child` is the only structural mutation; tree shape is meant to stay
/// fixed for a scoring session and be torn down with [Tree::clear].
///
/// # Example
/// ```
/// use treeshrew::model::tree::Tree;
///
/// let mut tree: Tree<String> = Tree::new(2);
/// let root = tree.head();
/// let a = tree.allocate_leaf_node().unwrap();
/// let b = tree.allocate_leaf_node().unwrap();
/// tree.add_child(root, a);
/// tree.add_child(root, b);
///
/// let order: Vec<_> = tree.postorder_iter().map(|n| n.id()).collect();
/// assert_eq!(order, vec![a, b, root]);
/// ```
#[derive(Debug, Clone)]
pub struct Tree<D> {
    max_tips: usize,
    leaf_nodes: NodeArena<TreeNode<D>>,
    internal_nodes: NodeArena<TreeNode<D>>,
    head: NodeId,
    stop: NodeId,
}

// ============================================================================
// New, Allocation, Structure (pub)
// ============================================================================
impl<D: NodeData> Tree<D> {
    /// Creates an empty tree with node capacity for `max_tips` tips.
    ///
    /// # Arguments
    /// `max_tips` - upper bound on the number of tips; must be positive
    ///
    /// # Panics
    /// Panics if `max_tips` is zero.
    pub fn new(max_tips: usize) -> Self {
        assert!(max_tips > 0, "Tree needs capacity for at least one tip");
        let leaf_capacity = 2 * max_tips;
        let internal_capacity = 2 * max_tips + 1;
        let mut internal_nodes = NodeArena::new(internal_capacity, leaf_capacity);

        // A fresh arena of at least 3 slots cannot be exhausted by two allocations
        let (head, stop) = match (internal_nodes.allocate(), internal_nodes.allocate()) {
            (Ok(head), Ok(stop)) => (head, stop),
            _ => unreachable!("fresh internal arena holds {internal_capacity} slots"),
        };

        let mut tree = Tree {
            max_tips,
            leaf_nodes: NodeArena::new(leaf_capacity, 0),
            internal_nodes,
            head,
            stop,
        };
        tree.node_mut(head).next_sibling = stop;
        tree
    }

    /// Takes a fresh node from the leaf-class arena.
    ///
    /// # Errors
    /// [crate::Error::ArenaExhausted] when all leaf-class slots are in use.
    pub fn allocate_leaf_node(&mut self) -> Result<NodeId> {
        self.leaf_nodes.allocate()
    }

    /// Takes a fresh node from the internal-class arena.
    ///
    /// # Errors
    /// [crate::Error::ArenaExhausted] when all internal-class slots are in use.
    pub fn allocate_internal_node(&mut self) -> Result<NodeId> {
        self.internal_nodes.allocate()
    }

    /// Appends `child` to the end of `parent`'s child chain and sets its parent link.
    ///
    /// # Panics
    /// Panics if either id is not a node of this tree, if `child` is the head or
    /// the stop node, or if `child` is already attached somewhere.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            child != self.head && child != self.stop,
            "Cannot attach head or stop node {child} as a child"
        );
        assert!(parent != self.stop, "Cannot attach children to the stop node");
        assert!(
            self.node(child).parent == NO_NODE,
            "Node {child} already has parent {}",
            self.node(child).parent
        );

        let last = self.node(parent).last_child;
        if last == NO_NODE {
            self.node_mut(parent).first_child = child;
        } else {
            self.node_mut(last).next_sibling = child;
        }
        self.node_mut(parent).last_child = child;

        let node = self.node_mut(child);
        node.parent = parent;
        node.next_sibling = NO_NODE;
    }

    /// Returns every node below the head to its arena and resets the head.
    ///
    /// Head and stop nodes survive; afterwards the tree consists of the bare head.
    pub fn clear(&mut self) {
        let attached: Vec<NodeId> = self
            .postorder_iter()
            .map(|node| node.id)
            .filter(|&id| id != self.head)
            .collect();
        for id in attached {
            self.deallocate_node(id);
        }

        let stop = self.stop;
        let head = self.node_mut(self.head);
        head.unlink();
        head.next_sibling = stop;
        head.data.clear();
    }

    fn deallocate_node(&mut self, id: NodeId) {
        if self.leaf_nodes.contains(id) {
            self.leaf_nodes.deallocate(id);
        } else {
            self.internal_nodes.deallocate(id);
        }
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl<D> Tree<D> {
    /// Returns the number of tips this tree was sized for.
    pub fn max_tips(&self) -> usize {
        self.max_tips
    }

    /// Returns the root node id.
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// Returns the id of the traversal sentinel.
    pub fn stop(&self) -> NodeId {
        self.stop
    }

    /// Returns whether `id` names a node slot of this tree (allocated or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.leaf_nodes.contains(id) || self.internal_nodes.contains(id)
    }

    /// Returns a reference to the node with the given id.
    ///
    /// # Panics
    /// Panics if `id` is the stop sentinel or not a node of this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode<D> {
        assert!(id != self.stop, "Dereferenced the stop node");
        if self.leaf_nodes.contains(id) {
            self.leaf_nodes.get(id)
        } else {
            self.internal_nodes.get(id)
        }
    }

    /// Returns a mutable reference to the node with the given id.
    ///
    /// # Panics
    /// Panics if `id` is the stop sentinel or not a node of this tree.
    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode<D> {
        assert!(id != self.stop, "Dereferenced the stop node");
        if self.leaf_nodes.contains(id) {
            self.leaf_nodes.get_mut(id)
        } else {
            self.internal_nodes.get_mut(id)
        }
    }

    /// Shorthand for `node(id).data()`.
    pub fn data(&self, id: NodeId) -> &D {
        &self.node(id).data
    }

    /// Shorthand for `node_mut(id).data_mut()`.
    pub fn data_mut(&mut self, id: NodeId) -> &mut D {
        &mut self.node_mut(id).data
    }

    /// Returns the parent of `id`, or `None` for the head.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    /// Returns the next sibling of `id`. For the head this is the stop node.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling()
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_leaf()
    }

    /// Returns the number of immediate children of `id`.
    pub fn num_children(&self, id: NodeId) -> usize {
        self.children_iter(id).count()
    }

    /// Returns the number of nodes reachable from the head, head included.
    pub fn node_count(&self) -> usize {
        self.postorder_iter().count()
    }

    /// Returns the number of leaves reachable from the head; 0 for an empty tree.
    pub fn num_leaves(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.leaf_iter(self.head).count()
    }

    /// Returns whether the head has no children yet.
    pub fn is_empty(&self) -> bool {
        self.node(self.head).is_leaf()
    }

    /// Returns whether every node has either 0 or exactly 2 children.
    pub fn is_binary(&self) -> bool {
        self.postorder_iter()
            .all(|node| matches!(self.num_children(node.id), 0 | 2))
    }

    /// Descends along first children until reaching a leaf.
    fn leftmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(child) = self.node(id).first_child() {
            id = child;
        }
        id
    }
}

impl<D> std::ops::Index<NodeId> for Tree<D> {
    type Output = TreeNode<D>;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.node(id)
    }
}

impl<D> std::ops::IndexMut<NodeId> for Tree<D> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.node_mut(id)
    }
}

// ============================================================================
// Iterator constructors (pub)
// ============================================================================
impl<D> Tree<D> {
    /// Returns an iterator over the whole tree in pre-order (parents before children).
    ///
    /// Terminates when the traversal climbs back to the head and steps onto the stop node.
    pub fn preorder_iter(&self) -> PreorderIter<'_, D> {
        PreorderIter {
            tree: self,
            current: self.head,
            end: self.stop,
        }
    }

    /// Returns an iterator over the whole tree in post-order (children before parents).
    ///
    /// The head is visited last.
    pub fn postorder_iter(&self) -> PostorderIter<'_, D> {
        PostorderIter {
            tree: self,
            current: self.leftmost_leaf(self.head),
            top: None,
            end: self.stop,
        }
    }

    /// Returns a post-order iterator restricted to the subtree below `top` (inclusive).
    pub fn postorder_iter_from(&self, top: NodeId) -> PostorderIter<'_, D> {
        PostorderIter {
            tree: self,
            current: self.leftmost_leaf(top),
            top: Some(top),
            end: self.stop,
        }
    }

    /// Returns an iterator over the leaves of the subtree below `top`, left to right.
    ///
    /// If `top` is itself a leaf, it is the only item. This includes the bare
    /// head of an empty tree, so check [Tree::is_empty] when that matters.
    pub fn leaf_iter(&self, top: NodeId) -> LeafIter<'_, D> {
        LeafIter {
            tree: self,
            current: self.leftmost_leaf(top),
            top,
        }
    }

    /// Returns an iterator over the immediate children of `id` in insertion order.
    pub fn children_iter(&self, id: NodeId) -> ChildrenIter<'_, D> {
        ChildrenIter {
            tree: self,
            current: self.node(id).first_child,
        }
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator for pre-order traversal, driven by sibling/parent links (no stack).
pub struct PreorderIter<'a, D> {
    tree: &'a Tree<D>,
    current: NodeId,
    end: NodeId,
}

impl<'a, D> Iterator for PreorderIter<'a, D> {
    type Item = &'a TreeNode<D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.end || self.current == NO_NODE {
            return None;
        }
        let node = self.tree.node(self.current);

        self.current = if node.first_child != NO_NODE {
            node.first_child
        } else {
            // Climb until a node with a sibling; the head's sibling is the end
            let mut climb = node;
            loop {
                if climb.next_sibling != NO_NODE {
                    break climb.next_sibling;
                }
                if climb.parent == NO_NODE {
                    break NO_NODE;
                }
                climb = self.tree.node(climb.parent);
            }
        };

        Some(node)
    }
}

/// Iterator for post-order traversal.
///
/// Starts at the leftmost-deepest descendant. Each step moves to the next
/// sibling's leftmost-deepest descendant if there is a sibling, else to the parent.
pub struct PostorderIter<'a, D> {
    tree: &'a Tree<D>,
    current: NodeId,
    top: Option<NodeId>,
    end: NodeId,
}

impl<'a, D> Iterator for PostorderIter<'a, D> {
    type Item = &'a TreeNode<D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == self.end || self.current == NO_NODE {
            return None;
        }
        let node = self.tree.node(self.current);

        self.current = if Some(node.id) == self.top {
            NO_NODE
        } else if node.next_sibling == self.end {
            // Stepped past the head
            self.end
        } else if node.next_sibling != NO_NODE {
            self.tree.leftmost_leaf(node.next_sibling)
        } else {
            node.parent
        };

        Some(node)
    }
}

/// Iterator over the leaves of a subtree, bounded so it never leaves that subtree.
pub struct LeafIter<'a, D> {
    tree: &'a Tree<D>,
    current: NodeId,
    top: NodeId,
}

impl<'a, D> Iterator for LeafIter<'a, D> {
    type Item = &'a TreeNode<D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NO_NODE {
            return None;
        }
        let leaf = self.tree.node(self.current);

        let mut climb = leaf;
        self.current = loop {
            if climb.id == self.top {
                break NO_NODE;
            }
            if climb.next_sibling != NO_NODE {
                break self.tree.leftmost_leaf(climb.next_sibling);
            }
            if climb.parent == NO_NODE {
                break NO_NODE;
            }
            climb = self.tree.node(climb.parent);
        };

        Some(leaf)
    }
}

/// Iterator over the immediate children of one node.
pub struct ChildrenIter<'a, D> {
    tree: &'a Tree<D>,
    current: NodeId,
}

impl<'a, D> Iterator for ChildrenIter<'a, D> {
    type Item = &'a TreeNode<D>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NO_NODE {
            return None;
        }
        let child = self.tree.node(self.current);
        self.current = child.next_sibling;
        Some(child)
    }
}
