use treeshrew::model::{GeneTree, NodeId, Tree};
use treeshrew::newick::parse_str;

/// ((A,B),(C,D)) built by hand; returns tree and ids [root, ab, cd, a, b, c, d]
fn balanced_four() -> (Tree<String>, [NodeId; 7]) {
    let mut tree: Tree<String> = Tree::new(4);
    let root = tree.head();
    let ab = tree.allocate_internal_node().unwrap();
    let cd = tree.allocate_internal_node().unwrap();
    let leaves: Vec<NodeId> = (0..4).map(|_| tree.allocate_leaf_node().unwrap()).collect();
    for (&id, label) in leaves.iter().zip(["A", "B", "C", "D"]) {
        *tree.data_mut(id) = label.to_string();
    }
    tree.add_child(root, ab);
    tree.add_child(root, cd);
    tree.add_child(ab, leaves[0]);
    tree.add_child(ab, leaves[1]);
    tree.add_child(cd, leaves[2]);
    tree.add_child(cd, leaves[3]);
    (tree, [root, ab, cd, leaves[0], leaves[1], leaves[2], leaves[3]])
}

/// Caterpillar "((((t0,t1),t2),t3)...);" with `k` leaves
fn caterpillar(k: usize) -> GeneTree {
    let mut newick = "(".repeat(k - 1);
    newick.push_str("t0");
    for i in 1..k {
        newick.push_str(&format!(",t{i}:0.1)"));
    }
    newick.push(';');
    parse_str(&newick).unwrap()
}

// --- TESTS TRAVERSAL ORDERS ---
#[test]
fn test_preorder_visits_parents_first() {
    let (tree, [root, ab, cd, a, b, c, d]) = balanced_four();
    let order: Vec<NodeId> = tree.preorder_iter().map(|n| n.id()).collect();
    assert_eq!(order, vec![root, ab, a, b, cd, c, d]);
}

#[test]
fn test_postorder_visits_children_first() {
    let (tree, [root, ab, cd, a, b, c, d]) = balanced_four();
    let order: Vec<NodeId> = tree.postorder_iter().map(|n| n.id()).collect();
    assert_eq!(order, vec![a, b, ab, c, d, cd, root]);
}

#[test]
fn test_postorder_from_subtree_stays_inside() {
    let (tree, [_, _, cd, _, _, c, d]) = balanced_four();
    let order: Vec<NodeId> = tree.postorder_iter_from(cd).map(|n| n.id()).collect();
    assert_eq!(order, vec![c, d, cd]);
}

#[test]
fn test_leaf_iter_bounded_by_subtree() {
    let (tree, [root, ab, _, a, b, c, d]) = balanced_four();
    let all: Vec<&str> = tree.leaf_iter(root).map(|n| n.data().as_str()).collect();
    assert_eq!(all, vec!["A", "B", "C", "D"]);

    let left: Vec<NodeId> = tree.leaf_iter(ab).map(|n| n.id()).collect();
    assert_eq!(left, vec![a, b]);

    let single: Vec<NodeId> = tree.leaf_iter(c).map(|n| n.id()).collect();
    assert_eq!(single, vec![c]);
    assert_eq!(tree.leaf_iter(d).count(), 1);
}

#[test]
fn test_children_iter_in_insertion_order() {
    let (tree, [root, ab, cd, a, ..]) = balanced_four();
    let children: Vec<NodeId> = tree.children_iter(root).map(|n| n.id()).collect();
    assert_eq!(children, vec![ab, cd]);
    assert_eq!(tree.children_iter(a).count(), 0);
}

#[test]
fn test_traversal_counts_for_binary_trees() {
    for k in [2, 3, 5, 8, 13] {
        let tree = caterpillar(k);
        assert_eq!(tree.postorder_iter().count(), 2 * k - 1, "postorder, k={k}");
        assert_eq!(tree.preorder_iter().count(), 2 * k - 1, "preorder, k={k}");
        assert_eq!(tree.leaf_iter(tree.head()).count(), k, "leaves, k={k}");
        assert_eq!(tree.postorder_iter().last().map(|n| n.id()), Some(tree.head()));
        assert!(tree.is_binary());
    }
}

// --- TESTS STRUCTURE ---
#[test]
fn test_node_links() {
    let (tree, [root, ab, cd, a, b, ..]) = balanced_four();
    assert_eq!(tree.parent(a), Some(ab));
    assert_eq!(tree.parent(ab), Some(root));
    assert_eq!(tree.parent(root), None);
    assert_eq!(tree.next_sibling(a), Some(b));
    assert_eq!(tree.next_sibling(b), None);
    assert_eq!(tree.next_sibling(ab), Some(cd));
    assert_eq!(tree.next_sibling(root), Some(tree.stop()));
    assert_eq!(tree.node(root).first_child(), Some(ab));
    assert_eq!(tree.node(root).last_child(), Some(cd));
    assert_eq!(tree.num_children(root), 2);
    assert_eq!(tree.num_leaves(), 4);
}

#[test]
fn test_tip_and_internal_ids_disjoint() {
    let (tree, ids) = balanced_four();
    let max_tips = tree.max_tips();
    for &leaf in &ids[3..] {
        assert!(leaf < 2 * max_tips);
    }
    for &internal in &ids[..3] {
        assert!(internal >= 2 * max_tips);
    }
}

#[test]
#[should_panic]
fn test_stop_node_not_accessible_mutably() {
    let mut tree: Tree<String> = Tree::new(2);
    let stop = tree.stop();
    tree.node_mut(stop);
}

#[test]
#[should_panic]
fn test_attaching_twice_panics() {
    let mut tree: Tree<String> = Tree::new(2);
    let head = tree.head();
    let inner = tree.allocate_internal_node().unwrap();
    let leaf = tree.allocate_leaf_node().unwrap();
    tree.add_child(head, leaf);
    tree.add_child(inner, leaf);
}

#[test]
fn test_leaf_arena_exhaustion_is_an_error() {
    let mut tree: Tree<String> = Tree::new(1);
    tree.allocate_leaf_node().unwrap();
    tree.allocate_leaf_node().unwrap();
    assert!(matches!(
        tree.allocate_leaf_node(),
        Err(treeshrew::Error::ArenaExhausted { capacity: 2 })
    ));
}

// --- TESTS GENE TREE DATA ---
#[test]
fn test_set_edge_length_marks_path_dirty() {
    let mut tree = parse_str("((A:0.1,B:0.2):0.3,(C:0.1,D:0.1):0.2);").unwrap();
    tree.clear_dirty();
    let a = tree.find_leaf("A").unwrap();
    let c = tree.find_leaf("C").unwrap();

    tree.set_edge_length(a, 0.5);
    assert_eq!(tree.data(a).edge_length(), 0.5);
    assert!(tree.data(a).is_dirty());
    assert!(tree.data(tree.parent(a).unwrap()).is_dirty());
    assert!(tree.data(tree.head()).is_dirty());
    assert!(!tree.data(c).is_dirty());
    assert!(!tree.data(tree.parent(c).unwrap()).is_dirty());
}

#[test]
fn test_gene_node_indices_match_ids() {
    let tree = parse_str("((A:0.1,B:0.2):0.3,C:0.4);").unwrap();
    for node in tree.preorder_iter() {
        assert_eq!(node.data().index(), node.id());
    }
    assert!((tree.total_edge_length() - 1.0).abs() < 1e-12);
}
