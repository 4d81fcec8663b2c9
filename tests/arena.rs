use treeshrew::model::arena::{ArenaSlot, NodeArena};
use treeshrew::model::GeneTree;
use treeshrew::newick::NewickParser;
use treeshrew::parser::byte_parser::ByteParser;

#[derive(Default)]
struct Record {
    index: usize,
    payload: Vec<u8>,
}

impl ArenaSlot for Record {
    fn assign_index(&mut self, index: usize) {
        self.index = index;
    }

    fn reset(&mut self) {
        self.payload.clear();
    }
}

#[test]
fn test_disjoint_arenas() {
    let mut leaves: NodeArena<Record> = NodeArena::new(4, 0);
    let mut internals: NodeArena<Record> = NodeArena::new(5, 4);

    let leaf_ids: Vec<usize> = (0..4).map(|_| leaves.allocate().unwrap()).collect();
    let internal_ids: Vec<usize> = (0..5).map(|_| internals.allocate().unwrap()).collect();
    assert_eq!(leaf_ids, vec![0, 1, 2, 3]);
    assert_eq!(internal_ids, vec![4, 5, 6, 7, 8]);
    assert!(leaves.allocate().is_err());
    assert!(internals.allocate().is_err());
}

#[test]
fn test_released_slot_is_cleared_and_reused() {
    let mut arena: NodeArena<Record> = NodeArena::new(3, 10);
    let first = arena.allocate().unwrap();
    let second = arena.allocate().unwrap();
    arena.get_mut(second).payload.extend_from_slice(b"ACGT");

    arena.deallocate(second);
    assert!(!arena.is_allocated(second));
    assert!(arena.is_allocated(first));
    assert!(arena.get(second).payload.is_empty());
    assert_eq!(arena.get(second).index, second);
    assert_eq!(arena.allocate().unwrap(), second);
}

#[test]
#[should_panic]
fn test_foreign_index_panics() {
    let arena: NodeArena<Record> = NodeArena::new(3, 10);
    arena.get(3);
}

#[test]
fn test_rebuilding_tree_does_not_exhaust_arenas() {
    let mut tree = GeneTree::new(4);
    let mut parser = NewickParser::new().with_max_tips(4);
    for round in 0..50 {
        let newick = if round % 2 == 0 {
            "((A:0.1,B:0.1):0.1,(C:0.1,D:0.1):0.1);"
        } else {
            "(((A:0.1,B:0.1):0.1,C:0.1):0.1,D:0.1);"
        };
        let mut byte_parser = ByteParser::for_str(newick);
        parser.parse_into(&mut byte_parser, &mut tree).unwrap();
        assert_eq!(tree.node_count(), 7);
        assert_eq!(tree.num_leaves(), 4);
    }
}
