use treeshrew::character::state::get_partials_from_state;
use treeshrew::character::{NucleotideAlignment, NucleotideSequence};
use treeshrew::likelihood::model::jc_transition_probability;
use treeshrew::likelihood::{EngineConfig, EngineState, LikelihoodEngine};
use treeshrew::model::{GeneTree, NodeId};
use treeshrew::newick::parse_str;
use treeshrew::Error;

const BALANCED: &str = "((A:0.1,B:0.2):0.05,(C:0.15,D:0.3):0.1);";
const DATA: &[(&str, &str)] = &[
    ("A", "ACGTACGTTAGCRA"),
    ("B", "ACGTACGATAGCAN"),
    ("C", "ACTTACGTTCGCGA"),
    ("D", "GCTTACGTTCGAG-"),
];

fn bind(tree: &GeneTree, data: &[(&str, &str)]) -> NucleotideAlignment {
    let num_sites = data.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
    let mut alignment = NucleotideAlignment::new(tree.max_tips(), num_sites);
    for &(label, symbols) in data {
        let leaf = tree.find_leaf(label).unwrap();
        let source = NucleotideSequence::from_symbols(label, symbols).unwrap();
        alignment.new_sequence(leaf, label, Some(&source)).unwrap();
    }
    alignment
}

fn engine_for(tree: &GeneTree, alignment: &NucleotideAlignment, config: EngineConfig) -> LikelihoodEngine {
    let mut engine = LikelihoodEngine::new(tree.max_tips(), config);
    engine.create_instance(alignment.num_active_sites()).unwrap();
    engine.set_tip_data(tree, alignment).unwrap();
    engine
}

/// Textbook Felsenstein pruning, one site at a time
fn prune(tree: &GeneTree, alignment: &NucleotideAlignment, id: NodeId, site: usize) -> [f64; 4] {
    if tree.is_leaf(id) {
        let state = alignment.active_states(id).unwrap()[site];
        return *get_partials_from_state(state).unwrap();
    }
    let mut partials = [1.0; 4];
    for child in tree.children_iter(id) {
        let below = prune(tree, alignment, child.id(), site);
        let t = child.data().edge_length();
        for (parent_state, value) in partials.iter_mut().enumerate() {
            let sum: f64 = (0..4)
                .map(|s| jc_transition_probability(parent_state == s, t) * below[s])
                .sum();
            *value *= sum;
        }
    }
    partials
}

fn reference_ln_likelihood(tree: &GeneTree, alignment: &NucleotideAlignment) -> f64 {
    (0..alignment.num_active_sites())
        .map(|site| {
            let root = prune(tree, alignment, tree.head(), site);
            (root.iter().sum::<f64>() * 0.25).ln()
        })
        .sum()
}

fn assert_close(actual: f64, expected: f64) {
    let relative = ((actual - expected) / expected).abs();
    assert!(relative < 1e-6, "{actual} vs {expected} (relative error {relative})");
}

// --- TESTS AGAINST REFERENCE ---
#[test]
fn test_four_taxon_matches_felsenstein_pruning() {
    let mut tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&tree, DATA);
    let mut engine = engine_for(&tree, &alignment, EngineConfig::default());

    let ln_l = engine.calc_ln_probability(&mut tree).unwrap();
    assert!(ln_l.is_finite());
    assert!(ln_l < 0.0);
    assert_close(ln_l, reference_ln_likelihood(&tree, &alignment));
    assert_eq!(engine.state(), EngineState::Scored);
}

#[test]
fn test_two_taxon_closed_form() {
    let mut tree = parse_str("(A:0.1,B:0.25);").unwrap();
    let alignment = bind(&tree, &[("A", "AC"), ("B", "AG")]);
    let mut engine = engine_for(&tree, &alignment, EngineConfig::default());

    let t = 0.35;
    let expected = (0.25 * jc_transition_probability(true, t)).ln()
        + (0.25 * jc_transition_probability(false, t)).ln();
    assert_close(engine.calc_ln_probability(&mut tree).unwrap(), expected);
}

#[test]
fn test_compact_states_equal_partials_without_ambiguity() {
    let data = &[("A", "ACGTT"), ("B", "ACGAT"), ("C", "CCGTA"), ("D", "ACTTA")];
    let mut tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&tree, data);

    let mut partials = engine_for(&tree, &alignment, EngineConfig::default());
    let compact_config = EngineConfig {
        use_tip_partials: false,
        ..EngineConfig::default()
    };
    let mut compact = engine_for(&tree, &alignment, compact_config);

    let a = partials.calc_ln_probability(&mut tree).unwrap();
    let b = compact.calc_ln_probability(&mut tree).unwrap();
    assert_close(a, b);
}

// --- TESTS RESCORING ---
#[test]
fn test_rescoring_is_deterministic() {
    let mut tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&tree, DATA);
    let mut engine = engine_for(&tree, &alignment, EngineConfig::default());

    let first = engine.calc_ln_probability(&mut tree).unwrap();
    let second = engine.calc_ln_probability(&mut tree).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rescoring_after_edge_change() {
    let mut tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&tree, DATA);
    let mut engine = engine_for(&tree, &alignment, EngineConfig::default());

    let before = engine.calc_ln_probability(&mut tree).unwrap();
    let c = tree.find_leaf("C").unwrap();
    tree.set_edge_length(c, 0.8);
    let after = engine.calc_ln_probability(&mut tree).unwrap();
    assert_ne!(before, after);
    assert_close(after, reference_ln_likelihood(&tree, &alignment));
}

#[test]
fn test_incremental_matches_full_recomputation() {
    let mut full_tree = parse_str(BALANCED).unwrap();
    let mut incremental_tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&full_tree, DATA);

    let mut full = engine_for(&full_tree, &alignment, EngineConfig::default());
    let incremental_config = EngineConfig {
        incremental: true,
        ..EngineConfig::default()
    };
    let mut incremental = engine_for(&incremental_tree, &alignment, incremental_config);

    for (label, length) in [("A", 0.4), ("D", 0.01), ("B", 1.2), ("A", 0.05)] {
        let a = full_tree.find_leaf(label).unwrap();
        let b = incremental_tree.find_leaf(label).unwrap();
        full_tree.set_edge_length(a, length);
        incremental_tree.set_edge_length(b, length);

        let expected = full.calc_ln_probability(&mut full_tree).unwrap();
        let actual = incremental.calc_ln_probability(&mut incremental_tree).unwrap();
        assert_close(actual, expected);
        assert!(incremental_tree.preorder_iter().all(|n| !n.data().is_dirty()));
    }
}

// --- TESTS FAILURES ---
#[test]
fn test_scoring_needs_tips() {
    let mut tree = parse_str(BALANCED).unwrap();
    let mut engine: LikelihoodEngine = LikelihoodEngine::new(tree.max_tips(), EngineConfig::default());
    engine.create_instance(4).unwrap();
    assert!(matches!(
        engine.calc_ln_probability(&mut tree),
        Err(Error::InvalidEngineState { state: "ready", .. })
    ));
}

#[test]
fn test_unbound_leaf_rejected() {
    let tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&tree, &DATA[..3]);
    let mut engine: LikelihoodEngine = LikelihoodEngine::new(tree.max_tips(), EngineConfig::default());
    engine.create_instance(alignment.num_active_sites()).unwrap();
    let d = tree.find_leaf("D").unwrap();
    assert!(matches!(
        engine.set_tip_data(&tree, &alignment),
        Err(Error::NodeNotBound(id)) if id == d
    ));
}

#[test]
fn test_multifurcation_rejected() {
    let mut tree = GeneTree::new(3);
    let head = tree.head();
    let mut alignment = NucleotideAlignment::new(3, 2);
    for label in ["A", "B", "C"] {
        let leaf = tree.allocate_leaf_node().unwrap();
        tree.add_child(head, leaf);
        tree.data_mut(leaf).set_label(label);
        let source = NucleotideSequence::from_symbols(label, "AC").unwrap();
        alignment.new_sequence(leaf, label, Some(&source)).unwrap();
    }
    let mut engine = engine_for(&tree, &alignment, EngineConfig::default());
    assert!(matches!(
        engine.calc_ln_probability(&mut tree),
        Err(Error::InvalidTreeArity { children: 3, .. })
    ));
}

#[test]
fn test_disposed_engine_rejects_work() {
    let mut tree = parse_str(BALANCED).unwrap();
    let alignment = bind(&tree, DATA);
    let mut engine = engine_for(&tree, &alignment, EngineConfig::default());
    engine.dispose().unwrap();
    assert!(engine.calc_ln_probability(&mut tree).is_err());
    assert!(engine.set_tip_data(&tree, &alignment).is_err());
}
