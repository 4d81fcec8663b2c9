use std::fs::File;
use std::path::{Path, PathBuf};
use treeshrew::character::MismatchModel;
use treeshrew::seqio::read_sequences;
use treeshrew::{Error, StateSpace, StateSpaceBuilder};

fn fixture(name: &str) -> PathBuf {
    Path::new("tests").join("fixtures").join(name)
}

fn open(name: &str) -> File {
    File::open(fixture(name)).unwrap()
}

fn initialized(alignment: &str, format: &str) -> StateSpace {
    let mut state_space = StateSpace::new(10, 100);
    state_space
        .initialize_with_tree_and_alignment(open("four_taxa.nwk"), open(alignment), "newick", format)
        .unwrap();
    state_space
}

// --- TESTS INITIALIZATION ---
#[test]
fn test_initialize_binds_every_leaf() {
    let state_space = initialized("four_taxa.fasta", "fasta");
    let tree = state_space.gene_tree().unwrap();
    let alignment = state_space.alignment();

    assert_eq!(tree.num_leaves(), 4);
    assert_eq!(tree.max_tips(), 10);
    assert_eq!(alignment.num_bound(), 4);
    assert_eq!(alignment.num_active_sites(), 14);
    for leaf in tree.leaf_iter(tree.head()) {
        let row = alignment.sequence(leaf.id()).unwrap();
        assert_eq!(row.label(), leaf.data().label());
    }
}

#[test]
fn test_fasta_and_phylip_score_identically() {
    let mut from_fasta = initialized("four_taxa.fasta", "fasta");
    let mut from_phylip = initialized("four_taxa.phy", "dnaphylip");
    let a = from_fasta.calc_ln_probability().unwrap();
    let b = from_phylip.calc_ln_probability().unwrap();
    assert!(a.is_finite() && a < 0.0);
    assert_eq!(a, b);
}

#[test]
fn test_nexus_session_scores_like_newick_and_fasta() {
    let mut from_fasta = initialized("four_taxa.fasta", "fasta");
    let mut from_nexus = StateSpace::new(10, 100);
    from_nexus
        .initialize_with_tree_and_alignment(open("four_taxa.nex"), open("four_taxa.nex"), "nexus", "NEXUS")
        .unwrap();

    let tree = from_nexus.gene_tree().unwrap();
    assert!(tree.find_leaf("Ptilocercus").is_some());
    assert_eq!(from_nexus.alignment().num_active_sites(), 14);
    assert_eq!(
        from_nexus.calc_ln_probability().unwrap(),
        from_fasta.calc_ln_probability().unwrap()
    );
}

#[test]
fn test_rescoring_through_session() {
    let mut state_space = StateSpaceBuilder::new()
        .with_max_sequences(4)
        .with_max_sites(20)
        .with_incremental_rescoring(true)
        .build();
    state_space
        .initialize_with_tree_and_alignment(open("four_taxa.nwk"), open("four_taxa.fasta"), "newick", "fasta")
        .unwrap();

    let first = state_space.calc_ln_probability().unwrap();
    assert_eq!(state_space.calc_ln_probability().unwrap(), first);

    let homo = state_space.gene_tree().unwrap().find_leaf("Homo").unwrap();
    state_space.set_edge_length(homo, 2.0).unwrap();
    let changed = state_space.calc_ln_probability().unwrap();
    assert!(changed.is_finite());
    assert_ne!(changed, first);
}

#[test]
fn test_missing_sequence_for_leaf() {
    let mut state_space = StateSpace::new(10, 100);
    let fasta = ">Tupaia\nACGT\n>Homo\nACGT\n>Mus\nACGT\n";
    let result = state_space.initialize_with_tree_and_alignment(
        open("four_taxa.nwk"),
        fasta.as_bytes(),
        "newick",
        "fasta",
    );
    assert!(matches!(result, Err(Error::MissingSequence(label)) if label == "Ptilocercus"));
}

#[test]
fn test_tree_source_must_hold_one_tree() {
    let mut state_space = StateSpace::new(10, 100);
    let result = state_space.initialize_with_tree_and_alignment(
        open("two_trees.nwk"),
        open("four_taxa.fasta"),
        "newick",
        "fasta",
    );
    assert!(matches!(result, Err(Error::MultipleTrees(2))));

    let result = state_space.initialize_with_tree_and_alignment(
        "  \n".as_bytes(),
        open("four_taxa.fasta"),
        "newick",
        "fasta",
    );
    assert!(matches!(result, Err(Error::EmptyTreeSource)));
}

#[test]
fn test_alignment_wider_than_capacity() {
    let mut state_space = StateSpace::new(10, 8);
    let result = state_space.initialize_with_tree_and_alignment(
        open("four_taxa.nwk"),
        open("four_taxa.fasta"),
        "newick",
        "fasta",
    );
    assert!(matches!(result, Err(Error::SequenceTooLong { len: 14, max: 8 })));
}

#[test]
fn test_uninitialized_session() {
    let mut state_space = StateSpace::new(4, 10);
    assert!(matches!(state_space.calc_ln_probability(), Err(Error::NoGeneTree)));
    assert!(matches!(state_space.calc_ln_probability_of_short_reads(0.01), Err(Error::NoGeneTree)));
    assert!(state_space.write_phylogenetic_data(Vec::new()).is_err());
}

// --- TESTS SHORT READS ---
#[test]
fn test_short_read_score_sums_over_leaves() {
    let mut state_space = initialized("four_taxa.fasta", "fasta");
    assert_eq!(state_space.load_short_reads(open("reads.fasta"), "fasta").unwrap(), 3);
    assert_eq!(state_space.short_reads().len(), 3);

    let rate = 0.05;
    let score = state_space.calc_ln_probability_of_short_reads(rate).unwrap();

    let tree = state_space.gene_tree().unwrap();
    let alignment = state_space.alignment();
    let expected: f64 = state_space
        .short_reads()
        .iter()
        .map(|read| {
            tree.leaf_iter(tree.head())
                .map(|leaf| {
                    let reference = alignment.active_states(leaf.id()).unwrap();
                    read.calc_probability_of_sequence(reference, rate).unwrap()
                })
                .sum::<f64>()
                .ln()
        })
        .sum();
    assert!(score.is_finite());
    assert!((score - expected).abs() < 1e-12);
}

#[test]
fn test_poisson_short_read_model() {
    let mut state_space = StateSpaceBuilder::new()
        .with_max_sequences(4)
        .with_max_sites(20)
        .with_mismatch_model(MismatchModel::Poisson { errors_per_site: 0.01 })
        .build();
    state_space
        .initialize_with_tree_and_alignment(open("four_taxa.nwk"), open("four_taxa.fasta"), "newick", "fasta")
        .unwrap();
    state_space.load_short_reads(open("reads.fasta"), "fasta").unwrap();
    let score = state_space.calc_ln_probability_of_short_reads(0.5).unwrap();
    assert!(score.is_finite());
}

// --- TESTS OUTPUT & TEARDOWN ---
#[test]
fn test_write_phylogenetic_data() {
    let state_space = initialized("four_taxa.fasta", "fasta");
    let mut out = Vec::new();
    state_space.write_phylogenetic_data(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\t\tTupaia\tACGTACGTTAGCRA\n"));
    assert!(text.contains("\t\tMus\tGCTTACGTTCGAG-\n"));
}

#[test]
fn test_dispose_and_reinitialize() {
    let mut state_space = initialized("four_taxa.fasta", "fasta");
    let first = state_space.calc_ln_probability().unwrap();

    state_space.dispose_gene_tree().unwrap();
    assert!(state_space.gene_tree().is_none());
    assert!(state_space.engine().is_none());
    assert_eq!(state_space.alignment().num_bound(), 0);
    state_space.dispose_alignment();
    assert_eq!(state_space.alignment().num_active_sites(), 0);

    state_space
        .initialize_with_tree_and_alignment(open("four_taxa.nwk"), open("four_taxa.fasta"), "newick", "fasta")
        .unwrap();
    assert_eq!(state_space.calc_ln_probability().unwrap(), first);
}

// --- TESTS SEQUENCE READERS ---
#[test]
fn test_sequence_format_tags() {
    for tag in ["phylip", "DNAPHYLIP", "rnaphylip"] {
        let sequences = read_sequences(open("four_taxa.phy"), tag).unwrap();
        assert_eq!(sequences.len(), 4);
    }
    assert!(matches!(
        read_sequences(open("four_taxa.fasta"), "nexml"),
        Err(Error::UnsupportedFormat(_))
    ));

    let from_nexus = read_sequences(open("four_taxa.nex"), "nexus").unwrap();
    let from_fasta = read_sequences(open("four_taxa.fasta"), "fasta").unwrap();
    assert_eq!(from_nexus.len(), 4);
    for sequence in from_fasta.iter() {
        assert_eq!(from_nexus.get(sequence.label()).unwrap().states(), sequence.states());
    }
}
