use std::fs::File;
use std::io;
use treeshrew::error::fatal;
use treeshrew::state_space::{DEFAULT_MAX_SEQUENCES, DEFAULT_MAX_SITES};
use treeshrew::StateSpace;

const USAGE: &str = "Usage: treeshrew <TREE-FILE> <ALIGNMENT-FILE> [FORMAT]";

/// Scores a Newick tree against an alignment (FASTA unless FORMAT says otherwise),
/// writes a PAUP* validation file to stderr and the log-likelihood to stdout.
fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .format_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (tree_path, alignment_path, format) = match args.as_slice() {
        [tree, alignment] => (tree, alignment, "fasta"),
        [tree, alignment, format] => (tree, alignment, format.as_str()),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let result = run(tree_path, alignment_path, format);
    match result {
        Ok(ln_probability) => println!("{ln_probability:.12}"),
        Err(err) => fatal(err),
    }
}

fn run(tree_path: &str, alignment_path: &str, format: &str) -> treeshrew::Result<f64> {
    let mut state_space = StateSpace::new(DEFAULT_MAX_SEQUENCES, DEFAULT_MAX_SITES);
    state_space.initialize_with_tree_and_alignment(
        File::open(tree_path)?,
        File::open(alignment_path)?,
        "newick",
        format,
    )?;
    state_space.write_phylogenetic_data(io::stderr())?;
    state_space.calc_ln_probability()
}
