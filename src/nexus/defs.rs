//! NEXUS keywords read by the block reader and emitted by the PAUP validation writer.

/// Ends a taxon label or an argument value inside a command
pub(crate) const NEXUS_LABEL_DELIMITERS: &[u8] = b" ,;=\t\n\r[";

/// Ends a command or block name
pub(crate) const NEXUS_WORD_DELIMITERS: &[u8] = b" ,;=\t\n\r[*";

/// NEXUS file header "#NEXUS"
pub(crate) const NEXUS_HEADER: &[u8] = b"#NEXUS";

/// Block begin keyword "Begin"
pub(crate) const BLOCK_BEGIN: &[u8] = b"Begin";

/// Block end keyword "End;" (with semicolon)
pub(crate) const BLOCK_END: &[u8] = b"End;";

// Taxa block
pub(crate) const TAXA: &[u8] = b"taxa;";

pub(crate) const DIMENSIONS: &[u8] = b"Dimensions";

pub(crate) const NTAX: &[u8] = b"ntax";

pub(crate) const TAXLABELS: &[u8] = b"Taxlabels";

// Characters block
pub(crate) const CHARACTERS: &[u8] = b"characters;";

pub(crate) const NCHAR: &[u8] = b"nchar";

/// Format command matching the symbols written by the state table
pub(crate) const DNA_FORMAT: &[u8] = b"Format datatype=dna gap=- missing=? matchchar=.;";

pub(crate) const MATRIX: &[u8] = b"Matrix";

// Trees block
pub(crate) const TREES: &[u8] = b"trees;";

/// Name of the single user tree
pub(crate) const USER_TREE: &[u8] = b"tree 1 =";

// PAUP blocks
pub(crate) const PAUP: &[u8] = b"paup;";

/// Keeps user branch lengths and silences root/reset warnings
pub(crate) const PAUP_SETTINGS: &[&[u8]] = &[b"set storebr;", b"set warnreset=no warnroot=no;"];

/// Jukes-Cantor likelihood score of the user tree with its own branch lengths
pub(crate) const PAUP_JC_SCORE: &[&[u8]] = &[
    b"set crit=likelihood;",
    b"lset userbr nst=1 basefreq=equal rates=equal pinvar=0;",
    b"lscore;",
];
