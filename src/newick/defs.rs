//! Constants for reading and writing Newick strings.

/// Newick label delimiters: parentheses, brackets, comma, colon, semicolon, whitespace
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b"([,:; \n\t\r)]";

/// Rooted-tree marker written in front of every tree
pub(crate) const ROOTED_MARKER: &str = "[&R] ";

/// Rough characters per node when estimating output length ("(,)" or label plus ":0.0123")
pub(crate) const CHARS_PER_NODE: usize = 12;
