//! Label escaping for Newick and NEXUS output.

/// Bytes that force a label into single quotes.
const SPECIAL_CHARS: &[char] = &[',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\''];

/// Checks if a label is enclosed in single quotes.
pub fn is_single_quoted(label: &str) -> bool {
    label.len() >= 2 && label.starts_with('\'') && label.ends_with('\'')
}

/// Checks if a label can be written verbatim:
/// - wrapped in single quotes with every internal single quote doubled, or
/// - free of spaces and special characters
///
/// # Examples
/// ```
/// # use treeshrew::parser::utils::is_escaped;
/// assert!(is_escaped("Tupaia_belangeri"));
/// assert!(is_escaped("'Tupaia belangeri'"));
/// assert!(!is_escaped("Tupaia belangeri"));
/// assert!(!is_escaped("'Belanger's treeshrew'"));
/// ```
pub fn is_escaped(label: &str) -> bool {
    if is_single_quoted(label) {
        let inner = &label[1..label.len() - 1];
        // Quotes must come in pairs
        inner
            .split("''")
            .all(|part| !part.contains('\''))
    } else {
        !label.contains(' ') && !label.contains(SPECIAL_CHARS)
    }
}

/// Escapes a label for Newick and NEXUS output.
///
/// Labels with special characters are wrapped in single quotes with internal
/// quotes doubled; spaces in otherwise plain labels become underscores.
/// Already escaped labels are returned unchanged.
///
/// # Examples
/// ```
/// # use treeshrew::parser::utils::escape_label;
/// assert_eq!(escape_label("Tupaia belangeri"), "Tupaia_belangeri");
/// assert_eq!(escape_label("T(belangeri)"), "'T(belangeri)'");
/// assert_eq!(escape_label("Belanger's"), "'Belanger''s'");
/// ```
pub fn escape_label(label: &str) -> String {
    if is_escaped(label) {
        return label.to_string();
    }

    if label.contains(SPECIAL_CHARS) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.replace(' ', "_")
    }
}
