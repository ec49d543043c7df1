//! Filename sanitization for species, method, and solvent names.
//!
//! Method and species names come from user configuration and routinely
//! contain shell metacharacters (`B3LYP-D3(BJ)`, `6-31+G*`, `CPCM,water`).
//! Every name that ends up in a path goes through [`sanitize`]; reports
//! reverse the mapping with [`desanitize`] so humans read the original
//! spelling.

static ESCAPE_MAP: &[(&str, &str)] = &[
    (" ", "-space-"),
    ("(", "-lparen-"),
    (")", "-rparen-"),
    ("[", "-lbracket-"),
    ("]", "-rbracket-"),
    ("{", "-lbrace-"),
    ("}", "-rbrace-"),
    (",", "-comma-"),
    (";", "-semicolon-"),
    ("*", "-asterisk-"),
    ("?", "-qmark-"),
    ("&", "-and-"),
    ("|", "-pipe-"),
    ("<", "-lt-"),
    (">", "-gt-"),
    ("\"", "-dq-"),
    ("'", "-sq-"),
    ("\\", "-backslash-"),
    (":", "-colon-"),
    ("$", "-dollar-"),
    ("~", "-tilde-"),
    ("!", "-exclamation-"),
    ("=", "-equal-"),
    ("\t", "-tab-"),
    ("\n", "-newline-"),
];

/// Replaces every unsafe character with its named escape and trims leading
/// and trailing underscores.
pub fn sanitize(name: &str) -> String {
    let mut out = name.to_owned();
    for (raw, escaped) in ESCAPE_MAP {
        if out.contains(raw) {
            out = out.replace(raw, escaped);
        }
    }
    out.trim_matches('_').to_owned()
}

/// Reverses [`sanitize`] for display purposes.
pub fn desanitize(name: &str) -> String {
    let mut out = name.to_owned();
    for (raw, escaped) in ESCAPE_MAP {
        if out.contains(escaped) {
            out = out.replace(escaped, raw);
        }
    }
    out
}
