//! Output text normalisation.

/// Remove every trailing `\n` and `\r`.
pub fn eat_trailing_eol(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}
