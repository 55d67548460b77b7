//! String normalization used to compare spoken queries with file names.

/// Collapse `s` into a search key: ASCII letters and digits lower-cased,
/// `-` kept, other ASCII dropped, non-ASCII characters copied verbatim.
///
/// The output only contains characters this function keeps unchanged, so
/// applying it twice yields the same string.
pub fn normalize_for_search(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || !c.is_ascii() {
            out.push(c);
        }
    }
    out
}

/// Like [`normalize_for_search`] but every run of dropped characters becomes
/// a single space, so token boundaries survive. No leading or trailing space.
pub fn normalize_for_token(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        let keep = if c.is_ascii_alphanumeric() {
            Some(c.to_ascii_lowercase())
        } else if c == '-' || !c.is_ascii() {
            Some(c)
        } else {
            None
        };
        match keep {
            Some(k) => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(k);
            }
            None => pending_space = true,
        }
    }
    out
}

/// Split a token-normalized string into its tokens.
pub fn tokens(token_normalized: &str) -> impl Iterator<Item = &str> {
    token_normalized.split(' ').filter(|t| !t.is_empty())
}
