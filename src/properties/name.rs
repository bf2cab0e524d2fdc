//! Property key normalization.
//!
//! Keys are compared in a canonical form: each dot-separated element is
//! lower-case kebab (`poolSize`, `pool_size` and `pool-size` are the same
//! element) and index suffixes such as `[0]` are kept verbatim.

/// Normalize a dotted/indexed property key into its canonical form.
///
/// ```
/// use ignition::properties::normalize_key;
///
/// assert_eq!(normalize_key("Spring.boot.poolSize"), "spring.boot.pool-size");
/// assert_eq!(normalize_key("server.ssl_key[0]"), "server.ssl-key[0]");
/// ```
pub fn normalize_key(key: &str) -> String {
    let key = key.trim();
    let mut out = String::with_capacity(key.len() + 4);
    let mut in_index = false;
    let mut prev: Option<char> = None;
    let mut chars = key.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '[' => {
                in_index = true;
                out.push(ch);
            }
            ']' => {
                in_index = false;
                out.push(ch);
            }
            _ if in_index => out.push(ch),
            '_' => out.push('-'),
            c if c.is_ascii_uppercase() => {
                let after_word =
                    matches!(prev, Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit());
                // last capital of an acronym run starts the next word: `URLValue`
                let ends_acronym = matches!(prev, Some(p) if p.is_ascii_uppercase())
                    && chars.peek().is_some_and(|next| next.is_ascii_lowercase());
                if after_word || ends_acronym {
                    out.push('-');
                }
                out.push(c.to_ascii_lowercase());
            }
            c => out.push(c),
        }
        prev = Some(ch);
    }
    out
}

/// Key of a member below `prefix`. An empty prefix yields the bare member name.
pub fn child_key(prefix: &str, member: &str) -> String {
    let member = normalize_key(member);
    if prefix.is_empty() {
        member
    } else {
        format!("{prefix}.{member}")
    }
}

/// Key of the `index`-th element of the list stored at `key`.
pub fn indexed_key(key: &str, index: usize) -> String {
    format!("{key}[{index}]")
}

/// Whether `candidate` lies strictly below `prefix` (`prefix.x` or `prefix[n]`).
pub fn is_descendant(prefix: &str, candidate: &str) -> bool {
    if prefix.is_empty() {
        return !candidate.is_empty();
    }
    candidate
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}
