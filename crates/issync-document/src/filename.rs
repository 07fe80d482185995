//! `<key>-<slug>.md` filename convention.

use issync_types::CanonicalKey;

const MAX_SLUG_LEN: usize = 64;

/// Lowercase `[a-z0-9]+` runs of `summary`, joined by `-`, capped at 64
/// characters, falling back to `"issue"` when nothing survives.
pub fn slugify(summary: &str) -> String {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in summary.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let mut slug = tokens.join("-");
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() { "issue".to_string() } else { slug }
}

/// The canonical `<key>-<slug>.md` filename for an issue.
pub fn issue_filename(key: &CanonicalKey, summary: &str) -> String {
    format!("{}-{}.md", key.as_str(), slugify(summary))
}

/// Extract the leading Canonical-Key prefix from a filename (with or without
/// the `.md` extension), trying the project-scoped form first and falling
/// back to the local-draft form. Returns `None` if neither the first two
/// hyphen-separated components form a valid key.
pub fn parse_filename_key(filename: &str) -> Option<CanonicalKey> {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let mut parts = stem.splitn(3, '-');
    let first = parts.next()?;
    let second = parts.next()?;
    CanonicalKey::parse(&format!("{first}-{second}")).ok()
}
