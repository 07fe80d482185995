//! String-replace known secrets with a fixed placeholder.
//!
//! The transport adapter registers the API token, the base64 `email:token`
//! composite, and the full `Authorization` header value as secrets before
//! constructing any error message, so none of them can leak through a
//! propagated error string.

/// The fixed placeholder every matched secret is replaced with.
pub const PLACEHOLDER: &str = "[REDACTED]";

/// A deduped, trimmed, non-empty set of secret strings to scrub from text.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new() -> Self {
        Self { secrets: Vec::new() }
    }

    /// Register a secret. Empty and whitespace-only values are ignored;
    /// duplicates (after trimming) are not added twice.
    pub fn add_secret(&mut self, secret: impl AsRef<str>) {
        let trimmed = secret.as_ref().trim();
        if trimmed.is_empty() {
            return;
        }
        if !self.secrets.iter().any(|s| s == trimmed) {
            self.secrets.push(trimmed.to_string());
        }
    }

    pub fn with_secret(mut self, secret: impl AsRef<str>) -> Self {
        self.add_secret(secret);
        self
    }

    /// Replace every occurrence of every registered secret in `text` with
    /// [`PLACEHOLDER`]. Longer secrets are matched first so that one secret
    /// being a substring of another (e.g. a token inside the `email:token`
    /// composite) does not leave a partial match behind.
    pub fn redact(&self, text: &str) -> String {
        if self.secrets.is_empty() {
            return text.to_string();
        }
        let mut ordered = self.secrets.clone();
        ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));

        let mut out = text.to_string();
        for secret in &ordered {
            out = out.replace(secret.as_str(), PLACEHOLDER);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }
}
