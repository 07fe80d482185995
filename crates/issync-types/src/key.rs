use std::fmt;

/// An issue identity: either a remote project-scoped key (`PROJ-123`) or a
/// local-draft key (`L-1a2b3c`). These are the only two accepted forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalKey(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("invalid issue key: {0:?}")]
    Invalid(String),
}

impl CanonicalKey {
    pub fn parse(raw: &str) -> Result<Self, KeyParseError> {
        if is_remote_key(raw) || is_draft_key(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(KeyParseError::Invalid(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `PROJ-123`-shaped keys assigned by the remote tracker.
    pub fn is_remote(&self) -> bool {
        is_remote_key(&self.0)
    }

    /// True for `L-<hex>`-shaped keys minted locally for unpublished drafts.
    pub fn is_draft(&self) -> bool {
        is_draft_key(&self.0)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CanonicalKey> for String {
    fn from(key: CanonicalKey) -> Self {
        key.0
    }
}

/// `^[A-Z][A-Z0-9]+-[0-9]+$`
fn is_remote_key(raw: &str) -> bool {
    let Some((project, number)) = raw.split_once('-') else {
        return false;
    };
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let mut chars = project.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_uppercase() {
        return false;
    }
    // at least one more char required by `[A-Z][A-Z0-9]+`
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// `^L-[0-9a-f]+$`
fn is_draft_key(raw: &str) -> bool {
    match raw.strip_prefix("L-") {
        Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_remote_key() {
        let key = CanonicalKey::parse("PROJ-123").unwrap();
        assert!(key.is_remote());
        assert!(!key.is_draft());
        assert_eq!(key.as_str(), "PROJ-123");
    }

    #[test]
    fn accepts_draft_key() {
        let key = CanonicalKey::parse("L-1a2b3c").unwrap();
        assert!(key.is_draft());
        assert!(!key.is_remote());
    }

    #[test]
    fn rejects_single_letter_project() {
        assert!(CanonicalKey::parse("P-1").is_err());
    }

    #[test]
    fn rejects_lowercase_project() {
        assert!(CanonicalKey::parse("proj-1").is_err());
    }

    #[test]
    fn rejects_missing_number() {
        assert!(CanonicalKey::parse("PROJ-").is_err());
        assert!(CanonicalKey::parse("PROJ").is_err());
    }

    #[test]
    fn rejects_uppercase_hex_draft() {
        assert!(CanonicalKey::parse("L-1A2B").is_err());
    }

    #[test]
    fn rejects_empty_draft_suffix() {
        assert!(CanonicalKey::parse("L-").is_err());
    }

    #[test]
    fn display_matches_source() {
        let key = CanonicalKey::parse("ABCD-42").unwrap();
        assert_eq!(key.to_string(), "ABCD-42");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = CanonicalKey::parse("PROJ-1").unwrap();
        let b = CanonicalKey::parse("PROJ-2").unwrap();
        assert!(a < b);
    }

    #[test]
    fn roundtrips_through_serde_json() {
        let key = CanonicalKey::parse("PROJ-123").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"PROJ-123\"");
        let back: CanonicalKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn serde_rejects_invalid_key() {
        let err = serde_json::from_str::<CanonicalKey>("\"nope\"").unwrap_err();
        assert!(err.to_string().contains("invalid issue key"));
    }
}
