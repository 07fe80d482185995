use std::collections::BTreeMap;

/// One cache record: where the issue file lives, its bucket, and the last
/// remote `updated` timestamp observed (opaque string, not parsed).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    pub path: String,
    pub status: String,
    pub remote_updated_at: Option<String>,
}

/// `cache.json`: a `version`-tagged, key-ordered map persisted pretty-printed.
/// `BTreeMap` gives the needed deterministic key order for free.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cache {
    pub version: String,
    pub issues: BTreeMap<String, CacheEntry>,
}

impl Cache {
    pub const SCHEMA_VERSION: &'static str = "1";

    pub fn new() -> Self {
        Self { version: Self::SCHEMA_VERSION.to_string(), issues: BTreeMap::new() }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
