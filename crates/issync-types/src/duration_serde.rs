//! A dual string-or-millis duration (de)serializer, so `config.json` can
//! write either `"30s"` or `30000` for the same field.
//!
//! `issync-lock` and `issync-retry` predate this helper and keep their own
//! string-only `humantime_serde` convention; this module exists for
//! `SyncConfig`'s own duration fields (see `issync-config`), which need
//! to accept both forms.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    (duration.as_millis() as u64).serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrMillis {
        String(String),
        Millis(u64),
    }

    match StringOrMillis::deserialize(deserializer)? {
        StringOrMillis::String(s) => {
            humantime::parse_duration(&s).map_err(|e| serde::de::Error::custom(format!("invalid duration {s:?}: {e}")))
        }
        StringOrMillis::Millis(ms) => Ok(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Wrapper {
        #[serde(with = "crate::duration_serde")]
        value: Duration,
    }

    #[test]
    fn deserializes_humantime_string() {
        let w: Wrapper = serde_json::from_str(r#"{"value":"30s"}"#).unwrap();
        assert_eq!(w.value, Duration::from_secs(30));
    }

    #[test]
    fn deserializes_millis_number() {
        let w: Wrapper = serde_json::from_str(r#"{"value":30000}"#).unwrap();
        assert_eq!(w.value, Duration::from_secs(30));
    }

    #[test]
    fn serializes_as_millis() {
        let json = serde_json::to_string(&Wrapper { value: Duration::from_secs(2) }).unwrap();
        assert_eq!(json, r#"{"value":2000}"#);
    }

    #[test]
    fn rejects_garbage_string() {
        let err = serde_json::from_str::<Wrapper>(r#"{"value":"not a duration"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }
}
