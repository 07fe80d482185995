use std::collections::BTreeSet;

/// `sort(dedup(lowercase(trim(x))))` over a raw label list. Empty tokens
/// (after trimming) are dropped rather than rendered as `""`.
pub fn canonical_labels<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Trim, then title-case: uppercase the first character, lowercase the rest.
/// `"  HIGH "` renders as `"High"`.
pub fn title_case(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_labels_dedupes_and_lowercases_and_sorts() {
        let labels = canonical_labels(["Bug", "p1", "bug"]);
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["bug".to_string(), "p1".to_string()]);
    }

    #[test]
    fn canonical_labels_drops_blank_tokens() {
        let labels = canonical_labels(["  ", "x"]);
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["x".to_string()]);
    }

    #[test]
    fn title_case_normalizes_shouting_and_whitespace() {
        assert_eq!(title_case("  HIGH "), "High");
    }

    #[test]
    fn title_case_handles_already_mixed_case() {
        assert_eq!(title_case("hIGHEST"), "Highest");
    }

    #[test]
    fn title_case_of_empty_is_empty() {
        assert_eq!(title_case("   "), "");
    }
}
