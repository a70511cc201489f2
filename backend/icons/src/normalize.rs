//! Food name normalization.

/// Normalize a raw food name into a cache key: lower-case, trim, collapse
/// internal whitespace, strip everything outside alphanumerics, whitespace
/// and hyphens. Deterministic and idempotent.
pub fn normalize(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Naive singular/plural variants of a normalized name, so near-duplicate
/// menu spellings ("dumpling" / "dumplings") share one icon.
pub fn name_variants(normalized: &str) -> Vec<String> {
    let mut variants = Vec::new();
    if let Some(stripped) = normalized.strip_suffix('s') {
        if !stripped.is_empty() {
            variants.push(stripped.to_string());
        }
    } else if !normalized.is_empty() {
        variants.push(format!("{normalized}s"));
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_case_whitespace_and_punctuation() {
        assert_eq!(normalize("Caesar   Salad!!"), normalize("caesar salad"));
        assert_eq!(normalize("Caesar   Salad!!"), "caesar salad");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize("  Pad   Thai (Spicy!)  ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn keeps_hyphens_and_digits() {
        assert_eq!(normalize("7-Up"), "7-up");
    }

    #[test]
    fn empty_and_symbol_only_names_collapse_to_empty() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn variants_toggle_trailing_s() {
        assert_eq!(name_variants("dumplings"), vec!["dumpling".to_string()]);
        assert_eq!(name_variants("dumpling"), vec!["dumplings".to_string()]);
        assert!(name_variants("").is_empty());
    }
}
