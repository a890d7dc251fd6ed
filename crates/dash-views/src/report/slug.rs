//! File names from titles

/// Lowercase `text`, turn whitespace runs into hyphens and drop everything
/// that is not a word character. Falls back to `fallback` when nothing is
/// left.
pub fn slugify(text: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c);
        }
    }

    if slug.trim_matches('-').is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Q1 Sales Report", "report"), "q1-sales-report");
        assert_eq!(slugify("  Revenue   by (Region)! ", "report"), "revenue-by-region");
        assert_eq!(slugify("snake_case-ok", "report"), "snake_case-ok");
        assert_eq!(slugify("Café über", "report"), "caf-ber");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify("", "chart"), "chart");
        assert_eq!(slugify("!!! ???", "chart"), "chart");
    }

    proptest! {
        #[test]
        fn test_slug_is_file_safe(text in ".{0,40}") {
            let slug = slugify(&text, "report");
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            prop_assert!(!slug.chars().any(|c| c.is_ascii_uppercase()));
        }
    }
}
