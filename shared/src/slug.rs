/// URL-fragment slug of a display name.
///
/// Lowercases, replaces every run of characters outside `[a-z0-9]` with a
/// single hyphen, and trims hyphens from both ends. Non-ASCII letters are
/// treated as separators. Idempotent.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// DOM id of the card wrapper for a slug.
pub fn wrapper_id(slug: &str) -> String {
    format!("wrapper-{slug}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_joins_words() {
        assert_eq!(slugify("Lower Youghiogheny"), "lower-youghiogheny");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Gauley (Upper) -- Section #1"), "gauley-upper-section-1");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  --New River!  "), "new-river");
    }

    #[test]
    fn empty_and_separator_only_inputs_are_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify(" -_/ "), "");
    }

    #[test]
    fn non_ascii_letters_act_as_separators() {
        assert_eq!(slugify("Río Grande"), "r-o-grande");
    }

    #[test]
    fn is_idempotent() {
        for name in [
            "Cheat Canyon",
            "  Big Sandy (Wonder Falls) ",
            "db-id-42",
            "Río Grande",
            "",
        ] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once, "slugify not idempotent for {name:?}");
        }
    }

    #[test]
    fn wrapper_id_prefixes_slug() {
        assert_eq!(wrapper_id("cheat-canyon"), "wrapper-cheat-canyon");
    }
}
