use std::sync::LazyLock;

use regex::Regex;

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}";

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{EMAIL_PATTERN}$")).expect("anchored email pattern is valid")
});

/// Email-shaped substrings of `text`, left to right, duplicates kept.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_mentions_in_order() {
        let text = "ping me at mention1@example.com and mention2@example.com";
        assert_eq!(
            extract_mentions(text),
            ["mention1@example.com", "mention2@example.com"]
        );
    }

    #[test]
    fn keeps_repeated_mentions() {
        assert_eq!(
            extract_mentions("a@x.com, a@x.com!"),
            ["a@x.com", "a@x.com"]
        );
    }

    #[test]
    fn ignores_text_without_addresses() {
        assert!(extract_mentions("").is_empty());
        assert!(extract_mentions("hello @everyone, see x@y").is_empty());
        // TLD needs two letters.
        assert!(extract_mentions("user@host.c").is_empty());
    }

    #[test]
    fn validates_whole_string() {
        assert!(is_valid_email("john.doe+tag@mail.example.org"));
        assert!(!is_valid_email("john@example"));
        assert!(!is_valid_email("say hi to john@example.com"));
        assert!(!is_valid_email(""));
    }
}
