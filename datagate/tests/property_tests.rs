//! Property-based tests for SQL input vetting.

use datagate::security::{escape_identifier, escape_string_literal, validate_identifier};
use proptest::prelude::*;

proptest! {
    /// Identifiers built from the safe alphabet always validate.
    #[test]
    fn safe_identifiers_always_accepted(name in "[a-zA-Z_][a-zA-Z0-9_]{0,30}") {
        // the blocklist can still reject keyword-containing names
        let lowered = name.to_lowercase();
        let blocked = ["select", "insert", "update", "delete", "drop"]
            .iter()
            .any(|kw| lowered.contains(kw));
        prop_assume!(!blocked);

        prop_assert!(validate_identifier(&name).is_ok());

        let escaped = escape_identifier(&name).unwrap();
        prop_assert_eq!(escaped, format!("\"{}\"", name));
    }

    /// Identifiers containing statement punctuation never validate.
    #[test]
    fn punctuated_identifiers_always_rejected(
        prefix in "[a-z_]{1,10}",
        punct in prop::sample::select(vec![";", "'", "--", " ", "/*", "\0"]),
        suffix in "[a-z_]{0,10}",
    ) {
        let candidate = format!("{prefix}{punct}{suffix}");
        prop_assert!(validate_identifier(&candidate).is_err());
    }

    /// Escaped string literals never leave a bare single quote behind.
    #[test]
    fn escaped_literals_contain_no_bare_quote(value in "[ -~]{0,60}") {
        if let Ok(escaped) = escape_string_literal(&value) {
            let mut chars = escaped.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '\'' {
                    prop_assert_eq!(chars.next(), Some('\''), "unpaired quote in {}", escaped);
                }
            }
        }
    }

    /// Length limits hold for arbitrarily long inputs.
    #[test]
    fn oversized_identifiers_rejected(name in "[a-z_]{129,200}") {
        prop_assert!(validate_identifier(&name).is_err());
    }
}
