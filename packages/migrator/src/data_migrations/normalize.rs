//! Row normalization: one legacy 2.x row into one 3.x paste
//!
//! Rules, in order:
//! 1. NULL password becomes `""`
//! 2. NULL language becomes `"plain"`
//! 3. Empty content becomes a single space
//! 4. HTML character references in content are decoded (2.x stored text escaped)
//!
//! Decoding follows the HTML5 rules for text content: legacy named entities
//! match without a trailing semicolon, `&#0;` and out-of-range code points
//! become U+FFFD, and `&#128;`..`&#159;` map through Windows-1252.

use crate::domains::pastes::{LegacyPasteRow, Paste, PasteKind};

/// Language tag given to pastes stored without one
pub const DEFAULT_LANG: &str = "plain";

/// Stand-in for empty content, which the 3.x schema rejects
pub const EMPTY_CONTENT_PLACEHOLDER: &str = " ";

/// Normalize a legacy row into a paste of the given class
pub fn normalize(row: LegacyPasteRow, kind: PasteKind) -> Paste {
    let LegacyPasteRow {
        key,
        lang,
        text,
        passwd,
    } = row;

    let password = match passwd {
        Some(password) => password,
        None => String::new(),
    };

    let lang = match lang {
        Some(lang) => lang,
        None => DEFAULT_LANG.to_string(),
    };

    let content = if text.is_empty() {
        EMPTY_CONTENT_PLACEHOLDER.to_string()
    } else {
        text
    };
    let content = htmlize::unescape(content).into_owned();

    Paste {
        kind,
        key,
        lang,
        content,
        password,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_password_becomes_empty() {
        let paste = normalize(
            LegacyPasteRow::new("k", Some("c"), "x", None),
            PasteKind::Temporary,
        );
        assert_eq!(paste.password, "");
    }

    #[test]
    fn present_password_is_kept() {
        let paste = normalize(
            LegacyPasteRow::new("k", Some("c"), "x", Some("s3cr3t")),
            PasteKind::Temporary,
        );
        assert_eq!(paste.password, "s3cr3t");
    }

    #[test]
    fn null_language_defaults_to_plain() {
        let paste = normalize(
            LegacyPasteRow::new("k", None, "x", None),
            PasteKind::Permanent,
        );
        assert_eq!(paste.lang, "plain");
    }

    #[test]
    fn empty_language_is_not_replaced() {
        // Only NULL is defaulted
        let paste = normalize(
            LegacyPasteRow::new("k", Some(""), "x", None),
            PasteKind::Permanent,
        );
        assert_eq!(paste.lang, "");
    }

    #[test]
    fn empty_content_becomes_single_space() {
        let paste = normalize(
            LegacyPasteRow::new("xyz", Some("python"), "", Some("s3cr3t")),
            PasteKind::Temporary,
        );
        assert_eq!(paste.content, " ");
    }

    #[test]
    fn whitespace_content_is_kept() {
        let paste = normalize(
            LegacyPasteRow::new("k", None, "\n\t", None),
            PasteKind::Temporary,
        );
        assert_eq!(paste.content, "\n\t");
    }

    #[test]
    fn entities_are_decoded() {
        let paste = normalize(
            LegacyPasteRow::new("abc123", None, "&lt;b&gt;hi&lt;/b&gt;", None),
            PasteKind::Permanent,
        );
        assert_eq!(paste.content, "<b>hi</b>");

        let paste = normalize(
            LegacyPasteRow::new(
                "k",
                Some("cpp"),
                "if (a &amp;&amp; b) puts(&quot;ok&quot;); // &#39;x&#39; &#x41;",
                None,
            ),
            PasteKind::Permanent,
        );
        assert_eq!(paste.content, "if (a && b) puts(\"ok\"); // 'x' A");
        assert!(!paste.content.contains("&amp;"));
        assert!(!paste.content.contains("&quot;"));
    }

    #[test]
    fn legacy_entities_decode_without_semicolon() {
        for (text, expected) in [("&lt", "<"), ("&amp", "&"), ("a &copy b", "a \u{a9} b")] {
            let paste = normalize(
                LegacyPasteRow::new("k", None, text, None),
                PasteKind::Temporary,
            );
            assert_eq!(paste.content, expected, "decoding {text:?}");
        }
    }

    #[test]
    fn numeric_references_follow_html5_replacements() {
        for (text, expected) in [
            ("&#0;", "\u{fffd}"),
            ("&#x110000;", "\u{fffd}"),
            ("&#128;", "\u{20ac}"),
            ("&#x99;", "\u{2122}"),
        ] {
            let paste = normalize(
                LegacyPasteRow::new("k", None, text, None),
                PasteKind::Permanent,
            );
            assert_eq!(paste.content, expected, "decoding {text:?}");
        }
    }

    #[test]
    fn decoding_is_applied_once() {
        // `&amp;lt;` was a literal "&lt;" typed by the user
        let paste = normalize(
            LegacyPasteRow::new("k", None, "&amp;lt;", None),
            PasteKind::Temporary,
        );
        assert_eq!(paste.content, "&lt;");
    }

    #[test]
    fn key_and_kind_are_carried_over() {
        let paste = normalize(
            LegacyPasteRow::new("abc123", None, "&lt;b&gt;hi&lt;/b&gt;", None),
            PasteKind::Permanent,
        );
        assert_eq!(
            paste,
            Paste {
                kind: PasteKind::Permanent,
                key: "abc123".to_string(),
                lang: "plain".to_string(),
                content: "<b>hi</b>".to_string(),
                password: String::new(),
            }
        );
    }
}
