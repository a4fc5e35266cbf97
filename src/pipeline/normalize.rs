//! Whitespace normalization for extracted text.
//!
//! PDF text extraction and OCR both produce ragged output: hard-wrapped
//! lines, runs of blank lines between columns, tab-aligned tables. The
//! normalizer collapses that noise without touching the characters
//! themselves, so non-Latin scripts survive intact for multilingual
//! generation and synthesis.
//!
//! ## Rule Order
//!
//! Rules must run in this specific order: line endings are unified before
//! newline runs are collapsed (a stray `\r` would otherwise hide a blank
//! line), and newline runs are collapsed before space runs so the
//! interleaved-whitespace pattern still sees the tabs and spaces it matches
//! on.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").unwrap());
static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Normalize extracted text to single-spaced, single-newline form.
///
/// Rules (applied in order):
/// 1. Unify line endings (CRLF / CR → LF)
/// 2. Collapse any run of 2+ newlines, with interleaved spaces or tabs,
///    into exactly one newline
/// 3. Collapse runs of spaces and tabs into a single space
/// 4. Trim leading and trailing whitespace
///
/// The function is idempotent: `normalize(normalize(t)) == normalize(t)`.
pub fn normalize(text: &str) -> String {
    let s = text.replace("\r\n", "\n").replace('\r', "\n");
    let s = RE_NEWLINE_RUNS.replace_all(&s, "\n");
    let s = RE_SPACE_RUNS.replace_all(&s, " ");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_newline_runs() {
        assert_eq!(normalize("a\n\n\nb"), "a\nb");
        assert_eq!(normalize("a\n \t \n  \nb"), "a\nb");
    }

    #[test]
    fn collapses_space_runs() {
        assert_eq!(normalize("a  \t  b"), "a b");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(normalize("  \n hello \n  "), "hello");
    }

    #[test]
    fn unifies_line_endings() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(normalize("a\r\n\r\nb"), "a\nb");
    }

    #[test]
    fn preserves_non_latin_scripts() {
        let hindi = "नमस्ते   दुनिया\n\n\nयह एक परीक्षण है।";
        assert_eq!(normalize(hindi), "नमस्ते दुनिया\nयह एक परीक्षण है।");
    }

    #[test]
    fn idempotent() {
        let cases = [
            "",
            "plain",
            "a\n\n\nb\t\tc",
            "  leading and trailing  ",
            "mixed \r\n\r\n endings\r",
            "tab\tbefore\n \t \nnewline",
            "para one\n\npara two\n\n\n\npara three",
        ];
        for case in cases {
            let once = normalize(case);
            assert_eq!(normalize(&once), once, "not idempotent for {case:?}");
        }
    }
}
