use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{MarkDef, Span};
use crate::portable::new_key;

// One alternation, scanned left to right. Bold must come before italic so
// `**x**` is never matched as an italic span wrapped in asterisks.
static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*[^*]+\*\*|\*[^*]+\*|`[^`]+`|\[[^\]]+\]\([^)]+\)").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

pub struct Inline {
    pub spans: Vec<Span>,
    pub mark_defs: Vec<MarkDef>,
}

/// Parse one logical line into marked spans plus out-of-line link definitions.
pub fn parse(text: &str) -> Inline {
    // Fast path: nothing that could open a bold/italic/code/link span.
    if !text.contains(['*', '`', '[']) {
        return Inline {
            spans: vec![plain(text)],
            mark_defs: Vec::new(),
        };
    }

    let mut spans = Vec::new();
    let mut mark_defs = Vec::new();
    let mut last = 0;

    for m in MARKUP_RE.find_iter(text) {
        if m.start() > last {
            spans.push(plain(&text[last..m.start()]));
        }

        let piece = m.as_str();
        if piece.starts_with("**") && piece.ends_with("**") {
            spans.push(marked(&piece[2..piece.len() - 2], "strong"));
        } else if piece.starts_with('*') && piece.ends_with('*') {
            spans.push(marked(&piece[1..piece.len() - 1], "em"));
        } else if piece.starts_with('`') && piece.ends_with('`') {
            spans.push(marked(&piece[1..piece.len() - 1], "code"));
        } else if let Some(caps) = LINK_RE.captures(piece) {
            // Links are indirect: the span carries a key into mark_defs,
            // never the URL itself.
            let key = new_key();
            mark_defs.push(MarkDef {
                key: key.clone(),
                href: caps[2].to_string(),
            });
            spans.push(Span {
                text: caps[1].to_string(),
                marks: vec![key],
            });
        }

        last = m.end();
    }

    if last < text.len() {
        spans.push(plain(&text[last..]));
    }
    if spans.is_empty() {
        spans.push(plain(text));
    }

    Inline { spans, mark_defs }
}

fn plain(text: &str) -> Span {
    Span {
        text: text.to_string(),
        marks: Vec::new(),
    }
}

fn marked(text: &str, mark: &str) -> Span {
    Span {
        text: text.to_string(),
        marks: vec![mark.to_string()],
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_markup_returns_single_unmarked_span() {
        let parsed = parse("just some plain text");
        assert_eq!(parsed.spans.len(), 1);
        assert_eq!(parsed.spans[0].text, "just some plain text");
        assert!(parsed.spans[0].marks.is_empty());
        assert!(parsed.mark_defs.is_empty());
    }

    #[test]
    fn bold_italic_code_link_in_one_pass() {
        let parsed = parse("**a** and *b* and `c` and [d](http://x)");
        let texts: Vec<&str> = parsed.spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", " and ", "b", " and ", "c", " and ", "d"]);
        assert_eq!(parsed.spans[0].marks, vec!["strong"]);
        assert!(parsed.spans[1].marks.is_empty());
        assert_eq!(parsed.spans[2].marks, vec!["em"]);
        assert_eq!(parsed.spans[4].marks, vec!["code"]);
        assert_eq!(parsed.mark_defs.len(), 1);
        assert_eq!(parsed.mark_defs[0].href, "http://x");
        assert_eq!(parsed.spans[6].marks, vec![parsed.mark_defs[0].key.clone()]);
    }

    #[test]
    fn bold_is_not_double_matched_as_italic() {
        let parsed = parse("**x**");
        assert_eq!(parsed.spans.len(), 1);
        assert_eq!(parsed.spans[0].text, "x");
        assert_eq!(parsed.spans[0].marks, vec!["strong"]);
    }

    #[test]
    fn every_link_mark_resolves_to_one_def() {
        let parsed = parse("[a](http://one) then [b](http://two)");
        assert_eq!(parsed.mark_defs.len(), 2);
        for span in parsed.spans.iter().filter(|s| !s.marks.is_empty()) {
            let resolved = parsed
                .mark_defs
                .iter()
                .filter(|d| d.key == span.marks[0])
                .count();
            assert_eq!(resolved, 1);
        }
        assert_ne!(parsed.mark_defs[0].key, parsed.mark_defs[1].key);
    }

    #[test]
    fn trailing_plain_text_kept() {
        let parsed = parse("`code` tail");
        assert_eq!(parsed.spans.len(), 2);
        assert_eq!(parsed.spans[1].text, " tail");
    }

    #[test]
    fn lone_bracket_falls_back_to_plain_span() {
        let parsed = parse("a [ stray bracket");
        assert_eq!(parsed.spans.len(), 1);
        assert_eq!(parsed.spans[0].text, "a [ stray bracket");
        assert!(parsed.spans[0].marks.is_empty());
    }
}
