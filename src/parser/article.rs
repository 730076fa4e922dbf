use std::sync::LazyLock;

use regex::Regex;

// Crawled pages carry the whole rendered chrome: nav, share buttons, author
// bio, related-post rails, footer. The article proper sits between the
// "N min read" line and the first footer/CTA marker.
const STOP_PHRASES: &[&str] = &[
    "related posts",
    "continue reading",
    "recommended for you",
    "you may also like",
    "share this",
    "subscribe to",
    "try adapty",
    "get started with adapty",
    "© adapty",
    "privacy policy",
    "terms of service",
    "book a demo",
    "### learn more",
    "### related",
    "## share",
    "[home]",
    "[blog]",
    "[pricing]",
    // Author bio sections start with the author's name
    "disha sharma",
    "victoria kharlan",
    "dmitry shestoperov",
    "kirill potekhin",
];

static SHARE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*-\s*\[(X|LinkedIn|Facebook|Telegram|Email|WhatsApp)\][^\n]*\n?").unwrap()
});
static BYLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^by\s*\[!\[[^\]]*\]\([^)]*\)\]\n*").unwrap());
static AUTHOR_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\[[^\]]*\]\(https://adapty\.io/author/[^)]*\)\s*").unwrap()
});
static BLANKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Slice the article body out of a crawled page's markdown and strip the
/// share/byline debris the crawler keeps.
pub fn extract_article(markdown: &str, title: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = markdown.lines().collect();

    // Start: after the "min read" line in the page header.
    let start = lines
        .iter()
        .take(50)
        .position(|line| {
            let lower = line.to_lowercase();
            lower.contains("min read") && !lower.contains('#')
        })
        .map(|i| i + 1)
        .unwrap_or(0);

    // End: the first footer/related/CTA marker after the start.
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| {
            let lower = line.to_lowercase();
            STOP_PHRASES.iter().any(|p| lower.contains(p))
        })
        .map(|(i, _)| i)
        .unwrap_or(lines.len());

    let mut content = lines[start..end].join("\n");

    content = SHARE_LINK_RE.replace_all(&content, "").into_owned();
    content = BYLINE_RE.replace_all(&content, "").into_owned();
    content = AUTHOR_LINK_RE.replace_all(&content, "").into_owned();

    // Drop a duplicated title heading at the very top.
    if !title.is_empty() {
        let title_re = Regex::new(&format!(r"(?i)^#\s*{}\s*\n+", regex::escape(title)))
            .expect("escaped title is a valid pattern");
        content = title_re.replace(&content, "").into_owned();
    }

    let content = content.trim();
    BLANKS_RE.replace_all(content, "\n\n").into_owned()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_after_min_read_line() {
        let md = "[Home](https://x)\nSome nav\n5 min read\nFirst real paragraph.";
        let body = extract_article(md, "");
        assert_eq!(body, "First real paragraph.");
    }

    #[test]
    fn stops_at_first_footer_marker() {
        let md = "3 min read\nArticle text.\nMore text.\nRelated Posts\nJunk after.";
        let body = extract_article(md, "");
        assert_eq!(body, "Article text.\nMore text.");
    }

    #[test]
    fn share_links_removed() {
        let md = "2 min read\n- [X](https://x.com/share)\n- [LinkedIn](https://li/share)\nActual content here.";
        let body = extract_article(md, "");
        assert_eq!(body, "Actual content here.");
    }

    #[test]
    fn duplicate_title_heading_removed() {
        let md = "4 min read\n# Paywall Basics\nIntro paragraph.";
        let body = extract_article(md, "Paywall Basics");
        assert_eq!(body, "Intro paragraph.");
    }

    #[test]
    fn title_with_regex_metacharacters() {
        let md = "4 min read\n# What is ARPU? (2024)\nIntro.";
        let body = extract_article(md, "What is ARPU? (2024)");
        assert_eq!(body, "Intro.");
    }

    #[test]
    fn blank_runs_collapsed() {
        let md = "1 min read\nfirst\n\n\n\nsecond";
        let body = extract_article(md, "");
        assert_eq!(body, "first\n\nsecond");
    }

    #[test]
    fn no_min_read_keeps_whole_page_until_marker() {
        let md = "Paragraph one.\nParagraph two.\nBook a demo\ntail";
        let body = extract_article(md, "");
        assert_eq!(body, "Paragraph one.\nParagraph two.");
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract_article("", "Anything"), "");
    }
}
