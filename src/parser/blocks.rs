use std::sync::LazyLock;

use regex::Regex;

use super::inline;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,4})\s+(.+)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\\?\.\s+").unwrap());
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static HRULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(-{3,}|\*{3,})$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { spans: Vec<Span>, mark_defs: Vec<MarkDef> },
    ListItem { ordered: bool, spans: Vec<Span>, mark_defs: Vec<MarkDef> },
    Blockquote { spans: Vec<Span>, mark_defs: Vec<MarkDef> },
    Code { code: String, language: String },
    FaqGroup { title: String, items: Vec<FaqItem> },
}

/// A run of text with zero or more marks: `strong`/`em`/`code`, or a key
/// referencing a MarkDef in the enclosing block.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkDef {
    pub key: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaqItem {
    pub question: String,
    pub answer: Vec<Block>,
}

/// Split article markdown into an ordered block sequence.
///
/// Input is scraped, loosely structured text, so unrecognized lines fall
/// through to paragraph accumulation instead of erroring.
pub fn segment(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_code = false;
    let mut code_lines: Vec<&str> = Vec::new();
    let mut code_lang = String::new();

    for line in markdown.lines() {
        // ── Fenced code: ``` toggles collection mode ──
        if line.starts_with("```") {
            if in_code {
                if !code_lines.is_empty() {
                    blocks.push(Block::Code {
                        code: code_lines.join("\n"),
                        language: if code_lang.is_empty() {
                            "text".to_string()
                        } else {
                            code_lang.clone()
                        },
                    });
                }
                in_code = false;
                code_lines.clear();
                code_lang.clear();
            } else {
                flush_paragraph(&mut paragraph, &mut blocks);
                in_code = true;
                code_lang = line[3..].trim().to_string();
            }
            continue;
        }

        if in_code {
            code_lines.push(line);
            continue;
        }

        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        // ── Heading: # .. #### ──
        if let Some(caps) = HEADING_RE.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                text: caps[2].trim().to_string(),
            });
            continue;
        }

        // ── Bullet list item ──
        if BULLET_RE.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let text = BULLET_RE.replace(line, "");
            let parsed = inline::parse(text.trim());
            blocks.push(Block::ListItem {
                ordered: false,
                spans: parsed.spans,
                mark_defs: parsed.mark_defs,
            });
            continue;
        }

        // ── Numbered list item ("1." and the escaped "1\." both occur) ──
        if NUMBERED_RE.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let text = NUMBERED_RE.replace(line, "");
            let parsed = inline::parse(text.trim());
            blocks.push(Block::ListItem {
                ordered: true,
                spans: parsed.spans,
                mark_defs: parsed.mark_defs,
            });
            continue;
        }

        // ── Blockquote ──
        if let Some(rest) = line.strip_prefix("> ") {
            flush_paragraph(&mut paragraph, &mut blocks);
            let parsed = inline::parse(rest.trim());
            blocks.push(Block::Blockquote {
                spans: parsed.spans,
                mark_defs: parsed.mark_defs,
            });
            continue;
        }

        // ── Images and horizontal rules are dropped ──
        if line.starts_with("![") || IMAGE_RE.is_match(line) {
            continue;
        }
        if HRULE_RE.is_match(line) {
            continue;
        }

        paragraph.push(line);
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

/// Join soft-wrapped paragraph lines with spaces and emit one Paragraph.
/// Empty or single-character results are discarded, not emitted.
fn flush_paragraph<'a>(paragraph: &mut Vec<&'a str>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ").trim().to_string();
    paragraph.clear();
    if text.chars().count() > 1 {
        let parsed = inline::parse(&text);
        blocks.push(Block::Paragraph {
            spans: parsed.spans,
            mark_defs: parsed.mark_defs,
        });
    }
}

// ── Tests ──
