use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{Block, FaqItem, Span};

static TABLE_DIVIDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|\s*-{3,}\s*\|").unwrap());
static DASH_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-–—]+$").unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static NBSP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)&nbsp;").unwrap());
static ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\([_\[\](){}/])").unwrap());

/// Normalize a freshly segmented block sequence: reinterpret single-cell
/// pipe-table artifacts as code, collapse the duplicates that produces, then
/// fold FAQ sections into accordion groups. Idempotent.
pub fn normalize(blocks: Vec<Block>) -> Vec<Block> {
    extract_faq_groups(dedupe_code_blocks(convert_table_artifacts(blocks)))
}

/// Crawled pages render one-cell tables around what was originally a code
/// snippet. A paragraph with a `| --- |` divider and exactly one non-dash
/// cell becomes a Code block; anything else passes through.
fn convert_table_artifacts(blocks: Vec<Block>) -> Vec<Block> {
    blocks
        .into_iter()
        .map(|block| {
            let code = match &block {
                Block::Paragraph { spans, .. } => extract_table_code(spans),
                _ => None,
            };
            match code {
                Some(code) => Block::Code {
                    code,
                    language: "text".to_string(),
                },
                None => block,
            }
        })
        .collect()
}

fn extract_table_code(spans: &[Span]) -> Option<String> {
    let raw: String = spans.iter().map(|s| s.text.as_str()).collect();
    if raw.is_empty() || !raw.contains('|') || !TABLE_DIVIDER_RE.is_match(&raw) {
        return None;
    }

    let normalized = BR_RE.replace_all(&raw, "\n");
    let normalized = NBSP_RE.replace_all(&normalized, " ");
    let normalized = normalized
        .replace('\u{a0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let cells: Vec<&str> = normalized
        .split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter(|segment| !DASH_SEGMENT_RE.is_match(segment))
        .collect();
    if cells.len() != 1 {
        return None;
    }

    let code = ESCAPE_RE.replace_all(cells[0], "$1").trim().to_string();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

/// Adjacent Code blocks with identical contents collapse to one.
fn dedupe_code_blocks(blocks: Vec<Block>) -> Vec<Block> {
    let mut cleaned: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if let (Block::Code { code, .. }, Some(Block::Code { code: prev, .. })) =
            (&block, cleaned.last())
        {
            if code == prev {
                continue;
            }
        }
        cleaned.push(block);
    }
    cleaned
}

/// Fold an H2 "FAQ"/"FAQs" heading plus its H3 question runs into a single
/// FaqGroup. The scan stops at the next H1/H2; a heading with no questions
/// under it passes through unchanged.
fn extract_faq_groups(blocks: Vec<Block>) -> Vec<Block> {
    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    let mut i = 0;

    while i < blocks.len() {
        let Block::Heading { level: 2, text } = &blocks[i] else {
            out.push(blocks[i].clone());
            i += 1;
            continue;
        };
        let lower = text.trim().to_lowercase();
        if lower != "faq" && lower != "faqs" {
            out.push(blocks[i].clone());
            i += 1;
            continue;
        }

        let title = text.clone();
        let mut items: Vec<FaqItem> = Vec::new();
        let mut question = String::new();
        let mut answer: Vec<Block> = Vec::new();
        let mut j = i + 1;

        while j < blocks.len() {
            match &blocks[j] {
                Block::Heading { level: 1 | 2, .. } => break,
                Block::Heading { level: 3, text } => {
                    if !question.is_empty() {
                        items.push(FaqItem {
                            question: std::mem::take(&mut question),
                            answer: std::mem::take(&mut answer),
                        });
                    }
                    question = text.clone();
                    answer = Vec::new();
                }
                other => {
                    // Blocks before the first question are preamble; drop them.
                    if !question.is_empty() {
                        answer.push(other.clone());
                    }
                }
            }
            j += 1;
        }

        if !question.is_empty() {
            items.push(FaqItem { question, answer });
        }

        if items.is_empty() {
            out.push(blocks[i].clone());
        } else {
            out.push(Block::FaqGroup { title, items });
        }
        i = j;
    }

    out
}

// ── Tests ──
