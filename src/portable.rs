use serde_json::{json, Value};
use uuid::Uuid;

use crate::parser::blocks::{Block, MarkDef, Span};

/// Short unique key for Portable Text `_key` fields and mark-def references.
pub fn new_key() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Serialize a block sequence into the Portable Text array the CMS stores.
pub fn to_portable(blocks: &[Block]) -> Vec<Value> {
    blocks.iter().map(block_value).collect()
}

fn block_value(block: &Block) -> Value {
    match block {
        Block::Heading { level, text } => json!({
            "_type": "block",
            "_key": new_key(),
            "style": format!("h{level}"),
            "markDefs": [],
            "children": [text_span(text)],
        }),
        Block::Paragraph { spans, mark_defs } => json!({
            "_type": "block",
            "_key": new_key(),
            "style": "normal",
            "markDefs": def_values(mark_defs),
            "children": span_values(spans),
        }),
        Block::ListItem {
            ordered,
            spans,
            mark_defs,
        } => json!({
            "_type": "block",
            "_key": new_key(),
            "style": "normal",
            "listItem": (if *ordered { "number" } else { "bullet" }),
            "level": 1,
            "markDefs": def_values(mark_defs),
            "children": span_values(spans),
        }),
        Block::Blockquote { spans, mark_defs } => json!({
            "_type": "block",
            "_key": new_key(),
            "style": "blockquote",
            "markDefs": def_values(mark_defs),
            "children": span_values(spans),
        }),
        Block::Code { code, language } => json!({
            "_type": "codeBlock",
            "_key": new_key(),
            "code": code,
            "language": language,
        }),
        Block::FaqGroup { title, items } => json!({
            "_type": "faqGroup",
            "_key": new_key(),
            "title": title,
            "items": items
                .iter()
                .map(|item| json!({
                    "_key": new_key(),
                    "question": item.question,
                    "answer": to_portable(&item.answer),
                }))
                .collect::<Vec<_>>(),
        }),
    }
}

fn span_values(spans: &[Span]) -> Vec<Value> {
    spans
        .iter()
        .map(|span| {
            json!({
                "_type": "span",
                "_key": new_key(),
                "text": span.text,
                "marks": span.marks,
            })
        })
        .collect()
}

fn text_span(text: &str) -> Value {
    json!({
        "_type": "span",
        "_key": new_key(),
        "text": text,
        "marks": [],
    })
}

fn def_values(mark_defs: &[MarkDef]) -> Vec<Value> {
    mark_defs
        .iter()
        .map(|def| {
            json!({
                "_type": "link",
                "_key": def.key,
                "href": def.href,
            })
        })
        .collect()
}

// ── Tests ──
