use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TARGETS_PATH: &str = "data/blog-posts.json";
pub const CRAWL_PATH: &str = "data/crawled-content-raw.json";
pub const OUTPUT_PATH: &str = "data/processed-blog-content.json";

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/blog/([^/]+)/?$").unwrap());

/// A post we want content for, as listed in blog-posts.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPost {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_local: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TargetFile {
    posts: Vec<TargetPost>,
}

/// The crawl dump: either the object itself, or (as the crawler emits it)
/// wrapped in a one-element array of {type: "text", text: "<json string>"}.
#[derive(Debug, Deserialize)]
pub struct CrawlDump {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub data: Vec<CrawledPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawledPage {
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "sourceURL")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Crawled content for one matched slug.
#[derive(Debug, Clone)]
pub struct CrawledContent {
    pub url: String,
    pub markdown: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedOutput {
    pub processed_at: String,
    pub total_posts: usize,
    pub with_full_content: usize,
    pub with_excerpt_only: usize,
    pub excerpt_only_slugs: Vec<String>,
    pub posts: Vec<ProcessedPost>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPost {
    pub slug: String,
    pub title: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub read_time: Option<String>,
    pub excerpt: Option<String>,
    pub image_local: Option<String>,
    pub body: Vec<Value>,
    pub body_preview: String,
    pub block_count: usize,
    pub has_full_content: bool,
}

pub fn read_targets(path: &Path) -> Result<Vec<TargetPost>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: TargetFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid target posts JSON in {}", path.display()))?;
    Ok(file.posts)
}

pub fn read_crawl(path: &Path) -> Result<CrawlDump> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_crawl(&raw)
}

/// Parse the crawl dump, unwrapping the nested text envelope when present.
pub fn parse_crawl(raw: &str) -> Result<CrawlDump> {
    let parsed: Value = serde_json::from_str(raw).context("Invalid crawl dump JSON")?;
    let nested = parsed
        .get(0)
        .and_then(|v| v.get("text"))
        .and_then(Value::as_str)
        .map(str::to_owned);
    let inner = match nested {
        Some(text) => serde_json::from_str(&text).context("Invalid nested crawl dump JSON")?,
        None => parsed,
    };
    serde_json::from_value(inner).context("Unexpected crawl dump shape")
}

/// Slug from a blog URL, query string stripped: .../blog/<slug>[/]?...
pub fn extract_slug(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    SLUG_RE.captures(path).map(|caps| caps[1].to_string())
}

/// Index crawled pages by slug. Pages without a usable URL or markdown body
/// are ignored.
pub fn index_by_slug(dump: &CrawlDump) -> HashMap<String, CrawledContent> {
    let mut map = HashMap::new();
    for page in &dump.data {
        let Some(meta) = &page.metadata else { continue };
        let Some(url) = meta.url.as_deref().or(meta.source_url.as_deref()) else {
            continue;
        };
        let (Some(slug), Some(markdown)) = (extract_slug(url), page.markdown.as_deref()) else {
            continue;
        };
        map.insert(
            slug,
            CrawledContent {
                url: url.to_string(),
                markdown: markdown.to_string(),
                title: meta.title.clone(),
            },
        );
    }
    map
}

pub fn write_output(path: &Path, output: &ProcessedOutput) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(output)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_output(path: &Path) -> Result<ProcessedOutput> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read {} (run 'process' first)",
            path.display()
        )
    })?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid processed output JSON in {}", path.display()))
}

// ── Tests ──
