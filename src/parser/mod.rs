pub mod article;
pub mod blocks;
pub mod inline;
pub mod postprocess;

use chrono::Utc;
use tracing::info;

use crate::portable;
use crate::store::{self, CrawlDump, CrawledContent, ProcessedOutput, ProcessedPost, TargetPost};

/// Articles shorter than this after extraction are treated as not crawled.
const MIN_ARTICLE_CHARS: usize = 200;
const PREVIEW_CHARS: usize = 200;

/// Full pipeline for one post: crawled markdown → article body → blocks →
/// normalized blocks → Portable Text. Returns None when the post has to fall
/// back to its excerpt (no crawled page, or a too-short extraction).
pub fn process_post(post: &TargetPost, crawled: Option<&CrawledContent>) -> Option<ProcessedPost> {
    let crawled = crawled?;
    let article = article::extract_article(&crawled.markdown, &post.title);
    if article.chars().count() <= MIN_ARTICLE_CHARS {
        return None;
    }

    let body = portable::to_portable(&postprocess::normalize(blocks::segment(&article)));
    let preview: String = article.chars().take(PREVIEW_CHARS).collect();

    Some(ProcessedPost {
        slug: post.slug.clone(),
        title: post.title.clone(),
        author: post.author.clone(),
        category: post.category.clone(),
        date: post.date.clone(),
        read_time: post.read_time.clone(),
        excerpt: post.excerpt.clone(),
        image_local: post.image_local.clone(),
        block_count: body.len(),
        body,
        body_preview: format!("{preview}..."),
        has_full_content: true,
    })
}

/// Convert every target post in order, routing the ones without usable
/// content to the excerpt-only bucket.
pub fn process_batch(targets: &[TargetPost], dump: &CrawlDump) -> ProcessedOutput {
    let crawled = store::index_by_slug(dump);
    info!("Matched {} URLs to content", crawled.len());

    let mut posts = Vec::new();
    let mut excerpt_only = Vec::new();

    for target in targets {
        match process_post(target, crawled.get(&target.slug)) {
            Some(post) => posts.push(post),
            None => excerpt_only.push(target.slug.clone()),
        }
    }

    ProcessedOutput {
        processed_at: Utc::now().to_rfc3339(),
        total_posts: posts.len(),
        with_full_content: posts.len(),
        with_excerpt_only: excerpt_only.len(),
        excerpt_only_slugs: excerpt_only,
        posts,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn target(slug: &str, title: &str) -> TargetPost {
        TargetPost {
            slug: slug.to_string(),
            title: title.to_string(),
            author: Some("Jane Doe".to_string()),
            category: Some("Growth".to_string()),
            date: None,
            read_time: Some("6 min read".to_string()),
            excerpt: Some("Short excerpt.".to_string()),
            image_local: None,
        }
    }

    fn dump_with_page(url: &str, markdown: &str) -> CrawlDump {
        let raw = serde_json::json!({
            "status": "completed",
            "total": 1,
            "data": [{"markdown": markdown, "metadata": {"url": url, "title": "A"}}],
        });
        store::parse_crawl(&raw.to_string()).unwrap()
    }

    fn long_article() -> String {
        let mut md = String::from("6 min read\n## Why paywalls matter\n");
        for _ in 0..8 {
            md.push_str("Paywall copy that keeps going on about conversion rates and pricing experiments.\n\n");
        }
        md
    }

    #[test]
    fn end_to_end_single_matched_post() {
        let targets = vec![target("a", "A")];
        let dump = dump_with_page("https://site.example/blog/a", &long_article());
        let output = process_batch(&targets, &dump);
        assert_eq!(output.total_posts, 1);
        assert_eq!(output.with_full_content, 1);
        assert_eq!(output.with_excerpt_only, 0);
        assert!(output.posts[0].has_full_content);
        assert_eq!(output.posts[0].slug, "a");
        assert_eq!(output.posts[0].block_count, output.posts[0].body.len());
        assert!(output.posts[0].body_preview.ends_with("..."));
    }

    #[test]
    fn unmatched_post_goes_to_excerpt_bucket() {
        let targets = vec![target("missing", "Missing")];
        let dump = dump_with_page("https://site.example/blog/other", &long_article());
        let output = process_batch(&targets, &dump);
        assert_eq!(output.total_posts, 0);
        assert_eq!(output.with_excerpt_only, 1);
        assert_eq!(output.excerpt_only_slugs, vec!["missing".to_string()]);
    }

    #[test]
    fn too_short_article_goes_to_excerpt_bucket() {
        let targets = vec![target("a", "A")];
        let dump = dump_with_page("https://site.example/blog/a", "3 min read\nTiny body.");
        let output = process_batch(&targets, &dump);
        assert_eq!(output.with_full_content, 0);
        assert_eq!(output.excerpt_only_slugs, vec!["a".to_string()]);
    }

    #[test]
    fn fixture_page_produces_structured_body() {
        let md = std::fs::read_to_string("tests/fixtures/paywall-guide.md").unwrap();
        let post = target("paywall-guide", "How to Build a Paywall That Converts");
        let crawled = CrawledContent {
            url: "https://adapty.io/blog/paywall-guide".to_string(),
            markdown: md,
            title: Some("How to Build a Paywall That Converts".to_string()),
        };
        let processed = process_post(&post, Some(&crawled)).expect("full content");

        let types: Vec<&str> = processed
            .body
            .iter()
            .map(|b| b["_type"].as_str().unwrap())
            .collect();
        assert!(types.contains(&"block"));
        assert!(types.contains(&"codeBlock"));
        assert!(types.contains(&"faqGroup"));

        // Nothing before or after the article body leaks through.
        let all_text: String = serde_json::to_string(&processed.body).unwrap();
        assert!(!all_text.contains("min read"));
        assert!(!all_text.contains("Related Posts"));
        assert!(!all_text.to_lowercase().contains("subscribe to"));
    }
}
