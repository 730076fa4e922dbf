use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use crate::store::ProcessedPost;

const API_VERSION: &str = "2024-01-01";
const DEFAULT_PROJECT_ID: &str = "4xpx1ym2";
const DEFAULT_DATASET: &str = "production";
const FIND_POST_QUERY: &str = r#"*[_type == "blogPost" && slug.current == $slug][0]{_id}"#;

/// Push stats returned after completion.
pub struct PushStats {
    pub total: usize,
    pub ok: usize,
    pub skipped: usize,
    pub errors: usize,
}

pub struct CmsClient {
    http: Client,
    project_id: String,
    dataset: String,
    token: String,
}

impl CmsClient {
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("SANITY_API_TOKEN")
            .map_err(|_| anyhow!("SANITY_API_TOKEN environment variable must be set"))?;
        let project_id = std::env::var("NEXT_PUBLIC_SANITY_PROJECT_ID")
            .unwrap_or_else(|_| DEFAULT_PROJECT_ID.to_string());
        let dataset = std::env::var("NEXT_PUBLIC_SANITY_DATASET")
            .unwrap_or_else(|_| DEFAULT_DATASET.to_string());
        Ok(Self {
            http: Client::new(),
            project_id,
            dataset,
            token,
        })
    }

    /// Overwrite the body of each post's CMS document, sequentially. A failed
    /// update is logged and the loop moves on; missing documents are skipped,
    /// never created. Nothing is retried.
    pub async fn push_posts(&self, posts: &[ProcessedPost]) -> Result<PushStats> {
        let total = posts.len();
        let mut stats = PushStats {
            total,
            ok: 0,
            skipped: 0,
            errors: 0,
        };

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );

        for post in posts {
            match self.push_one(post).await {
                Ok(true) => {
                    stats.ok += 1;
                    pb.println(format!(
                        "  [OK] {} - updated with {} blocks",
                        post.slug, post.block_count
                    ));
                }
                Ok(false) => {
                    stats.skipped += 1;
                    pb.println(format!("  [SKIP] {} - not found in CMS", post.slug));
                }
                Err(e) => {
                    stats.errors += 1;
                    pb.println(format!("  [ERR] {}: {}", post.slug, e));
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Pushed {} posts ({} ok, {} skipped, {} errors)",
            stats.total, stats.ok, stats.skipped, stats.errors
        );

        Ok(stats)
    }

    /// Returns Ok(false) when no document matches the slug.
    async fn push_one(&self, post: &ProcessedPost) -> Result<bool> {
        match self.find_document_id(&post.slug).await? {
            Some(id) => {
                self.patch_body(&id, &post.body).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_document_id(&self, slug: &str) -> Result<Option<String>> {
        let url = format!(
            "https://{}.api.sanity.io/v{}/data/query/{}",
            self.project_id, API_VERSION, self.dataset
        );
        let slug_param = serde_json::to_string(slug)?;
        let body: Value = self
            .http
            .get(url)
            .query(&[("query", FIND_POST_QUERY), ("$slug", &slug_param)])
            .bearer_auth(&self.token)
            .send()
            .await
            .context("CMS query request failed")?
            .error_for_status()
            .context("CMS query returned an error status")?
            .json()
            .await
            .context("CMS query response was not JSON")?;

        Ok(body
            .get("result")
            .and_then(|r| r.get("_id"))
            .and_then(Value::as_str)
            .map(String::from))
    }

    async fn patch_body(&self, id: &str, body: &[Value]) -> Result<()> {
        let url = format!(
            "https://{}.api.sanity.io/v{}/data/mutate/{}",
            self.project_id, API_VERSION, self.dataset
        );
        let payload = json!({
            "mutations": [{ "patch": { "id": id, "set": { "body": body } } }]
        });
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .context("CMS mutate request failed")?
            .error_for_status()
            .context("CMS mutate returned an error status")?;
        Ok(())
    }
}
