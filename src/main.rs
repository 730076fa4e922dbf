mod cms;
mod parser;
mod portable;
mod store;

use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use store::ProcessedOutput;

#[derive(Parser)]
#[command(name = "blog_importer", about = "Crawled blog content → Portable Text CMS importer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert crawled pages into Portable Text and write the processed JSON
    Process,
    /// Push processed post bodies to the CMS
    Push {
        /// Max posts to push (default: all with full content)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Process + push in one pipeline
    Run,
    /// Show statistics from the last processed output
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process => {
            run_process().map(|_| ())
        }
        Commands::Push { limit } => {
            let output = store::read_output(Path::new(store::OUTPUT_PATH))?;
            push_posts(&output, limit).await
        }
        Commands::Run => {
            let output = run_process()?;
            if std::env::var("SANITY_API_TOKEN").is_ok() {
                push_posts(&output, None).await
            } else {
                println!("\nTo import to the CMS, set SANITY_API_TOKEN environment variable");
                Ok(())
            }
        }
        Commands::Stats => {
            let output = store::read_output(Path::new(store::OUTPUT_PATH))?;
            println!("Processed at:      {}", output.processed_at);
            println!("Total posts:       {}", output.total_posts);
            println!("With full content: {}", output.with_full_content);
            println!("With excerpt only: {}", output.with_excerpt_only);
            for slug in &output.excerpt_only_slugs {
                println!("  excerpt-only: {}", slug);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run_process() -> anyhow::Result<ProcessedOutput> {
    let targets = store::read_targets(Path::new(store::TARGETS_PATH))?;
    let dump = store::read_crawl(Path::new(store::CRAWL_PATH))?;

    println!("Crawl status: {}", dump.status.as_deref().unwrap_or("unknown"));
    println!(
        "Total pages crawled: {}",
        dump.total.map(|t| t.to_string()).unwrap_or_else(|| "?".into())
    );

    let output = parser::process_batch(&targets, &dump);
    store::write_output(Path::new(store::OUTPUT_PATH), &output)?;

    println!("\nProcessed {} posts", output.total_posts);
    println!("With full content: {}", output.with_full_content);
    println!("With excerpt only: {}", output.with_excerpt_only);
    println!("\nSaved processed content to: {}", store::OUTPUT_PATH);

    if let Some(sample) = output.posts.first() {
        println!("\nSample post: {}", sample.title);
        println!("  Blocks: {}", sample.block_count);
        println!(
            "  Preview: {}...",
            sample.body_preview.chars().take(100).collect::<String>()
        );
    }

    Ok(output)
}

async fn push_posts(output: &ProcessedOutput, limit: Option<usize>) -> anyhow::Result<()> {
    let client = cms::CmsClient::from_env()?;
    let posts: Vec<_> = output
        .posts
        .iter()
        .filter(|p| p.has_full_content)
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    if posts.is_empty() {
        println!("No posts with full content to push. Run 'process' first.");
        return Ok(());
    }

    println!("--- Updating CMS ({} posts) ---", posts.len());
    let stats = client.push_posts(&posts).await?;
    println!(
        "Done: {} updated, {} skipped, {} errors.",
        stats.ok, stats.skipped, stats.errors
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
