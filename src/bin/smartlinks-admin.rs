use anyhow::Result;
use clap::{Parser, Subcommand};
use smartlinks::analytics::AnalyticsAggregator;
use smartlinks::config::Config;
use smartlinks::links::{LinkService, MAX_LIST_LIMIT};
use smartlinks::models::{CreateLinkRequest, Link, LinkFilter};
use smartlinks::storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smartlinks-admin")]
#[command(about = "Smartlinks link management CLI")]
#[command(
    long_about = "Smartlinks link management CLI\n\nWrites go straight to the database. A running server picks them up once its keyword cache entries expire (CACHE_TTL_SECS for known keywords, a few seconds for unknown ones)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a link
    Create {
        keyword: String,
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// List links, active only unless --all is given
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Deactivate a link by id
    Deactivate { id: i64 },
    /// Re-activate a link by id
    Activate { id: i64 },
    /// Show totals and the most clicked links
    Stats,
    /// Insert the sample links
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smartlinks=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let storage = storage::connect(&config.database).await?;
    let links = LinkService::new(storage.clone());

    match cli.command {
        Commands::Create {
            keyword,
            url,
            title,
            description,
            category,
        } => {
            let link = links
                .create(CreateLinkRequest {
                    keyword,
                    url,
                    title,
                    description,
                    category,
                    created_by: Some("admin-cli".to_string()),
                })
                .await?;
            println!("✓ Created link #{}: {} -> {}", link.id, link.keyword, link.url);
        }
        Commands::List { category, all } => {
            let filter = LinkFilter {
                category,
                is_active: if all { None } else { Some(true) },
                search: None,
            };
            let found = links.list(&filter, MAX_LIST_LIMIT, 0).await?;
            if found.is_empty() {
                println!("No links found.");
            } else {
                print_links(&found);
            }
        }
        Commands::Deactivate { id } => {
            let link = links.deactivate(id).await?;
            println!("✓ Deactivated link #{} ({})", link.id, link.keyword);
        }
        Commands::Activate { id } => {
            let link = links.activate(id).await?;
            println!("✓ Activated link #{} ({})", link.id, link.keyword);
        }
        Commands::Stats => {
            let snapshot = AnalyticsAggregator::new(storage).stats(10, 0).await?;
            println!("Active links: {}", snapshot.total_links);
            println!("Total clicks: {}", snapshot.total_clicks);

            if !snapshot.top_links.is_empty() {
                println!();
                println!("{:<24} {:>8}  {}", "Keyword", "Clicks", "URL");
                println!("{}", "-".repeat(80));
                for entry in snapshot.top_links {
                    println!(
                        "{:<24} {:>8}  {}",
                        entry.link.keyword, entry.click_count, entry.link.url
                    );
                }
            }

            if !snapshot.categories.is_empty() {
                println!();
                println!("{:<24} {:>8} {:>8}", "Category", "Links", "Clicks");
                println!("{}", "-".repeat(42));
                for category in snapshot.categories {
                    println!(
                        "{:<24} {:>8} {:>8}",
                        category.category, category.link_count, category.click_count
                    );
                }
            }
        }
        Commands::Seed => {
            let created = links.seed_samples().await?;
            if created.is_empty() {
                println!("Sample links already present.");
            } else {
                for link in created {
                    println!("✓ Created link #{}: {} -> {}", link.id, link.keyword, link.url);
                }
            }
        }
    }

    Ok(())
}

fn print_links(links: &[Link]) {
    println!(
        "{:<6} {:<24} {:<16} {:<8} {}",
        "ID", "Keyword", "Category", "Active", "URL"
    );
    println!("{}", "-".repeat(100));
    for link in links {
        println!(
            "{:<6} {:<24} {:<16} {:<8} {}",
            link.id,
            link.keyword,
            link.category,
            if link.is_active { "yes" } else { "no" },
            link.url
        );
    }
}
