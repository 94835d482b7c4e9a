//! flare-kb main entry point
//!
//! This is the command-line interface for the flare-kb knowledge-base crawler.

use anyhow::Context;
use clap::Parser;
use flare_kb::config::{load_config_with_hash, Config};
use flare_kb::crawler::{run_crawl, RunOptions};
use flare_kb::output::{load_statistics, print_search_results, print_statistics, search_all};
use flare_kb::storage::open_storage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// flare-kb: an organization knowledge-base crawler
///
/// flare-kb crawls the organization's web properties pass by pass, collects
/// repository READMEs, and stores everything in a searchable SQLite file.
#[derive(Parser, Debug)]
#[command(name = "flare-kb")]
#[command(version)]
#[command(about = "An organization knowledge-base crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "search"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "search"])]
    stats: bool,

    /// Run a full-text query against the database and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["dry_run", "stats"])]
    search: Option<String>,

    /// Skip the web crawl passes
    #[arg(long)]
    skip_web: bool,

    /// Skip the repository collection
    #[arg(long)]
    skip_repos: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(query) = &cli.search {
        handle_search(&config, query)?;
    } else {
        let options = RunOptions {
            skip_web: cli.skip_web,
            skip_repos: cli.skip_repos,
        };
        handle_crawl(&config, &config_hash, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("flare_kb=info,warn"),
            1 => EnvFilter::new("flare_kb=debug,info"),
            2 => EnvFilter::new("flare_kb=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated crawl plan
fn handle_dry_run(config: &Config) {
    println!("=== flare-kb Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nAdmission ({:?}):", config.admission.mode);
    for host in &config.admission.hosts {
        println!("  - {}", host);
    }
    println!(
        "  Excluded extensions: {}",
        config.admission.excluded_extensions.join(" ")
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nCrawl Passes ({}):", config.passes.len());
    for pass in &config.passes {
        match pass.max_pages {
            Some(cap) => println!("  - {} -> {} (max {} pages)", pass.label, pass.start_url, cap),
            None => println!("  - {} -> {}", pass.label, pass.start_url),
        }
    }

    match &config.repositories {
        Some(repos) => {
            println!("\nRepositories ({}):", repos.owner);
            println!("  API: {}", repos.api_base);
            println!("  Delay between calls: {}ms", repos.delay_ms);
            println!("  Discover organization repositories: {}", repos.discover);
            for id in &repos.ids {
                println!("  - {}", id);
            }
        }
        None => println!("\nRepositories: not configured"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: prints matching pages and repositories
fn handle_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let results = search_all(&storage, query)?;
    print_search_results(query, &results);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, options: RunOptions) -> anyhow::Result<()> {
    tracing::info!(
        "Passes: {}, admitted hosts: {}",
        config.passes.len(),
        config.admission.hosts.len()
    );

    match run_crawl(config, config_hash, options).await {
        Ok(summary) => {
            let stored: u64 = summary.passes.iter().map(|p| p.pages_stored).sum();
            tracing::info!(
                "Run {} completed: {} pages stored, {} repositories stored",
                summary.run_id,
                stored,
                summary.repositories_stored.unwrap_or(0)
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
