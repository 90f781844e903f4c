//! Tome CLI
//!
//! Command-line front end for cached AniList manga lookups.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tome_cache::CacheStats;
use tome_core::types::Manga;
use tome_lookup::{LookupConfig, LookupService, Resolved};

/// Tome - cached manga metadata from AniList
#[derive(Parser)]
#[command(name = "tome")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cache directory
    #[arg(long, global = true, env = "TOME_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// AniList GraphQL endpoint
    #[arg(long, global = true, env = "TOME_ANILIST_URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search manga by name
    Search {
        /// Title to search for
        name: String,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a manga by AniList id
    Get {
        /// AniList id
        id: i64,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Bind a name to an AniList id
    Link {
        /// Name as it appears locally
        name: String,
        /// AniList id it refers to
        id: i64,
    },

    /// Find the best match for a name and remember it
    Closest {
        /// Name to match
        name: String,
    },

    /// Inspect or clear the caches
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts and lifetimes
    Info,

    /// Remove cached lookups
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Also remove name bindings
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tome=debug,info"
    } else {
        "tome=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = LookupConfig::from_env();
    if let Some(dir) = cli.cache_dir {
        config = config.with_cache_dir(dir);
    }
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }

    let service = LookupService::from_config(&config).with_context(|| {
        format!(
            "Failed to open lookup service (cache dir: {})",
            config.cache_dir.display()
        )
    })?;

    match cli.command {
        Commands::Search { name, json } => cmd_search(&service, &name, json).await,
        Commands::Get { id, json } => cmd_get(&service, id, json).await,
        Commands::Link { name, id } => cmd_link(&service, &name, id),
        Commands::Closest { name } => cmd_closest(&service, &name).await,
        Commands::Cache { action } => match action {
            CacheAction::Info => cmd_cache_info(&service, &config),
            CacheAction::Clear { yes, all } => cmd_cache_clear(&service, yes, all),
        },
    }
}

/// Search by name
async fn cmd_search(service: &LookupService, name: &str, json: bool) -> Result<()> {
    let pb = spinner(format!("Searching AniList for \"{}\"...", name))?;
    let result = service.search_by_name_full(name).await;
    pb.finish_and_clear();

    let Resolved { value: mangas, from_cache } =
        result.with_context(|| format!("Search for \"{}\" failed", name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&mangas)?);
        return Ok(());
    }

    println!("{} {}{}", "🔍 Results for:".cyan().bold(), name, source_tag(from_cache));

    if mangas.is_empty() {
        println!("\n{}", "No manga found.".yellow());
        return Ok(());
    }

    for manga in &mangas {
        println!(
            "   {} {} {}",
            format!("{:>7}", manga.id).dimmed(),
            manga.display_title().bold(),
            manga.status.as_deref().unwrap_or("").dimmed()
        );
    }
    println!("\n   {} result(s)", mangas.len());

    Ok(())
}

/// Show one record by id
async fn cmd_get(service: &LookupService, id: i64, json: bool) -> Result<()> {
    let pb = spinner(format!("Fetching AniList id {}...", id))?;
    let result = service.get_by_id_full(id).await;
    pb.finish_and_clear();

    let Resolved { value: manga, from_cache } =
        result.with_context(|| format!("Lookup of AniList id {} failed", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manga)?);
        return Ok(());
    }

    print_manga(&manga, from_cache);
    Ok(())
}

/// Bind a name to an id
fn cmd_link(service: &LookupService, name: &str, id: i64) -> Result<()> {
    let previous = service.bound_id(name);

    service
        .bind(name, id)
        .with_context(|| format!("Failed to bind \"{}\" to {}", name, id))?;

    match previous {
        Some(old) if old != id => println!(
            "{} \"{}\" → {} (was {})",
            "✅ Rebound".green().bold(),
            name,
            id,
            old
        ),
        _ => println!("{} \"{}\" → {}", "✅ Bound".green().bold(), name, id),
    }

    Ok(())
}

/// Find and remember the closest match
async fn cmd_closest(service: &LookupService, name: &str) -> Result<()> {
    let pb = spinner(format!("Matching \"{}\"...", name))?;
    let result = service.find_closest(name).await;
    pb.finish_and_clear();

    match result.with_context(|| format!("Matching \"{}\" failed", name))? {
        Some(manga) => {
            println!("{} {}", "🎯 Closest match for:".cyan().bold(), name);
            print_manga(&manga, false);
        }
        None => println!("{} {}", "No match for:".yellow(), name),
    }

    Ok(())
}

/// Print cache statistics
fn cmd_cache_info(service: &LookupService, config: &LookupConfig) -> Result<()> {
    println!("{}", "📦 Cache".cyan().bold());
    println!("   {} {}", "Directory:".dimmed(), config.cache_dir.display());
    println!();

    for stats in service.caches().stats() {
        print_stats(&stats);
    }

    Ok(())
}

/// Clear caches after confirmation
fn cmd_cache_clear(service: &LookupService, yes: bool, all: bool) -> Result<()> {
    let what = if all {
        "all caches, including name bindings"
    } else {
        "search and id caches"
    };

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Clear {}?", what))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("{}", "Aborted.".dimmed());
            return Ok(());
        }
    }

    let caches = service.caches();
    let cleared = if all {
        caches.clear_all()
    } else {
        caches.clear_expiring()
    };
    cleared.context("Failed to clear caches")?;

    println!("{} {}", "🧹 Cleared".green().bold(), what);
    Ok(())
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn source_tag(from_cache: bool) -> ColoredString {
    if from_cache {
        " (cached)".dimmed()
    } else {
        " (AniList)".dimmed()
    }
}

fn print_manga(manga: &Manga, from_cache: bool) {
    println!(
        "\n{}{}",
        manga.display_title().green().bold(),
        source_tag(from_cache)
    );
    println!("   {} {}", "AniList id:".dimmed(), manga.id);

    let others: Vec<&str> = manga
        .names()
        .filter(|title| *title != manga.display_title())
        .collect();
    if !others.is_empty() {
        println!("   {} {}", "Also known as:".dimmed(), others.join(", "));
    }
    if let Some(status) = &manga.status {
        println!("   {} {}", "Status:".dimmed(), status);
    }
    if let Some(chapters) = manga.chapters {
        println!("   {} {}", "Chapters:".dimmed(), chapters);
    }
    if !manga.genres.is_empty() {
        println!("   {} {}", "Genres:".dimmed(), manga.genres.join(", "));
    }
    if let Some(url) = &manga.site_url {
        println!("   {} {}", "Page:".dimmed(), url.underline());
    }
}

fn print_stats(stats: &CacheStats) {
    println!("   {}", stats.name.bold());
    println!("      {} {}", "Entries:".dimmed(), stats.entries);
    println!("      {} {}", "Expires:".dimmed(), stats.policy);
    match stats.last_written_at {
        Some(at) => println!(
            "      {} {}",
            "Written:".dimmed(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("      {} {}", "Written:".dimmed(), "never".dimmed()),
    }
}
