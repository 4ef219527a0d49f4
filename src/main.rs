use ai_event_scanner::app::{
    CollectionStore, DiscoveryUseCase, SessionService, ToggleOutcome, TransportPort,
};
use ai_event_scanner::config::Config;
use ai_event_scanner::domain::{
    Category, CollectionScope, DiscoveryRequest, Event, LoadFilters, Platform, PreferencesUpdate,
};
use ai_event_scanner::error::ScannerError;
use ai_event_scanner::infra::{ReqwestHttp, SessionFile};
use ai_event_scanner::observability::{init_logging, metrics};
use ai_event_scanner::view::{project, CategoryFilter};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Parser)]
#[command(name = "ai_event_scanner")]
#[command(about = "Discover and track AI events from Luma and Meetup")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a config.toml (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print a Prometheus snapshot of client metrics after the command
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct MonthArgs {
    /// Month (1-12), defaults to the current month
    #[arg(long)]
    month: Option<u32>,
    /// Year, defaults to the current year
    #[arg(long)]
    year: Option<i32>,
}

impl MonthArgs {
    fn scope(self) -> Result<CollectionScope, ScannerError> {
        let current = CollectionScope::current();
        CollectionScope::new(
            self.month.unwrap_or(current.month),
            self.year.unwrap_or(current.year),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the backend to discover events for a location and month
    Discover {
        /// City or "Online"
        #[arg(long)]
        location: String,
        /// Platform to search: luma or meetup
        #[arg(long, default_value = "luma")]
        platform: Platform,
        #[command(flatten)]
        when: MonthArgs,
    },
    /// Show the events of a month
    Events {
        #[command(flatten)]
        when: MonthArgs,
        /// Server-side location filter
        #[arg(long)]
        location: Option<String>,
        /// Server-side minimum AI relevance score (1-10)
        #[arg(long)]
        min_score: Option<u8>,
        /// Category to show, or "All"
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
        /// Only show watched events
        #[arg(long)]
        watched_only: bool,
    },
    /// Flip the watched flag of one event
    Watch {
        /// Event id
        #[arg(long)]
        id: String,
        #[command(flatten)]
        when: MonthArgs,
    },
    /// Show or change session preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesAction,
    },
    /// Show session statistics
    Stats,
    /// Check backend health
    Health,
    /// List the categories and platforms the backend knows
    Categories,
}

#[derive(Subcommand)]
enum PreferencesAction {
    Show,
    Set {
        #[arg(long)]
        location: Option<String>,
        /// Comma-separated categories
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<Category>>,
        #[arg(long)]
        min_score: Option<u8>,
        #[arg(long)]
        platform: Option<Platform>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        theme: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            dotenv::dotenv().ok();
            Config::from_file(path)?.with_env_overrides()?
        }
        None => Config::load()?,
    };
    Ok(config)
}

fn print_event(event: &Event) {
    let watched = if event.is_watched { "👁 " } else { "  " };
    println!(
        "{}{} [{}] {} | {} | score {}/10 | {}",
        watched,
        event.date_time.format("%Y-%m-%d %H:%M"),
        event.category,
        event.title,
        event.location,
        event.ai_relevance_score,
        event.platform
    );
    println!("     id: {}  {}", event.id, event.source_url);
}

async fn run(command: Commands, transport: Arc<dyn TransportPort>) -> Result<(), ScannerError> {
    let store = Arc::new(CollectionStore::new(transport.clone()));
    let sessions = SessionService::new(transport.clone());

    match command {
        Commands::Discover { location, platform, when } => {
            let discovery = DiscoveryUseCase::new(transport, store.clone());
            let request = DiscoveryRequest::new(location, platform, when.scope()?);
            println!("🔎 Discovering events on {} for {}...", platform, request.scope());
            let outcome = discovery.discover(request).await?;
            println!("✅ {}", outcome.message);
            if let Some(count) = outcome.events_discovered {
                println!("   Events discovered: {}", count);
            }
            match (outcome.collection_refreshed, store.snapshot().await) {
                (true, Some(collection)) => println!(
                    "   {} now has {} events ({} watched)",
                    outcome.scope,
                    collection.total_events(),
                    collection.watched_count()
                ),
                _ => {
                    let reason = outcome.refresh_error.unwrap_or_default();
                    println!("⚠️  Could not reload {}: {}", outcome.scope, reason);
                }
            }
        }
        Commands::Events {
            when,
            location,
            min_score,
            category,
            watched_only,
        } => {
            let filters = LoadFilters {
                location,
                category: None,
                min_relevance_score: min_score,
            };
            let collection = store.load(when.scope()?, filters).await?;
            println!(
                "\n📅 Events for {}: {} total, {} watched",
                collection.scope(),
                collection.total_events(),
                collection.watched_count()
            );
            for (bucket, events) in collection.buckets() {
                println!("   {}: {}", bucket, events.len());
            }
            let shown = project(&collection, &category, watched_only);
            if shown.is_empty() {
                println!("\nNo events match ({}, watched only: {})", category, watched_only);
            } else {
                println!();
                for event in shown {
                    print_event(event);
                }
            }
        }
        Commands::Watch { id, when } => {
            let collection = store.load(when.scope()?, LoadFilters::default()).await?;
            let Some(current) = collection.find(&id).map(|e| e.is_watched) else {
                println!("⚠️  Event {} is not in {}", id, collection.scope());
                return Ok(());
            };
            match store.toggle_watch(&id, current).await? {
                ToggleOutcome::Applied { watched } | ToggleOutcome::Unchanged { watched } => {
                    let verb = if watched { "Watching" } else { "No longer watching" };
                    println!("✅ {} {}", verb, id);
                    if let Some(collection) = store.snapshot().await {
                        println!("   Watched this month: {}", collection.watched_count());
                    }
                }
                ToggleOutcome::NotFound => println!("⚠️  Event {} disappeared from the collection", id),
                ToggleOutcome::Stale => debug!("Toggle superseded by a newer one"),
            }
        }
        Commands::Preferences { action } => match action {
            PreferencesAction::Show => {
                let prefs = sessions.preferences().await?;
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
            PreferencesAction::Set {
                location,
                categories,
                min_score,
                platform,
                notifications,
                theme,
            } => {
                let update = PreferencesUpdate {
                    location,
                    categories,
                    min_relevance_score: min_score,
                    platform,
                    notifications,
                    theme,
                };
                let prefs = sessions.update_preferences(update).await?;
                println!("✅ Preferences updated");
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            }
        },
        Commands::Stats => {
            let stats = sessions.session_stats().await?;
            println!("📊 Session stats");
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Health => {
            let health = sessions.health().await?;
            let icon = if health.is_healthy() { "✅" } else { "❌" };
            println!(
                "{} {} {} ({})",
                icon,
                health.service.as_deref().unwrap_or("backend"),
                health.version.as_deref().unwrap_or("unknown version"),
                health.status
            );
        }
        Commands::Categories => {
            let catalog = sessions.categories().await?;
            let categories: Vec<String> = catalog.categories.iter().map(ToString::to_string).collect();
            let platforms: Vec<String> = catalog.platforms.iter().map(ToString::to_string).collect();
            println!("Categories: {}", categories.join(", "));
            println!("Platforms:  {}", platforms.join(", "));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    init_logging(&config.logging.directory)?;

    if cli.metrics {
        if let Err(e) = metrics::init() {
            warn!("Metrics unavailable: {}", e);
        }
    }

    let session_file = SessionFile::new(config.session.state_file.clone());
    let stored_session = session_file.load()?;
    let http = Arc::new(ReqwestHttp::new(
        &config.api,
        &config.session,
        stored_session.as_deref(),
    )?);

    let result = run(cli.command, http.clone()).await;

    if let Some(session_id) = http.session_cookie() {
        if stored_session.as_deref() != Some(session_id.as_str()) {
            session_file.save(&session_id)?;
        }
    }

    if cli.metrics {
        if let Some(snapshot) = metrics::render() {
            println!("\n{}", snapshot);
        }
    }

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        println!("❌ {}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}
