use std::path::{Path, PathBuf};
use std::sync::Arc;
use vodseek::cli::output::{describe_event, describe_outcome, print_videos, summary};
use vodseek::cli::{CacheAction, Cli, Commands, ConfigAction, ViewArgs};
use vodseek::client::HttpSearchClient;
use vodseek::clock::SystemClock;
use vodseek::config::Config;
use vodseek::error::{Result, VodseekError};
use vodseek::history::Preferences;
use vodseek::retrieval::{event_channel, SearchOrchestrator, SearchOutcome, SearchSettings};
use vodseek::storage::{
    format_size, open_persistent_store, KeyValueStore, MemoryStore, ResultCache, SqliteStore,
};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Search {
            query,
            pages,
            view,
            refresh,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_search(&config, &query, pages, &view, refresh, json)?;
        }
        Commands::History { clear } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_history(&config, clear)?;
        }
        Commands::Favorite { game } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_favorite(&config, game)?;
        }
        Commands::Cache { action } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_cache(&config, action)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "vodseek=debug" } else { "vodseek=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Persistent store when available, memory otherwise
struct Stores {
    sqlite: Option<Arc<SqliteStore>>,
    kv: Arc<dyn KeyValueStore>,
}

fn open_stores(config: &Config) -> Result<Stores> {
    let data_dir = expand_path(&config.storage.data_dir)?;
    let sqlite = open_persistent_store(&data_dir, config.max_entry_bytes());
    let kv: Arc<dyn KeyValueStore> = match &sqlite {
        Some(store) => store.clone(),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(Stores { sqlite, kv })
}

fn cmd_search(
    config: &Config,
    query: &str,
    pages: usize,
    view: &ViewArgs,
    refresh: bool,
    json: bool,
) -> Result<()> {
    let stores = open_stores(config)?;
    let cache = ResultCache::new(Some(stores.kv.clone()), config.cache_ttl());
    let client = Arc::new(HttpSearchClient::new(&config.api)?);
    let (events, mut receiver) = event_channel();

    let orchestrator = SearchOrchestrator::new(client, cache, SearchSettings::from_config(config))
        .with_events(events);
    orchestrator.set_filters(view.filters());
    orchestrator.set_sort(view.sort);

    if refresh {
        orchestrator.cache().invalidate(query.trim());
    }

    let mut prefs = Preferences::load(
        stores.kv.clone(),
        Arc::new(SystemClock),
        config.history.max_items,
    );
    prefs.record(query);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| VodseekError::Io {
            source: e,
            context: "Failed to start async runtime".to_string(),
        })?;

    let work = async move {
        let mut outcome = orchestrator.search(query).await;

        for _ in 1..pages.max(1) {
            if !orchestrator.snapshot().can_load_more() {
                break;
            }
            outcome = orchestrator.load_more().await;
        }

        (outcome, orchestrator.snapshot())
    };

    let progress = async move {
        while let Some(event) = receiver.recv().await {
            tracing::debug!("event: {}", event.name());
            if let Some(line) = describe_event(&event) {
                eprintln!("{}", line);
            }
        }
    };

    let ((outcome, state), ()) = runtime.block_on(async { tokio::join!(work, progress) });

    if json {
        let body = serde_json::json!({ "outcome": outcome, "state": state });
        let text = serde_json::to_string_pretty(&body).map_err(|e| VodseekError::Json {
            source: e,
            context: "Failed to serialize search results".to_string(),
        })?;
        println!("{}", text);
    } else {
        print_videos(&state.visible_videos);
        if !state.all_videos.is_empty() {
            println!("\n{}", summary(&state));
        }
        println!("{}", describe_outcome(&outcome));
    }

    match outcome {
        SearchOutcome::Failed { error } => Err(VodseekError::Search(error)),
        _ => Ok(()),
    }
}

fn cmd_history(config: &Config, clear: bool) -> Result<()> {
    let stores = open_stores(config)?;
    let mut prefs = Preferences::load(stores.kv, Arc::new(SystemClock), config.history.max_items);

    if clear {
        prefs.clear_history();
        println!("✓ Search history cleared");
        return Ok(());
    }

    if prefs.history().is_empty() {
        println!("No recent searches");
        return Ok(());
    }

    println!("Recent searches:");
    for entry in prefs.history() {
        let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(entry.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let star = if prefs.is_favorite(&entry.query) { "★" } else { " " };
        println!("  {} {}  {}", star, entry.query, when);
    }

    Ok(())
}

fn cmd_favorite(config: &Config, game: Option<String>) -> Result<()> {
    let stores = open_stores(config)?;
    let mut prefs = Preferences::load(stores.kv, Arc::new(SystemClock), config.history.max_items);

    match game {
        Some(game) => {
            if prefs.toggle_favorite(&game) {
                println!("★ Added {} to favourites", game);
            } else {
                println!("Removed {} from favourites", game);
            }
        }
        None if prefs.favorites().is_empty() => println!("No favourite games"),
        None => {
            println!("Favourite games:");
            for game in prefs.favorites() {
                println!("  ★ {}", game);
            }
        }
    }

    Ok(())
}

fn cmd_cache(config: &Config, action: CacheAction) -> Result<()> {
    let stores = open_stores(config)?;
    let cache = ResultCache::new(Some(stores.kv.clone()), config.cache_ttl());

    match action {
        CacheAction::Clear => {
            let removed = cache.clear();
            println!("✓ Removed {} cached searches", removed);
        }
        CacheAction::Prune => {
            let removed = cache.purge_expired(chrono::Utc::now());
            println!("✓ Removed {} stale entries", removed);
        }
        CacheAction::Stats => {
            let Some(sqlite) = stores.sqlite else {
                println!("No persistent store available, nothing is cached between runs");
                return Ok(());
            };

            let stats = sqlite.stats()?;
            let cached = stores.kv.keys(vodseek::storage::CACHE_KEY_PREFIX)?.len();

            println!("Store Statistics");
            println!("================");
            println!("Entries:         {}", stats.entry_count);
            println!("Cached searches: {}", cached);
            println!("Total size:      {}", format_size(stats.total_size_bytes));
            println!("Entry TTL:       {}", config.cache.ttl);
        }
    }

    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| VodseekError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Backend: {}{}", config.api.base_url, config.api.search_path);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Save default config
            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = Config::load_or_default(&path)?;
    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }
    Ok(config)
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| VodseekError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| VodseekError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
