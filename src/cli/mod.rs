//! CLI command definitions and parsing
use crate::filtering::{DateFilter, DurationFilter, FilterSet, LanguageFilter, SortKey, ViewsFilter};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod output;

#[derive(Parser, Debug)]
#[command(
    name = "vodseek",
    version,
    author = "neur0map",
    about = "Search recorded game videos from the terminal",
    long_about = "vodseek searches a video catalog by game name, retries flaky backends, falls back to \
                  alternate spellings when a query finds nothing, and caches results for fifteen minutes."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/vodseek/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search videos for a game
    Search {
        /// Game name
        query: String,

        /// Number of pages to fetch
        #[arg(short = 'n', long, default_value = "1")]
        pages: usize,

        #[command(flatten)]
        view: ViewArgs,

        /// Ignore cached results for this query
        #[arg(long)]
        refresh: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show or clear recent searches
    History {
        /// Forget every recorded search
        #[arg(long)]
        clear: bool,
    },

    /// Toggle a game in the favourites list (lists favourites without a name)
    Favorite {
        /// Game name
        game: Option<String>,
    },

    /// Manage the local result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Filter and sort options for displayed results
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Upload date: all, today, this_week, this_month
    #[arg(long, default_value = "all")]
    pub date: DateFilter,

    /// Length: all, short, medium, long
    #[arg(long, default_value = "all")]
    pub duration: DurationFilter,

    /// View count: all, less_100, 100_1000, more_1000
    #[arg(long, default_value = "all")]
    pub views: ViewsFilter,

    /// Language code, or all
    #[arg(long, default_value = "all")]
    pub language: LanguageFilter,

    /// Sort by: date, views, duration
    #[arg(long, default_value = "date")]
    pub sort: SortKey,
}

impl ViewArgs {
    pub fn filters(&self) -> FilterSet {
        FilterSet {
            date: self.date,
            duration: self.duration,
            views: self.views,
            language: self.language.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Remove every cached search
    Clear,

    /// Remove expired and unreadable entries
    Prune,

    /// Show store size and entry counts
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "vodseek",
            "--profile",
            "fast",
            "search",
            "Minecraft",
            "--pages",
            "2",
            "--views",
            "more_1000",
            "--language",
            "fr",
            "--sort",
            "views",
        ])
        .unwrap();

        assert_eq!(cli.profile.as_deref(), Some("fast"));
        match cli.command {
            Commands::Search {
                query, pages, view, ..
            } => {
                assert_eq!(query, "Minecraft");
                assert_eq!(pages, 2);
                assert_eq!(view.sort, SortKey::Views);
                let filters = view.filters();
                assert_eq!(filters.views, ViewsFilter::More1000);
                assert_eq!(filters.language, LanguageFilter::Code("fr".to_string()));
                assert_eq!(filters.date, DateFilter::All);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let result = Cli::try_parse_from(["vodseek", "search", "q", "--date", "yesterday"]);
        assert!(result.is_err());
    }
}
