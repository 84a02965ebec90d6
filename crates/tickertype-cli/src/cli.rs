//! CLI argument definitions for tickertype.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | Print the visible ticker list |
//! | `add` | Add one or more tickers to the original list |
//! | `remove` | Blacklist one visible ticker |
//! | `remove-all` | Blacklist every visible ticker |
//! | `refresh` | Re-fetch the stock and ETF listings |
//! | `walk` | Step through the list interactively |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--home` | `$TICKERTYPE_HOME` | Directory holding the list files |
//! | `--no-fetched` | `false` | Hide fetched tickers from the visible list |
//! | `--verbose` | `false` | Debug-level logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! tickertype add aapl msft
//! tickertype refresh --deadline-secs 600
//! tickertype --no-fetched list --format json
//! tickertype walk
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ticker list helper: fetch, curate, and walk a list of symbols.
#[derive(Debug, Parser)]
#[command(
    name = "tickertype",
    author,
    version,
    about = "Fetch, curate, and walk a ticker list",
    long_about = "tickertype keeps a local list of stock and ETF tickers. It merges \
tickers scraped from a screener with your own additions, hides anything you \
removed, and lets you step through the result one ticker at a time.\n\
\n\
Use 'tickertype <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Data directory holding original.txt, fetched.txt, and blacklist.txt.
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// Show only your own tickers, not the fetched ones.
    #[arg(long, global = true, default_value_t = false)]
    pub no_fetched: bool,

    /// Log at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One ticker or field per line.
    Text,
    /// Single JSON document.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the visible ticker list.
    List,

    /// Add tickers to your own list.
    ///
    /// Tickers are trimmed and uppercased. Adding a ticker you previously
    /// removed brings it back.
    ///
    /// # Examples
    ///
    ///   tickertype add AAPL
    ///   tickertype add spy qqq iwm
    Add(AddArgs),

    /// Remove one visible ticker.
    ///
    /// The ticker is blacklisted, so later refreshes will not bring it back.
    Remove(RemoveArgs),

    /// Remove every visible ticker.
    RemoveAll,

    /// Re-fetch the stock and ETF listings and replace the fetched list.
    ///
    /// Rate limits and network errors are retried until the listing is
    /// complete. Use --deadline-secs to give up after a fixed time.
    Refresh(RefreshArgs),

    /// Step through the visible list from standard input.
    ///
    /// Keys: n/down forward, p/up backward, o/right open a view,
    /// r refresh in the background, q quit.
    Walk(WalkArgs),
}

/// Arguments for the `add` command.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// One or more tickers (e.g., AAPL, BRK-B).
    #[arg(required = true, num_args = 1..)]
    pub tickers: Vec<String>,
}

/// Arguments for the `remove` command.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Ticker to remove.
    pub ticker: String,
}

/// Arguments for the `refresh` command.
#[derive(Debug, Args)]
pub struct RefreshArgs {
    /// Give up after this many seconds instead of retrying forever.
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

/// Arguments for the `walk` command.
#[derive(Debug, Args)]
pub struct WalkArgs {
    /// Prefix for open-view URLs; the encoded "<TICKER> stock" query is appended.
    #[arg(long, default_value = "https://www.google.com/search?q=")]
    pub search_base: String,
}
