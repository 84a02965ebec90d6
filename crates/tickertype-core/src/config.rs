//! Runtime configuration resolved from defaults and `TICKERTYPE_*` variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `TICKERTYPE_HOME` | `$HOME/.tickertype` | Directory holding the three list files |
//! | `TICKERTYPE_STOCK_URL` | screener, stocks only | Stock listing address |
//! | `TICKERTYPE_ETF_URL` | screener, ETFs only | ETF listing address |
//! | `TICKERTYPE_SHOW_FETCHED` | `true` | Include fetched tickers in the visible set |
//! | `TICKERTYPE_REMOVE_ALL` | `blacklist-only` | `blacklist-only` or `clear-original` |
//! | `TICKERTYPE_DIRECTION_ON_REBUILD` | `preserve` | `preserve` or `reset` |
//! | `TICKERTYPE_BACKOFF` | `fixed` | `fixed` or `exponential` (doubling, jittered, capped at 5 min) |
//! | `TICKERTYPE_BACKOFF_SECS` | `10` | Delay before the first retry of a page |
//! | `TICKERTYPE_MAX_RETRIES` | unset | Retry ceiling per page; unset retries forever |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::{FetchConfig, ListingQuery};
use crate::navigator::DirectionOnRebuild;
use crate::reconciler::ReconcilerOptions;
use crate::retry::Backoff;
use crate::store::TickerStore;
use crate::ValidationError;

pub const DEFAULT_STOCK_URL: &str = "https://finviz.com/screener.ashx?v=111&f=ind_stocksonly";
pub const DEFAULT_ETF_URL: &str = "https://finviz.com/screener.ashx?v=111&f=ind_exchangetradedfund";
pub const DEFAULT_BACKOFF_SECS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub home: PathBuf,
    pub stock_url: String,
    pub etf_url: String,
    pub reconciler: ReconcilerOptions,
    pub direction_on_rebuild: DirectionOnRebuild,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home: default_home(|name| env::var(name).ok()),
            stock_url: String::from(DEFAULT_STOCK_URL),
            etf_url: String::from(DEFAULT_ETF_URL),
            reconciler: ReconcilerOptions::default(),
            direction_on_rebuild: DirectionOnRebuild::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self {
            home: default_home(&lookup),
            ..Self::default()
        };

        if let Some(url) = var("TICKERTYPE_STOCK_URL") {
            config.stock_url = url;
        }
        if let Some(url) = var("TICKERTYPE_ETF_URL") {
            config.etf_url = url;
        }
        if let Some(value) = var("TICKERTYPE_SHOW_FETCHED") {
            config.reconciler.show_fetched = parse_flag("TICKERTYPE_SHOW_FETCHED", &value)?;
        }
        if let Some(value) = var("TICKERTYPE_REMOVE_ALL") {
            config.reconciler.remove_all = value.parse()?;
        }
        if let Some(value) = var("TICKERTYPE_DIRECTION_ON_REBUILD") {
            config.direction_on_rebuild = value.parse()?;
        }
        let backoff_secs = var("TICKERTYPE_BACKOFF_SECS")
            .map(|value| parse_number("TICKERTYPE_BACKOFF_SECS", &value))
            .transpose()?;
        let strategy = var("TICKERTYPE_BACKOFF");
        if backoff_secs.is_some() || strategy.is_some() {
            let secs = backoff_secs.unwrap_or(DEFAULT_BACKOFF_SECS);
            let delay = Duration::from_secs(u64::from(secs));
            config.fetch.retry.backoff =
                Backoff::named(strategy.as_deref().unwrap_or("fixed"), delay)?;
        }
        if let Some(value) = var("TICKERTYPE_MAX_RETRIES") {
            config.fetch.retry.max_retries = Some(parse_number("TICKERTYPE_MAX_RETRIES", &value)?);
        }

        Ok(config)
    }

    pub fn store(&self) -> TickerStore {
        TickerStore::new(&self.home)
    }

    /// Stock query first, then ETF query.
    pub fn queries(&self) -> Vec<ListingQuery> {
        vec![
            ListingQuery::new("stocks", self.stock_url.as_str()),
            ListingQuery::new("etfs", self.etf_url.as_str()),
        ]
    }
}

fn default_home<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("TICKERTYPE_HOME").filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }

    if let Some(home) = lookup("HOME").filter(|home| !home.is_empty()) {
        return PathBuf::from(home).join(".tickertype");
    }

    PathBuf::from(".tickertype")
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidFlag {
            name,
            value: value.to_owned(),
        }),
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u32, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidNumber {
            name,
            value: value.to_owned(),
        })
}
