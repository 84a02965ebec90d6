//! # Tickertype Core
//!
//! Ticker list maintenance and traversal for the tickertype desktop helper.
//!
//! ## Overview
//!
//! - **Fetcher** pulls tickers from a paginated HTML screener, surviving
//!   rate limits and flaky connections by retrying the same page
//! - **Reconciler** merges fetched tickers with the user's own list and
//!   blacklist into one sorted, deduplicated visible set
//! - **Navigator** walks that set as a ring, forward and backward, handing
//!   out the next ticker to type
//! - **Store** persists the three lists as plain text with atomic replace
//! - **Service** serializes all mutations on one task and republishes the
//!   navigator ring after each change
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Defaults and `TICKERTYPE_*` environment overrides |
//! | [`domain`] | [`Ticker`] and [`ListKind`] |
//! | [`error`] | Validation errors |
//! | [`fetcher`] | Paginated listing fetch loop |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`listing`] | HTML listing page parser |
//! | [`navigator`] | Ring and bidirectional cursor |
//! | [`reconciler`] | Original / fetched / blacklist merge rules |
//! | [`retry`] | Backoff policy |
//! | [`service`] | Single-writer task and handle |
//! | [`sleeper`] | Delay abstraction |
//! | [`store`] | Flat-file list persistence |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   add / remove / refresh   ┌──────────────────┐
//! │  Input shell │ ─────────────────────────▶ │  Service worker  │
//! └──────┬───────┘                            └────────┬─────────┘
//!        │ step / open view                            │
//!        ▼                                             ▼
//! ┌──────────────┐   ring swap     ┌──────────────┐   ┌──────────────┐
//! │  Navigator   │ ◀────────────── │  Reconciler  │──▶│ TickerStore  │
//! └──────────────┘                 └──────▲───────┘   └──────────────┘
//!                                         │ fetch result
//!                                  ┌──────┴───────┐   ┌──────────────┐
//!                                  │   Fetcher    │──▶│ HttpClient   │
//!                                  └──────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use tickertype_core::{
//!     spawn_service, AppConfig, ListingFetcher, Navigator, Reconciler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let reconciler = Reconciler::open(config.store(), config.reconciler)?;
//!     let fetcher = ListingFetcher::new(config.fetch.clone())?;
//!     let navigator = Arc::new(Mutex::new(Navigator::new(config.direction_on_rebuild)));
//!
//!     let (service, _task) = spawn_service(reconciler, fetcher, config.queries(), navigator);
//!     service.add("AAPL").await?;
//!
//!     if let Some(ticker) = service.step_forward() {
//!         println!("type: {ticker}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod listing;
pub mod navigator;
pub mod reconciler;
pub mod retry;
pub mod service;
pub mod sleeper;
pub mod store;

pub use config::AppConfig;
pub use domain::{ListKind, Ticker};
pub use error::ValidationError;
pub use fetcher::{
    FetchConfig, FetchError, FetchOutcome, ListingFetcher, ListingQuery, QueryReport,
    RefreshReport, DEFAULT_PAGE_SIZE,
};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use listing::{ListingPage, ListingParser};
pub use navigator::{Direction, DirectionOnRebuild, Navigator, OpenView, Ring};
pub use reconciler::{ReconcileError, Reconciler, ReconcilerOptions, RemoveAllPolicy};
pub use retry::{Backoff, RetryConfig};
pub use service::{spawn_service, ServiceError, ServiceHandle, SharedNavigator};
pub use sleeper::{Sleeper, TokioSleeper};
pub use store::{Durability, StoreError, StoredLists, TickerStore};
