//! Resilient paginated listing fetcher.
//!
//! Pages are requested in order starting at 1 and their tickers concatenated
//! until a page comes back with no rows. Transport failures and rate-limit
//! responses are retried against the same page after a backoff; a page is
//! never skipped. With the default [`RetryConfig`] there is no retry ceiling,
//! so a source that never recovers blocks the caller indefinitely. Use
//! [`ListingFetcher::fetch_with_deadline`] when bounded latency matters.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::listing::{ListingPage, ListingParser, DEFAULT_ROW_SELECTOR, DEFAULT_TICKER_COLUMN};
use crate::retry::RetryConfig;
use crate::sleeper::{Sleeper, TokioSleeper};

/// Results per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";
const DEFAULT_REFERER: &str = "https://finviz.com/";

/// Errors surfaced by the fetcher. Transient failures are retried, not reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("gave up on {query} page {page} after {attempts} attempts")]
    RetriesExhausted {
        query: String,
        page: u32,
        attempts: u32,
    },
    #[error("listing fetch did not finish within {after_ms}ms")]
    TimedOut { after_ms: u64 },
    #[error("invalid row selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// A parameterized listing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub name: String,
    pub url: String,
    pub page_size: u32,
}

impl ListingQuery {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 1-based row offset of the first result on `page` (also 1-based).
    pub fn offset(&self, page: u32) -> u32 {
        1 + page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn page_url(&self, page: u32) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}r={}", self.url, separator, self.offset(page))
    }
}

/// Fetcher tuning. Defaults follow the screener site's tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Pause before every request, retries included.
    pub courtesy_delay: Duration,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
    pub referer: String,
    pub row_selector: String,
    pub ticker_column: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            courtesy_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            user_agent: String::from(DEFAULT_USER_AGENT),
            referer: String::from(DEFAULT_REFERER),
            row_selector: String::from(DEFAULT_ROW_SELECTOR),
            ticker_column: DEFAULT_TICKER_COLUMN,
        }
    }
}

/// Per-query summary of a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    pub name: String,
    pub pages: u32,
    pub tickers: usize,
}

/// Summary of one multi-query refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub fetched_at: String,
    pub queries: Vec<QueryReport>,
}

impl RefreshReport {
    pub fn total_tickers(&self) -> usize {
        self.queries.iter().map(|query| query.tickers).sum()
    }
}

/// Concatenated raw tickers from every query plus the report describing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub tickers: Vec<String>,
    pub report: RefreshReport,
}

#[derive(Debug, Default)]
struct Harvest {
    tickers: Vec<String>,
    pages: u32,
}

/// Paginated listing fetcher. Stateless between calls.
#[derive(Clone)]
pub struct ListingFetcher {
    http_client: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    parser: ListingParser,
    config: FetchConfig,
}

impl ListingFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        Self::with_transport(
            Arc::new(ReqwestHttpClient::new()),
            Arc::new(TokioSleeper),
            config,
        )
    }

    pub fn with_transport(
        http_client: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
        config: FetchConfig,
    ) -> Result<Self, FetchError> {
        let parser = ListingParser::new(&config.row_selector, config.ticker_column)?;
        Ok(Self {
            http_client,
            sleeper,
            parser,
            config,
        })
    }

    /// Fetch every page of `query` and return the raw ticker strings in page order.
    pub async fn fetch(&self, query: &ListingQuery) -> Result<Vec<String>, FetchError> {
        Ok(self.harvest(query).await?.tickers)
    }

    /// [`fetch`](Self::fetch) bounded by an external deadline.
    pub async fn fetch_with_deadline(
        &self,
        query: &ListingQuery,
        deadline: Duration,
    ) -> Result<Vec<String>, FetchError> {
        match tokio::time::timeout(deadline, self.fetch(query)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::TimedOut {
                after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Fetch each query in turn. Results are concatenated, not deduplicated.
    pub async fn fetch_all(&self, queries: &[ListingQuery]) -> Result<FetchOutcome, FetchError> {
        let mut tickers = Vec::new();
        let mut reports = Vec::with_capacity(queries.len());

        for query in queries {
            let harvest = self.harvest(query).await?;
            reports.push(QueryReport {
                name: query.name.clone(),
                pages: harvest.pages,
                tickers: harvest.tickers.len(),
            });
            tickers.extend(harvest.tickers);
        }

        let fetched_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Ok(FetchOutcome {
            tickers,
            report: RefreshReport {
                fetched_at,
                queries: reports,
            },
        })
    }

    async fn harvest(&self, query: &ListingQuery) -> Result<Harvest, FetchError> {
        let mut harvest = Harvest::default();
        let mut page = 1_u32;

        loop {
            let listing = self.fetch_page(query, page).await?;
            if listing.is_empty() {
                info!(
                    query = %query.name,
                    pages = harvest.pages,
                    tickers = harvest.tickers.len(),
                    "listing exhausted"
                );
                return Ok(harvest);
            }

            info!(query = %query.name, page, rows = listing.rows, "fetched listing page");
            harvest.tickers.extend(listing.tickers);
            harvest.pages = page;
            page = page.saturating_add(1);
        }
    }

    /// Fetch a single page, retrying the same page on transient failures.
    pub async fn fetch_page(
        &self,
        query: &ListingQuery,
        page: u32,
    ) -> Result<ListingPage, FetchError> {
        let url = query.page_url(page);
        let mut retries = 0_u32;

        loop {
            self.pause(self.config.courtesy_delay).await;

            let request = HttpRequest::get(url.as_str())
                .with_header("User-Agent", self.config.user_agent.as_str())
                .with_header("Referer", self.config.referer.as_str())
                .with_timeout(self.config.request_timeout);

            match self.http_client.execute(request).await {
                Ok(response) if self.config.retry.should_retry_status(response.status) => {
                    warn!(
                        query = %query.name,
                        page,
                        status = response.status,
                        "rate limited, backing off"
                    );
                }
                Ok(response) => {
                    if !response.is_success() {
                        warn!(
                            query = %query.name,
                            page,
                            status = response.status,
                            "unexpected status, parsing body anyway"
                        );
                    }
                    return Ok(self.parser.parse(&response.body));
                }
                Err(error) => {
                    warn!(
                        query = %query.name,
                        page,
                        kind = ?error.kind(),
                        error = %error,
                        "request failed, backing off"
                    );
                }
            }

            if !self.config.retry.allows_retry(retries) {
                return Err(FetchError::RetriesExhausted {
                    query: query.name.clone(),
                    page,
                    attempts: retries.saturating_add(1),
                });
            }

            self.pause(self.config.retry.delay_for_attempt(retries)).await;
            retries = retries.saturating_add(1);
        }
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration).await;
        }
    }
}
