//! Merges fetched tickers with the user's original list and blacklist.
//!
//! The visible set is always `(original ∪ fetched?) − blacklist`, sorted.
//! Removal is a soft delete: the ticker is added to the blacklist and stays in
//! `original`. Every mutation is written through to the [`TickerStore`].

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::fetcher::{FetchError, ListingFetcher, ListingQuery, RefreshReport};
use crate::store::{StoreError, StoredLists, TickerStore};
use crate::{ListKind, Ticker, ValidationError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("'{ticker}' is not in the visible list")]
    NotVisible { ticker: Ticker },
    #[error("there are no visible tickers to remove")]
    NothingVisible,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// What `remove_all` does to the original list besides blacklisting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemoveAllPolicy {
    /// Blacklist every visible ticker; `original` is untouched.
    #[default]
    BlacklistOnly,
    /// Blacklist every visible ticker and also empty `original`.
    ClearOriginal,
}

impl RemoveAllPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlacklistOnly => "blacklist-only",
            Self::ClearOriginal => "clear-original",
        }
    }
}

impl Display for RemoveAllPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoveAllPolicy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blacklist-only" => Ok(Self::BlacklistOnly),
            "clear-original" => Ok(Self::ClearOriginal),
            other => Err(ValidationError::InvalidPolicy {
                value: other.to_owned(),
                expected: "blacklist-only, clear-original",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub show_fetched: bool,
    pub remove_all: RemoveAllPolicy,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            show_fetched: true,
            remove_all: RemoveAllPolicy::default(),
        }
    }
}

/// Owner of the three ticker lists. Not synchronized; wrap in a single writer.
#[derive(Debug)]
pub struct Reconciler {
    store: TickerStore,
    lists: StoredLists,
    options: ReconcilerOptions,
}

impl Reconciler {
    /// Load all lists from `store`.
    pub fn open(store: TickerStore, options: ReconcilerOptions) -> Result<Self, ReconcileError> {
        let lists = store.load_all()?;
        Ok(Self {
            store,
            lists,
            options,
        })
    }

    pub fn lists(&self) -> &StoredLists {
        &self.lists
    }

    pub fn show_fetched(&self) -> bool {
        self.options.show_fetched
    }

    pub fn set_show_fetched(&mut self, show_fetched: bool) {
        self.options.show_fetched = show_fetched;
    }

    /// Visible set under the current show-fetched setting.
    pub fn visible(&self) -> Vec<Ticker> {
        self.compute_visible(self.options.show_fetched)
    }

    /// `(original ∪ fetched) − blacklist` when `show_fetched`, else `original − blacklist`.
    pub fn compute_visible(&self, show_fetched: bool) -> Vec<Ticker> {
        let mut visible: BTreeSet<&Ticker> = self.lists.original.iter().collect();
        if show_fetched {
            visible.extend(self.lists.fetched.iter());
        }
        visible
            .into_iter()
            .filter(|ticker| !self.lists.blacklist.contains(*ticker))
            .cloned()
            .collect()
    }

    fn is_visible(&self, ticker: &Ticker) -> bool {
        if self.lists.blacklist.contains(ticker) {
            return false;
        }
        self.lists.original.contains(ticker)
            || (self.options.show_fetched && self.lists.fetched.contains(ticker))
    }

    /// Add one ticker to `original`. An explicit add also lifts it off the blacklist.
    pub fn add(&mut self, raw: &str) -> Result<Ticker, ReconcileError> {
        let ticker = Ticker::parse(raw)?;
        self.insert_original(std::slice::from_ref(&ticker));
        Ok(ticker)
    }

    /// Add a batch. Blank entries are skipped; any other invalid entry rejects the batch.
    pub fn add_bulk<I, S>(&mut self, raws: I) -> Result<Vec<Ticker>, ReconcileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = BTreeSet::new();
        for raw in raws {
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                continue;
            }
            batch.insert(Ticker::parse(raw)?);
        }

        if batch.is_empty() {
            return Err(ValidationError::EmptyTicker.into());
        }

        let added: Vec<Ticker> = batch.into_iter().collect();
        self.insert_original(&added);
        Ok(added)
    }

    fn insert_original(&mut self, tickers: &[Ticker]) {
        let mut unblocked = false;
        for ticker in tickers {
            self.lists.original.insert(ticker.clone());
            unblocked |= self.lists.blacklist.remove(ticker);
        }

        self.store.save(ListKind::Original, &self.lists.original);
        if unblocked {
            self.store.save(ListKind::Blacklist, &self.lists.blacklist);
        }
        info!(count = tickers.len(), "added tickers");
    }

    /// Soft-delete a visible ticker by blacklisting it.
    pub fn remove(&mut self, raw: &str) -> Result<Ticker, ReconcileError> {
        let ticker = Ticker::parse(raw)?;
        if !self.is_visible(&ticker) {
            return Err(ReconcileError::NotVisible { ticker });
        }

        self.lists.blacklist.insert(ticker.clone());
        self.store.save(ListKind::Blacklist, &self.lists.blacklist);
        info!(%ticker, "blacklisted ticker");
        Ok(ticker)
    }

    /// Blacklist everything currently visible, applying the configured policy.
    pub fn remove_all(&mut self) -> Result<Vec<Ticker>, ReconcileError> {
        let visible = self.visible();
        if visible.is_empty() {
            return Err(ReconcileError::NothingVisible);
        }

        self.lists.blacklist.extend(visible.iter().cloned());
        self.store.save(ListKind::Blacklist, &self.lists.blacklist);

        if self.options.remove_all == RemoveAllPolicy::ClearOriginal {
            self.lists.original.clear();
            self.store.save(ListKind::Original, &self.lists.original);
        }

        info!(count = visible.len(), policy = %self.options.remove_all, "blacklisted all visible tickers");
        Ok(visible)
    }

    /// Replace `fetched` wholesale with a fresh fetch result. Returns the stored count.
    pub fn replace_fetched<I, S>(&mut self, raws: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fetched = BTreeSet::new();
        for raw in raws {
            match Ticker::parse(raw.as_ref()) {
                Ok(ticker) => {
                    fetched.insert(ticker);
                }
                Err(error) => {
                    warn!(raw = raw.as_ref(), %error, "dropping unparseable fetched ticker");
                }
            }
        }

        self.lists.fetched = fetched;
        self.store.save(ListKind::Fetched, &self.lists.fetched);
        self.lists.fetched.len()
    }

    /// Fetch every query and replace `fetched` with the union of the results.
    ///
    /// Blocks for as long as the fetcher does. Callers that must stay
    /// responsive should fetch elsewhere and hand the result to
    /// [`replace_fetched`](Self::replace_fetched).
    pub async fn refresh_from_source(
        &mut self,
        fetcher: &ListingFetcher,
        queries: &[ListingQuery],
    ) -> Result<RefreshReport, ReconcileError> {
        let outcome = fetcher.fetch_all(queries).await?;
        self.replace_fetched(outcome.tickers);
        Ok(outcome.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(tickers: &[Ticker]) -> Vec<&str> {
        tickers.iter().map(Ticker::as_str).collect()
    }

    fn reconciler(dir: &std::path::Path, options: ReconcilerOptions) -> Reconciler {
        Reconciler::open(TickerStore::new(dir), options).expect("open")
    }

    #[test]
    fn visible_is_union_minus_blacklist_sorted() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());

        rec.add_bulk(["msft", "aapl"]).expect("add");
        rec.replace_fetched(["SPY", "AAPL", "QQQ"]);
        rec.remove("QQQ").expect("remove");

        assert_eq!(names(&rec.visible()), vec!["AAPL", "MSFT", "SPY"]);
        assert_eq!(names(&rec.compute_visible(false)), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn add_rejects_blank_input_without_mutation() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());

        let err = rec.add("   ").expect_err("must fail");
        assert!(matches!(
            err,
            ReconcileError::Validation(ValidationError::EmptyTicker)
        ));
        assert!(rec.lists().original.is_empty());
    }

    #[test]
    fn add_bulk_skips_blanks_and_rejects_bad_batches_whole() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());

        let added = rec.add_bulk([" tsla ", "", "nvda", "TSLA"]).expect("add");
        assert_eq!(names(&added), vec!["NVDA", "TSLA"]);

        let err = rec.add_bulk(["AMD", "BAD$"]).expect_err("must fail");
        assert!(matches!(err, ReconcileError::Validation(_)));
        assert!(!rec.visible().iter().any(|t| t.as_str() == "AMD"));

        let err = rec.add_bulk(["", "  "]).expect_err("must fail");
        assert!(matches!(
            err,
            ReconcileError::Validation(ValidationError::EmptyTicker)
        ));
    }

    #[test]
    fn remove_of_invisible_ticker_reports_not_visible() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());
        rec.add("AAPL").expect("add");

        let err = rec.remove("MSFT").expect_err("must fail");
        assert!(matches!(err, ReconcileError::NotVisible { .. }));
        assert!(rec.lists().blacklist.is_empty());
    }

    #[test]
    fn fetched_only_ticker_is_invisible_when_fetched_hidden() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(
            temp.path(),
            ReconcilerOptions {
                show_fetched: false,
                ..ReconcilerOptions::default()
            },
        );
        rec.replace_fetched(["SPY"]);

        assert!(rec.visible().is_empty());
        assert!(matches!(
            rec.remove("SPY"),
            Err(ReconcileError::NotVisible { .. })
        ));

        rec.set_show_fetched(true);
        assert_eq!(names(&rec.visible()), vec!["SPY"]);
    }

    #[test]
    fn readding_a_blacklisted_ticker_restores_it() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());
        rec.add("AAPL").expect("add");
        rec.remove("AAPL").expect("remove");
        assert!(rec.visible().is_empty());

        rec.add("aapl").expect("re-add");
        assert_eq!(names(&rec.visible()), vec!["AAPL"]);
        assert!(rec.lists().blacklist.is_empty());
    }

    #[test]
    fn remove_all_honors_policy() {
        let temp = tempdir().expect("tempdir");
        let mut keep = reconciler(&temp.path().join("keep"), ReconcilerOptions::default());
        keep.add_bulk(["A", "B"]).expect("add");
        keep.replace_fetched(["C"]);
        let removed = keep.remove_all().expect("remove all");
        assert_eq!(names(&removed), vec!["A", "B", "C"]);
        assert_eq!(keep.lists().original.len(), 2);
        assert!(keep.visible().is_empty());

        let mut clear = reconciler(
            &temp.path().join("clear"),
            ReconcilerOptions {
                remove_all: RemoveAllPolicy::ClearOriginal,
                ..ReconcilerOptions::default()
            },
        );
        clear.add_bulk(["A", "B"]).expect("add");
        clear.remove_all().expect("remove all");
        assert!(clear.lists().original.is_empty());
        assert_eq!(clear.lists().blacklist.len(), 2);
    }

    #[test]
    fn remove_all_on_empty_view_is_reported() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());
        assert!(matches!(
            rec.remove_all(),
            Err(ReconcileError::NothingVisible)
        ));
    }

    #[test]
    fn replace_fetched_is_wholesale_and_drops_junk() {
        let temp = tempdir().expect("tempdir");
        let mut rec = reconciler(temp.path(), ReconcilerOptions::default());

        assert_eq!(rec.replace_fetched(["SPY", "QQQ", "spy"]), 2);
        assert_eq!(rec.replace_fetched(["IWM", "", "#N/A"]), 1);
        assert_eq!(names(&rec.visible()), vec!["IWM"]);
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!(
            "clear-original".parse::<RemoveAllPolicy>(),
            Ok(RemoveAllPolicy::ClearOriginal)
        );
        assert!("nuke".parse::<RemoveAllPolicy>().is_err());
    }
}
