//! Behavior-driven tests for list reconciliation and persistence
//!
//! These tests verify HOW the original, fetched, and blacklist sets combine
//! into the visible list, and that every change survives a restart.

use std::collections::VecDeque;
use std::fs;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::tempdir;
use tickertype_core::{
    FetchConfig, HttpClient, HttpError, HttpRequest, HttpResponse, ListKind, ListingFetcher,
    ListingQuery, ReconcileError, Reconciler, ReconcilerOptions, RemoveAllPolicy, Sleeper,
    Ticker, TickerStore,
};

// =============================================================================
// Helpers
// =============================================================================

struct PagedHttpClient {
    pages: Mutex<VecDeque<String>>,
}

impl HttpClient for PagedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let body = self
            .pages
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_default();
        Box::pin(async move { Ok(HttpResponse::ok(body)) })
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep<'a>(&'a self, _duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}

fn listing(tickers: &[&str]) -> String {
    let mut html = String::from(r#"<table class="screener_table">"#);
    for (index, ticker) in tickers.iter().enumerate() {
        html.push_str(&format!(
            r#"<tr valign="top"><td>{}</td><td>{ticker}</td></tr>"#,
            index + 1
        ));
    }
    html.push_str("</table>");
    html
}

/// Serves each listing as one page followed by an empty page.
fn fetcher_serving(listings: &[&[&str]]) -> ListingFetcher {
    let mut pages = VecDeque::new();
    for tickers in listings {
        pages.push_back(listing(tickers));
        pages.push_back(listing(&[]));
    }
    ListingFetcher::with_transport(
        Arc::new(PagedHttpClient {
            pages: Mutex::new(pages),
        }),
        Arc::new(NoSleep),
        FetchConfig {
            courtesy_delay: Duration::ZERO,
            ..FetchConfig::default()
        },
    )
    .expect("valid fetcher config")
}

fn queries() -> Vec<ListingQuery> {
    vec![
        ListingQuery::new("stocks", "https://example.test/stocks"),
        ListingQuery::new("etfs", "https://example.test/etfs"),
    ]
}

fn names(tickers: &[Ticker]) -> Vec<&str> {
    tickers.iter().map(Ticker::as_str).collect()
}

fn open(store: &TickerStore) -> Reconciler {
    Reconciler::open(store.clone(), ReconcilerOptions::default()).expect("open")
}

// =============================================================================
// Visible set
// =============================================================================

#[test]
fn when_lists_overlap_visible_set_is_sorted_and_deduplicated() {
    // Given: Overlapping original and fetched lists
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    reconciler.add_bulk(["spy", "aapl"]).expect("add");
    reconciler.replace_fetched(["MSFT", "AAPL", "QQQ"]);

    // When: The visible set is computed
    let visible = reconciler.visible();

    // Then: Each ticker appears once in lexicographic order
    assert_eq!(names(&visible), vec!["AAPL", "MSFT", "QQQ", "SPY"]);
}

#[test]
fn when_ticker_is_removed_it_stays_in_original_but_disappears_from_view() {
    // Given: A ticker the user added
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    reconciler.add("TSLA").expect("add");

    // When: The user removes it
    reconciler.remove("tsla").expect("remove");

    // Then: It is blacklisted, still recorded as original, and no longer visible
    let tsla = Ticker::parse("TSLA").expect("valid");
    assert!(reconciler.lists().original.contains(&tsla));
    assert!(reconciler.lists().blacklist.contains(&tsla));
    assert!(reconciler.visible().is_empty());

    // And: Both files on disk still carry it
    let original = fs::read_to_string(temp.path().join("original.txt")).expect("original file");
    let blacklist = fs::read_to_string(temp.path().join("blacklist.txt")).expect("blacklist file");
    assert_eq!(original, "TSLA\n");
    assert_eq!(blacklist, "TSLA\n");
}

#[test]
fn when_visible_set_is_computed_twice_without_changes_it_is_identical() {
    // Given: Original, fetched, and blacklisted tickers
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    reconciler.add_bulk(["NVDA", "AAPL"]).expect("add");
    reconciler.replace_fetched(["SPY", "GME", "AAPL"]);
    reconciler.remove("GME").expect("remove");

    for show_fetched in [true, false] {
        // When: The same view is computed twice in a row
        let first = reconciler.compute_visible(show_fetched);
        let second = reconciler.compute_visible(show_fetched);

        // Then: Both results match
        assert_eq!(first, second, "show_fetched={show_fetched}");
    }
    assert_eq!(names(&reconciler.compute_visible(true)), vec!["AAPL", "NVDA", "SPY"]);
    assert_eq!(names(&reconciler.compute_visible(false)), vec!["AAPL", "NVDA"]);
}

#[test]
fn when_blacklisted_ticker_reappears_in_a_fetch_it_stays_hidden() {
    // Given: A fetched ticker the user removed
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    reconciler.replace_fetched(["GME", "AMC"]);
    reconciler.remove("GME").expect("remove");

    // When: A later refresh brings it back
    reconciler.replace_fetched(["GME", "AMC", "BB"]);

    // Then: The blacklist still wins
    assert_eq!(names(&reconciler.visible()), vec!["AMC", "BB"]);
}

#[test]
fn when_show_fetched_is_toggled_only_original_minus_blacklist_remains() {
    // Given: A mix of original and fetched tickers
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    reconciler.add("AAPL").expect("add");
    reconciler.replace_fetched(["SPY"]);

    // When: Fetched tickers are hidden
    reconciler.set_show_fetched(false);

    // Then: The fetched list is kept but no longer shown
    assert_eq!(names(&reconciler.visible()), vec!["AAPL"]);
    assert_eq!(reconciler.lists().fetched.len(), 1);
}

#[test]
fn when_remove_all_clears_original_under_policy_lists_reflect_it() {
    // Given: A reconciler configured to clear the original list
    let temp = tempdir().expect("tempdir");
    let store = TickerStore::new(temp.path());
    let mut reconciler = Reconciler::open(
        store.clone(),
        ReconcilerOptions {
            remove_all: RemoveAllPolicy::ClearOriginal,
            ..ReconcilerOptions::default()
        },
    )
    .expect("open");
    reconciler.add_bulk(["A", "B"]).expect("add");
    reconciler.replace_fetched(["C"]);

    // When: Everything visible is removed
    let removed = reconciler.remove_all().expect("remove all");

    // Then: All were blacklisted and the cleared original list is persisted
    assert_eq!(names(&removed), vec!["A", "B", "C"]);
    assert!(store.load(ListKind::Original).expect("load").is_empty());
    assert_eq!(store.load(ListKind::Blacklist).expect("load").len(), 3);
}

#[test]
fn when_input_is_invalid_nothing_changes() {
    // Given: An empty reconciler
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));

    // When: Bad tickers are submitted
    let blank = reconciler.add("");
    let symbol = reconciler.add("AA PL");

    // Then: Both are rejected and nothing is written
    assert!(matches!(blank, Err(ReconcileError::Validation(_))));
    assert!(matches!(symbol, Err(ReconcileError::Validation(_))));
    assert!(reconciler.visible().is_empty());
    assert!(!temp.path().join("original.txt").exists());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn when_reopened_every_list_is_restored() {
    // Given: A session that touched all three lists
    let temp = tempdir().expect("tempdir");
    let store = TickerStore::new(temp.path());
    let before = {
        let mut reconciler = open(&store);
        reconciler.add_bulk(["AAPL", "MSFT"]).expect("add");
        reconciler.replace_fetched(["SPY", "QQQ"]);
        reconciler.remove("MSFT").expect("remove");
        reconciler.visible()
    };

    // When: A new session opens the same directory
    let reconciler = open(&store);

    // Then: The visible set is identical
    assert_eq!(reconciler.visible(), before);
    assert_eq!(names(&before), vec!["AAPL", "QQQ", "SPY"]);
}

#[test]
fn when_files_are_written_they_hold_one_uppercase_ticker_per_line() {
    // Given: Mixed-case input
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));

    // When: Tickers are added
    reconciler.add_bulk(["msft", "brk-b", "aapl"]).expect("add");

    // Then: The file is sorted and normalized
    let raw = fs::read_to_string(temp.path().join("original.txt")).expect("file");
    assert_eq!(raw, "AAPL\nBRK-B\nMSFT\n");
}

#[test]
fn when_hand_edited_files_hold_junk_valid_lines_still_load() {
    // Given: A hand-edited original list
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("original.txt"), "aapl\n\n  nvda \n???\n").expect("seed");

    // When: The lists are opened
    let reconciler = open(&TickerStore::new(temp.path()));

    // Then: Valid tickers are normalized and junk is skipped
    assert_eq!(names(&reconciler.visible()), vec!["AAPL", "NVDA"]);
}

#[test]
fn when_a_list_file_holds_invalid_utf8_the_other_lines_still_load() {
    // Given: An original list with a line of raw non-UTF-8 bytes
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("original.txt"), b"AAPL\n\xff\xfe\nMSFT\n").expect("seed");

    // When: The lists are opened
    let result = Reconciler::open(TickerStore::new(temp.path()), ReconcilerOptions::default());

    // Then: Opening succeeds and only the bad line is dropped
    let reconciler = result.expect("open should skip the undecodable line");
    assert_eq!(names(&reconciler.visible()), vec!["AAPL", "MSFT"]);
}

#[test]
fn when_a_list_cannot_be_persisted_memory_stays_authoritative() {
    // Given: An open session whose original list file is then replaced by a directory
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    fs::create_dir_all(temp.path().join("original.txt")).expect("squat");

    // When: A ticker is added
    let added = reconciler.add("AAPL");

    // Then: The add still succeeds for this session
    assert!(added.is_ok());
    assert_eq!(names(&reconciler.visible()), vec!["AAPL"]);
}

#[test]
fn when_a_list_file_is_unreadable_open_reports_it() {
    // Given: A directory where the blacklist file should be
    let temp = tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("blacklist.txt")).expect("squat");

    // When: The lists are opened
    let result = Reconciler::open(TickerStore::new(temp.path()), ReconcilerOptions::default());

    // Then: The failure names the store, not a silent empty list
    assert!(matches!(result, Err(ReconcileError::Store(_))));
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn when_refreshed_fetched_list_is_replaced_wholesale() {
    // Given: A stale fetched list
    let temp = tempdir().expect("tempdir");
    let store = TickerStore::new(temp.path());
    let mut reconciler = open(&store);
    reconciler.replace_fetched(["OLD"]);
    let fetcher = fetcher_serving(&[&["AAPL", "MSFT"], &["SPY", "AAPL"]]);

    // When: Both listings are fetched
    let report = reconciler
        .refresh_from_source(&fetcher, &queries())
        .await
        .expect("refresh");

    // Then: Stale entries are gone, duplicates merge, and the file matches
    assert_eq!(report.total_tickers(), 4);
    assert_eq!(names(&reconciler.visible()), vec!["AAPL", "MSFT", "SPY"]);
    assert_eq!(store.load(ListKind::Fetched).expect("load").len(), 3);
}

#[tokio::test]
async fn when_refresh_returns_nothing_fetched_list_becomes_empty() {
    // Given: A previously fetched list
    let temp = tempdir().expect("tempdir");
    let mut reconciler = open(&TickerStore::new(temp.path()));
    reconciler.add("AAPL").expect("add");
    reconciler.replace_fetched(["SPY"]);
    let fetcher = fetcher_serving(&[&[], &[]]);

    // When: The source lists nothing
    reconciler
        .refresh_from_source(&fetcher, &queries())
        .await
        .expect("refresh");

    // Then: Only the user's own tickers remain
    assert_eq!(names(&reconciler.visible()), vec!["AAPL"]);
}
