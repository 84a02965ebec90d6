//! HTML listing page parsing.
//!
//! A listing page is a table whose data rows each describe one instrument.
//! The ticker sits in a fixed column. A page without matching rows marks the
//! end of pagination, so the row count is reported separately from the
//! tickers that could actually be read.

use scraper::{Html, Selector};

use crate::fetcher::FetchError;

/// Row selector for the screener results table.
pub const DEFAULT_ROW_SELECTOR: &str = r#"table.screener_table tr[valign="top"]"#;

/// Zero-based cell index holding the ticker (the first cell is the row number).
pub const DEFAULT_TICKER_COLUMN: usize = 1;

/// Rows matched on one page and the ticker text extracted from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub rows: usize,
    pub tickers: Vec<String>,
}

impl ListingPage {
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Compiled selectors for extracting tickers from a listing page.
#[derive(Debug, Clone)]
pub struct ListingParser {
    rows: Selector,
    cells: Selector,
    column: usize,
}

impl ListingParser {
    pub fn new(row_selector: &str, column: usize) -> Result<Self, FetchError> {
        let rows = Selector::parse(row_selector).map_err(|error| FetchError::InvalidSelector {
            selector: row_selector.to_owned(),
            message: error.to_string(),
        })?;
        let cells = Selector::parse("td").map_err(|error| FetchError::InvalidSelector {
            selector: String::from("td"),
            message: error.to_string(),
        })?;
        Ok(Self {
            rows,
            cells,
            column,
        })
    }

    /// Parse one page body. Bodies that are not HTML simply match nothing.
    pub fn parse(&self, body: &str) -> ListingPage {
        let document = Html::parse_document(body);
        let mut page = ListingPage::default();

        for row in document.select(&self.rows) {
            page.rows += 1;
            let Some(cell) = row.select(&self.cells).nth(self.column) else {
                continue;
            };
            let text = cell.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                page.tickers.push(text.to_owned());
            }
        }

        page
    }
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_SELECTOR, DEFAULT_TICKER_COLUMN)
            .expect("default listing selector is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> String {
        let mut html = String::from(
            r#"<html><body><table class="screener_table"><tr><th>No.</th><th>Ticker</th></tr>"#,
        );
        for cells in rows {
            html.push_str(r#"<tr valign="top">"#);
            for cell in *cells {
                html.push_str(&format!("<td><a>{cell}</a></td>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</table></body></html>");
        html
    }

    #[test]
    fn extracts_second_cell_of_each_data_row() {
        let parser = ListingParser::default();
        let page = parser.parse(&table(&[&["1", "AAPL", "Apple"], &["2", " MSFT ", "Microsoft"]]));

        assert_eq!(page.rows, 2);
        assert_eq!(page.tickers, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn header_rows_are_not_counted() {
        let parser = ListingParser::default();
        let page = parser.parse(&table(&[]));

        assert!(page.is_empty());
        assert!(page.tickers.is_empty());
    }

    #[test]
    fn short_rows_count_but_yield_nothing() {
        let parser = ListingParser::default();
        let page = parser.parse(&table(&[&["1"], &["2", "SPY"]]));

        assert_eq!(page.rows, 2);
        assert_eq!(page.tickers, vec!["SPY"]);
    }

    #[test]
    fn rows_outside_the_screener_table_are_ignored() {
        let parser = ListingParser::default();
        let page = parser.parse(
            r#"<table class="other"><tr valign="top"><td>1</td><td>NOPE</td></tr></table>"#,
        );

        assert!(page.is_empty());
    }

    #[test]
    fn non_html_body_is_an_empty_page() {
        let parser = ListingParser::default();
        assert!(parser.parse("Too many requests").is_empty());
        assert!(parser.parse("").is_empty());
    }

    #[test]
    fn invalid_selector_is_reported() {
        let error = ListingParser::new("table[", 1).expect_err("must fail");
        assert!(matches!(error, FetchError::InvalidSelector { .. }));
    }
}
