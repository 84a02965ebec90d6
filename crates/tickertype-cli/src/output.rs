use std::io::Write;

use serde_json::json;
use tickertype_core::{Direction, OpenView, RefreshReport, Ticker};

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render_tickers(
    out: &mut impl Write,
    tickers: &[Ticker],
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            for ticker in tickers {
                writeln!(out, "{ticker}")?;
            }
        }
        OutputFormat::Json => {
            let payload = json!({ "count": tickers.len(), "tickers": tickers });
            writeln!(out, "{}", serde_json::to_string(&payload)?)?;
        }
    }
    Ok(())
}

/// Tickers touched by an add or remove.
pub fn render_change(
    out: &mut impl Write,
    action: &str,
    tickers: &[Ticker],
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            let joined = tickers
                .iter()
                .map(Ticker::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, "{action}: {joined}")?;
        }
        OutputFormat::Json => {
            let payload = json!({ "action": action, "tickers": tickers });
            writeln!(out, "{}", serde_json::to_string(&payload)?)?;
        }
    }
    Ok(())
}

pub fn render_report(
    out: &mut impl Write,
    report: &RefreshReport,
    visible: usize,
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "fetched_at: {}", report.fetched_at)?;
            for query in &report.queries {
                writeln!(
                    out,
                    "{:<10}: {} tickers over {} pages",
                    query.name, query.tickers, query.pages
                )?;
            }
            writeln!(out, "visible   : {visible}")?;
        }
        OutputFormat::Json => {
            let payload = json!({ "report": report, "visible": visible });
            writeln!(out, "{}", serde_json::to_string(&payload)?)?;
        }
    }
    Ok(())
}

/// One traversal step. Text mode prints the bare ticker, as it would be typed.
pub fn render_step(
    out: &mut impl Write,
    ticker: &Ticker,
    direction: Direction,
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => writeln!(out, "{ticker}")?,
        OutputFormat::Json => {
            let payload = json!({ "ticker": ticker, "direction": direction });
            writeln!(out, "{}", serde_json::to_string(&payload)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn render_view(
    out: &mut impl Write,
    view: &OpenView,
    search_base: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let url = view.search_url(search_base);
    match format {
        OutputFormat::Text => writeln!(out, "open {} -> {url}", view.query)?,
        OutputFormat::Json => {
            let payload = json!({ "ticker": view.ticker, "query": view.query, "url": url });
            writeln!(out, "{}", serde_json::to_string(&payload)?)?;
        }
    }
    out.flush()?;
    Ok(())
}
