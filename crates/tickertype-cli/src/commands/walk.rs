//! Interactive traversal. Each input line is one key; each step prints the
//! ticker the input shell would type.

use std::io;

use tickertype_core::{Direction, ServiceHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::{OutputFormat, WalkArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Forward,
    Backward,
    OpenView,
    Refresh,
    Quit,
}

impl Key {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "n" | "down" => Some(Self::Forward),
            "p" | "up" => Some(Self::Backward),
            "o" | "right" => Some(Self::OpenView),
            "r" | "refresh" => Some(Self::Refresh),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

pub async fn run(
    args: &WalkArgs,
    service: &ServiceHandle,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = io::stdout();
    info!(tickers = service.visible().len(), "walking ticker list");

    while let Some(line) = lines.next_line().await? {
        let Some(key) = Key::parse(&line) else {
            warn!(input = line.trim(), "unrecognized key");
            continue;
        };

        match key {
            Key::Forward => match service.step_forward() {
                Some(ticker) => output::render_step(&mut out, &ticker, Direction::Forward, format)?,
                None => debug!("nothing to step through"),
            },
            Key::Backward => match service.step_backward() {
                Some(ticker) => output::render_step(&mut out, &ticker, Direction::Backward, format)?,
                None => debug!("nothing to step through"),
            },
            Key::OpenView => match service.open_view() {
                Some(view) => output::render_view(&mut out, &view, &args.search_base, format)?,
                None => debug!("no ticker emitted yet"),
            },
            Key::Refresh => spawn_refresh(service.clone()),
            Key::Quit => break,
        }
    }

    Ok(())
}

/// Refresh without blocking the walk; the ring is swapped when it lands.
fn spawn_refresh(service: ServiceHandle) {
    tokio::spawn(async move {
        match service.refresh().await {
            Ok(report) => info!(
                tickers = report.total_tickers(),
                visible = service.visible().len(),
                "background refresh finished"
            ),
            Err(error) => warn!(%error, "background refresh failed"),
        }
    });
}
