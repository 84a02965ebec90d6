use std::io;
use std::time::Duration;

use tickertype_core::{FetchError, ServiceHandle};
use tracing::info;

use crate::cli::{OutputFormat, RefreshArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &RefreshArgs,
    service: &ServiceHandle,
    format: OutputFormat,
) -> Result<(), CliError> {
    info!("refreshing listings; rate limits are retried until they clear");

    let report = match args.deadline_secs.map(Duration::from_secs) {
        Some(deadline) => match tokio::time::timeout(deadline, service.refresh()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::TimedOut {
                    after_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                }
                .into())
            }
        },
        None => service.refresh().await?,
    };

    let visible = service.visible().len();
    output::render_report(&mut io::stdout(), &report, visible, format)
}
