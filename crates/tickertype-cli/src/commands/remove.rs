use std::io;

use tickertype_core::ServiceHandle;

use crate::cli::{OutputFormat, RemoveArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &RemoveArgs,
    service: &ServiceHandle,
    format: OutputFormat,
) -> Result<(), CliError> {
    let removed = service.remove(args.ticker.as_str()).await?;
    output::render_change(&mut io::stdout(), "removed", &[removed], format)
}

pub async fn run_all(service: &ServiceHandle, format: OutputFormat) -> Result<(), CliError> {
    let removed = service.remove_all().await?;
    output::render_change(&mut io::stdout(), "removed", &removed, format)
}
