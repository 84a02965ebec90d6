use std::io;

use tickertype_core::ServiceHandle;

use crate::cli::{AddArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &AddArgs,
    service: &ServiceHandle,
    format: OutputFormat,
) -> Result<(), CliError> {
    let added = match args.tickers.as_slice() {
        [single] => vec![service.add(single.as_str()).await?],
        many => service.add_bulk(many.iter().map(String::as_str)).await?,
    };
    output::render_change(&mut io::stdout(), "added", &added, format)
}
