use std::io;

use tickertype_core::ServiceHandle;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

pub fn run(service: &ServiceHandle, format: OutputFormat) -> Result<(), CliError> {
    let visible = service.visible();
    output::render_tickers(&mut io::stdout(), &visible, format)
}
