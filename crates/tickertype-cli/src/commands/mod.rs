mod add;
mod list;
mod refresh;
mod remove;
mod walk;

use std::sync::{Arc, Mutex};

use tickertype_core::{
    spawn_service, AppConfig, ListingFetcher, Navigator, Reconciler, ServiceError,
};
use tracing::{debug, warn};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = apply_flags(AppConfig::from_env()?, cli);
    debug!(home = %config.home.display(), show_fetched = config.reconciler.show_fetched, "resolved configuration");

    let reconciler = Reconciler::open(config.store(), config.reconciler)?;
    let fetcher = ListingFetcher::new(config.fetch.clone())?;
    let navigator = Arc::new(Mutex::new(Navigator::new(config.direction_on_rebuild)));
    let (service, task) = spawn_service(reconciler, fetcher, config.queries(), navigator);

    let result = match &cli.command {
        Command::List => list::run(&service, cli.format),
        Command::Add(args) => add::run(args, &service, cli.format).await,
        Command::Remove(args) => remove::run(args, &service, cli.format).await,
        Command::RemoveAll => remove::run_all(&service, cli.format).await,
        Command::Refresh(args) => refresh::run(args, &service, cli.format).await,
        Command::Walk(args) => walk::run(args, &service, cli.format).await,
    };

    let shutdown = service.shutdown().await;
    if let Err(error) = task.await {
        warn!(%error, "ticker service task did not exit cleanly");
    }
    settle(result, shutdown)
}

/// The command's own error wins over a failed shutdown.
fn settle(
    result: Result<(), CliError>,
    shutdown: Result<(), ServiceError>,
) -> Result<(), CliError> {
    match (result, shutdown) {
        (Err(error), Err(shutdown_error)) => {
            warn!(error = %shutdown_error, "ticker service did not shut down cleanly");
            Err(error)
        }
        (Err(error), Ok(())) => Err(error),
        (Ok(()), shutdown) => shutdown.map_err(CliError::from),
    }
}

/// Command-line flags override the environment.
fn apply_flags(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(home) = &cli.home {
        config.home = home.clone();
    }
    if cli.no_fetched {
        config.reconciler.show_fetched = false;
    }
    config
}
