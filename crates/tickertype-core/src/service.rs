//! Single-writer coordination between the lists, the fetcher, and the navigator.
//!
//! One tokio task owns the [`Reconciler`] and applies [`Command`]s in arrival
//! order. Network fetches run on their own task and re-enter the queue as a
//! completion command, so add/remove keep flowing while a refresh is stuck in
//! backoff. After each change the worker builds a fresh [`Ring`] outside the
//! navigator lock and swaps it in. It then publishes the new visible set on a
//! watch channel.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::fetcher::{FetchError, FetchOutcome, ListingFetcher, ListingQuery, RefreshReport};
use crate::navigator::{Navigator, OpenView, Ring};
use crate::reconciler::{ReconcileError, Reconciler};
use crate::Ticker;

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Navigator shared between the worker (rebuilds) and the input shell (steps).
pub type SharedNavigator = Arc<Mutex<Navigator>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("a refresh is already in progress")]
    RefreshInProgress,
    #[error("ticker service has stopped")]
    Stopped,
}

type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

enum Command {
    Add { raw: String, reply: Reply<Ticker> },
    AddBulk { raws: Vec<String>, reply: Reply<Vec<Ticker>> },
    Remove { raw: String, reply: Reply<Ticker> },
    RemoveAll { reply: Reply<Vec<Ticker>> },
    SetShowFetched { show: bool, reply: Reply<()> },
    Refresh { reply: Reply<RefreshReport> },
    FetchCompleted {
        result: Result<FetchOutcome, FetchError>,
        reply: Reply<RefreshReport>,
    },
    Shutdown { reply: Reply<()> },
}

/// Cloneable front door to the service task.
#[derive(Clone)]
pub struct ServiceHandle {
    commands: mpsc::Sender<Command>,
    visible: watch::Receiver<Arc<Vec<Ticker>>>,
    navigator: SharedNavigator,
}

/// Start the service. It stops once every [`ServiceHandle`] is dropped.
pub fn spawn_service(
    reconciler: Reconciler,
    fetcher: ListingFetcher,
    queries: Vec<ListingQuery>,
    navigator: SharedNavigator,
) -> (ServiceHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let initial = reconciler.visible();
    install_ring(&navigator, Ring::new(initial.clone()));
    let (visible_tx, visible_rx) = watch::channel(Arc::new(initial));

    let worker = Worker {
        reconciler,
        fetcher: Arc::new(fetcher),
        queries: queries.into(),
        navigator: Arc::clone(&navigator),
        visible: visible_tx,
        loopback: commands_tx.downgrade(),
        refreshing: false,
    };
    let task = tokio::spawn(worker.run(commands_rx));

    let handle = ServiceHandle {
        commands: commands_tx,
        visible: visible_rx,
        navigator,
    };
    (handle, task)
}

impl ServiceHandle {
    pub async fn add(&self, raw: impl Into<String>) -> Result<Ticker, ServiceError> {
        let raw = raw.into();
        self.request(|reply| Command::Add { raw, reply }).await
    }

    pub async fn add_bulk<I, S>(&self, raws: I) -> Result<Vec<Ticker>, ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raws = raws.into_iter().map(Into::into).collect();
        self.request(|reply| Command::AddBulk { raws, reply }).await
    }

    pub async fn remove(&self, raw: impl Into<String>) -> Result<Ticker, ServiceError> {
        let raw = raw.into();
        self.request(|reply| Command::Remove { raw, reply }).await
    }

    pub async fn remove_all(&self) -> Result<Vec<Ticker>, ServiceError> {
        self.request(|reply| Command::RemoveAll { reply }).await
    }

    pub async fn set_show_fetched(&self, show: bool) -> Result<(), ServiceError> {
        self.request(|reply| Command::SetShowFetched { show, reply })
            .await
    }

    /// Fetch both listings and replace the cached fetched list. Resolves when done.
    pub async fn refresh(&self) -> Result<RefreshReport, ServiceError> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// Stop the worker once queued commands ahead of this one are applied.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Latest published visible set.
    pub fn visible(&self) -> Arc<Vec<Ticker>> {
        Arc::clone(&self.visible.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Ticker>>> {
        self.visible.clone()
    }

    pub fn navigator(&self) -> SharedNavigator {
        Arc::clone(&self.navigator)
    }

    pub fn step_forward(&self) -> Option<Ticker> {
        self.lock_navigator().step_forward()
    }

    pub fn step_backward(&self) -> Option<Ticker> {
        self.lock_navigator().step_backward()
    }

    pub fn open_view(&self) -> Option<OpenView> {
        self.lock_navigator().emit_for_open_view()
    }

    fn lock_navigator(&self) -> std::sync::MutexGuard<'_, Navigator> {
        self.navigator
            .lock()
            .expect("navigator lock is not poisoned")
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ServiceError::Stopped)?;
        response.await.map_err(|_| ServiceError::Stopped)?
    }
}

struct Worker {
    reconciler: Reconciler,
    fetcher: Arc<ListingFetcher>,
    queries: Arc<[ListingQuery]>,
    navigator: SharedNavigator,
    visible: watch::Sender<Arc<Vec<Ticker>>>,
    loopback: mpsc::WeakSender<Command>,
    refreshing: bool,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            if let Command::Shutdown { reply } = command {
                let _ = reply.send(Ok(()));
                break;
            }
            self.handle(command);
        }
        info!("ticker service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Add { raw, reply } => {
                let result = self.reconciler.add(&raw).map_err(ServiceError::from);
                self.publish();
                let _ = reply.send(result);
            }
            Command::AddBulk { raws, reply } => {
                let result = self.reconciler.add_bulk(&raws).map_err(ServiceError::from);
                self.publish();
                let _ = reply.send(result);
            }
            Command::Remove { raw, reply } => {
                let result = self.reconciler.remove(&raw).map_err(ServiceError::from);
                self.publish();
                let _ = reply.send(result);
            }
            Command::RemoveAll { reply } => {
                let result = self.reconciler.remove_all().map_err(ServiceError::from);
                self.publish();
                let _ = reply.send(result);
            }
            Command::SetShowFetched { show, reply } => {
                self.reconciler.set_show_fetched(show);
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::Refresh { reply } => self.start_refresh(reply),
            Command::Shutdown { reply } => {
                let _ = reply.send(Ok(()));
            }
            Command::FetchCompleted { result, reply } => {
                self.refreshing = false;
                let result = result.map_err(ServiceError::from).map(|outcome| {
                    let stored = self.reconciler.replace_fetched(outcome.tickers);
                    info!(stored, "fetched list replaced");
                    outcome.report
                });
                self.publish();
                let _ = reply.send(result);
            }
        }
    }

    fn start_refresh(&mut self, reply: Reply<RefreshReport>) {
        if self.refreshing {
            let _ = reply.send(Err(ServiceError::RefreshInProgress));
            return;
        }
        let Some(loopback) = self.loopback.upgrade() else {
            let _ = reply.send(Err(ServiceError::Stopped));
            return;
        };

        self.refreshing = true;
        let fetcher = Arc::clone(&self.fetcher);
        let queries = Arc::clone(&self.queries);
        tokio::spawn(async move {
            let result = fetcher.fetch_all(&queries).await;
            if loopback
                .send(Command::FetchCompleted { result, reply })
                .await
                .is_err()
            {
                warn!("ticker service stopped before refresh completed");
            }
        });
    }

    /// Rebuild and publish when the visible set actually changed.
    fn publish(&mut self) {
        let visible = self.reconciler.visible();
        if **self.visible.borrow() == visible {
            return;
        }

        install_ring(&self.navigator, Ring::new(visible.clone()));
        self.visible.send_replace(Arc::new(visible));
    }
}

fn install_ring(navigator: &SharedNavigator, ring: Ring) {
    navigator
        .lock()
        .expect("navigator lock is not poisoned")
        .install(ring);
}
