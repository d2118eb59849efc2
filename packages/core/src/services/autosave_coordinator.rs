//! Autosave Coordinator
//!
//! Turns the live stream of editor changes into rate-limited, retryable
//! persistence for one `(owner_id, slug)` document:
//!
//! - Event-driven background task: sleeps until an edit or command arrives
//! - Trailing-edge debounce: edits within the quiescence window collapse into
//!   one settled value carrying only the latest document
//! - Settled values go through an [`AutosaveSession`] (skip unchanged, delete
//!   blank, write otherwise)
//! - Manual retry re-issues the last failed write, bounded by the config
//!
//! ## Single writer
//!
//! One coordinator serves one editing session. Its task handles commands one at
//! a time, so a superseding write is only issued after the prior write call
//! returns; edits keep arriving on an unbounded channel while a write is in
//! flight and are debounced by the time they were made, not the time they were
//! dequeued.
//!
//! No timeout is layered over store calls; a hung transport keeps the status at
//! `saving` until the store returns.

use crate::db::ContentStore;
use crate::models::{
    AutosaveConfig, AutosaveSnapshot, CanonicalDocuments, ContentKey, DocumentNode,
    EditableContent, SaveStatus,
};
use crate::services::{AutosaveError, AutosaveSession, Debouncer, SettleOutcome};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;

const ERROR_CHANNEL_CAPACITY: usize = 16;

enum Command {
    Edit {
        doc: DocumentNode,
        at: Instant,
    },
    Flush(oneshot::Sender<Result<Option<SettleOutcome>, AutosaveError>>),
    Retry(oneshot::Sender<Result<(), AutosaveError>>),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle the editor UI talks to
///
/// `edit` never blocks: it only enqueues the change for the coordinator task.
#[derive(Clone)]
pub struct AutosaveHandle {
    key: ContentKey,
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_tx: broadcast::Sender<SaveStatus>,
    error_tx: broadcast::Sender<AutosaveError>,
    snapshot_rx: watch::Receiver<AutosaveSnapshot>,
}

impl AutosaveHandle {
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Report a raw document change from the editor
    pub fn edit(&self, doc: DocumentNode) -> Result<(), AutosaveError> {
        self.cmd_tx
            .send(Command::Edit {
                doc,
                at: Instant::now(),
            })
            .map_err(|_| AutosaveError::coordinator_closed(&self.key))
    }

    /// Manually retry the last failed write
    pub async fn retry(&self) -> Result<(), AutosaveError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Retry(reply_tx))?;
        reply_rx
            .await
            .map_err(|_| AutosaveError::coordinator_closed(&self.key))?
    }

    /// Settle the pending value now instead of waiting out the window
    ///
    /// Returns `Ok(None)` when no edit was pending.
    pub async fn flush(&self) -> Result<Option<SettleOutcome>, AutosaveError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Flush(reply_tx))?;
        reply_rx
            .await
            .map_err(|_| AutosaveError::coordinator_closed(&self.key))?
    }

    pub fn status(&self) -> SaveStatus {
        self.snapshot_rx.borrow().status
    }

    pub fn snapshot(&self) -> AutosaveSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Watch the latest snapshot (status, retry state, char count, emptiness)
    pub fn watch(&self) -> watch::Receiver<AutosaveSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Receive every status transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SaveStatus> {
        self.status_tx.subscribe()
    }

    /// Status transitions as a `Stream`
    pub fn status_stream(&self) -> BroadcastStream<SaveStatus> {
        BroadcastStream::new(self.status_tx.subscribe())
    }

    /// Receive write and delete failures, including ones from automatic saves
    pub fn subscribe_errors(&self) -> broadcast::Receiver<AutosaveError> {
        self.error_tx.subscribe()
    }

    fn send(&self, command: Command) -> Result<(), AutosaveError> {
        self.cmd_tx
            .send(command)
            .map_err(|_| AutosaveError::coordinator_closed(&self.key))
    }
}

/// Owner of the background autosave task for one document
pub struct AutosaveCoordinator {
    handle: AutosaveHandle,
    task: JoinHandle<()>,
}

impl AutosaveCoordinator {
    /// Validate `config` and start the coordinator task for `content`
    ///
    /// The task first runs the removal guard on the mounted value, then waits
    /// for edits. Must be called from within a tokio runtime.
    pub fn spawn(
        store: Arc<dyn ContentStore>,
        content: EditableContent,
        config: AutosaveConfig,
        canon: CanonicalDocuments,
    ) -> Result<Self, AutosaveError> {
        config.validate().map_err(AutosaveError::invalid_config)?;

        tracing::info!(
            "AutosaveCoordinator starting for {} (debounce {}ms, max {} attempts)",
            content.key,
            config.debounce_ms,
            config.max_retry_attempts
        );

        let EditableContent { key, body } = content;
        let session = AutosaveSession::new(key.clone(), store, canon, config.max_retry_attempts);
        let debouncer = Debouncer::new(config.debounce_window());

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (error_tx, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);

        let handle = AutosaveHandle {
            key,
            cmd_tx,
            status_tx: session.status_sender(),
            error_tx: error_tx.clone(),
            snapshot_rx: session.watch(),
        };

        let task = tokio::spawn(run(session, debouncer, body, cmd_rx, error_tx));

        Ok(Self { handle, task })
    }

    /// Get a cloneable handle for the editor
    pub fn handle(&self) -> AutosaveHandle {
        self.handle.clone()
    }

    /// Settle any pending edit, then stop the task
    pub async fn shutdown(self) -> Result<(), AutosaveError> {
        tracing::info!("Shutting down AutosaveCoordinator for {}", self.handle.key);

        let (reply_tx, reply_rx) = oneshot::channel();
        if self.handle.send(Command::Shutdown(reply_tx)).is_ok() {
            let _ = reply_rx.await;
        }

        if let Err(e) = self.task.await {
            tracing::error!(
                "AutosaveCoordinator task for {} ended abnormally: {}",
                self.handle.key,
                e
            );
            return Err(AutosaveError::coordinator_closed(&self.handle.key));
        }
        Ok(())
    }
}

async fn run(
    mut session: AutosaveSession,
    mut debouncer: Debouncer<DocumentNode>,
    initial: DocumentNode,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    error_tx: broadcast::Sender<AutosaveError>,
) {
    if let Err(e) = session.mount(&initial).await {
        report(&error_tx, e);
    }

    loop {
        let deadline = debouncer.deadline();

        tokio::select! {
            biased;

            command = cmd_rx.recv() => match command {
                Some(Command::Edit { doc, at }) => {
                    session.note_edit(&doc);
                    debouncer.push_at(doc, at);
                }
                Some(Command::Flush(reply)) => {
                    let result = match debouncer.flush() {
                        Some(doc) => settle(&mut session, doc, &error_tx).await.map(Some),
                        None => Ok(None),
                    };
                    let _ = reply.send(result);
                }
                Some(Command::Retry(reply)) => {
                    let result = session.retry().await;
                    if let Err(e) = &result {
                        report(&error_tx, e.clone());
                    }
                    let _ = reply.send(result);
                }
                Some(Command::Shutdown(reply)) => {
                    settle_pending(&mut session, &mut debouncer, &error_tx).await;
                    let _ = reply.send(());
                    break;
                }
                None => {
                    // Every handle dropped
                    settle_pending(&mut session, &mut debouncer, &error_tx).await;
                    break;
                }
            },

            _ = wait_until(deadline) => {
                if let Some(doc) = debouncer.take_ready(Instant::now()) {
                    let _ = settle(&mut session, doc, &error_tx).await;
                }
            }
        }
    }

    tracing::info!("AutosaveCoordinator for {} stopped", session.key());
}

async fn settle(
    session: &mut AutosaveSession,
    doc: DocumentNode,
    error_tx: &broadcast::Sender<AutosaveError>,
) -> Result<SettleOutcome, AutosaveError> {
    let result = session.settle(doc).await;
    match &result {
        Ok(SettleOutcome::RemovalFailed) => {
            report(
                error_tx,
                AutosaveError::delete_failure(session.key(), "blank content could not be removed"),
            );
        }
        Ok(outcome) => tracing::debug!("Settled {}: {:?}", session.key(), outcome),
        Err(e) => report(error_tx, e.clone()),
    }
    result
}

async fn settle_pending(
    session: &mut AutosaveSession,
    debouncer: &mut Debouncer<DocumentNode>,
    error_tx: &broadcast::Sender<AutosaveError>,
) {
    if let Some(doc) = debouncer.flush() {
        let _ = settle(session, doc, error_tx).await;
    }
}

fn report(error_tx: &broadcast::Sender<AutosaveError>, error: AutosaveError) {
    tracing::debug!("Reporting autosave error: {}", error);
    let _ = error_tx.send(error);
}

/// Sleep until `deadline`, or forever when nothing is pending
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
