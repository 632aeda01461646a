//! Draft writer: the single task that owns every store access.
//!
//! DESIGN
//! ======
//! Saves and deletes are fire-and-forget from the widget's point of view.
//! They land in a per-key pending table where a newer write for a key
//! replaces the older one, so backpressure coalesces writes instead of
//! dropping them and the last write submitted for a key is the last one
//! applied. One worker drains the table in arrival order.
//!
//! Loads and flushes travel on a bounded command queue to the same worker,
//! which drains every pending write before answering, so a load always
//! observes the writes submitted before it.
//!
//! ERROR HANDLING
//! ==============
//! Failed writes are retried with linear back-off and then dropped with a
//! warning. A stored value that cannot be decoded loads as "no draft".

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, oneshot};
use tracing::{info, warn};

use super::{KeyValueStore, StoreError};
use crate::config::WriterConfig;
use crate::draft::{Draft, IdSource, storage_key};

enum StoreCommand {
    Load { key: String, reply: oneshot::Sender<Result<Option<String>, StoreError>> },
    Flush { reply: oneshot::Sender<()> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WriteOp {
    Save { key: String, value: String },
    Delete { key: String },
}

impl WriteOp {
    fn key(&self) -> &str {
        match self {
            Self::Save { key, .. } | Self::Delete { key } => key,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Save { .. } => "save",
            Self::Delete { .. } => "delete",
        }
    }
}

// =============================================================================
// PENDING WRITES
// =============================================================================

#[derive(Default)]
struct PendingQueue {
    /// Keys in first-submitted order; each key appears at most once.
    order: VecDeque<String>,
    ops: HashMap<String, WriteOp>,
}

/// Latest unapplied write per key, shared between handles and the worker.
#[derive(Default)]
struct PendingWrites {
    queue: Mutex<PendingQueue>,
    notify: Notify,
}

impl PendingWrites {
    fn lock(&self) -> MutexGuard<'_, PendingQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, op: WriteOp) {
        {
            let mut queue = self.lock();
            let key = op.key().to_owned();
            if queue.ops.insert(key.clone(), op).is_none() {
                queue.order.push_back(key);
            }
        }
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<WriteOp> {
        let mut queue = self.lock();
        while let Some(key) = queue.order.pop_front() {
            if let Some(op) = queue.ops.remove(&key) {
                return Some(op);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.lock().ops.len()
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Handle to the draft writer task. Cheap to clone; the task exits once
/// every handle is dropped, after applying what is still pending.
#[derive(Clone)]
pub struct DraftWriter {
    tx: mpsc::Sender<StoreCommand>,
    pending: Arc<PendingWrites>,
}

/// Spawn the writer task over `store` and return its handle.
#[must_use]
pub fn spawn_draft_writer(store: Arc<dyn KeyValueStore>, config: WriterConfig) -> DraftWriter {
    let (tx, mut rx) = mpsc::channel::<StoreCommand>(config.queue_capacity.max(1));
    let pending = Arc::new(PendingWrites::default());

    info!(
        queue_capacity = config.queue_capacity,
        retries = config.retries,
        retry_base_ms = config.retry_base_ms,
        "draft writer configured"
    );

    let worker_pending = Arc::clone(&pending);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = worker_pending.notify.notified() => {
                    drain_pending(&worker_pending, store.as_ref(), config).await;
                }
                command = rx.recv() => {
                    drain_pending(&worker_pending, store.as_ref(), config).await;
                    match command {
                        Some(StoreCommand::Load { key, reply }) => {
                            let _ = reply.send(store.get(&key).await);
                        }
                        Some(StoreCommand::Flush { reply }) => {
                            let _ = reply.send(());
                        }
                        None => break,
                    }
                }
            }
        }
    });

    DraftWriter { tx, pending }
}

impl DraftWriter {
    /// Record the full draft for `client_id`. Never blocks.
    pub fn save(&self, client_id: &str, draft: &Draft) {
        match draft.to_json() {
            Ok(value) => self.submit(WriteOp::Save { key: storage_key(client_id), value }),
            Err(e) => warn!(error = %e, client_id, "draft encode failed; not saved"),
        }
    }

    /// Record removal of the stored draft for `client_id`. Never blocks.
    pub fn delete(&self, client_id: &str) {
        self.submit(WriteOp::Delete { key: storage_key(client_id) });
    }

    fn submit(&self, op: WriteOp) {
        if self.tx.is_closed() {
            warn!(key = op.key(), op = op.kind(), "draft writer closed; dropping write");
            return;
        }
        self.pending.push(op);
    }

    /// Load the stored draft for `client_id`, after every write submitted
    /// so far.
    ///
    /// A missing, blank, or undecodable value yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriterClosed`] if the writer task is gone, or
    /// the backend's error if the read fails.
    pub async fn load(&self, client_id: &str) -> Result<Option<Draft>, StoreError> {
        let key = storage_key(client_id);
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Load { key: key.clone(), reply })
            .await
            .map_err(|_| StoreError::WriterClosed)?;
        let raw = rx.await.map_err(|_| StoreError::WriterClosed)??;

        let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        match Draft::from_json(client_id, &raw, &mut IdSource::new()) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                warn!(error = %e, key, "stored draft unreadable; starting empty");
                Ok(None)
            }
        }
    }

    /// Wait until every write submitted before this call has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriterClosed`] if the writer task is gone.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StoreCommand::Flush { reply }).await.map_err(|_| StoreError::WriterClosed)?;
        rx.await.map_err(|_| StoreError::WriterClosed)
    }
}

async fn drain_pending(pending: &PendingWrites, store: &dyn KeyValueStore, config: WriterConfig) {
    while let Some(op) = pending.pop() {
        apply_with_retry(store, &op, config).await;
    }
}

async fn apply(store: &dyn KeyValueStore, op: &WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::Save { key, value } => store.set(key, value.clone()).await,
        WriteOp::Delete { key } => store.delete(key).await,
    }
}

async fn apply_with_retry(store: &dyn KeyValueStore, op: &WriteOp, config: WriterConfig) {
    let retries = config.retries.max(1);
    for attempt in 1..=retries {
        match apply(store, op).await {
            Ok(()) => return,
            Err(e) if attempt < retries => {
                warn!(error = %e, attempt, total = retries, key = op.key(), op = op.kind(), "draft write failed; retrying");
                tokio::time::sleep(Duration::from_millis((attempt as u64) * config.retry_base_ms)).await;
            }
            Err(e) => {
                warn!(error = %e, key = op.key(), op = op.kind(), "draft write failed after retries; dropping");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;
