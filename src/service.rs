//! Feedback bubble service: the handle the view layer talks to.
//!
//! DESIGN
//! ======
//! `FeedbackBubble` is a cloneable handle over one `WidgetCore` behind a
//! `tokio::sync::Mutex`, so exactly one event is applied at a time. Each
//! call runs the core handler, then carries out the storage actions it
//! returned through the `DraftWriter`. Whatever is left (redraws,
//! animations, notices) goes back to the caller.
//!
//! LIFECYCLE
//! =========
//! One handle per app session. Dropping every clone stops the writer task
//! once its queue drains; call `flush` first to wait for pending writes.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::BubbleConfig;
use crate::draft::{Draft, Highlight, NoteId, NoteSection, TrafficLight};
use crate::geometry::{Point, Viewport};
use crate::gesture::Region;
use crate::handoff::{HandoffError, HandoffTarget};
use crate::payload::HandoffRequest;
use crate::store::{DraftWriter, KeyValueStore, StoreError, spawn_draft_writer};
use crate::widget::{Action, ComposeError, WidgetCore, WidgetSnapshot, WidgetState};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("draft is empty")]
    EmptyDraft,
    #[error("no active client")]
    NoActiveClient,
    #[error("handoff failed: {0}")]
    Handoff(#[from] HandoffError),
}

impl From<ComposeError> for SendError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::EmptyDraft => Self::EmptyDraft,
            ComposeError::NoActiveClient => Self::NoActiveClient,
        }
    }
}

#[derive(Clone)]
pub struct FeedbackBubble {
    core: Arc<Mutex<WidgetCore>>,
    writer: DraftWriter,
    handoff: Arc<dyn HandoffTarget>,
    epoch: Instant,
}

impl FeedbackBubble {
    /// Build the service and spawn its draft writer. Must be called inside
    /// a tokio runtime.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        handoff: Arc<dyn HandoffTarget>,
        config: BubbleConfig,
        viewport: Viewport,
    ) -> Self {
        info!(
            drag_threshold_px = config.gesture.drag_threshold_px,
            tap_suppress_ms = config.gesture.tap_suppress_ms,
            "feedback bubble configured"
        );
        Self {
            core: Arc::new(Mutex::new(WidgetCore::new(config.gesture, viewport))),
            writer: spawn_draft_writer(store, config.writer),
            handoff,
            epoch: Instant::now(),
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub async fn state(&self) -> WidgetState {
        self.core.lock().await.state()
    }

    pub async fn snapshot(&self) -> WidgetSnapshot {
        self.core.lock().await.snapshot()
    }

    pub async fn draft(&self) -> Draft {
        self.core.lock().await.draft().clone()
    }

    pub async fn is_pulsing(&self) -> bool {
        self.core.lock().await.is_pulsing()
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    /// Bind the bubble to a client (loading its stored draft) or, with
    /// `None`, unbind and hide it.
    pub async fn set_active_client(&self, id: Option<&str>, display_name: &str) -> Vec<Action> {
        self.with_core(|core| core.set_active_client(id, display_name)).await
    }

    pub async fn show_bubble(&self) -> Vec<Action> {
        self.with_core(WidgetCore::show_bubble).await
    }

    pub async fn hide_bubble(&self) -> Vec<Action> {
        self.with_core(WidgetCore::hide_bubble).await
    }

    pub async fn set_viewport(&self, width: f64, height: f64) -> Vec<Action> {
        self.with_core(|core| core.set_viewport(width, height)).await
    }

    // =========================================================================
    // GESTURES
    // =========================================================================

    pub async fn tap(&self) -> Vec<Action> {
        let now = self.now_ms();
        self.with_core(|core| core.tap(now)).await
    }

    pub async fn collapse(&self) -> Vec<Action> {
        self.with_core(WidgetCore::collapse).await
    }

    pub async fn pointer_down(&self, region: Region) -> Vec<Action> {
        self.with_core(|core| core.on_pointer_down(region)).await
    }

    /// `delta` is the cumulative displacement since the press.
    pub async fn pointer_move(&self, delta: Point) -> Vec<Action> {
        self.with_core(|core| core.on_pointer_move(delta)).await
    }

    pub async fn pointer_up(&self, delta: Point) -> Vec<Action> {
        let now = self.now_ms();
        self.with_core(|core| core.on_pointer_up(delta, now)).await
    }

    pub async fn pointer_cancel(&self) -> Vec<Action> {
        self.with_core(WidgetCore::on_pointer_cancel).await
    }

    /// Advance animations by one frame of `dt_ms`.
    pub async fn tick(&self, dt_ms: f64) -> Vec<Action> {
        self.with_core(|core| core.tick(dt_ms)).await
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    pub async fn set_input(&self, section: NoteSection, text: &str) {
        self.core.lock().await.set_input(section, text);
    }

    /// Add the section's typed input as a note.
    pub async fn submit_note(&self, section: NoteSection) -> Vec<Action> {
        self.with_core(|core| core.submit_input(section)).await
    }

    pub async fn add_note(&self, section: NoteSection, text: &str) -> Vec<Action> {
        self.with_core(|core| core.add_note(section, text)).await
    }

    pub async fn add_media_highlight(&self, highlight: Highlight) -> Vec<Action> {
        self.with_core(|core| core.add_media_highlight(highlight)).await
    }

    pub async fn remove_note(&self, section: NoteSection, id: &NoteId) -> Vec<Action> {
        self.with_core(|core| core.remove_note(section, id)).await
    }

    pub async fn set_status(&self, status: TrafficLight) -> Vec<Action> {
        self.with_core(|core| core.set_status(status)).await
    }

    pub async fn clear(&self) -> Vec<Action> {
        self.with_core(WidgetCore::clear).await
    }

    pub async fn dismiss_notice(&self) -> Vec<Action> {
        self.with_core(WidgetCore::dismiss_notice).await
    }

    // =========================================================================
    // HANDOFF
    // =========================================================================

    /// Hand the current draft to the composer. On success the draft is
    /// cleared and the panel collapses; on failure the draft is kept. The
    /// bubble stays usable while the target is busy; if another client
    /// became active meanwhile, its draft is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::EmptyDraft`] (and raises the notice) when there
    /// is nothing to send, [`SendError::NoActiveClient`] when unbound, or
    /// the target's error if the handoff fails.
    pub async fn send_feedback(&self) -> Result<HandoffRequest, SendError> {
        let request = self.core.lock().await.compose()?;

        // The core stays unlocked while the target accepts the request.
        if let Err(e) = self.handoff.hand_off(&request).await {
            warn!(error = %e, client_id = %request.client_id, "feedback handoff failed; draft kept");
            return Err(e.into());
        }

        let client_id = request.client_id.clone();
        self.with_core(|core| core.complete_handoff(&client_id)).await;
        Ok(request)
    }

    /// Wait for every queued draft write to reach the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriterClosed`] if the writer task is gone.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.writer.flush().await
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    async fn with_core<F>(&self, f: F) -> Vec<Action>
    where
        F: FnOnce(&mut WidgetCore) -> Vec<Action>,
    {
        let mut core = self.core.lock().await;
        let actions = f(&mut *core);
        self.apply(&mut *core, actions).await
    }

    /// Carry out storage actions and return the rest for the view layer.
    async fn apply(&self, core: &mut WidgetCore, actions: Vec<Action>) -> Vec<Action> {
        let mut pending = VecDeque::from(actions);
        let mut out = Vec::new();

        while let Some(action) = pending.pop_front() {
            match action {
                Action::SaveDraft { client_id, draft } => self.writer.save(&client_id, &draft),
                Action::DeleteDraft { client_id } => self.writer.delete(&client_id),
                Action::LoadDraft { client_id } => {
                    let loaded = match self.writer.load(&client_id).await {
                        Ok(loaded) => loaded,
                        Err(e) => {
                            warn!(error = %e, client_id = %client_id, "draft load failed; starting empty");
                            None
                        }
                    };
                    pending.extend(core.apply_loaded(&client_id, loaded));
                }
                other => out.push(other),
            }
        }

        out
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
