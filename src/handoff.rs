//! Handoff: passing a finished report to the message composer.
//!
//! The widget does not send anything itself. It hands the composed
//! payload to a [`HandoffTarget`], normally the host's navigation layer,
//! which opens the compose screen prefilled with the report.

use tokio::sync::mpsc;
use tracing::info;

use crate::payload::HandoffRequest;

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("handoff target is closed")]
    Closed,
    #[error("handoff encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for finished reports. Enables mocking in tests.
#[async_trait::async_trait]
pub trait HandoffTarget: Send + Sync {
    /// Deliver `request` to the composer.
    ///
    /// # Errors
    ///
    /// Returns a [`HandoffError`] if the target cannot accept the request;
    /// the caller keeps the draft in that case.
    async fn hand_off(&self, request: &HandoffRequest) -> Result<(), HandoffError>;
}

/// Navigation request for the compose-message screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeNavigation {
    pub client_id: String,
    /// The serialized `HandoffPayload`.
    pub prefill_data: String,
}

/// Target that forwards navigation requests over a channel to the host.
#[derive(Debug, Clone)]
pub struct ChannelHandoff {
    tx: mpsc::Sender<ComposeNavigation>,
}

impl ChannelHandoff {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ComposeNavigation>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl HandoffTarget for ChannelHandoff {
    async fn hand_off(&self, request: &HandoffRequest) -> Result<(), HandoffError> {
        let prefill_data = request.prefill_data()?;
        self.tx
            .send(ComposeNavigation { client_id: request.client_id.clone(), prefill_data })
            .await
            .map_err(|_| HandoffError::Closed)?;
        info!(client_id = %request.client_id, "feedback handed off to composer");
        Ok(())
    }
}

#[cfg(test)]
#[path = "handoff_test.rs"]
mod tests;
