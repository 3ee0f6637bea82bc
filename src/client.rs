//! Requester-side client
//!
//! The UI surface's view of the coordinator. Every request is a typed
//! message with a oneshot reply, wrapped in a control timeout so the
//! caller always ends in a terminal state even if the coordinator task
//! has torn down.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::capture::worker::ChunkFeed;
use crate::coordinator::{CaptureEvent, CaptureOutcome, Command};
use crate::error::CaptureError;
use crate::permission::SurfaceId;
use crate::session::CaptureSession;

/// Requester-side handle to a spawned coordinator.
pub struct CaptureClient {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<CaptureEvent>,

    /// Feed capability for the live session, if any.
    feed: Mutex<Option<ChunkFeed>>,

    control_timeout: Duration,
}

impl CaptureClient {
    pub(crate) fn new(
        tx: mpsc::Sender<Command>,
        events: broadcast::Sender<CaptureEvent>,
        control_timeout: Duration,
    ) -> Self {
        Self {
            tx,
            events,
            feed: Mutex::new(None),
            control_timeout,
        }
    }

    /// Request capture of `surface`.
    ///
    /// Fails with [`CaptureError::AlreadyRecording`] while a session is live.
    pub async fn start_capture(&self, surface: SurfaceId) -> Result<(), CaptureError> {
        let (reply, rx) = oneshot::channel();
        let feed = self
            .request(Command::Start { surface, reply }, rx)
            .await??;
        *self.feed.lock() = Some(feed);
        Ok(())
    }

    /// Stop the active session and collect its outcome.
    ///
    /// Fails with [`CaptureError::NotRecording`] when no session is active.
    pub async fn stop_capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let (reply, rx) = oneshot::channel();
        let result = self.request(Command::Stop { reply }, rx).await?;
        self.feed.lock().take();
        result
    }

    /// Push one captured chunk into the live capture context.
    pub async fn feed_chunk(&self, chunk: Vec<u8>) -> Result<(), CaptureError> {
        let feed = self.feed.lock().clone().ok_or(CaptureError::NotRecording)?;
        feed.send(chunk).await
    }

    /// Snapshot of the coordinator's session slot.
    pub async fn status(&self) -> Result<CaptureSession, CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Status { reply }, rx).await
    }

    /// Collect the most recent completed outcome, consuming it.
    ///
    /// Covers outcomes the requester did not receive directly, such as a
    /// session completed by the safety cutoff or a capture whose analysis
    /// submission failed.
    pub async fn take_last_outcome(&self) -> Result<Option<CaptureOutcome>, CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::TakeOutcome { reply }, rx).await
    }

    /// Subscribe to capture lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        command: Command,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, CaptureError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CaptureError::Unknown("coordinator is gone".to_string()))?;
        match tokio::time::timeout(self.control_timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(CaptureError::Unknown(
                "coordinator dropped the request".to_string(),
            )),
            Err(_) => Err(CaptureError::Unknown(
                "coordinator did not respond in time".to_string(),
            )),
        }
    }
}
