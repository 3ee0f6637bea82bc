//! Capture session state machine
//!
//! One `CaptureSession` slot exists per coordinator. It is mutated only
//! through the transition methods below, so every path in and out of a
//! session is checked against the current status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CaptureError;
use crate::permission::SurfaceId;

/// Current status of the capture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    /// No capture in progress
    Idle,
    /// Start accepted, permission handle not yet acquired
    Requested,
    /// Stream open, chunks flowing
    Active,
    /// Stop accepted, artifact being finalized
    Stopping,
    /// Artifact produced and handed off
    Completed,
    /// Terminal failure, about to resolve back to Idle
    Failed,
}

impl Default for CaptureStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// One start-to-stop capture lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    status: CaptureStatus,

    /// Opaque token identifying this session, new on every request.
    pub session_token: String,

    /// When the current session was requested.
    pub started_at: DateTime<Utc>,

    /// Surface the session captures, None while idle.
    pub surface: Option<SurfaceId>,
}

impl CaptureSession {
    /// An empty slot with no session in it.
    pub fn idle() -> Self {
        Self {
            status: CaptureStatus::Idle,
            session_token: String::new(),
            started_at: Utc::now(),
            surface: None,
        }
    }

    pub fn status(&self) -> CaptureStatus {
        self.status
    }

    pub fn is_live(&self) -> bool {
        matches!(
            self.status,
            CaptureStatus::Requested | CaptureStatus::Active | CaptureStatus::Stopping
        )
    }

    /// Claim the slot for a new session: `Idle -> Requested`.
    ///
    /// A request against a live session is rejected, never queued.
    pub fn request(&mut self, surface: SurfaceId) -> Result<(), CaptureError> {
        if self.status != CaptureStatus::Idle {
            return Err(CaptureError::AlreadyRecording);
        }
        self.status = CaptureStatus::Requested;
        self.session_token = Uuid::new_v4().simple().to_string();
        self.started_at = Utc::now();
        self.surface = Some(surface);
        Ok(())
    }

    /// `Requested -> Active`, once the stream is open.
    pub fn activate(&mut self) -> Result<(), CaptureError> {
        if self.status != CaptureStatus::Requested {
            return Err(CaptureError::Unknown(format!(
                "cannot activate a session in the {:?} state",
                self.status
            )));
        }
        self.status = CaptureStatus::Active;
        Ok(())
    }

    /// `Active -> Stopping`, when a stop is accepted.
    pub fn begin_stop(&mut self) -> Result<(), CaptureError> {
        if self.status != CaptureStatus::Active {
            return Err(CaptureError::NotRecording);
        }
        self.status = CaptureStatus::Stopping;
        Ok(())
    }

    /// Mark the session completed after the artifact hand-off.
    pub fn complete(&mut self) {
        self.status = CaptureStatus::Completed;
    }

    /// Mark the session failed. Reachable from any live state.
    pub fn fail(&mut self) {
        self.status = CaptureStatus::Failed;
    }

    /// Resolve the slot back to `Idle` so the requester may retry.
    pub fn reset(&mut self) {
        self.status = CaptureStatus::Idle;
        self.surface = None;
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::idle()
    }
}
