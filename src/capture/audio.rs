//! Tab audio backend
//!
//! Streamed audio capture. The host's recording primitive pushes encoded
//! chunks into the capturer while the stream is open; this backend owns
//! the grant handshake for them.

use async_trait::async_trait;

use super::{BackendFactory, CaptureBackend, CaptureKind};
use crate::error::CaptureError;
use crate::permission::PermissionHandle;

/// Backend for continuous tab-audio capture.
#[derive(Debug, Default)]
pub struct AudioStreamBackend {
    stream_open: bool,
}

impl AudioStreamBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaptureBackend for AudioStreamBackend {
    fn kind(&self) -> CaptureKind {
        CaptureKind::TabAudio
    }

    fn mime_type(&self) -> &'static str {
        "audio/webm"
    }

    async fn open(&mut self, grant: &PermissionHandle) -> Result<(), CaptureError> {
        if grant.kind != CaptureKind::TabAudio {
            return Err(CaptureError::StreamUnavailable(format!(
                "grant for surface {} is not scoped for tab audio",
                grant.surface
            )));
        }
        self.stream_open = true;
        tracing::debug!(surface = %grant.surface, "audio stream opened");
        Ok(())
    }

    async fn close(&mut self) {
        if self.stream_open {
            self.stream_open = false;
            tracing::debug!("audio stream closed");
        }
    }
}

/// Factory producing [`AudioStreamBackend`]s.
#[derive(Debug, Default)]
pub struct AudioCaptureFactory;

impl BackendFactory for AudioCaptureFactory {
    fn kind(&self) -> CaptureKind {
        CaptureKind::TabAudio
    }

    fn build(&self) -> Box<dyn CaptureBackend> {
        Box::new(AudioStreamBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::SurfaceId;

    #[tokio::test]
    async fn test_rejects_grant_with_wrong_scope() {
        let mut backend = AudioStreamBackend::new();
        let grant = PermissionHandle::new(SurfaceId::new("tab-1"), CaptureKind::TabImage);
        let err = backend.open(&grant).await.unwrap_err();
        assert!(matches!(err, CaptureError::StreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_open_close_cycle() {
        let mut backend = AudioStreamBackend::new();
        let grant = PermissionHandle::new(SurfaceId::new("tab-1"), CaptureKind::TabAudio);
        backend.open(&grant).await.unwrap();
        backend.close().await;
        // Closing again is a no-op.
        backend.close().await;
    }
}
