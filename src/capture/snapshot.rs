//! Tab image backend
//!
//! Single-frame capture of a tab's visible content. Two acquisition
//! strategies feed the same backend: pulling the clean source image out of
//! the page, or screenshotting the visible tab when extraction is not
//! possible. Source-image extraction is preferred; the screenshot path is
//! the fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{BackendFactory, CaptureBackend, CaptureKind, ChunkPolicy};
use crate::error::CaptureError;
use crate::permission::PermissionHandle;

/// How the frame is acquired from the tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStrategy {
    /// Extract the original image element from the page.
    SourceImage,
    /// Screenshot the visible tab area.
    Screenshot,
}

/// Backend for single-frame tab-image capture.
#[derive(Debug)]
pub struct SnapshotBackend {
    strategy: FrameStrategy,
    stream_open: bool,
}

impl SnapshotBackend {
    pub fn new(strategy: FrameStrategy) -> Self {
        Self {
            strategy,
            stream_open: false,
        }
    }

    pub fn strategy(&self) -> FrameStrategy {
        self.strategy
    }
}

#[async_trait]
impl CaptureBackend for SnapshotBackend {
    fn kind(&self) -> CaptureKind {
        CaptureKind::TabImage
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }

    fn chunk_policy(&self) -> ChunkPolicy {
        // A retaken frame supersedes the previous one.
        ChunkPolicy::Replace
    }

    async fn open(&mut self, grant: &PermissionHandle) -> Result<(), CaptureError> {
        if grant.kind != CaptureKind::TabImage {
            return Err(CaptureError::StreamUnavailable(format!(
                "grant for surface {} is not scoped for tab images",
                grant.surface
            )));
        }
        self.stream_open = true;
        tracing::debug!(surface = %grant.surface, strategy = ?self.strategy, "snapshot source opened");
        Ok(())
    }

    async fn close(&mut self) {
        self.stream_open = false;
    }
}

/// Factory producing [`SnapshotBackend`]s with a fixed strategy.
#[derive(Debug)]
pub struct SnapshotCaptureFactory {
    pub strategy: FrameStrategy,
}

impl Default for SnapshotCaptureFactory {
    fn default() -> Self {
        Self {
            strategy: FrameStrategy::SourceImage,
        }
    }
}

impl BackendFactory for SnapshotCaptureFactory {
    fn kind(&self) -> CaptureKind {
        CaptureKind::TabImage
    }

    fn build(&self) -> Box<dyn CaptureBackend> {
        Box::new(SnapshotBackend::new(self.strategy))
    }
}
