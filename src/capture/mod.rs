//! Capture backends and the capturer context
//!
//! Backend variants for the recording primitive sit behind one trait so
//! the coordinator never branches on media type. The capturer itself runs
//! as an isolated task, see [`worker`].

pub mod audio;
pub mod snapshot;
pub mod worker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::permission::PermissionHandle;

/// What kind of media a backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    /// Continuous tab audio
    TabAudio,
    /// A single image of the tab's visible content
    TabImage,
}

/// How the capturer buffers incoming chunks for a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Chunks accumulate in order (streamed media).
    Append,
    /// A new chunk supersedes the previous one (single-frame media).
    Replace,
}

/// The recording primitive owned by the capturer context.
///
/// Embedders with a real media source implement this to bridge their
/// platform's stream into the capture pipeline; the bundled backends
/// validate the grant and track the stream handshake.
#[async_trait]
pub trait CaptureBackend: Send {
    /// Media kind this backend produces.
    fn kind(&self) -> CaptureKind;

    /// MIME type of the finalized artifact.
    fn mime_type(&self) -> &'static str;

    fn chunk_policy(&self) -> ChunkPolicy {
        ChunkPolicy::Append
    }

    /// Open the underlying stream using an ephemeral grant.
    ///
    /// Fails with [`CaptureError::StreamUnavailable`] when the grant is
    /// not scoped for this backend or the source cannot be opened.
    async fn open(&mut self, grant: &PermissionHandle) -> Result<(), CaptureError>;

    /// Close the underlying stream. Must be safe to call when closed.
    async fn close(&mut self);
}

/// Builds the backend when the coordinator lazily spawns the capturer.
pub trait BackendFactory: Send {
    fn kind(&self) -> CaptureKind;

    fn build(&self) -> Box<dyn CaptureBackend>;
}
