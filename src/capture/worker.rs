//! Capturer context
//!
//! The capturer runs as its own task and owns the recording primitive and
//! the chunk buffer. The coordinator and the host's media source talk to
//! it only through messages; nothing else shares its memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{CaptureBackend, ChunkPolicy};
use crate::artifact::{ChunkBuffer, EncodedArtifact};
use crate::error::CaptureError;
use crate::permission::PermissionHandle;

const CONTROL_CAPACITY: usize = 64;

pub(crate) enum CapturerMsg {
    Begin {
        grant: PermissionHandle,
        reply: oneshot::Sender<Result<(), CaptureError>>,
    },
    Feed {
        chunk: Vec<u8>,
    },
    End {
        reply: oneshot::Sender<Result<EncodedArtifact, CaptureError>>,
    },
    Abort,
}

/// Control handle for a spawned capturer context.
#[derive(Clone)]
pub struct CapturerHandle {
    tx: mpsc::Sender<CapturerMsg>,

    /// Whether the context currently holds an open stream. Shared with
    /// [`ChunkFeed`] so feeds against a closed stream fail fast.
    stream_open: Arc<AtomicBool>,
}

impl CapturerHandle {
    /// Spawn a capturer task owning `backend`.
    pub fn spawn(backend: Box<dyn CaptureBackend>) -> Self {
        let (tx, rx) = mpsc::channel(CONTROL_CAPACITY);
        let stream_open = Arc::new(AtomicBool::new(false));
        tokio::spawn(run(backend, rx, stream_open.clone()));
        Self { tx, stream_open }
    }

    /// Whether the capturer task has torn down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// A capability for pushing captured chunks into this context.
    pub fn feeder(&self) -> ChunkFeed {
        ChunkFeed {
            tx: self.tx.clone(),
            stream_open: self.stream_open.clone(),
        }
    }

    pub(crate) async fn begin(&self, grant: PermissionHandle) -> Result<(), CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CapturerMsg::Begin { grant, reply })
            .await
            .map_err(|_| gone())?;
        rx.await.map_err(|_| gone())?
    }

    pub(crate) async fn end(&self) -> Result<EncodedArtifact, CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CapturerMsg::End { reply })
            .await
            .map_err(|_| gone())?;
        rx.await.map_err(|_| gone())?
    }

    /// Release the stream and discard buffered data, without waiting.
    pub(crate) fn abort(&self) {
        let _ = self.tx.try_send(CapturerMsg::Abort);
    }
}

/// Capability for pushing captured chunks into a capturer context.
#[derive(Clone)]
pub struct ChunkFeed {
    tx: mpsc::Sender<CapturerMsg>,
    stream_open: Arc<AtomicBool>,
}

impl ChunkFeed {
    /// Push one chunk into the context.
    ///
    /// Fails with [`CaptureError::NotRecording`] once the stream has
    /// closed, e.g. after a stop or the safety cutoff.
    pub async fn send(&self, chunk: Vec<u8>) -> Result<(), CaptureError> {
        if !self.stream_open.load(Ordering::SeqCst) {
            return Err(CaptureError::NotRecording);
        }
        self.tx
            .send(CapturerMsg::Feed { chunk })
            .await
            .map_err(|_| gone())
    }
}

fn gone() -> CaptureError {
    CaptureError::StreamUnavailable("capture context is gone".to_string())
}

async fn run(
    mut backend: Box<dyn CaptureBackend>,
    mut rx: mpsc::Receiver<CapturerMsg>,
    stream_open: Arc<AtomicBool>,
) {
    let mut buffer = ChunkBuffer::new();

    while let Some(msg) = rx.recv().await {
        match msg {
            CapturerMsg::Begin { grant, reply } => {
                // A previous stream must be closed before a new one opens.
                if stream_open.load(Ordering::SeqCst) {
                    backend.close().await;
                }
                buffer.clear();

                let result = backend.open(&grant).await;
                stream_open.store(result.is_ok(), Ordering::SeqCst);
                if let Err(e) = &result {
                    tracing::warn!("capture stream failed to open: {e}");
                }
                let _ = reply.send(result);
            }
            CapturerMsg::Feed { chunk } => {
                // Chunks already queued when the stream closed are dropped.
                if !stream_open.load(Ordering::SeqCst) {
                    tracing::debug!(
                        bytes = chunk.len(),
                        "dropping chunk fed outside an open stream"
                    );
                    continue;
                }
                match backend.chunk_policy() {
                    ChunkPolicy::Append => buffer.push(chunk),
                    ChunkPolicy::Replace => buffer.replace(chunk),
                }
            }
            CapturerMsg::End { reply } => {
                if !stream_open.load(Ordering::SeqCst) {
                    let _ = reply.send(Err(CaptureError::NotRecording));
                    continue;
                }
                backend.close().await;
                stream_open.store(false, Ordering::SeqCst);
                let result = std::mem::take(&mut buffer).finalize(backend.mime_type());
                let _ = reply.send(result);
            }
            CapturerMsg::Abort => {
                if stream_open.load(Ordering::SeqCst) {
                    backend.close().await;
                    stream_open.store(false, Ordering::SeqCst);
                }
                buffer.clear();
            }
        }
    }

    // Control channel dropped; make sure the stream does not leak.
    if stream_open.load(Ordering::SeqCst) {
        backend.close().await;
        stream_open.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::audio::AudioStreamBackend;
    use crate::capture::snapshot::{FrameStrategy, SnapshotBackend};
    use crate::capture::CaptureKind;
    use crate::permission::SurfaceId;

    fn audio_grant() -> PermissionHandle {
        PermissionHandle::new(SurfaceId::new("tab-1"), CaptureKind::TabAudio)
    }

    #[tokio::test]
    async fn test_begin_feed_end_yields_artifact() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        capturer.begin(audio_grant()).await.unwrap();

        let feed = capturer.feeder();
        feed.send(vec![0u8; 10]).await.unwrap();
        feed.send(vec![1u8; 20]).await.unwrap();
        feed.send(vec![2u8; 15]).await.unwrap();

        let artifact = capturer.end().await.unwrap();
        assert_eq!(artifact.mime_type, "audio/webm");
        assert!(artifact.size_bytes >= 45);
    }

    #[tokio::test]
    async fn test_end_with_no_chunks_is_empty_capture() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        capturer.begin(audio_grant()).await.unwrap();
        assert_eq!(capturer.end().await, Err(CaptureError::EmptyCapture));
    }

    #[tokio::test]
    async fn test_end_without_begin_is_not_recording() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        assert_eq!(capturer.end().await, Err(CaptureError::NotRecording));
    }

    #[tokio::test]
    async fn test_second_begin_discards_previous_stream() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        capturer.begin(audio_grant()).await.unwrap();
        capturer.feeder().send(vec![9u8; 50]).await.unwrap();

        // New session: old buffer must not bleed into the new artifact.
        capturer.begin(audio_grant()).await.unwrap();
        capturer.feeder().send(vec![1u8; 5]).await.unwrap();

        let artifact = capturer.end().await.unwrap();
        assert_eq!(artifact.size_bytes, 5);
    }

    #[tokio::test]
    async fn test_abort_discards_buffer_and_closes_stream() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        capturer.begin(audio_grant()).await.unwrap();
        capturer.feeder().send(vec![4u8; 12]).await.unwrap();
        capturer.abort();

        // After an abort the stream is closed, so End reports NotRecording.
        assert_eq!(capturer.end().await, Err(CaptureError::NotRecording));
    }

    #[tokio::test]
    async fn test_snapshot_replaces_earlier_frame() {
        let capturer =
            CapturerHandle::spawn(Box::new(SnapshotBackend::new(FrameStrategy::Screenshot)));
        let grant = PermissionHandle::new(SurfaceId::new("tab-2"), CaptureKind::TabImage);
        capturer.begin(grant).await.unwrap();

        let feed = capturer.feeder();
        feed.send(vec![0u8; 100]).await.unwrap();
        feed.send(vec![5u8; 40]).await.unwrap();

        let artifact = capturer.end().await.unwrap();
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(artifact.size_bytes, 40);
    }

    #[tokio::test]
    async fn test_feed_before_begin_reports_not_recording() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        let feed = capturer.feeder();
        assert_eq!(
            feed.send(vec![1u8; 10]).await,
            Err(CaptureError::NotRecording)
        );

        capturer.begin(audio_grant()).await.unwrap();
        feed.send(vec![2u8; 7]).await.unwrap();
        let artifact = capturer.end().await.unwrap();
        assert_eq!(artifact.size_bytes, 7);
    }

    #[tokio::test]
    async fn test_feed_after_end_reports_not_recording() {
        let capturer = CapturerHandle::spawn(Box::new(AudioStreamBackend::new()));
        capturer.begin(audio_grant()).await.unwrap();

        let feed = capturer.feeder();
        feed.send(vec![1u8; 4]).await.unwrap();
        capturer.end().await.unwrap();

        // The stream is closed; late feeds must not report success.
        assert_eq!(
            feed.send(vec![2u8; 4]).await,
            Err(CaptureError::NotRecording)
        );
    }
}
