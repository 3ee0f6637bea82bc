//! Encoded artifacts and chunk buffering
//!
//! The capturer buffers raw chunks in memory and finalizes them into a
//! single base64-encoded artifact when the stream closes. Either a complete
//! artifact comes out or an error does; there is no partial hand-off.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

/// The final encoded media object produced by a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedArtifact {
    /// MIME type of the encoded payload, e.g. `audio/webm`.
    pub mime_type: String,

    /// Base64-encoded media bytes.
    pub payload: String,

    /// Size of the raw media in bytes, before base64 expansion.
    pub size_bytes: u64,
}

impl EncodedArtifact {
    /// Decode the payload back into raw media bytes.
    pub fn decode(&self) -> Result<Vec<u8>, CaptureError> {
        general_purpose::STANDARD
            .decode(&self.payload)
            .map_err(|e| CaptureError::Unknown(format!("artifact payload is not valid base64: {e}")))
    }
}

/// In-memory buffer of captured chunks.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    total_bytes: u64,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk to the buffer.
    pub fn push(&mut self, chunk: Vec<u8>) {
        self.total_bytes += chunk.len() as u64;
        self.chunks.push(chunk);
    }

    /// Replace the whole buffer with one chunk. Used by single-frame
    /// backends where a retaken frame supersedes the previous one.
    pub fn replace(&mut self, chunk: Vec<u8>) {
        self.clear();
        self.push(chunk);
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn is_empty(&self) -> bool {
        self.total_bytes == 0
    }

    /// Finalize buffered chunks into one artifact.
    ///
    /// Zero buffered bytes is an error, never a zero-byte artifact.
    pub fn finalize(self, mime_type: &str) -> Result<EncodedArtifact, CaptureError> {
        if self.total_bytes == 0 {
            return Err(CaptureError::EmptyCapture);
        }

        let mut raw = Vec::with_capacity(self.total_bytes as usize);
        for chunk in &self.chunks {
            raw.extend_from_slice(chunk);
        }

        Ok(EncodedArtifact {
            mime_type: mime_type.to_string(),
            payload: general_purpose::STANDARD.encode(&raw),
            size_bytes: raw.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_concatenates_chunks() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1u8; 10]);
        buffer.push(vec![2u8; 20]);
        buffer.push(vec![3u8; 15]);
        assert_eq!(buffer.total_bytes(), 45);

        let artifact = buffer.finalize("audio/webm").unwrap();
        assert_eq!(artifact.mime_type, "audio/webm");
        assert_eq!(artifact.size_bytes, 45);

        let raw = artifact.decode().unwrap();
        assert_eq!(raw.len(), 45);
        assert_eq!(&raw[..10], &[1u8; 10]);
        assert_eq!(&raw[10..30], &[2u8; 20]);
    }

    #[test]
    fn test_empty_buffer_never_yields_artifact() {
        let buffer = ChunkBuffer::new();
        assert_eq!(
            buffer.finalize("audio/webm"),
            Err(CaptureError::EmptyCapture)
        );
    }

    #[test]
    fn test_replace_keeps_only_last_chunk() {
        let mut buffer = ChunkBuffer::new();
        buffer.replace(vec![0u8; 100]);
        buffer.replace(vec![7u8; 30]);
        let artifact = buffer.finalize("image/png").unwrap();
        assert_eq!(artifact.size_bytes, 30);
        assert_eq!(artifact.decode().unwrap(), vec![7u8; 30]);
    }
}
