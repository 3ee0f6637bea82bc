//! DateGuard capture - tab-media acquisition coordination.
//!
//! Implements the hand-off protocol between three isolated roles:
//!
//! - the **requester** ([`CaptureClient`]), a UI surface that starts and
//!   stops captures and renders the result;
//! - the **coordinator** ([`coordinator::CaptureCoordinator`]), which owns
//!   the single capture slot, the session state machine, and the
//!   permission handle for the active surface;
//! - the **capturer** (`capture::worker`), an isolated task owning the
//!   recording primitive and the chunk buffer.
//!
//! All cross-role communication is asynchronous message passing. A
//! completed session produces exactly one [`EncodedArtifact`], which is
//! delivered once to the configured analysis sink.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dateguard_capture::capture::audio::AudioCaptureFactory;
//! use dateguard_capture::{CaptureCoordinator, CoordinatorConfig, SurfaceId, UnrestrictedHost};
//!
//! # async fn demo() -> Result<(), dateguard_capture::CaptureError> {
//! let client = CaptureCoordinator::spawn(
//!     Arc::new(UnrestrictedHost),
//!     Box::new(AudioCaptureFactory),
//!     None,
//!     CoordinatorConfig::from_env(),
//! );
//!
//! client.start_capture(SurfaceId::new("tab-1")).await?;
//! client.feed_chunk(vec![0u8; 4096]).await?;
//! let outcome = client.stop_capture().await?;
//! println!("{} bytes of {}", outcome.artifact.size_bytes, outcome.artifact.mime_type);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod capture;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod permission;
pub mod session;
pub mod sink;

pub use artifact::EncodedArtifact;
pub use capture::{BackendFactory, CaptureBackend, CaptureKind, ChunkPolicy};
pub use client::CaptureClient;
pub use config::{CoordinatorConfig, SinkConfig};
pub use coordinator::{CaptureCoordinator, CaptureEvent, CaptureOutcome};
pub use error::{CaptureError, CaptureResult, ErrorResponse};
pub use permission::{PermissionHandle, PermissionHost, SurfaceId, UnrestrictedHost};
pub use session::{CaptureSession, CaptureStatus};
pub use sink::{AnalysisSink, HttpAnalysisSink, RiskAssessment, RiskCategory};
