//! Capture coordinator
//!
//! Owns the single capture slot and the session state machine. Runs as its
//! own task; the requester talks to it through [`crate::client::CaptureClient`],
//! and it in turn drives the capturer context and the permission host. Every
//! failure resolves the slot back to idle so the requester may retry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;

use crate::artifact::EncodedArtifact;
use crate::capture::worker::{CapturerHandle, ChunkFeed};
use crate::capture::BackendFactory;
use crate::client::CaptureClient;
use crate::config::CoordinatorConfig;
use crate::error::CaptureError;
use crate::permission::{PermissionHandle, PermissionHost, SurfaceId};
use crate::session::{CaptureSession, CaptureStatus};
use crate::sink::{AnalysisSink, RiskAssessment};

/// Events emitted while a session runs
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Capture started
    Started,
    /// Capture stopped and the artifact was handed off
    Stopped,
    /// Session failed with the given reason
    Failed(String),
    /// The safety cutoff force-stopped an over-long session
    Cutoff,
}

/// What a completed session hands back to the requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOutcome {
    pub artifact: EncodedArtifact,

    /// Assessment from the analysis sink, when one is configured.
    pub assessment: Option<RiskAssessment>,
}

pub(crate) enum Command {
    Start {
        surface: SurfaceId,
        reply: oneshot::Sender<Result<ChunkFeed, CaptureError>>,
    },
    Stop {
        reply: oneshot::Sender<Result<CaptureOutcome, CaptureError>>,
    },
    Status {
        reply: oneshot::Sender<CaptureSession>,
    },
    TakeOutcome {
        reply: oneshot::Sender<Option<CaptureOutcome>>,
    },
}

/// Serializes access to the single capture slot.
pub struct CaptureCoordinator {
    session: CaptureSession,
    host: Arc<dyn PermissionHost>,
    factory: Box<dyn BackendFactory>,

    /// Lazily spawned capture context.
    capturer: Option<CapturerHandle>,

    /// Grant held for the active session.
    grant: Option<PermissionHandle>,

    sink: Option<Arc<dyn AnalysisSink>>,

    /// Single slot holding the most recent completed outcome.
    last_outcome: Option<CaptureOutcome>,

    /// Most recent terminal failure, replayed to late stop requests.
    last_failure: Option<CaptureError>,

    events: broadcast::Sender<CaptureEvent>,
    config: CoordinatorConfig,

    /// When the safety cutoff fires for the active session.
    cutoff_at: Option<Instant>,
}

impl CaptureCoordinator {
    /// Spawn the coordinator task and return the requester-side client.
    pub fn spawn(
        host: Arc<dyn PermissionHost>,
        factory: Box<dyn BackendFactory>,
        sink: Option<Arc<dyn AnalysisSink>>,
        config: CoordinatorConfig,
    ) -> CaptureClient {
        let (tx, rx) = mpsc::channel(16);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let control_timeout = config.control_timeout();

        let coordinator = Self {
            session: CaptureSession::idle(),
            host,
            factory,
            capturer: None,
            grant: None,
            sink,
            last_outcome: None,
            last_failure: None,
            events: events.clone(),
            config,
            cutoff_at: None,
        };
        tokio::spawn(coordinator.run(rx));

        CaptureClient::new(tx, events, control_timeout)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        loop {
            let deadline = self.cutoff_at.unwrap_or_else(Instant::now);
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline), if self.cutoff_at.is_some() => {
                    self.cutoff().await;
                }
            }
        }

        // All clients dropped; never leave a stream open behind us.
        if let Some(capturer) = &self.capturer {
            capturer.abort();
        }
        if let Some(grant) = self.grant.take() {
            self.host.release(grant).await;
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start { surface, reply } => {
                let _ = reply.send(self.start(surface).await);
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.stop().await);
            }
            Command::Status { reply } => {
                let _ = reply.send(self.session.clone());
            }
            Command::TakeOutcome { reply } => {
                let _ = reply.send(self.last_outcome.take());
            }
        }
    }

    async fn start(&mut self, surface: SurfaceId) -> Result<ChunkFeed, CaptureError> {
        // Atomic check-and-transition: a live session means busy, not queued.
        self.session.request(surface.clone())?;
        tracing::info!(
            surface = %surface,
            token = %self.session.session_token,
            "capture requested"
        );

        let grant = match self.host.acquire(&surface, self.factory.kind()).await {
            Ok(grant) => grant,
            Err(e) => return Err(self.fail(e).await),
        };

        // Lazily spawn the capture context, or replace one that tore down.
        let capturer = match &self.capturer {
            Some(capturer) if !capturer.is_closed() => capturer.clone(),
            _ => {
                let capturer = CapturerHandle::spawn(self.factory.build());
                self.capturer = Some(capturer.clone());
                capturer
            }
        };

        if let Err(e) = capturer.begin(grant.clone()).await {
            self.host.release(grant).await;
            return Err(self.fail(e).await);
        }
        self.grant = Some(grant);

        self.session.activate()?;
        self.cutoff_at = self.config.max_capture().map(|d| Instant::now() + d);
        let _ = self.events.send(CaptureEvent::Started);
        tracing::info!("capture active");

        Ok(capturer.feeder())
    }

    async fn stop(&mut self) -> Result<CaptureOutcome, CaptureError> {
        self.session.begin_stop()?;
        self.cutoff_at = None;
        tracing::info!(token = %self.session.session_token, "capture stopping");
        self.finish().await
    }

    /// Finalize the active session into an outcome. Shared by explicit
    /// stops and the safety cutoff.
    async fn finish(&mut self) -> Result<CaptureOutcome, CaptureError> {
        let capturer = match &self.capturer {
            Some(capturer) if !capturer.is_closed() => capturer.clone(),
            // The capture context tore down mid-session; resolve to its
            // recorded failure instead of blocking on a dead channel.
            _ => {
                let err = self.last_failure.clone().unwrap_or_else(|| {
                    CaptureError::StreamUnavailable("capture context is gone".to_string())
                });
                return Err(self.fail(err).await);
            }
        };

        let artifact = match capturer.end().await {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fail(e).await),
        };

        if let Some(grant) = self.grant.take() {
            self.host.release(grant).await;
        }
        self.session.complete();
        tracing::info!(
            size_bytes = artifact.size_bytes,
            mime = %artifact.mime_type,
            "capture completed"
        );

        let assessment = match &self.sink {
            Some(sink) => match sink.submit(&artifact).await {
                Ok(assessment) => Some(assessment),
                Err(e) => {
                    // The capture itself succeeded; keep the artifact
                    // reachable even though analysis failed.
                    self.last_outcome = Some(CaptureOutcome {
                        artifact,
                        assessment: None,
                    });
                    return Err(self.fail(e).await);
                }
            },
            None => None,
        };

        let outcome = CaptureOutcome {
            artifact,
            assessment,
        };
        self.last_outcome = Some(outcome.clone());
        self.session.reset();
        let _ = self.events.send(CaptureEvent::Stopped);
        Ok(outcome)
    }

    async fn cutoff(&mut self) {
        self.cutoff_at = None;
        if self.session.status() != CaptureStatus::Active {
            return;
        }
        tracing::warn!(
            token = %self.session.session_token,
            "maximum capture duration reached, forcing stop"
        );
        if self.session.begin_stop().is_ok() {
            // The outcome lands in the last-outcome slot for the
            // requester to collect.
            let _ = self.finish().await;
            let _ = self.events.send(CaptureEvent::Cutoff);
        }
    }

    /// Tear the session down after a terminal failure and resolve the
    /// slot back to idle. Returns the error for propagation.
    async fn fail(&mut self, err: CaptureError) -> CaptureError {
        tracing::warn!("capture session failed: {err}");
        if let Some(capturer) = &self.capturer {
            capturer.abort();
        }
        if let Some(grant) = self.grant.take() {
            self.host.release(grant).await;
        }
        self.cutoff_at = None;
        self.session.fail();
        let _ = self.events.send(CaptureEvent::Failed(err.to_string()));
        self.last_failure = Some(err.clone());
        self.session.reset();
        err
    }
}
