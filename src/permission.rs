//! Ephemeral capture permissions
//!
//! The coordinator never decides capture policy itself. It asks a
//! [`PermissionHost`] for a handle scoped to one foreground surface and
//! releases it when the session ends, successfully or not.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::CaptureKind;
use crate::error::CaptureError;

/// Identifies the foreground surface (tab) a capture is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ephemeral, scope-limited grant for capturing one surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionHandle {
    pub token: Uuid,
    pub surface: SurfaceId,
    pub kind: CaptureKind,
    pub granted_at: DateTime<Utc>,
}

impl PermissionHandle {
    pub fn new(surface: SurfaceId, kind: CaptureKind) -> Self {
        Self {
            token: Uuid::new_v4(),
            surface,
            kind,
            granted_at: Utc::now(),
        }
    }
}

/// Issues and revokes ephemeral capture grants.
#[async_trait]
pub trait PermissionHost: Send + Sync {
    /// Acquire a capture grant for `surface`.
    async fn acquire(
        &self,
        surface: &SurfaceId,
        kind: CaptureKind,
    ) -> Result<PermissionHandle, CaptureError>;

    /// Release a previously acquired grant.
    async fn release(&self, handle: PermissionHandle);
}

/// Host that grants every request.
///
/// For embedders whose surrounding platform already prompted the user
/// before the request reaches the coordinator.
#[derive(Debug, Default)]
pub struct UnrestrictedHost;

#[async_trait]
impl PermissionHost for UnrestrictedHost {
    async fn acquire(
        &self,
        surface: &SurfaceId,
        kind: CaptureKind,
    ) -> Result<PermissionHandle, CaptureError> {
        Ok(PermissionHandle::new(surface.clone(), kind))
    }

    async fn release(&self, handle: PermissionHandle) {
        tracing::debug!(token = %handle.token, "capture grant released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unrestricted_host_scopes_the_grant() {
        let host = UnrestrictedHost;
        let surface = SurfaceId::new("tab-9");
        let handle = host
            .acquire(&surface, CaptureKind::TabAudio)
            .await
            .unwrap();
        assert_eq!(handle.surface, surface);
        assert_eq!(handle.kind, CaptureKind::TabAudio);
        host.release(handle).await;
    }
}
