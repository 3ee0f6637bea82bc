//! Downstream analysis sink
//!
//! A completed capture session hands its artifact to the analysis service
//! exactly once. The coordinator treats the sink as opaque: whatever error
//! it reports is surfaced to the requester verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifact::EncodedArtifact;
use crate::config::SinkConfig;
use crate::error::CaptureError;

/// Risk bucket assigned by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Safe,
    Suspicious,
    ScamLikely,
}

/// Structured assessment returned by the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100 likelihood of scam/danger.
    pub risk_score: u8,
    pub category: RiskCategory,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub recommended_action: String,
    #[serde(default)]
    pub suggested_reply: String,
}

/// Accepts one encoded artifact per completed session.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn submit(&self, artifact: &EncodedArtifact) -> Result<RiskAssessment, CaptureError>;
}

/// HTTP sink posting the artifact as JSON to the analysis backend.
pub struct HttpAnalysisSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAnalysisSink {
    pub fn new(config: &SinkConfig) -> Result<Self, CaptureError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CaptureError::Unknown(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl AnalysisSink for HttpAnalysisSink {
    async fn submit(&self, artifact: &EncodedArtifact) -> Result<RiskAssessment, CaptureError> {
        tracing::info!(
            endpoint = %self.endpoint,
            size_bytes = artifact.size_bytes,
            mime = %artifact.mime_type,
            "submitting artifact for analysis"
        );

        let mut request = self.client.post(&self.endpoint).json(artifact);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CaptureError::DownstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_detail(&body).unwrap_or_else(|| truncate(&body, 200));
            return Err(CaptureError::DownstreamUnavailable(format!(
                "analysis service returned {status}: {detail}"
            )));
        }

        response
            .json::<RiskAssessment>()
            .await
            .map_err(|e| CaptureError::DownstreamUnavailable(format!("invalid analysis response: {e}")))
    }
}

/// Pull a human-readable detail out of a JSON error body, if there is one.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(key))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i <= max)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!("{}…", &s[..cut])
    }
}
