//! Publish request and outcome types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publish payload as received at the API boundary.
///
/// Every field is optional here so that missing required fields surface as
/// a [`ValidationError`] instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PublishBeatPayload {
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    /// Caller's own identifier, echoed back as `song_id`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub bpm: Option<f64>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Rejections raised before any resource is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: audio_url")]
    MissingSourceUrl,

    #[error("Missing required field: title")]
    MissingTitle,

    #[error("bpm must be a positive number, got {0}")]
    InvalidBpm(f64),
}

/// A validated publish request. Immutable once accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    source_url: String,
    title: String,
    tags: Option<String>,
    bpm: Option<f64>,
    key: Option<String>,
    external_id: Option<String>,
}

impl PublishRequest {
    /// Build a request with only the required fields.
    pub fn new(
        source_url: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::try_from(PublishBeatPayload {
            audio_url: Some(source_url.into()),
            title: Some(title.into()),
            ..Default::default()
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    pub fn bpm(&self) -> Option<f64> {
        self.bpm
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }
}

impl TryFrom<PublishBeatPayload> for PublishRequest {
    type Error = ValidationError;

    fn try_from(payload: PublishBeatPayload) -> Result<Self, Self::Error> {
        let source_url = payload
            .audio_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ValidationError::MissingSourceUrl)?;
        let title = payload
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(ValidationError::MissingTitle)?;

        if let Some(bpm) = payload.bpm {
            if !bpm.is_finite() || bpm <= 0.0 {
                return Err(ValidationError::InvalidBpm(bpm));
            }
        }

        // Optional fields keep `Some("")`: an empty value still clears the
        // marketplace control, while `None` leaves it untouched.
        Ok(Self {
            source_url: source_url.trim().to_string(),
            title,
            tags: payload.tags,
            bpm: payload.bpm,
            key: payload.key,
            external_id: payload.id,
        })
    }
}

/// Why a publish did not succeed. Causes are only in the logs.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    Validation(ValidationError),
    Download,
    Publish,
    Unexpected,
}

impl FailureReason {
    /// Whether the caller, not the service, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Download => "download",
            Self::Publish => "publish",
            Self::Unexpected => "unexpected",
        }
    }
}

/// Result of one publish request. Produced exactly once per request.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Success {
        message: String,
        external_id: Option<String>,
    },
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Metric label.
    pub fn result_label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { reason, .. } => reason.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(audio_url: Option<&str>, title: Option<&str>) -> PublishBeatPayload {
        PublishBeatPayload {
            audio_url: audio_url.map(String::from),
            title: title.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_minimal_payload() {
        let request =
            PublishRequest::try_from(payload(Some("https://x/a.wav"), Some("Beat 1"))).unwrap();
        assert_eq!(request.source_url(), "https://x/a.wav");
        assert_eq!(request.title(), "Beat 1");
        assert!(request.tags().is_none());
        assert!(request.bpm().is_none());
        assert!(request.key().is_none());
        assert!(request.external_id().is_none());
    }

    #[test]
    fn test_missing_audio_url() {
        let result = PublishRequest::try_from(payload(None, Some("Beat 1")));
        assert_eq!(result, Err(ValidationError::MissingSourceUrl));
    }

    #[test]
    fn test_blank_title_is_missing() {
        let result = PublishRequest::try_from(payload(Some("https://x/a.wav"), Some("   ")));
        assert_eq!(result, Err(ValidationError::MissingTitle));
    }

    #[test]
    fn test_non_positive_bpm_rejected() {
        let mut p = payload(Some("https://x/a.wav"), Some("Beat 1"));
        p.bpm = Some(0.0);
        assert_eq!(
            PublishRequest::try_from(p),
            Err(ValidationError::InvalidBpm(0.0))
        );
    }

    #[test]
    fn test_empty_optional_field_is_kept() {
        let mut p = payload(Some("https://x/a.wav"), Some("Beat 1"));
        p.tags = Some(String::new());
        let request = PublishRequest::try_from(p).unwrap();
        assert_eq!(request.tags(), Some(""));
    }

    #[test]
    fn test_payload_deserializes_wire_names() {
        let json = r#"{"audio_url":"https://x/a.wav","title":"Beat 1","id":"abc","bpm":140}"#;
        let p: PublishBeatPayload = serde_json::from_str(json).unwrap();
        let request = PublishRequest::try_from(p).unwrap();
        assert_eq!(request.external_id(), Some("abc"));
        assert_eq!(request.bpm(), Some(140.0));
    }

    #[test]
    fn test_outcome_labels() {
        let failure = PublishOutcome::Failure {
            reason: FailureReason::Download,
            message: "Failed to download audio file".to_string(),
        };
        assert_eq!(failure.result_label(), "download");
        assert!(!failure.is_success());
        assert!(FailureReason::Validation(ValidationError::MissingTitle).is_client_error());
        assert!(!FailureReason::Unexpected.is_client_error());
    }
}
