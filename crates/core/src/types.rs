use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of media a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Whether artifacts of this kind can be repaired in place with
    /// local pixel-level operations. Video frames cannot.
    pub fn supports_local_repair(&self) -> bool {
        matches!(self, MediaKind::Image)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Opaque reference to a produced artifact. The core never inspects the
/// content behind the URI; providers and evaluators do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: Uuid,
    pub uri: String,
    pub media_kind: MediaKind,
}

impl ArtifactRef {
    pub fn new(uri: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            uri: uri.into(),
            media_kind,
        }
    }
}

/// A named brand color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandColor {
    pub name: String,
    pub hex: String,
}

/// Brand/style profile consumed read-only by evaluators and the
/// prompt-refinement step. Built by an external extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleProfile {
    pub id: Uuid,
    pub display_name: String,
    pub colors: Vec<BrandColor>,
    pub logo_uri: Option<String>,
    pub product_uri: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

/// Lifecycle status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Rejected,
    Cancelled,
}

impl RunStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Rejected | RunStatus::Cancelled
        )
    }
}
