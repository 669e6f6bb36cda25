//! Collaborator traits for the external services the pipeline drives.
//!
//! The workflow engine receives these as constructor-injected
//! `Arc<dyn Trait>` dependencies so tests can substitute fakes.

use async_trait::async_trait;

use crate::types::{ArtifactRef, MediaKind, StyleProfile};

/// Synthesizes an artifact from a prompt. Errors are opaque to the core
/// beyond success/failure; retry policy lives in the workflow engine.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        media_kind: MediaKind,
        style_profile: Option<&StyleProfile>,
    ) -> anyhow::Result<ArtifactRef>;
}

/// Builds a brand/style profile from an uploaded-asset or webpage source.
#[async_trait]
pub trait StyleProfileProvider: Send + Sync {
    async fn extract(&self, source: &str) -> anyhow::Result<StyleProfile>;
}

/// Which local pixel-level repairs to apply on the enhance path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairFlags {
    pub sharpen: bool,
    pub denoise: bool,
    pub contrast: bool,
    pub brightness: bool,
}

impl RepairFlags {
    pub fn any(&self) -> bool {
        self.sharpen || self.denoise || self.contrast || self.brightness
    }
}

/// Applies local pixel-level repairs to an image artifact, producing a
/// new artifact reference.
#[async_trait]
pub trait RepairProvider: Send + Sync {
    async fn repair(
        &self,
        artifact: &ArtifactRef,
        flags: RepairFlags,
    ) -> anyhow::Result<ArtifactRef>;
}

/// Rewrites a generation prompt so that a regeneration attempt addresses
/// the critique's findings.
#[async_trait]
pub trait PromptImprover: Send + Sync {
    async fn improve(
        &self,
        original_prompt: &str,
        issues: &[String],
        style_profile: Option<&StyleProfile>,
    ) -> anyhow::Result<String>;
}
