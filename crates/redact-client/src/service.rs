//! The remote collaborator seam.
//!
//! Every AI operation the orchestrator depends on is an opaque remote
//! function behind [`RemediationService`]. Requests are owned structs so
//! the seam can be faked in tests without an HTTP server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use redact_models::{
    BlurEffect, CensorMode, ClassificationResult, ClipBounds, JobHandle, NormalizedRegion,
    ReplacementMap, ResultLocation, SegmentEntry,
};

use crate::error::ServiceResult;

/// Reference image uploaded alongside a replacement prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReferenceImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Guess the content type from the file extension.
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let lower = file_name.to_lowercase();
        let content_type = if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else {
            "application/octet-stream"
        };
        Self::new(file_name, content_type, bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Parameters for detect-and-blur / detect-and-pixelate.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurRequest {
    pub label: String,
    pub strength: u32,
    pub effect: BlurEffect,
    pub clip: Option<ClipBounds>,
}

/// Parameters for segmentation (mask overlay or mask-only for inpainting).
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRequest {
    pub label: String,
    pub mask_only: bool,
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGuidedRequest {
    pub prompt: String,
    pub reference_image: ReferenceImage,
}

/// Parameters for the text-only (Gen4) replacement backend.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReplaceRequest {
    pub prompt: String,
    pub reference_image: Option<ReferenceImage>,
    pub negative_prompt: Option<String>,
    pub duration: Option<u32>,
    pub clip: Option<ClipBounds>,
}

/// Second half of mask-then-inpaint; relies on the mask produced for the same job.
#[derive(Debug, Clone, PartialEq)]
pub struct InpaintRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CensorRequest {
    pub mode: CensorMode,
    pub replacements: Option<ReplacementMap>,
    pub matches: Vec<SegmentEntry>,
}

/// Artifact written by a remote media operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteArtifact {
    #[serde(alias = "download_path", default)]
    pub download_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensorOutcome {
    #[serde(alias = "download_path", default)]
    pub download_path: String,
    pub mode: CensorMode,
}

/// The remote AI operations, one method per service endpoint.
#[async_trait]
pub trait RemediationService: Send + Sync {
    /// Ask what a region contains and which actions are recommended.
    async fn classify_region(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> ServiceResult<ClassificationResult>;

    /// Candidate object names for a box at a timestamp.
    async fn detect_object_names(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> ServiceResult<Vec<String>>;

    async fn detect_and_blur(&self, job: &JobHandle, request: BlurRequest) -> ServiceResult<RemoteArtifact>;

    async fn segment(&self, job: &JobHandle, request: SegmentRequest) -> ServiceResult<RemoteArtifact>;

    async fn replace_image_guided(
        &self,
        job: &JobHandle,
        request: ImageGuidedRequest,
    ) -> ServiceResult<RemoteArtifact>;

    async fn replace_text_only(
        &self,
        job: &JobHandle,
        request: TextReplaceRequest,
    ) -> ServiceResult<RemoteArtifact>;

    async fn inpaint(&self, job: &JobHandle, request: InpaintRequest) -> ServiceResult<RemoteArtifact>;

    /// Bulk profanity analysis of the job's audio track.
    async fn scan_audio(&self, job: &JobHandle) -> ServiceResult<Vec<SegmentEntry>>;

    async fn censor(&self, job: &JobHandle, request: CensorRequest) -> ServiceResult<CensorOutcome>;

    /// Suggested clean replacements for one word.
    async fn suggest_replacement(&self, job: &JobHandle, word: &str) -> ServiceResult<Vec<String>>;

    /// Download location of the job's latest processed video.
    fn download_url(&self, job: &JobHandle) -> ResultLocation;

    /// Download location of the job's segmented (masked) video.
    fn segmented_download_url(&self, job: &JobHandle) -> ResultLocation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_image_content_type() {
        assert_eq!(ReferenceImage::from_file_name("Ref.PNG", vec![1]).content_type, "image/png");
        assert_eq!(ReferenceImage::from_file_name("a.jpeg", vec![1]).content_type, "image/jpeg");
        assert_eq!(
            ReferenceImage::from_file_name("a.bin", vec![]).content_type,
            "application/octet-stream"
        );
        assert!(ReferenceImage::from_file_name("a.bin", vec![]).is_empty());
    }

    #[test]
    fn test_artifact_accepts_snake_case() {
        let artifact: RemoteArtifact =
            serde_json::from_str(r#"{"download_path": "/outputs/job-1.mp4"}"#).unwrap();
        assert_eq!(artifact.download_path, "/outputs/job-1.mp4");
    }
}
