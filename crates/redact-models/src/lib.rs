//! Shared data models for the remediation orchestrator.
//!
//! This crate provides Serde-serializable types for:
//! - Job handles and normalized regions
//! - Action kinds, suggestions and completion payloads
//! - Profanity segment entries and replacement maps
//! - Pipeline status

pub mod action;
pub mod classification;
pub mod job;
pub mod region;
pub mod segment;
pub mod status;
pub mod timestamp;

// Re-export common types
pub use action::{
    ActionCompletion, ActionKind, ActionSuggestion, BlurEffect, CensorMode, ReplaceBackend,
    ResultLocation, UnknownActionKind,
};
pub use classification::{default_suggestions, ClassificationResult};
pub use job::JobHandle;
pub use region::{NormalizedRegion, SurfacePoint};
pub use segment::{ReplacementMap, SegmentEntry, SegmentId};
pub use status::PipelineStatus;
pub use timestamp::{ClipBounds, TimestampError};
