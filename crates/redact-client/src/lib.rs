//! Remediation service client.
//!
//! This crate provides:
//! - The [`RemediationService`] seam the orchestrator depends on
//! - A reqwest-backed HTTP implementation with env configuration
//! - Request metrics and typed errors

pub mod client;
pub mod error;
pub mod metrics;
pub mod service;
mod types;

#[cfg(test)]
mod client_tests;

pub use client::{HttpRemediationClient, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use service::{
    BlurRequest, CensorOutcome, CensorRequest, ImageGuidedRequest, InpaintRequest, ReferenceImage,
    RemediationService, RemoteArtifact, SegmentRequest, TextReplaceRequest,
};
