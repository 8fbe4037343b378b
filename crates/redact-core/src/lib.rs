//! Remediation orchestrator.
//!
//! This crate provides:
//! - Region selection with a minimum-size confirmation threshold
//! - Region classification with a silent default-action fallback
//! - The action executor and its per-kind remote recipes
//! - The editable segment collection with id-addressed enrichment
//! - The pipeline status tracker and the two workflows built on it

pub mod classifier;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod segments;
pub mod selector;
pub mod tracker;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use classifier::{ClassificationOutcome, RegionClassifier};
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult, GENERIC_FAILURE};
pub use executor::{ActionExecutor, ActionParams};
pub use logging::ActionLogger;
pub use segments::{EnrichOutcome, EnrichmentTicket, ScanTicket, SegmentCollection, SegmentField};
pub use selector::{ClassificationTicket, RegionSelector, SelectorState};
pub use tracker::{
    FlowKind, PipelineEvent, PipelineSnapshot, PipelineTicket, PipelineTracker, TransitionError,
};
pub use workflow::{
    CensorWorkflow, ClassificationReply, EnrichmentReply, PendingClassification, PendingEnrichment,
    RegionWorkflow,
};
