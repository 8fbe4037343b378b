//! Region classification and object-name detection.

use std::sync::Arc;

use tracing::{debug, warn};

use redact_client::RemediationService;
use redact_models::{ClassificationResult, JobHandle, NormalizedRegion};

use crate::error::{CoreError, CoreResult};

/// Result of a classification that never blocks the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationOutcome {
    Classified(ClassificationResult),
    /// The remote call failed; default suggestions were substituted.
    Fallback {
        result: ClassificationResult,
        reason: String,
    },
}

impl ClassificationOutcome {
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Self::Classified(result) | Self::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Thin client over the remote classifier and object detector.
#[derive(Clone)]
pub struct RegionClassifier {
    service: Arc<dyn RemediationService>,
}

impl RegionClassifier {
    pub fn new(service: Arc<dyn RemediationService>) -> Self {
        Self { service }
    }

    /// Single outbound classification call.
    pub async fn classify(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> CoreResult<ClassificationResult> {
        self.service
            .classify_region(job, timestamp, region)
            .await
            .map_err(|e| CoreError::Classification(e.message()))
    }

    /// Classify, substituting the default suggestions on failure.
    pub async fn classify_or_fallback(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> ClassificationOutcome {
        match self.classify(job, timestamp, region).await {
            Ok(result) if result.has_suggestions() => ClassificationOutcome::Classified(result),
            Ok(result) => {
                // Keep the item name, fill in actions the user can still pick.
                let mut fallback = ClassificationResult::fallback();
                fallback.item_name = result.item_name;
                fallback.reasoning = result.reasoning;
                ClassificationOutcome::Classified(fallback)
            }
            Err(e) => {
                warn!(job = %job, error = %e, "Classification failed, using default actions");
                ClassificationOutcome::Fallback {
                    result: ClassificationResult::fallback(),
                    reason: e.user_message(),
                }
            }
        }
    }

    /// First detected object name, used to pre-fill the target field.
    ///
    /// Failures are logged and swallowed.
    pub async fn detect_object_name(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> Option<String> {
        match self.service.detect_object_names(job, timestamp, region).await {
            Ok(names) => names
                .into_iter()
                .map(|n| n.trim().to_string())
                .find(|n| !n.is_empty()),
            Err(e) => {
                debug!(job = %job, error = %e, "Object name detection failed");
                None
            }
        }
    }
}
