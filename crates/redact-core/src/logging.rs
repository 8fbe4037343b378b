//! Structured action logging.

use tracing::{error, info, warn, Span};

use redact_models::{ActionKind, JobHandle};

/// Logger carrying the job and action for every lifecycle event.
#[derive(Debug, Clone)]
pub struct ActionLogger {
    job: String,
    action: String,
}

impl ActionLogger {
    /// Create a logger for one action run on `job`.
    ///
    /// # Arguments
    /// * `job` - The job the action targets
    /// * `kind` - The action; its wire name becomes the `action` field
    pub fn new(job: &JobHandle, kind: ActionKind) -> Self {
        Self {
            job: job.to_string(),
            action: kind.as_str().to_string(),
        }
    }

    /// Logger for operations that are not an [`ActionKind`] (scans, enrichment).
    pub fn for_operation(job: &JobHandle, operation: &str) -> Self {
        Self {
            job: job.to_string(),
            action: operation.to_string(),
        }
    }

    /// Log the start of an action.
    pub fn log_start(&self, message: &str) {
        info!(job = %self.job, action = %self.action, "Action started: {}", message);
    }

    /// Log a step finishing inside a multi-step action.
    pub fn log_progress(&self, message: &str) {
        info!(job = %self.job, action = %self.action, "Action progress: {}", message);
    }

    /// Log a recoverable problem, such as a failed suggestion request.
    pub fn log_warning(&self, message: &str) {
        warn!(job = %self.job, action = %self.action, "Action warning: {}", message);
    }

    /// Log a failed action.
    pub fn log_error(&self, message: &str) {
        error!(job = %self.job, action = %self.action, "Action error: {}", message);
    }

    /// Log the completion of an action.
    pub fn log_completion(&self, message: &str) {
        info!(job = %self.job, action = %self.action, "Action completed: {}", message);
    }

    /// Get the job handle as logged.
    pub fn job(&self) -> &str {
        &self.job
    }

    /// Get the action or operation name.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Create a tracing span for the action.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("remediation_action", job = %self.job, action = %self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_fields() {
        let job = JobHandle::from_string("job-9");
        let logger = ActionLogger::new(&job, ActionKind::ReplaceMaskInpaint);
        assert_eq!(logger.job(), "job-9");
        assert_eq!(logger.action(), "replace-mask-inpaint");

        let scan = ActionLogger::for_operation(&job, "scan_audio");
        assert_eq!(scan.action(), "scan_audio");
    }
}
