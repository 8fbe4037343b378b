//! The two invocation sites: region actions and batch censoring.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::debug;

use redact_client::RemediationService;
use redact_models::{
    ActionCompletion, ActionKind, ActionSuggestion, CensorMode, ClassificationResult, JobHandle,
    NormalizedRegion, PipelineStatus, ReplaceBackend, ResultLocation, SegmentId, SurfacePoint,
};

use crate::classifier::{ClassificationOutcome, RegionClassifier};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::executor::{ActionExecutor, ActionParams};
use crate::logging::ActionLogger;
use crate::segments::{fetch_suggestions, EnrichOutcome, EnrichmentTicket, SegmentCollection};
use crate::selector::{ClassificationTicket, RegionSelector};
use crate::tracker::{PipelineEvent, PipelineSnapshot, PipelineTracker};

/// Return a completed tracker to its initiating state for reuse.
///
/// An `error` tracker is left alone; leaving it takes an explicit retry.
fn reuse_completed(tracker: &PipelineTracker) {
    if tracker.status() != PipelineStatus::Completed {
        return;
    }
    if let Err(e) = tracker.reset() {
        debug!(error = %e, "Tracker reset skipped");
    }
}

/// A classification request detached from the workflow so it can run
/// without holding a borrow.
pub struct PendingClassification {
    ticket: ClassificationTicket,
    job: JobHandle,
    timestamp: f64,
    classifier: RegionClassifier,
}

impl PendingClassification {
    pub fn region(&self) -> NormalizedRegion {
        self.ticket.region
    }

    pub async fn run(self) -> ClassificationReply {
        let outcome = self
            .classifier
            .classify_or_fallback(&self.job, self.timestamp, self.ticket.region)
            .await;
        ClassificationReply {
            ticket: self.ticket,
            outcome,
        }
    }
}

pub struct ClassificationReply {
    ticket: ClassificationTicket,
    pub outcome: ClassificationOutcome,
}

/// A suggestion request for one entry, detached from the workflow so
/// other entries can be edited or enriched while it runs.
pub struct PendingEnrichment {
    ticket: EnrichmentTicket,
    job: JobHandle,
    service: Arc<dyn RemediationService>,
}

impl PendingEnrichment {
    pub fn id(&self) -> SegmentId {
        self.ticket.id
    }

    pub fn word(&self) -> &str {
        &self.ticket.word
    }

    pub async fn run(self) -> EnrichmentReply {
        let result = fetch_suggestions(self.service.as_ref(), &self.job, &self.ticket).await;
        EnrichmentReply {
            ticket: self.ticket,
            result,
        }
    }
}

pub struct EnrichmentReply {
    ticket: EnrichmentTicket,
    result: CoreResult<Vec<String>>,
}

impl EnrichmentReply {
    pub fn id(&self) -> SegmentId {
        self.ticket.id
    }
}

/// Single-action flow: select a region, classify it, run one action.
pub struct RegionWorkflow {
    job: JobHandle,
    selector: RegionSelector,
    classifier: RegionClassifier,
    executor: ActionExecutor,
    tracker: PipelineTracker,
    playhead: f64,
    classification: Option<ClassificationOutcome>,
    default_backend: ReplaceBackend,
}

impl RegionWorkflow {
    pub fn new(service: Arc<dyn RemediationService>, job: JobHandle, config: &CoreConfig) -> Self {
        Self {
            job,
            selector: RegionSelector::new(config.min_region_percent),
            classifier: RegionClassifier::new(Arc::clone(&service)),
            executor: ActionExecutor::new(service, config),
            tracker: PipelineTracker::single(),
            playhead: 0.0,
            classification: None,
            default_backend: config.default_replace_backend,
        }
    }

    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn tracker(&self) -> &PipelineTracker {
        &self.tracker
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.tracker.subscribe()
    }

    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: Fn(&ActionCompletion) + Send + Sync + 'static,
    {
        self.tracker.on_complete(callback);
    }

    /// Video position (seconds) sent with classification and detection.
    pub fn set_playhead(&mut self, seconds: f64) {
        self.playhead = seconds.max(0.0);
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Begin a drag.
    ///
    /// Refused while an action is processing or its error is still shown,
    /// and while a region is confirmed. A completed tracker is reset only
    /// once the selector has accepted the gesture.
    pub fn pointer_down(&mut self, point: SurfacePoint) -> bool {
        if matches!(
            self.tracker.status(),
            PipelineStatus::Processing | PipelineStatus::Error
        ) {
            return false;
        }
        if !self.selector.pointer_down(point) {
            return false;
        }
        reuse_completed(&self.tracker);
        true
    }

    pub fn pointer_move(&mut self, point: SurfacePoint) -> Option<NormalizedRegion> {
        self.selector.pointer_move(point)
    }

    /// Finish the drag. A confirmed region yields the classification to run.
    pub fn pointer_up(&mut self) -> Option<PendingClassification> {
        let ticket = self.selector.pointer_up()?;
        self.classification = None;
        if let Err(e) = self.tracker.dispatch(PipelineEvent::BeginDetect) {
            debug!(error = %e, "Classification started outside idle");
        }
        Some(PendingClassification {
            ticket,
            job: self.job.clone(),
            timestamp: self.playhead,
            classifier: self.classifier.clone(),
        })
    }

    /// Commit a classification reply unless its region was superseded.
    pub fn apply_classification(&mut self, reply: ClassificationReply) -> bool {
        if !self.selector.finish_classification(&reply.ticket) {
            return false;
        }
        self.classification = Some(reply.outcome);
        if self.tracker.status() == PipelineStatus::Detecting {
            if let Err(e) = self.tracker.dispatch(PipelineEvent::DetectFinished) {
                debug!(error = %e, "Detect finish ignored");
            }
        }
        true
    }

    /// Confirm the drag and classify the region in one step.
    pub async fn confirm(&mut self) -> Option<&ClassificationResult> {
        let pending = self.pointer_up()?;
        let reply = pending.run().await;
        if self.apply_classification(reply) {
            self.classification()
        } else {
            None
        }
    }

    /// Cancel the gesture: the region is cleared and late replies are dropped.
    ///
    /// A failed action keeps its error status until [`Self::retry`].
    pub fn reset(&mut self) {
        self.selector.reset();
        self.classification = None;
        if self.tracker.status() == PipelineStatus::Detecting {
            if let Err(e) = self.tracker.dispatch(PipelineEvent::CancelDetect) {
                debug!(error = %e, "Detect cancel ignored");
            }
        }
        reuse_completed(&self.tracker);
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref().map(ClassificationOutcome::result)
    }

    pub fn used_fallback(&self) -> bool {
        self.classification
            .as_ref()
            .is_some_and(ClassificationOutcome::is_fallback)
    }

    pub fn suggestions(&self) -> &[ActionSuggestion] {
        self.classification()
            .map(|c| c.suggested_actions.as_slice())
            .unwrap_or_default()
    }

    pub fn resolve(&self, suggestion: &ActionSuggestion) -> CoreResult<ActionKind> {
        suggestion
            .resolve_kind(self.default_backend)
            .ok_or_else(|| CoreError::UnsupportedAction(suggestion.kind.clone()))
    }

    /// Detected object name for the current region, for pre-filling the target.
    pub async fn prefill_target(&self) -> Option<String> {
        let region = self.selector.region()?;
        self.classifier
            .detect_object_name(&self.job, self.playhead, region)
            .await
    }

    /// Run one action through the tracker.
    ///
    /// Validation failures are returned without a tracker transition. On
    /// success the region is cleared.
    pub async fn run_action(&mut self, kind: ActionKind, params: ActionParams) -> CoreResult<ResultLocation> {
        ActionExecutor::validate(&self.job, kind, &params)?;
        let location = self
            .tracker
            .run(kind, self.executor.execute(&self.job, kind, params))
            .await?;
        self.selector.reset();
        self.classification = None;
        Ok(location)
    }

    /// Run an action named by its wire string or a suggestion kind.
    pub async fn run_named(&mut self, kind: &str, params: ActionParams) -> CoreResult<ResultLocation> {
        let suggestion = ActionSuggestion::new("", kind, "", "");
        match self.resolve(&suggestion) {
            Ok(kind) => self.run_action(kind, params).await,
            Err(e) => {
                if let Err(reject) = self.tracker.reject(&e) {
                    debug!(error = %reject, "Rejection not recorded");
                }
                Err(e)
            }
        }
    }

    pub fn retry(&self) -> CoreResult<()> {
        self.tracker.retry()
    }
}

/// Batch flow: scan, edit entries, then censor in one submission.
pub struct CensorWorkflow {
    job: JobHandle,
    service: Arc<dyn RemediationService>,
    segments: SegmentCollection,
    executor: ActionExecutor,
    tracker: PipelineTracker,
}

impl CensorWorkflow {
    pub fn new(service: Arc<dyn RemediationService>, job: JobHandle, config: &CoreConfig) -> Self {
        Self {
            job,
            executor: ActionExecutor::new(Arc::clone(&service), config),
            service,
            segments: SegmentCollection::new(),
            tracker: PipelineTracker::batch(),
        }
    }

    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn segments(&self) -> &SegmentCollection {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut SegmentCollection {
        &mut self.segments
    }

    pub fn tracker(&self) -> &PipelineTracker {
        &self.tracker
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.tracker.subscribe()
    }

    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: Fn(&ActionCompletion) + Send + Sync + 'static,
    {
        self.tracker.on_complete(callback);
    }

    /// Bulk scan. Replaces every entry, discarding manual edits.
    pub async fn scan(&mut self) -> CoreResult<usize> {
        reuse_completed(&self.tracker);
        self.tracker.dispatch(PipelineEvent::BeginScan)?;
        let ticket = self.segments.begin_scan();
        let logger = ActionLogger::for_operation(&self.job, "scan_audio");
        logger.log_start("scanning audio");

        match self.service.scan_audio(&self.job).await {
            Ok(matches) => {
                let count = matches.len();
                self.segments.apply_scan(ticket, matches);
                self.tracker.dispatch(PipelineEvent::ScanSucceeded)?;
                logger.log_completion(&format!("{} match(es)", count));
                Ok(count)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                self.tracker.dispatch(PipelineEvent::ScanFailed(e.message()))?;
                Err(CoreError::Service(e))
            }
        }
    }

    /// Reserve a suggestion request for the entry at `index` holding `word`.
    ///
    /// Returns `None` when that index no longer holds `word`. The returned
    /// request borrows nothing, so entries stay editable while it runs.
    pub fn begin_enrichment(&mut self, index: usize, word: &str) -> Option<PendingEnrichment> {
        let Some(ticket) = self.segments.begin_enrichment(index, word) else {
            debug!(index, word, "Entry no longer holds word, skipping suggestion");
            return None;
        };
        Some(PendingEnrichment {
            ticket,
            job: self.job.clone(),
            service: Arc::clone(&self.service),
        })
    }

    /// Commit a suggestion reply to whichever row now holds its entry.
    pub fn apply_enrichment(&mut self, reply: EnrichmentReply) -> EnrichOutcome {
        match reply.result {
            Ok(suggestions) => self.segments.commit_enrichment(&reply.ticket, &suggestions),
            Err(e) => self.segments.abandon_enrichment(&reply.ticket, &e.user_message()),
        }
    }

    /// Fetch and commit one suggestion for the entry at `index` holding `word`.
    pub async fn enrich_one(&mut self, index: usize, word: &str) -> EnrichOutcome {
        let Some(pending) = self.begin_enrichment(index, word) else {
            return EnrichOutcome::Stale;
        };
        let reply = pending.run().await;
        self.apply_enrichment(reply)
    }

    /// Enrich every entry that has a word but no replacement, concurrently.
    ///
    /// Each response is committed independently; one failure leaves the
    /// others untouched.
    pub async fn enrich_all(&mut self) -> Vec<(SegmentId, EnrichOutcome)> {
        let pending: Vec<_> = self
            .segments
            .pending_enrichment()
            .into_iter()
            .filter_map(|(index, word)| self.begin_enrichment(index, &word))
            .collect();

        let replies = join_all(pending.into_iter().map(PendingEnrichment::run)).await;

        replies
            .into_iter()
            .map(|reply| {
                let id = reply.id();
                (id, self.apply_enrichment(reply))
            })
            .collect()
    }

    /// Submit the whole collection to the censor pipeline.
    ///
    /// Dub mode sends the folded replacement map; empty replacements are left out.
    pub async fn submit(&mut self, mode: CensorMode) -> CoreResult<ResultLocation> {
        let entries = self.segments.snapshot();
        let mut params = ActionParams::new().with_matches(entries.to_vec());
        if mode == CensorMode::Dub {
            params = params.with_replacements(self.segments.replacement_map());
        }
        let kind = mode.action_kind();
        self.tracker
            .run(kind, self.executor.execute(&self.job, kind, params))
            .await
    }

    pub fn retry(&self) -> CoreResult<()> {
        self.tracker.retry()
    }

    pub fn reset(&self) -> CoreResult<()> {
        self.tracker.reset()
    }
}
