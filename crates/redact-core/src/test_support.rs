//! Recording fake of the remote service for orchestrator tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use redact_client::{
    BlurRequest, CensorOutcome, CensorRequest, ImageGuidedRequest, InpaintRequest,
    RemediationService, RemoteArtifact, SegmentRequest, ServiceError, ServiceResult,
    TextReplaceRequest,
};
use redact_models::{ClassificationResult, JobHandle, NormalizedRegion, ResultLocation, SegmentEntry};

#[derive(Default)]
struct State {
    log: Vec<&'static str>,
    failures: HashMap<&'static str, String>,
    classification: Option<ClassificationResult>,
    object_names: Vec<String>,
    scan: Vec<SegmentEntry>,
    suggestions: HashMap<String, Vec<String>>,
    blur: Vec<BlurRequest>,
    segment: Vec<SegmentRequest>,
    image_guided: Vec<ImageGuidedRequest>,
    text_replace: Vec<TextReplaceRequest>,
    censor: Vec<CensorRequest>,
    suggest_words: Vec<String>,
    failing_words: HashMap<String, String>,
}

/// Counts calls per operation and fails those scripted to fail.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<State>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, operation: &'static str, message: &str) {
        self.state().failures.insert(operation, message.to_string());
    }

    pub fn heal(&self, operation: &'static str) {
        self.state().failures.remove(operation);
    }

    pub fn set_classification(&self, result: ClassificationResult) {
        self.state().classification = Some(result);
    }

    pub fn set_object_names(&self, names: Vec<String>) {
        self.state().object_names = names;
    }

    pub fn set_scan(&self, matches: Vec<SegmentEntry>) {
        self.state().scan = matches;
    }

    pub fn set_suggestions(&self, word: &str, suggestions: &[&str]) {
        self.state()
            .suggestions
            .insert(word.to_string(), suggestions.iter().map(|s| s.to_string()).collect());
    }

    /// Fail suggestion requests for one word only.
    pub fn fail_word(&self, word: &str, message: &str) {
        self.state()
            .failing_words
            .insert(word.to_string(), message.to_string());
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.state().log.iter().filter(|op| **op == operation).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().log.len()
    }

    pub fn call_log(&self) -> Vec<&'static str> {
        self.state().log.clone()
    }

    pub fn last_blur(&self) -> Option<BlurRequest> {
        self.state().blur.last().cloned()
    }

    pub fn last_segment(&self) -> Option<SegmentRequest> {
        self.state().segment.last().cloned()
    }

    pub fn last_image_guided(&self) -> Option<ImageGuidedRequest> {
        self.state().image_guided.last().cloned()
    }

    pub fn last_text_replace(&self) -> Option<TextReplaceRequest> {
        self.state().text_replace.last().cloned()
    }

    pub fn last_censor(&self) -> Option<CensorRequest> {
        self.state().censor.last().cloned()
    }

    pub fn suggested_words(&self) -> Vec<String> {
        self.state().suggest_words.clone()
    }

    /// Record the call, then return the scripted failure if any.
    fn record(&self, operation: &'static str) -> ServiceResult<()> {
        let mut state = self.state();
        state.log.push(operation);
        match state.failures.get(operation) {
            Some(message) => Err(ServiceError::remote(500, message.clone())),
            None => Ok(()),
        }
    }

    fn artifact(job: &JobHandle, suffix: &str) -> RemoteArtifact {
        RemoteArtifact {
            download_path: format!("/outputs/{}/{}", job, suffix),
        }
    }
}

#[async_trait]
impl RemediationService for FakeService {
    async fn classify_region(
        &self,
        _job: &JobHandle,
        _timestamp: f64,
        _region: NormalizedRegion,
    ) -> ServiceResult<ClassificationResult> {
        self.record("classify_region")?;
        Ok(self
            .state()
            .classification
            .clone()
            .unwrap_or_else(ClassificationResult::fallback))
    }

    async fn detect_object_names(
        &self,
        _job: &JobHandle,
        _timestamp: f64,
        _region: NormalizedRegion,
    ) -> ServiceResult<Vec<String>> {
        self.record("detect_object_names")?;
        Ok(self.state().object_names.clone())
    }

    async fn detect_and_blur(&self, job: &JobHandle, request: BlurRequest) -> ServiceResult<RemoteArtifact> {
        self.state().blur.push(request);
        self.record("detect_and_blur")?;
        Ok(Self::artifact(job, "blurred.mp4"))
    }

    async fn segment(&self, job: &JobHandle, request: SegmentRequest) -> ServiceResult<RemoteArtifact> {
        self.state().segment.push(request);
        self.record("segment")?;
        Ok(Self::artifact(job, "segmented.mp4"))
    }

    async fn replace_image_guided(
        &self,
        job: &JobHandle,
        request: ImageGuidedRequest,
    ) -> ServiceResult<RemoteArtifact> {
        self.state().image_guided.push(request);
        self.record("replace_image_guided")?;
        Ok(Self::artifact(job, "replaced.mp4"))
    }

    async fn replace_text_only(
        &self,
        job: &JobHandle,
        request: TextReplaceRequest,
    ) -> ServiceResult<RemoteArtifact> {
        self.state().text_replace.push(request);
        self.record("replace_text_only")?;
        Ok(Self::artifact(job, "replaced.mp4"))
    }

    async fn inpaint(&self, job: &JobHandle, _request: InpaintRequest) -> ServiceResult<RemoteArtifact> {
        self.record("inpaint")?;
        Ok(Self::artifact(job, "inpainted.mp4"))
    }

    async fn scan_audio(&self, _job: &JobHandle) -> ServiceResult<Vec<SegmentEntry>> {
        self.record("scan_audio")?;
        Ok(self.state().scan.clone())
    }

    async fn censor(&self, job: &JobHandle, request: CensorRequest) -> ServiceResult<CensorOutcome> {
        let mode = request.mode;
        self.state().censor.push(request);
        self.record("censor")?;
        Ok(CensorOutcome {
            download_path: Self::artifact(job, "censored.mp4").download_path,
            mode,
        })
    }

    async fn suggest_replacement(&self, _job: &JobHandle, word: &str) -> ServiceResult<Vec<String>> {
        self.state().suggest_words.push(word.to_string());
        self.record("suggest_replacement")?;
        if let Some(message) = self.state().failing_words.get(word) {
            return Err(ServiceError::remote(502, message.clone()));
        }
        Ok(self.state().suggestions.get(word).cloned().unwrap_or_default())
    }

    fn download_url(&self, job: &JobHandle) -> ResultLocation {
        ResultLocation::new(format!("https://fake.test/api/download/{}", job))
    }

    fn segmented_download_url(&self, job: &JobHandle) -> ResultLocation {
        ResultLocation::new(format!("https://fake.test/api/download-segmented/{}", job))
    }
}
