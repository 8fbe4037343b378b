//! HTTP client for the remediation services.
//!
//! - HTTP client tuning (pooling, timeouts)
//! - Remote error bodies surfaced as readable messages
//! - Observability (tracing spans, metrics)
//!
//! Timeouts are owned here. There is no automatic retry: every retry is
//! a fresh, user-initiated call.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};
use url::Url;

use redact_models::{ClassificationResult, JobHandle, NormalizedRegion, ResultLocation, SegmentEntry};

use crate::error::{extract_error_message, ServiceError, ServiceResult};
use crate::metrics::record_request;
use crate::service::{
    BlurRequest, CensorOutcome, CensorRequest, ImageGuidedRequest, InpaintRequest, ReferenceImage,
    RemediationService, RemoteArtifact, SegmentRequest, TextReplaceRequest,
};
use crate::types::{
    BlurBody, CensorBody, InpaintBody, JobBody, RegionBody, ScanResponse, SegmentBody, SuggestBody,
    SuggestionsResponse,
};

// =============================================================================
// Configuration
// =============================================================================

/// Remediation service client configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the remediation API
    pub base_url: Url,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Request timeout (remote media jobs run for minutes)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl ServiceConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

    /// Create a config for `base_url` with default timeouts.
    pub fn new(base_url: &str) -> ServiceResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        let base_url = std::env::var("REDACT_SERVICE_URL").map_err(|_| {
            ServiceError::config("REDACT_SERVICE_URL must be set to reach the remediation service")
        })?;

        let timeout_secs: u64 = std::env::var("REDACT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);

        let connect_timeout_secs: u64 = std::env::var("REDACT_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::DEFAULT_CONNECT_TIMEOUT_SECS);

        Ok(Self {
            base_url: parse_base_url(&base_url)?,
            api_key: std::env::var("REDACT_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

fn parse_base_url(raw: &str) -> ServiceResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::config("REDACT_SERVICE_URL cannot be empty"));
    }
    let url = Url::parse(raw)
        .map_err(|e| ServiceError::config(format!("Invalid service URL '{}': {}", raw, e)))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ServiceError::config(format!(
            "Service URL must be an absolute http(s) URL: {}",
            raw
        )));
    }
    Ok(url)
}

// =============================================================================
// Client
// =============================================================================

/// reqwest-backed [`RemediationService`].
#[derive(Clone)]
pub struct HttpRemediationClient {
    http: Client,
    config: ServiceConfig,
    base: String,
}

impl HttpRemediationClient {
    pub fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .user_agent(concat!("redact-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServiceError::Network)?;

        let base = config.base_url.as_str().trim_end_matches('/').to_string();

        Ok(Self { http, config, base })
    }

    /// Create from environment variables.
    pub fn from_env() -> ServiceResult<Self> {
        Self::new(ServiceConfig::from_env()?)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn post_json<B, R>(&self, operation: &str, job: &JobHandle, path: &str, body: &B) -> ServiceResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        self.execute_request(operation, job, async {
            let response = self.authorize(self.http.post(&url)).json(body).send().await?;
            Self::decode(&url, response).await
        })
        .await
    }

    async fn post_multipart<R>(&self, operation: &str, job: &JobHandle, path: &str, form: Form) -> ServiceResult<R>
    where
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        self.execute_request(operation, job, async {
            let response = self
                .authorize(self.http.post(&url))
                .multipart(form)
                .send()
                .await?;
            Self::decode(&url, response).await
        })
        .await
    }

    async fn decode<R: DeserializeOwned>(url: &str, response: Response) -> ServiceResult<R> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("Request failed");
            return Err(ServiceError::from_http_status(
                status.as_u16(),
                extract_error_message(&body, fallback),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            let prefix: String = body.chars().take(200).collect();
            ServiceError::invalid_response(format!(
                "{} returned an unparseable body: {} (body prefix: {})",
                url, e, prefix
            ))
        })
    }

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(&self, operation: &str, job: &JobHandle, fut: F) -> ServiceResult<T>
    where
        F: std::future::Future<Output = ServiceResult<T>>,
    {
        let span = info_span!("remediation_request", operation = %operation, job = %job);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(599),
        };
        record_request(operation, status, latency_ms);
        debug!(operation = %operation, job = %job, status, latency_ms, "remote call finished");

        result
    }
}

fn image_part(image: ReferenceImage) -> ServiceResult<Part> {
    Ok(Part::bytes(image.bytes)
        .file_name(image.file_name)
        .mime_str(&image.content_type)?)
}

#[async_trait]
impl RemediationService for HttpRemediationClient {
    async fn classify_region(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> ServiceResult<ClassificationResult> {
        let body = RegionBody {
            job_id: job.as_str(),
            timestamp,
            region,
        };
        self.post_json("classify_region", job, "/api/classify-region", &body)
            .await
    }

    async fn detect_object_names(
        &self,
        job: &JobHandle,
        timestamp: f64,
        region: NormalizedRegion,
    ) -> ServiceResult<Vec<String>> {
        let body = RegionBody {
            job_id: job.as_str(),
            timestamp,
            region,
        };
        let response: SuggestionsResponse = self
            .post_json("detect_object_names", job, "/api/detect-objects", &body)
            .await?;
        Ok(response.suggestions)
    }

    async fn detect_and_blur(&self, job: &JobHandle, request: BlurRequest) -> ServiceResult<RemoteArtifact> {
        let body = BlurBody {
            job_id: job.as_str(),
            target_object: &request.label,
            blur_strength: request.strength,
            effect: request.effect.as_str(),
            start_time: None,
            end_time: None,
        }
        .with_clip(request.clip);
        self.post_json("detect_and_blur", job, "/api/blur", &body).await
    }

    async fn segment(&self, job: &JobHandle, request: SegmentRequest) -> ServiceResult<RemoteArtifact> {
        let body = SegmentBody {
            job_id: job.as_str(),
            target_object: &request.label,
            mask_only: request.mask_only,
            color: &request.color,
            opacity: request.opacity,
        };
        self.post_json("segment", job, "/api/segment", &body).await
    }

    async fn replace_image_guided(
        &self,
        job: &JobHandle,
        request: ImageGuidedRequest,
    ) -> ServiceResult<RemoteArtifact> {
        let form = Form::new()
            .text("jobId", job.to_string())
            .text("prompt", request.prompt)
            .part("referenceImage", image_part(request.reference_image)?);
        self.post_multipart("replace_image_guided", job, "/api/replace", form)
            .await
    }

    async fn replace_text_only(
        &self,
        job: &JobHandle,
        request: TextReplaceRequest,
    ) -> ServiceResult<RemoteArtifact> {
        let mut form = Form::new()
            .text("jobId", job.to_string())
            .text("prompt", request.prompt);
        if let Some(negative) = request.negative_prompt {
            form = form.text("negativePrompt", negative);
        }
        if let Some(duration) = request.duration {
            form = form.text("duration", duration.to_string());
        }
        if let Some(clip) = request.clip {
            form = form
                .text("startTime", clip.start_time.to_string())
                .text("endTime", clip.end_time.to_string());
        }
        if let Some(image) = request.reference_image {
            form = form.part("referenceImage", image_part(image)?);
        }
        self.post_multipart("replace_text_only", job, "/api/replace-gen4", form)
            .await
    }

    async fn inpaint(&self, job: &JobHandle, request: InpaintRequest) -> ServiceResult<RemoteArtifact> {
        let body = InpaintBody {
            job_id: job.as_str(),
            prompt: &request.prompt,
        };
        self.post_json("inpaint", job, "/api/inpaint", &body).await
    }

    async fn scan_audio(&self, job: &JobHandle) -> ServiceResult<Vec<SegmentEntry>> {
        let body = JobBody { job_id: job.as_str() };
        let response: ScanResponse = self
            .post_json("scan_audio", job, "/api/profanity/scan", &body)
            .await?;
        Ok(response.matches)
    }

    async fn censor(&self, job: &JobHandle, request: CensorRequest) -> ServiceResult<CensorOutcome> {
        let body = CensorBody {
            job_id: job.as_str(),
            mode: request.mode.as_str(),
            custom_words: request.replacements.as_ref(),
            matches: &request.matches,
        };
        self.post_json("censor", job, "/api/profanity/censor", &body)
            .await
    }

    async fn suggest_replacement(&self, job: &JobHandle, word: &str) -> ServiceResult<Vec<String>> {
        let body = SuggestBody {
            job_id: job.as_str(),
            word,
        };
        let response: SuggestionsResponse = self
            .post_json("suggest_replacement", job, "/api/profanity/suggest", &body)
            .await?;
        Ok(response.suggestions)
    }

    fn download_url(&self, job: &JobHandle) -> ResultLocation {
        ResultLocation::new(format!(
            "{}/api/download/{}",
            self.base,
            urlencoding::encode(job.as_str())
        ))
    }

    fn segmented_download_url(&self, job: &JobHandle) -> ResultLocation {
        ResultLocation::new(format!(
            "{}/api/download-segmented/{}",
            self.base,
            urlencoding::encode(job.as_str())
        ))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_requires_url() {
        std::env::remove_var("REDACT_SERVICE_URL");
        let result = ServiceConfig::from_env();
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        std::env::set_var("REDACT_SERVICE_URL", "http://localhost:8000");
        std::env::remove_var("REDACT_TIMEOUT_SECS");
        std::env::remove_var("REDACT_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("REDACT_API_KEY");
        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_config_parses_env_overrides() {
        std::env::set_var("REDACT_SERVICE_URL", "https://redact.example.com/");
        std::env::set_var("REDACT_TIMEOUT_SECS", "60");
        std::env::set_var("REDACT_CONNECT_TIMEOUT_SECS", "not-a-number");
        std::env::set_var("REDACT_API_KEY", "secret");
        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        std::env::remove_var("REDACT_TIMEOUT_SECS");
        std::env::remove_var("REDACT_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("REDACT_API_KEY");
    }

    #[test]
    fn test_base_url_validation() {
        assert!(ServiceConfig::new("").is_err());
        assert!(ServiceConfig::new("not a url").is_err());
        assert!(ServiceConfig::new("mailto:ops@example.com").is_err());
        assert!(ServiceConfig::new("ftp://example.com").is_err());
        assert!(ServiceConfig::new("http://127.0.0.1:9000").is_ok());
    }

    #[test]
    fn test_download_locations_are_distinct() {
        let client = HttpRemediationClient::new(ServiceConfig::new("http://svc:8000/").unwrap()).unwrap();
        let job = JobHandle::from_string("job 1");
        assert_eq!(client.download_url(&job).as_str(), "http://svc:8000/api/download/job%201");
        assert_eq!(
            client.segmented_download_url(&job).as_str(),
            "http://svc:8000/api/download-segmented/job%201"
        );
    }
}
