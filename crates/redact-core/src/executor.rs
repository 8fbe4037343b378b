//! Action dispatch: one remote recipe per [`ActionKind`].

use std::sync::Arc;

use tracing::Instrument;

use redact_client::{
    BlurRequest, CensorRequest, ImageGuidedRequest, InpaintRequest, ReferenceImage,
    RemediationService, SegmentRequest, ServiceResult, TextReplaceRequest,
};
use redact_models::{
    ActionKind, BlurEffect, CensorMode, ClipBounds, JobHandle, ReplacementMap, ResultLocation,
    SegmentEntry,
};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::logging::ActionLogger;

/// Parameters for one action invocation. Each recipe reads what it needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionParams {
    /// Object to detect, blur or segment
    pub target_label: Option<String>,
    pub strength: Option<u32>,
    pub color: Option<String>,
    pub opacity: Option<f64>,
    pub prompt: Option<String>,
    pub reference_image: Option<ReferenceImage>,
    pub negative_prompt: Option<String>,
    pub duration: Option<u32>,
    /// Restricts processing to a sub-interval of the timeline
    pub clip: Option<ClipBounds>,
    /// Explicit dub replacements; folded from `matches` when absent
    pub replacements: Option<ReplacementMap>,
    pub matches: Vec<SegmentEntry>,
}

impl ActionParams {
    /// Empty parameters; each recipe applies its own defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Object label for the detect, blur and segment steps.
    pub fn with_target(mut self, label: impl Into<String>) -> Self {
        self.target_label = Some(label.into());
        self
    }

    /// Blur or pixelation strength. Defaults to the configured value.
    pub fn with_strength(mut self, strength: u32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Overlay color and opacity for a visible mask.
    pub fn with_mask_style(mut self, color: impl Into<String>, opacity: f64) -> Self {
        self.color = Some(color.into());
        self.opacity = Some(opacity);
        self
    }

    /// Replacement prompt; blank prompts count as missing.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Reference image. An empty file counts as missing.
    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    /// What the text-only backend should avoid generating.
    pub fn with_negative_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    /// Generated clip length in seconds (text-only).
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Limit processing to `[start, end)` of the timeline.
    pub fn with_clip(mut self, clip: ClipBounds) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Explicit dub map, used instead of folding `matches`.
    pub fn with_replacements(mut self, replacements: ReplacementMap) -> Self {
        self.replacements = Some(replacements);
        self
    }

    /// Timed entries sent with either censor mode.
    pub fn with_matches(mut self, matches: Vec<SegmentEntry>) -> Self {
        self.matches = matches;
        self
    }

    fn label(&self) -> Option<&str> {
        non_blank(self.target_label.as_deref())
    }

    fn prompt_text(&self) -> Option<&str> {
        non_blank(self.prompt.as_deref())
    }

    fn usable_reference(&self) -> Option<&ReferenceImage> {
        self.reference_image.as_ref().filter(|img| !img.is_empty())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Runs the ordered remote calls for an action and resolves its result location.
#[derive(Clone)]
pub struct ActionExecutor {
    service: Arc<dyn RemediationService>,
    blur_strength: u32,
    mask_color: String,
    mask_opacity: f64,
    text_duration: u32,
}

impl ActionExecutor {
    pub fn new(service: Arc<dyn RemediationService>, config: &CoreConfig) -> Self {
        Self {
            service,
            blur_strength: config.default_blur_strength,
            mask_color: config.mask_color.clone(),
            mask_opacity: config.mask_opacity,
            text_duration: config.text_replace_duration,
        }
    }

    /// Check preconditions for `kind` without touching the network.
    pub fn validate(job: &JobHandle, kind: ActionKind, params: &ActionParams) -> CoreResult<()> {
        if job.is_empty() {
            return Err(CoreError::validation("Job handle is required"));
        }

        if let Some(clip) = &params.clip {
            clip.validate()
                .map_err(|e| CoreError::validation(format!("Invalid clip bounds: {}", e)))?;
        }

        if let Some(opacity) = params.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(CoreError::validation("Opacity must be between 0 and 1"));
            }
        }

        if params.strength == Some(0) {
            return Err(CoreError::validation("Strength must be positive"));
        }

        match kind {
            ActionKind::Blur | ActionKind::Pixelate | ActionKind::Mask => {
                if params.label().is_none() {
                    return Err(CoreError::validation("Target object is required"));
                }
            }
            ActionKind::ReplaceImageGuided => {
                if params.usable_reference().is_none() {
                    return Err(CoreError::validation(
                        "Reference image is required for image-guided replacement",
                    ));
                }
            }
            ActionKind::ReplaceMaskInpaint => {
                if params.label().is_none() {
                    return Err(CoreError::validation("Target object is required"));
                }
                if params.prompt_text().is_none() {
                    return Err(CoreError::validation("Replacement prompt is required"));
                }
            }
            ActionKind::ReplaceTextOnly => {
                if params.prompt_text().is_none() {
                    return Err(CoreError::validation("Replacement prompt is required"));
                }
            }
            ActionKind::CensorBeep | ActionKind::CensorDub => {}
        }

        Ok(())
    }

    /// Execute an action named by its wire string.
    pub async fn execute_named(
        &self,
        job: &JobHandle,
        kind: &str,
        params: ActionParams,
    ) -> CoreResult<(ActionKind, ResultLocation)> {
        let kind: ActionKind = kind
            .parse()
            .map_err(|_| CoreError::UnsupportedAction(kind.to_string()))?;
        let location = self.execute(job, kind, params).await?;
        Ok((kind, location))
    }

    /// Run the recipe for `kind`.
    ///
    /// Steps run strictly in order and the first failure aborts the rest.
    pub async fn execute(
        &self,
        job: &JobHandle,
        kind: ActionKind,
        params: ActionParams,
    ) -> CoreResult<ResultLocation> {
        Self::validate(job, kind, &params)?;

        let logger = ActionLogger::new(job, kind);
        let span = logger.create_span();
        async {
            logger.log_start(&format!("{} step(s)", kind.step_count()));
            let result = self.run_recipe(job, kind, params, &logger).await;
            match &result {
                Ok(location) => logger.log_completion(location.as_str()),
                Err(e) => logger.log_error(&e.to_string()),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_recipe(
        &self,
        job: &JobHandle,
        kind: ActionKind,
        params: ActionParams,
        logger: &ActionLogger,
    ) -> CoreResult<ResultLocation> {
        let service = self.service.as_ref();
        let label = params.label().unwrap_or_default().to_string();
        let prompt = params.prompt_text().unwrap_or_default().to_string();

        match kind {
            ActionKind::Blur | ActionKind::Pixelate => {
                let effect = if kind == ActionKind::Pixelate {
                    BlurEffect::Pixelate
                } else {
                    BlurEffect::Blur
                };
                let request = BlurRequest {
                    label,
                    strength: params.strength.unwrap_or(self.blur_strength),
                    effect,
                    clip: params.clip,
                };
                step("detect_and_blur", service.detect_and_blur(job, request).await)?;
                Ok(service.download_url(job))
            }
            ActionKind::Mask => {
                let request = SegmentRequest {
                    label,
                    mask_only: false,
                    color: params.color.clone().unwrap_or_else(|| self.mask_color.clone()),
                    opacity: params.opacity.unwrap_or(self.mask_opacity),
                };
                step("segment", service.segment(job, request).await)?;
                Ok(service.segmented_download_url(job))
            }
            ActionKind::ReplaceImageGuided => {
                let reference_image = params
                    .usable_reference()
                    .cloned()
                    .ok_or_else(|| CoreError::validation("Reference image is required"))?;
                let request = ImageGuidedRequest {
                    prompt,
                    reference_image,
                };
                step("replace_image_guided", service.replace_image_guided(job, request).await)?;
                Ok(service.download_url(job))
            }
            ActionKind::ReplaceMaskInpaint => {
                let mask = SegmentRequest {
                    label,
                    mask_only: true,
                    color: self.mask_color.clone(),
                    opacity: 1.0,
                };
                step("segment", service.segment(job, mask).await)?;
                logger.log_progress("mask ready, inpainting");

                step("inpaint", service.inpaint(job, InpaintRequest { prompt }).await)?;
                Ok(service.download_url(job))
            }
            ActionKind::ReplaceTextOnly => {
                let request = TextReplaceRequest {
                    prompt,
                    reference_image: params.usable_reference().cloned(),
                    negative_prompt: non_blank(params.negative_prompt.as_deref()).map(str::to_string),
                    duration: Some(params.duration.unwrap_or(self.text_duration)),
                    clip: params.clip,
                };
                step("replace_text_only", service.replace_text_only(job, request).await)?;
                Ok(service.download_url(job))
            }
            ActionKind::CensorBeep => {
                let request = CensorRequest {
                    mode: CensorMode::Beep,
                    replacements: None,
                    matches: params.matches,
                };
                step("censor", service.censor(job, request).await)?;
                Ok(service.download_url(job))
            }
            ActionKind::CensorDub => {
                let replacements = params
                    .replacements
                    .unwrap_or_else(|| ReplacementMap::from_entries(&params.matches));
                logger.log_progress(&format!("{} replacement(s)", replacements.len()));
                let request = CensorRequest {
                    mode: CensorMode::Dub,
                    replacements: Some(replacements),
                    matches: params.matches,
                };
                step("censor", service.censor(job, request).await)?;
                Ok(service.download_url(job))
            }
        }
    }
}

fn step<T>(name: &'static str, result: ServiceResult<T>) -> CoreResult<T> {
    result.map_err(|e| CoreError::execution(name, e))
}
