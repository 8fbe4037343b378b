//! Wire payloads for the remediation HTTP endpoints.

use serde::{Deserialize, Serialize};

use redact_models::{ClipBounds, NormalizedRegion, ReplacementMap, SegmentEntry};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegionBody<'a> {
    pub job_id: &'a str,
    pub timestamp: f64,
    #[serde(rename = "box")]
    pub region: NormalizedRegion,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BlurBody<'a> {
    pub job_id: &'a str,
    pub target_object: &'a str,
    pub blur_strength: u32,
    pub effect: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

impl<'a> BlurBody<'a> {
    pub fn with_clip(mut self, clip: Option<ClipBounds>) -> Self {
        self.start_time = clip.map(|c| c.start_time);
        self.end_time = clip.map(|c| c.end_time);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SegmentBody<'a> {
    pub job_id: &'a str,
    pub target_object: &'a str,
    pub mask_only: bool,
    pub color: &'a str,
    pub opacity: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InpaintBody<'a> {
    pub job_id: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobBody<'a> {
    pub job_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CensorBody<'a> {
    pub job_id: &'a str,
    pub mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_words: Option<&'a ReplacementMap>,
    #[serde(skip_serializing_if = "no_matches")]
    pub matches: &'a [SegmentEntry],
}

fn no_matches(matches: &&[SegmentEntry]) -> bool {
    matches.is_empty()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SuggestBody<'a> {
    pub job_id: &'a str,
    pub word: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuggestionsResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScanResponse {
    #[serde(default)]
    pub matches: Vec<SegmentEntry>,
}
