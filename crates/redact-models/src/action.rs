//! Remediation action kinds and the caller-facing completion payload.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed set of remediation operations.
///
/// Each kind maps to exactly one executor recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Detect the target and blur it
    Blur,
    /// Detect the target and pixelate it
    Pixelate,
    /// Segment the target and overlay a solid mask
    Mask,
    /// Replace the target guided by a reference image
    ReplaceImageGuided,
    /// Segment the target, then inpaint the mask from a prompt
    ReplaceMaskInpaint,
    /// Replace from a text prompt only (Gen4 backend)
    ReplaceTextOnly,
    /// Beep out detected profanity
    CensorBeep,
    /// Dub detected profanity with synthesized replacements
    CensorDub,
}

impl ActionKind {
    pub const ALL: &'static [ActionKind] = &[
        ActionKind::Blur,
        ActionKind::Pixelate,
        ActionKind::Mask,
        ActionKind::ReplaceImageGuided,
        ActionKind::ReplaceMaskInpaint,
        ActionKind::ReplaceTextOnly,
        ActionKind::CensorBeep,
        ActionKind::CensorDub,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Blur => "blur",
            ActionKind::Pixelate => "pixelate",
            ActionKind::Mask => "mask",
            ActionKind::ReplaceImageGuided => "replace-image-guided",
            ActionKind::ReplaceMaskInpaint => "replace-mask-inpaint",
            ActionKind::ReplaceTextOnly => "replace-text-only",
            ActionKind::CensorBeep => "censor-beep",
            ActionKind::CensorDub => "censor-dub",
        }
    }

    /// Number of dependent remote calls the recipe issues.
    pub fn step_count(&self) -> usize {
        match self {
            ActionKind::ReplaceMaskInpaint => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ActionKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| UnknownActionKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown action kind: {0}")]
pub struct UnknownActionKind(pub String);

/// Alternative AI backends for object replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceBackend {
    ImageGuided,
    MaskInpaint,
    #[default]
    TextOnly,
}

impl ReplaceBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceBackend::ImageGuided => "image-guided",
            ReplaceBackend::MaskInpaint => "mask-inpaint",
            ReplaceBackend::TextOnly => "text-only",
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        match self {
            ReplaceBackend::ImageGuided => ActionKind::ReplaceImageGuided,
            ReplaceBackend::MaskInpaint => ActionKind::ReplaceMaskInpaint,
            ReplaceBackend::TextOnly => ActionKind::ReplaceTextOnly,
        }
    }
}

impl fmt::Display for ReplaceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReplaceBackend {
    type Err = ReplaceBackendParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image-guided" | "image_guided" => Ok(ReplaceBackend::ImageGuided),
            "mask-inpaint" | "mask_inpaint" => Ok(ReplaceBackend::MaskInpaint),
            "text-only" | "text_only" | "gen4" => Ok(ReplaceBackend::TextOnly),
            _ => Err(ReplaceBackendParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown replace backend: {0}")]
pub struct ReplaceBackendParseError(String);

/// Visual effect applied by the detect-and-blur service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlurEffect {
    Blur,
    Pixelate,
}

impl BlurEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlurEffect::Blur => "blur",
            BlurEffect::Pixelate => "pixelate",
        }
    }
}

impl fmt::Display for BlurEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audio censoring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CensorMode {
    Beep,
    Dub,
}

impl CensorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CensorMode::Beep => "beep",
            CensorMode::Dub => "dub",
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        match self {
            CensorMode::Beep => ActionKind::CensorBeep,
            CensorMode::Dub => ActionKind::CensorDub,
        }
    }
}

impl fmt::Display for CensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CensorMode {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beep" => Ok(CensorMode::Beep),
            "dub" => Ok(CensorMode::Dub),
            _ => Err(UnknownActionKind(s.to_string())),
        }
    }
}

/// One recommended remediation returned by the region classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActionSuggestion {
    pub id: String,
    /// Free-form kind as reported by the classifier (`blur`, `replace`, `mute`, ...)
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl ActionSuggestion {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            label: label.into(),
            description: description.into(),
        }
    }

    /// Map the suggested kind onto an executable action.
    ///
    /// The generic `replace` resolves to `default_backend` and `mute` to a
    /// beep censor. Unrecognised kinds resolve to `None`.
    pub fn resolve_kind(&self, default_backend: ReplaceBackend) -> Option<ActionKind> {
        match self.kind.trim().to_lowercase().as_str() {
            "replace" => Some(default_backend.action_kind()),
            "mute" | "beep" => Some(ActionKind::CensorBeep),
            "dub" => Some(ActionKind::CensorDub),
            other => other.parse().ok(),
        }
    }
}

/// Opaque retrievable pointer (URL or path) to a finished artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ResultLocation(pub String);

impl ResultLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion notification delivered once per successful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionCompletion {
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl ActionCompletion {
    pub fn new(kind: ActionKind, location: Option<&ResultLocation>) -> Self {
        Self {
            kind,
            download_url: location.map(|l| l.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), *kind);
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_action_kind() {
        let err = "sharpen".parse::<ActionKind>().unwrap_err();
        assert_eq!(err, UnknownActionKind("sharpen".into()));
        assert_eq!(err.to_string(), "Unknown action kind: sharpen");
    }

    #[test]
    fn test_step_count() {
        assert_eq!(ActionKind::ReplaceMaskInpaint.step_count(), 2);
        assert_eq!(ActionKind::Blur.step_count(), 1);
        assert_eq!(ActionKind::CensorDub.step_count(), 1);
    }

    #[test]
    fn test_suggestion_resolution() {
        let replace = ActionSuggestion::new("2", "replace", "Replace", "");
        assert_eq!(
            replace.resolve_kind(ReplaceBackend::MaskInpaint),
            Some(ActionKind::ReplaceMaskInpaint)
        );

        let mute = ActionSuggestion::new("3", "mute", "Mute", "");
        assert_eq!(mute.resolve_kind(ReplaceBackend::default()), Some(ActionKind::CensorBeep));

        let blur = ActionSuggestion::new("1", "Blur", "Blur", "");
        assert_eq!(blur.resolve_kind(ReplaceBackend::default()), Some(ActionKind::Blur));

        let unknown = ActionSuggestion::new("4", "recolor", "Recolor", "");
        assert_eq!(unknown.resolve_kind(ReplaceBackend::default()), None);
    }

    #[test]
    fn test_completion_payload_shape() {
        let location = ResultLocation::new("https://svc/api/download/job-1");
        let completion = ActionCompletion::new(ActionKind::Blur, Some(&location));
        let json = serde_json::to_value(&completion).unwrap();
        assert_eq!(json["kind"], "blur");
        assert_eq!(json["downloadUrl"], "https://svc/api/download/job-1");

        let bare = serde_json::to_value(ActionCompletion::new(ActionKind::CensorBeep, None)).unwrap();
        assert!(bare.get("downloadUrl").is_none());
    }

    #[test]
    fn test_replace_backend_parse() {
        assert_eq!("gen4".parse::<ReplaceBackend>().unwrap(), ReplaceBackend::TextOnly);
        assert_eq!("mask_inpaint".parse::<ReplaceBackend>().unwrap(), ReplaceBackend::MaskInpaint);
        assert!("other".parse::<ReplaceBackend>().is_err());
    }
}
