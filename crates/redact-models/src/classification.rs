//! Region classification results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::action::ActionSuggestion;

/// What the classifier thinks a region contains and what to do about it.
///
/// Replaced wholesale on every new classification, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub item_name: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub suggested_actions: Vec<ActionSuggestion>,
}

impl ClassificationResult {
    /// Hard-coded suggestions used when classification is unavailable.
    pub fn fallback() -> Self {
        Self {
            item_name: String::new(),
            reasoning: String::new(),
            suggested_actions: default_suggestions(),
        }
    }

    pub fn has_suggestions(&self) -> bool {
        !self.suggested_actions.is_empty()
    }
}

/// The default action list: blur, replace, mute.
pub fn default_suggestions() -> Vec<ActionSuggestion> {
    vec![
        ActionSuggestion::new("default-blur", "blur", "Blur", "Blur the selected object"),
        ActionSuggestion::new(
            "default-replace",
            "replace",
            "Replace",
            "Replace the selected object with something else",
        ),
        ActionSuggestion::new("default-mute", "mute", "Mute", "Mute audio for this segment"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_has_three_defaults() {
        let fallback = ClassificationResult::fallback();
        let kinds: Vec<&str> = fallback
            .suggested_actions
            .iter()
            .map(|s| s.kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["blur", "replace", "mute"]);
        assert!(fallback.item_name.is_empty());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "itemName": "bottle",
            "reasoning": "Brand logo visible",
            "suggestedActions": [
                {"id": "a1", "kind": "blur", "label": "Blur logo", "description": "Hide branding"}
            ]
        }"#;
        let result: ClassificationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.item_name, "bottle");
        assert_eq!(result.suggested_actions.len(), 1);
        assert_eq!(result.suggested_actions[0].kind, "blur");
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        let result: ClassificationResult = serde_json::from_str(r#"{"itemName": "cup"}"#).unwrap();
        assert!(!result.has_suggestions());
        assert!(result.reasoning.is_empty());
    }
}
