//! Profanity segment entries and the replacement map folded from them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::timestamp::format_seconds;

static NEXT_SEGMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable synthetic identity of a segment entry.
///
/// Assigned once at creation and never sent to the remote side, so async
/// work addressed by id survives index shifts caused by removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl SegmentId {
    pub fn next() -> Self {
        Self(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg-{}", self.0)
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// One detected-or-manual profanity occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEntry {
    #[serde(skip, default = "SegmentId::next")]
    pub id: SegmentId,
    pub word: String,
    #[serde(alias = "start")]
    pub start_time: f64,
    #[serde(alias = "end")]
    pub end_time: f64,
    #[serde(default)]
    pub replacement: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(default)]
    pub context: String,
}

impl SegmentEntry {
    /// A detected match with a fresh identity.
    pub fn new(word: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            id: SegmentId::next(),
            word: word.into(),
            start_time,
            end_time,
            replacement: String::new(),
            confidence: default_confidence(),
            speaker_id: None,
            context: String::new(),
        }
    }

    /// Blank entry appended by the operator: empty word, zero-to-one-second window.
    pub fn manual() -> Self {
        Self::new(String::new(), 0.0, 1.0)
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    pub fn has_replacement(&self) -> bool {
        !self.replacement.trim().is_empty()
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Human readable window, e.g. `00:01:02.500-00:01:03`.
    pub fn window_label(&self) -> String {
        format!(
            "{}-{}",
            format_seconds(self.start_time),
            format_seconds(self.end_time)
        )
    }
}

/// Word to replacement mapping sent with a dub censor request.
///
/// Entries with an empty replacement are never stored; they are dropped
/// rather than sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ReplacementMap(BTreeMap<String, String>);

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a segment collection. Later entries win for duplicate words.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a SegmentEntry>) -> Self {
        let mut map = Self::new();
        for entry in entries {
            map.insert(&entry.word, &entry.replacement);
        }
        map
    }

    /// Insert a pair, ignoring blank words and blank replacements.
    ///
    /// Returns true if the pair was stored.
    pub fn insert(&mut self, word: &str, replacement: &str) -> bool {
        let word = word.trim();
        let replacement = replacement.trim();
        if word.is_empty() || replacement.is_empty() {
            return false;
        }
        self.0.insert(word.to_string(), replacement.to_string());
        true
    }

    pub fn get(&self, word: &str) -> Option<&str> {
        self.0.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
