//! Editable segment collection with per-entry async enrichment.
//!
//! Every mutation installs a fresh `Arc<Vec<_>>` so observers holding a
//! snapshot can detect change by pointer identity. Async work is addressed
//! by [`SegmentId`], never by index, and is re-validated at commit time.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use redact_client::RemediationService;
use redact_models::{JobHandle, ReplacementMap, SegmentEntry, SegmentId};

use crate::error::{CoreError, CoreResult};
use crate::logging::ActionLogger;

/// One editable field of a [`SegmentEntry`].
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentField {
    Word(String),
    StartTime(f64),
    EndTime(f64),
    Replacement(String),
    Confidence(f64),
    SpeakerId(Option<String>),
    Context(String),
}

impl SegmentField {
    fn apply(self, entry: &mut SegmentEntry) {
        match self {
            SegmentField::Word(v) => entry.word = v,
            SegmentField::StartTime(v) => entry.start_time = v,
            SegmentField::EndTime(v) => entry.end_time = v,
            SegmentField::Replacement(v) => entry.replacement = v,
            SegmentField::Confidence(v) => entry.confidence = v.clamp(0.0, 1.0),
            SegmentField::SpeakerId(v) => entry.speaker_id = v,
            SegmentField::Context(v) => entry.context = v,
        }
    }
}

/// Issued by [`SegmentCollection::begin_scan`]; only the latest scan may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket {
    seq: u64,
}

/// A pending replacement suggestion for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentTicket {
    pub id: SegmentId,
    pub word: String,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// The first suggestion was written into the entry.
    Applied(String),
    /// The remote side had nothing to offer; the entry is unchanged.
    NoSuggestion,
    /// The entry was removed, its word edited, or the collection rescanned.
    Stale,
    /// The suggestion request failed; the entry is unchanged.
    Failed(String),
}

impl EnrichOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EnrichOutcome::Applied(_))
    }
}

/// Ordered, independently editable profanity matches.
#[derive(Debug, Clone, Default)]
pub struct SegmentCollection {
    entries: Arc<Vec<SegmentEntry>>,
    /// Bumped when a scan replaces the collection.
    generation: u64,
    /// Bumped on every mutation.
    revision: u64,
    scan_seq: u64,
    loading: HashMap<String, usize>,
}

impl SegmentCollection {
    /// Empty collection, before any scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with entries as if a scan had produced them.
    pub fn from_entries(entries: Vec<SegmentEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
            ..Self::default()
        }
    }

    /// Current entries in display order.
    pub fn entries(&self) -> &[SegmentEntry] {
        &self.entries
    }

    /// Shared snapshot; a new pointer is installed on every mutation.
    pub fn snapshot(&self) -> Arc<Vec<SegmentEntry>> {
        Arc::clone(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at the current `index`, if any.
    pub fn get(&self, index: usize) -> Option<&SegmentEntry> {
        self.entries.get(index)
    }

    /// Current index of the entry with `id`.
    pub fn position(&self, id: SegmentId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Mutation counter; changes whenever the entries change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Scan counter. Enrichment tickets from an older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn mutate<R>(&mut self, f: impl FnOnce(&mut Vec<SegmentEntry>) -> R) -> R {
        let mut next = (*self.entries).clone();
        let out = f(&mut next);
        self.entries = Arc::new(next);
        self.revision += 1;
        out
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index >= self.entries.len() {
            return Err(CoreError::validation(format!(
                "Segment index {} out of range ({} entries)",
                index,
                self.entries.len()
            )));
        }
        Ok(())
    }

    /// Append a blank manual entry and return its id.
    pub fn add_entry(&mut self) -> SegmentId {
        let entry = SegmentEntry::manual();
        let id = entry.id;
        self.mutate(|entries| entries.push(entry));
        id
    }

    /// Remove by current index; later entries shift down.
    pub fn remove_entry(&mut self, index: usize) -> CoreResult<SegmentEntry> {
        self.check_index(index)?;
        Ok(self.mutate(|entries| entries.remove(index)))
    }

    /// Edit one field of the entry at `index`.
    pub fn update_field(&mut self, index: usize, field: SegmentField) -> CoreResult<()> {
        self.check_index(index)?;
        self.mutate(|entries| field.apply(&mut entries[index]));
        Ok(())
    }

    /// Edit by id, independent of index shifts.
    pub fn update_by_id(&mut self, id: SegmentId, field: SegmentField) -> CoreResult<()> {
        let index = self
            .position(id)
            .ok_or_else(|| CoreError::validation(format!("Segment {} not found", id)))?;
        self.update_field(index, field)
    }

    /// Start a bulk scan. A later `begin_scan` supersedes this ticket.
    pub fn begin_scan(&mut self) -> ScanTicket {
        self.scan_seq += 1;
        ScanTicket { seq: self.scan_seq }
    }

    /// Replace the whole collection with scan results.
    ///
    /// Destructive: manual edits are discarded and pending enrichments
    /// become stale. Returns false if the ticket was superseded.
    pub fn apply_scan(&mut self, ticket: ScanTicket, entries: Vec<SegmentEntry>) -> bool {
        if ticket.seq != self.scan_seq {
            debug!(ticket = ticket.seq, latest = self.scan_seq, "Dropping superseded scan");
            return false;
        }
        self.entries = Arc::new(entries);
        self.generation += 1;
        self.revision += 1;
        self.loading.clear();
        true
    }

    /// Reserve an enrichment for the entry at `index`.
    ///
    /// Returns `None` unless the entry exists and still holds `word`.
    pub fn begin_enrichment(&mut self, index: usize, word: &str) -> Option<EnrichmentTicket> {
        let entry = self.entries.get(index)?;
        if entry.word != word || word.trim().is_empty() {
            return None;
        }
        *self.loading.entry(word.to_string()).or_insert(0) += 1;
        Some(EnrichmentTicket {
            id: entry.id,
            word: word.to_string(),
            generation: self.generation,
        })
    }

    /// Whether a suggestion request for `word` is in flight.
    pub fn is_loading(&self, word: &str) -> bool {
        self.loading.get(word).is_some_and(|n| *n > 0)
    }

    fn release(&mut self, ticket: &EnrichmentTicket) {
        if ticket.generation != self.generation {
            return;
        }
        if let Some(count) = self.loading.get_mut(&ticket.word) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.loading.remove(&ticket.word);
            }
        }
    }

    /// Write the first non-blank suggestion into the ticket's entry.
    ///
    /// The entry is located by id at write time. Responses for removed or
    /// edited entries are dropped, never retried.
    pub fn commit_enrichment(&mut self, ticket: &EnrichmentTicket, suggestions: &[String]) -> EnrichOutcome {
        self.release(ticket);

        if ticket.generation != self.generation {
            debug!(segment = %ticket.id, "Dropping suggestion from before rescan");
            return EnrichOutcome::Stale;
        }
        let Some(index) = self.position(ticket.id) else {
            debug!(segment = %ticket.id, "Dropping suggestion for removed entry");
            return EnrichOutcome::Stale;
        };
        if self.entries[index].word != ticket.word {
            debug!(segment = %ticket.id, "Dropping suggestion for edited word");
            return EnrichOutcome::Stale;
        }

        let Some(suggestion) = suggestions.iter().map(|s| s.trim()).find(|s| !s.is_empty()) else {
            return EnrichOutcome::NoSuggestion;
        };
        let suggestion = suggestion.to_string();
        self.mutate(|entries| entries[index].replacement = suggestion.clone());
        EnrichOutcome::Applied(suggestion)
    }

    /// Settle a ticket whose request failed. Nothing is written.
    pub fn abandon_enrichment(&mut self, ticket: &EnrichmentTicket, reason: &str) -> EnrichOutcome {
        self.release(ticket);
        EnrichOutcome::Failed(reason.to_string())
    }

    /// Fold into the dub replacement map, dropping empty replacements.
    pub fn replacement_map(&self) -> ReplacementMap {
        ReplacementMap::from_entries(self.entries.iter())
    }

    /// Entries worth enriching: a word but no replacement yet.
    pub fn pending_enrichment(&self) -> Vec<(usize, String)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.word.trim().is_empty() && !e.has_replacement())
            .map(|(i, e)| (i, e.word.clone()))
            .collect()
    }
}

/// Fetch suggestions for a ticket without borrowing the collection.
pub async fn fetch_suggestions(
    service: &dyn RemediationService,
    job: &JobHandle,
    ticket: &EnrichmentTicket,
) -> CoreResult<Vec<String>> {
    let logger = ActionLogger::for_operation(job, "suggest_replacement");
    service.suggest_replacement(job, &ticket.word).await.map_err(|e| {
        logger.log_warning(&format!("No suggestion for {}: {}", ticket.id, e));
        CoreError::Service(e)
    })
}
