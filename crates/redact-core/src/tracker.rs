//! Pipeline status state machine.
//!
//! Transitions are a pure function over [`PipelineSnapshot`]. The tracker
//! publishes each applied snapshot on a `watch` channel.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use redact_models::{ActionCompletion, ActionKind, PipelineStatus, ResultLocation};

use crate::error::{CoreError, CoreResult, GENERIC_FAILURE};

/// Which invocation site a tracker serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Region selection, classification and one action.
    SingleAction,
    /// Scan, edit, then one batch censor action.
    Batch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    BeginDetect,
    DetectFinished,
    /// The gesture was reset while classification was pending.
    CancelDetect,
    BeginScan,
    ScanSucceeded,
    ScanFailed(String),
    BeginProcessing(ActionKind),
    /// Submission refused before execution (unknown action kind).
    Rejected(String),
    Succeeded(ResultLocation),
    Failed(String),
    Retry,
    Reset,
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::BeginDetect => "begin_detect",
            PipelineEvent::DetectFinished => "detect_finished",
            PipelineEvent::CancelDetect => "cancel_detect",
            PipelineEvent::BeginScan => "begin_scan",
            PipelineEvent::ScanSucceeded => "scan_succeeded",
            PipelineEvent::ScanFailed(_) => "scan_failed",
            PipelineEvent::BeginProcessing(_) => "begin_processing",
            PipelineEvent::Rejected(_) => "rejected",
            PipelineEvent::Succeeded(_) => "succeeded",
            PipelineEvent::Failed(_) => "failed",
            PipelineEvent::Retry => "retry",
            PipelineEvent::Reset => "reset",
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Illegal transition: {event} while {from}")]
pub struct TransitionError {
    pub from: PipelineStatus,
    pub event: &'static str,
}

/// Immutable view of one tracker's state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSnapshot {
    pub flow: FlowKind,
    pub status: PipelineStatus,
    pub action: Option<ActionKind>,
    /// Error text while in `Error`
    pub message: Option<String>,
    pub result: Option<ResultLocation>,
    /// Bumped whenever a new detect or processing run starts, or a detect is cancelled
    pub generation: u64,
    /// Bumped on every applied transition
    pub seq: u64,
    pub updated_at: DateTime<Utc>,
    /// Batch flow only: a scan has populated the collection at least once
    pub scanned: bool,
}

impl PipelineSnapshot {
    pub fn new(flow: FlowKind) -> Self {
        Self {
            flow,
            status: PipelineStatus::Idle,
            action: None,
            message: None,
            result: None,
            generation: 0,
            seq: 0,
            updated_at: Utc::now(),
            scanned: false,
        }
    }

    /// State the flow returns to after a retry or reset.
    fn rearm_status(&self) -> PipelineStatus {
        match self.flow {
            FlowKind::Batch if self.scanned => PipelineStatus::Ready,
            _ => PipelineStatus::Idle,
        }
    }

    /// Compute the successor state for `event`.
    pub fn apply(&self, event: &PipelineEvent) -> Result<Self, TransitionError> {
        use PipelineEvent as E;
        use PipelineStatus as S;

        let illegal = || TransitionError {
            from: self.status,
            event: event.name(),
        };

        let mut next = self.clone();
        match (self.status, event) {
            (S::Idle, E::BeginDetect) if self.flow == FlowKind::SingleAction => {
                next.status = S::Detecting;
                next.generation += 1;
            }
            (S::Detecting, E::DetectFinished) => {
                next.status = S::Idle;
            }
            (S::Detecting, E::CancelDetect) => {
                next.status = S::Idle;
                next.generation += 1;
            }
            (S::Idle | S::Ready, E::BeginScan) if self.flow == FlowKind::Batch => {
                next.status = S::Scanning;
                next.message = None;
            }
            (S::Scanning, E::ScanSucceeded) => {
                next.status = S::Ready;
                next.scanned = true;
            }
            (S::Scanning, E::ScanFailed(message)) => {
                next.status = S::Error;
                next.message = Some(display_message(message));
            }
            // The batch flow only submits once a scan has reached `ready`.
            (S::Idle | S::Ready, E::BeginProcessing(kind))
                if self.status == S::Ready || self.flow == FlowKind::SingleAction =>
            {
                next.status = S::Processing;
                next.action = Some(*kind);
                next.message = None;
                next.result = None;
                next.generation += 1;
            }
            (S::Idle | S::Ready, E::Rejected(message)) => {
                next.status = S::Error;
                next.message = Some(display_message(message));
            }
            (S::Processing, E::Succeeded(location)) => {
                next.status = S::Completed;
                next.result = Some(location.clone());
            }
            (S::Processing, E::Failed(message)) => {
                next.status = S::Error;
                next.message = Some(display_message(message));
            }
            (S::Error, E::Retry) => {
                next.status = self.rearm_status();
                next.message = None;
            }
            (S::Completed, E::Reset) => {
                next.status = self.rearm_status();
                next.result = None;
                next.action = None;
            }
            _ => return Err(illegal()),
        }

        next.seq += 1;
        next.updated_at = Utc::now();
        Ok(next)
    }
}

fn display_message(message: &str) -> String {
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message.to_string()
    }
}

/// Proof that a processing run was started; settles exactly one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTicket {
    pub generation: u64,
    pub kind: ActionKind,
}

type CompletionCallback = Box<dyn Fn(&ActionCompletion) + Send + Sync>;

/// Owns one pipeline's state and publishes snapshots to observers.
pub struct PipelineTracker {
    state: watch::Sender<PipelineSnapshot>,
    on_complete: Option<CompletionCallback>,
}

impl PipelineTracker {
    pub fn new(flow: FlowKind) -> Self {
        let (state, _) = watch::channel(PipelineSnapshot::new(flow));
        Self {
            state,
            on_complete: None,
        }
    }

    pub fn single() -> Self {
        Self::new(FlowKind::SingleAction)
    }

    pub fn batch() -> Self {
        Self::new(FlowKind::Batch)
    }

    /// Register the caller's completion callback, replacing any previous one.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: Fn(&ActionCompletion) + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> PipelineStatus {
        self.state.borrow().status
    }

    /// Whether the triggering control should be enabled.
    pub fn accepts_trigger(&self) -> bool {
        self.status().accepts_trigger()
    }

    /// Apply `event` and publish the new snapshot.
    pub fn dispatch(&self, event: PipelineEvent) -> Result<PipelineSnapshot, TransitionError> {
        let mut outcome = None;
        self.state.send_if_modified(|current| {
            let result = current.apply(&event);
            let applied = result.is_ok();
            if let Ok(next) = &result {
                *current = next.clone();
            }
            outcome = Some(result);
            applied
        });

        let outcome = outcome.unwrap_or_else(|| {
            Err(TransitionError {
                from: self.status(),
                event: event.name(),
            })
        });
        match &outcome {
            Ok(snapshot) => debug!(event = %event, status = %snapshot.status, seq = snapshot.seq, "Pipeline transition"),
            Err(e) => debug!(error = %e, "Rejected pipeline transition"),
        }
        outcome
    }

    /// Enter `processing` for one action.
    pub fn begin_processing(&self, kind: ActionKind) -> CoreResult<PipelineTicket> {
        let snapshot = self.dispatch(PipelineEvent::BeginProcessing(kind))?;
        Ok(PipelineTicket {
            generation: snapshot.generation,
            kind,
        })
    }

    fn check_ticket(&self, ticket: &PipelineTicket) -> CoreResult<()> {
        let current = self.state.borrow().generation;
        if current != ticket.generation {
            return Err(CoreError::Stale {
                got: ticket.generation,
                current,
            });
        }
        Ok(())
    }

    /// Settle a run successfully and notify the completion callback once.
    pub fn complete(&self, ticket: PipelineTicket, location: ResultLocation) -> CoreResult<()> {
        self.check_ticket(&ticket)?;
        let snapshot = self.dispatch(PipelineEvent::Succeeded(location))?;

        let completion = ActionCompletion::new(ticket.kind, snapshot.result.as_ref());
        info!(action = %ticket.kind, download_url = ?completion.download_url, "Action completed");
        if let Some(callback) = &self.on_complete {
            callback(&completion);
        }
        Ok(())
    }

    pub fn fail(&self, ticket: PipelineTicket, message: &str) -> CoreResult<()> {
        self.check_ticket(&ticket)?;
        self.dispatch(PipelineEvent::Failed(message.to_string()))?;
        Ok(())
    }

    /// Refuse a submission without running anything.
    pub fn reject(&self, err: &CoreError) -> CoreResult<()> {
        self.dispatch(PipelineEvent::Rejected(err.user_message()))?;
        Ok(())
    }

    /// Drive one action through `processing` to `completed` or `error`.
    pub async fn run<F>(&self, kind: ActionKind, action: F) -> CoreResult<ResultLocation>
    where
        F: Future<Output = CoreResult<ResultLocation>>,
    {
        let ticket = self.begin_processing(kind)?;
        match action.await {
            Ok(location) => {
                self.complete(ticket, location.clone())?;
                Ok(location)
            }
            Err(e) => {
                self.fail(ticket, &e.user_message())?;
                Err(e)
            }
        }
    }

    pub fn retry(&self) -> CoreResult<()> {
        self.dispatch(PipelineEvent::Retry)?;
        Ok(())
    }

    pub fn reset(&self) -> CoreResult<()> {
        self.dispatch(PipelineEvent::Reset)?;
        Ok(())
    }
}

impl fmt::Debug for PipelineTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineTracker")
            .field("state", &*self.state.borrow())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
