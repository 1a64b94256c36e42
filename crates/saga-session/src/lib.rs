use saga_capture::ChangeCapture;
use saga_core::summarize::{SummarizeError, Summarizer};
use saga_core::{Change, Session};
use saga_journal::{render_session_block, JournalStore};

pub mod engine;
pub mod prompt;

pub use engine::Engine;

// ── States and outcomes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session, or the current session has its end time set.
    Idle,
    /// A session exists with no end time; capture is gated open.
    Recording,
    /// End time stamped, awaiting the external summarization call.
    Summarizing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started { session: Session },
    /// In-band notice, not an error: a Recording session already exists.
    AlreadyRecording,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// In-band notice: nothing to stop.
    NotRecording,
    /// Session ended with zero captured changes; no summarizer call, no
    /// journal write.
    NoChanges { session: Session },
    /// Summary appended to the journal.
    Written { session: Session },
    /// Summarizer failed. When `error.retryable` the same session and
    /// change set are parked for exactly one explicit `retry`.
    Failed { session: Session, error: SummarizeError },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// Nothing was parked (never failed retryably, or already retried).
    NothingPending,
    Written { session: Session },
    Failed { session: Session, error: SummarizeError },
}

/// The session/change pair parked after a retryable failure. Consumed by
/// the single manual retry, success or not.
#[derive(Debug, Clone)]
struct PendingSummary {
    session: Session,
    changes: Vec<Change>,
}

// ── Lifecycle ──

/// State machine gating capture and orchestrating the stop-time pipeline:
/// pull changes → summarize → append to the journal. Owns the one
/// authoritative session; at most one Recording session exists at a time.
/// Collaborators (capture, summarizer, store) are injected per call.
pub struct SessionLifecycle {
    session: Option<Session>,
    state: SessionState,
    pending_retry: Option<PendingSummary>,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        SessionLifecycle {
            session: None,
            state: SessionState::Idle,
            pending_retry: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The Recording session's id, if any. This is what tags captured
    /// changes.
    pub fn active_session_id(&self) -> Option<&str> {
        match self.state {
            SessionState::Recording => self.session.as_ref().map(|s| s.id.as_str()),
            _ => None,
        }
    }

    pub fn has_pending_retry(&self) -> bool {
        self.pending_retry.is_some()
    }

    /// Begin a fresh session. A no-op while one is already Recording.
    pub fn start(&mut self) -> StartOutcome {
        if self.state == SessionState::Recording {
            tracing::debug!("start ignored: session already recording");
            return StartOutcome::AlreadyRecording;
        }
        let session = Session::begin();
        tracing::info!(id = %session.id, "session started");
        self.session = Some(session.clone());
        self.state = SessionState::Recording;
        StartOutcome::Started { session }
    }

    /// End the Recording session: stamp its end time (irreversible), pull
    /// its changes, and run the summarize→append pipeline. An empty change
    /// set short-circuits straight to Idle. Journal I/O failure is the only
    /// error path; summarizer failure is an in-band outcome.
    pub fn stop(
        &mut self,
        capture: &ChangeCapture,
        summarizer: &dyn Summarizer,
        store: &JournalStore,
    ) -> anyhow::Result<StopOutcome> {
        if self.state != SessionState::Recording {
            tracing::debug!("stop ignored: no recording session");
            return Ok(StopOutcome::NotRecording);
        }
        let Some(mut session) = self.session.take() else {
            return Ok(StopOutcome::NotRecording);
        };
        session.end_time = Some(saga_core::now());
        self.state = SessionState::Summarizing;

        let changes = capture.changes_for_session(&session.id);
        if changes.is_empty() {
            tracing::info!(id = %session.id, "session ended with no changes");
            self.state = SessionState::Idle;
            return Ok(StopOutcome::NoChanges { session });
        }

        tracing::info!(id = %session.id, changes = changes.len(), "summarizing session");
        let result = summarize_and_append(&session, &changes, summarizer, store);
        // Idle regardless of outcome; retry is a fresh explicit operation,
        // not a queued state.
        self.state = SessionState::Idle;

        match result? {
            Ok(()) => Ok(StopOutcome::Written { session }),
            Err(error) => {
                tracing::warn!(id = %session.id, kind = ?error.kind, retryable = error.retryable, "summarization failed");
                if error.retryable {
                    self.pending_retry = Some(PendingSummary {
                        session: session.clone(),
                        changes,
                    });
                }
                Ok(StopOutcome::Failed { session, error })
            }
        }
    }

    /// Re-run the parked summarize→append step once, with the same session
    /// and change set. The parked pair is consumed whether or not this
    /// attempt succeeds.
    pub fn retry(
        &mut self,
        summarizer: &dyn Summarizer,
        store: &JournalStore,
    ) -> anyhow::Result<RetryOutcome> {
        let Some(pending) = self.pending_retry.take() else {
            return Ok(RetryOutcome::NothingPending);
        };
        tracing::info!(id = %pending.session.id, "retrying summarization");
        match summarize_and_append(&pending.session, &pending.changes, summarizer, store)? {
            Ok(()) => Ok(RetryOutcome::Written {
                session: pending.session,
            }),
            Err(error) => Ok(RetryOutcome::Failed {
                session: pending.session,
                error,
            }),
        }
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// One summarize→format→append pass. The outer `Result` is journal I/O;
/// the inner one is the collaborator's classified failure.
fn summarize_and_append(
    session: &Session,
    changes: &[Change],
    summarizer: &dyn Summarizer,
    store: &JournalStore,
) -> anyhow::Result<Result<(), SummarizeError>> {
    let summary = match summarizer.summarize(session, changes) {
        Ok(s) => s,
        Err(e) => return Ok(Err(e)),
    };
    let block = render_session_block(&session.label(), &summary);
    store.append_session(&block)?;
    Ok(Ok(()))
}
