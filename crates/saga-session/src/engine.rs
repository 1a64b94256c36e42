//! Top-level wiring. The host process (an editor extension, a CLI, a
//! test) feeds mutation notifications in and drives start/stop; the engine
//! routes the active session id to capture so the components hold no
//! back-references to each other.

use std::path::{Path, PathBuf};

use saga_capture::{ChangeCapture, FsTextSource, TextSource};
use saga_core::config::EngineConfig;
use saga_core::summarize::Summarizer;
use saga_index::JournalIndex;
use saga_journal::JournalStore;

use crate::prompt::{PromptSummarizer, PromptTransport};
use crate::{RetryOutcome, SessionLifecycle, SessionState, StartOutcome, StopOutcome};

pub struct Engine {
    capture: ChangeCapture,
    lifecycle: SessionLifecycle,
    store: JournalStore,
    index: JournalIndex,
    source: Box<dyn TextSource>,
    prompt_budget_chars: usize,
}

impl Engine {
    pub fn new(
        project_root: &Path,
        config: EngineConfig,
        source: Box<dyn TextSource>,
    ) -> anyhow::Result<Self> {
        let store = JournalStore::new(config.journal_file(project_root), &config.journal_title);
        let index = JournalIndex::new(store.clone(), Some(PathBuf::from(project_root)))?;
        Ok(Engine {
            capture: ChangeCapture::new(config.retain_on_close, config.record_sessionless),
            lifecycle: SessionLifecycle::new(),
            store,
            index,
            source,
            prompt_budget_chars: config.prompt_budget_chars,
        })
    }

    /// Engine over the real filesystem with config loaded from
    /// `<root>/.saga/config.json` (defaults when absent).
    pub fn open(project_root: &Path) -> anyhow::Result<Self> {
        let config = EngineConfig::load(&project_root.join(".saga/config.json"));
        Self::new(project_root, config, Box::new(FsTextSource))
    }

    // ── Session control ──

    pub fn start(&mut self) -> StartOutcome {
        self.lifecycle.start()
    }

    pub fn stop(&mut self, summarizer: &dyn Summarizer) -> anyhow::Result<StopOutcome> {
        let outcome = self.lifecycle.stop(&self.capture, summarizer, &self.store)?;
        if matches!(outcome, StopOutcome::Written { .. }) {
            self.index.refresh()?;
        }
        Ok(outcome)
    }

    pub fn retry(&mut self, summarizer: &dyn Summarizer) -> anyhow::Result<RetryOutcome> {
        let outcome = self.lifecycle.retry(summarizer, &self.store)?;
        if matches!(outcome, RetryOutcome::Written { .. }) {
            self.index.refresh()?;
        }
        Ok(outcome)
    }

    /// Stop via a plain-text collaborator: the change set is rendered into
    /// prompt text under the configured char budget before it reaches the
    /// transport.
    pub fn stop_with_prompt<T: PromptTransport>(
        &mut self,
        transport: T,
    ) -> anyhow::Result<StopOutcome> {
        let summarizer = PromptSummarizer::new(transport, self.prompt_budget_chars);
        self.stop(&summarizer)
    }

    /// Retry counterpart of `stop_with_prompt`.
    pub fn retry_with_prompt<T: PromptTransport>(
        &mut self,
        transport: T,
    ) -> anyhow::Result<RetryOutcome> {
        let summarizer = PromptSummarizer::new(transport, self.prompt_budget_chars);
        self.retry(&summarizer)
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn has_pending_retry(&self) -> bool {
        self.lifecycle.has_pending_retry()
    }

    // ── Mutation notifications ──

    pub fn on_save(&mut self, path: &Path, new_text: &str) {
        let session = self.active_id();
        self.capture.on_save(session.as_deref(), path, new_text);
    }

    pub fn on_create(&mut self, path: &Path) {
        let session = self.active_id();
        self.capture
            .on_create(session.as_deref(), path, self.source.as_ref());
    }

    pub fn on_delete(&mut self, path: &Path) {
        let session = self.active_id();
        self.capture.on_delete(session.as_deref(), path);
    }

    pub fn on_rename(&mut self, old_path: &Path, new_path: &Path) {
        let session = self.active_id();
        self.capture
            .on_rename(session.as_deref(), old_path, new_path, self.source.as_ref());
    }

    pub fn on_open(&mut self, path: &Path) {
        self.capture.on_open(path, self.source.as_ref());
    }

    pub fn on_close(&mut self, path: &Path) {
        self.capture.on_close(path);
    }

    fn active_id(&self) -> Option<String> {
        self.lifecycle.active_session_id().map(str::to_string)
    }

    // ── Access to the parts ──

    pub fn capture(&self) -> &ChangeCapture {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut ChangeCapture {
        &mut self.capture
    }

    pub fn store(&self) -> &JournalStore {
        &self.store
    }

    pub fn index(&self) -> &JournalIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut JournalIndex {
        &mut self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_core::summarize::{
        FileSummary, SessionSummary, SummarizeError, Summarizer, SummaryLine,
    };
    use saga_core::{Change, ChangeKind, Session};

    /// Deterministic summarizer: one line per change, description derived
    /// from the change kind.
    struct Echo;

    impl Summarizer for Echo {
        fn summarize(
            &self,
            _session: &Session,
            changes: &[Change],
        ) -> Result<SessionSummary, SummarizeError> {
            let mut files: Vec<FileSummary> = Vec::new();
            for change in changes {
                let desc = match &change.kind {
                    ChangeKind::Save { .. } => "edited".to_string(),
                    ChangeKind::Create { .. } => "created".to_string(),
                    ChangeKind::Delete { .. } => "deleted".to_string(),
                    ChangeKind::Rename { new_file_path } => format!("renamed to {new_file_path}"),
                };
                let line = SummaryLine {
                    timestamp: saga_core::change_clock(change.timestamp),
                    description: desc,
                };
                match files.iter_mut().find(|f| f.file_path == change.file_path) {
                    Some(f) => f.changes.push(line),
                    None => files.push(FileSummary {
                        file_path: change.file_path.clone(),
                        changes: vec![line],
                    }),
                }
            }
            Ok(SessionSummary { files })
        }
    }

    fn engine(tmp: &tempfile::TempDir) -> Engine {
        Engine::open(tmp.path()).unwrap()
    }

    #[test]
    fn full_cycle_writes_journal_and_refreshes_index() {
        let tmp = tempfile::tempdir().unwrap();
        let mut eng = engine(&tmp);

        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        let file = src.join("a.rs");
        std::fs::write(&file, "fn a() {}").unwrap();

        eng.start();
        eng.on_create(&file);
        eng.on_save(&file, "fn a() { body() }");

        let out = eng.stop(&Echo).unwrap();
        assert!(matches!(out, StopOutcome::Written { .. }));
        assert_eq!(eng.state(), SessionState::Idle);

        // The index already sees the new session without a manual refresh.
        let sessions = eng.index().by_session();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].files.len(), 1);
        assert_eq!(sessions[0].files[0].changes.len(), 2);

        // Absolute capture paths collapse to project-relative entries.
        let files = eng.index().by_file();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/a.rs");
        assert_eq!(files[0].total_changes, 2);
    }

    #[test]
    fn changes_while_idle_never_reach_the_journal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut eng = engine(&tmp);

        eng.on_save(Path::new("/p/a.rs"), "idle edit");
        eng.start();
        let out = eng.stop(&Echo).unwrap();
        assert!(matches!(out, StopOutcome::NoChanges { .. }));
        assert_eq!(eng.store().read().unwrap(), "");
    }

    #[test]
    fn rename_while_recording_is_journaled() {
        let tmp = tempfile::tempdir().unwrap();
        let mut eng = engine(&tmp);

        eng.on_save(Path::new("/p/a.ts"), "body");
        eng.start();
        eng.on_rename(Path::new("/p/a.ts"), Path::new("/p/b.ts"));
        let out = eng.stop(&Echo).unwrap();
        assert!(matches!(out, StopOutcome::Written { .. }));

        let sessions = eng.index().by_session();
        assert_eq!(sessions[0].files[0].path, "/p/a.ts");
        assert_eq!(sessions[0].files[0].changes[0].description, "renamed to /p/b.ts");
    }

    #[test]
    fn configured_budget_truncates_the_prompt_reaching_the_collaborator() {
        use std::cell::RefCell;

        let tmp = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            prompt_budget_chars: 500,
            ..EngineConfig::default()
        };
        let mut eng = Engine::new(tmp.path(), config, Box::new(FsTextSource)).unwrap();

        eng.start();
        eng.on_save(Path::new("/p/big.rs"), &"x".repeat(20_000));

        let seen = RefCell::new(String::new());
        let out = eng
            .stop_with_prompt(|prompt: &str| {
                seen.borrow_mut().push_str(prompt);
                Ok(SessionSummary {
                    files: vec![FileSummary {
                        file_path: "/p/big.rs".into(),
                        changes: vec![SummaryLine {
                            timestamp: "09:00:00".into(),
                            description: "big edit".into(),
                        }],
                    }],
                })
            })
            .unwrap();
        assert!(matches!(out, StopOutcome::Written { .. }));

        let prompt = seen.borrow();
        assert!(prompt.contains("saved at"));
        assert!(prompt.contains("[truncated]"));
        assert!(prompt.len() < 2_000);
    }

    #[test]
    fn two_cycles_stack_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let mut eng = engine(&tmp);

        eng.start();
        eng.on_save(Path::new("/p/first.rs"), "one");
        eng.stop(&Echo).unwrap();

        eng.start();
        eng.on_save(Path::new("/p/second.rs"), "two");
        eng.stop(&Echo).unwrap();

        let sessions = eng.index().by_session();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].files[0].path, "/p/second.rs");
        assert_eq!(sessions[1].files[0].path, "/p/first.rs");
    }
}
