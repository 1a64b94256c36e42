use std::path::{Path, PathBuf};

use saga_journal::{JournalChange, JournalSession, JournalStore};
use serde::Serialize;

pub mod tree;

pub use tree::{Node, NodeId, ViewMode};

// ── Path normalization ──

/// Normalize a recorded path for aggregation and lookup. An absolute path
/// under the project root is rewritten relative to the root; everything
/// else is used trimmed, as-is. The same function runs on both the write
/// side (aggregation) and the read side (lookup) — diverging here silently
/// splits one logical file into two entries.
pub fn normalize_path(path: &str, project_root: Option<&Path>) -> String {
    let trimmed = path.trim();
    if let Some(root) = project_root {
        let p = Path::new(trimmed);
        if p.is_absolute() {
            if let Ok(rel) = p.strip_prefix(root) {
                return rel.display().to_string();
            }
        }
    }
    trimmed.to_string()
}

// ── By-file projection ──

/// One distinct file across all sessions, with its total change count
/// summed over every session that touched it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileEntry {
    pub path: String,
    pub total_changes: usize,
}

/// One session's contribution to a single file: that session's changes for
/// that file only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileSessionEntry {
    pub session_title: String,
    pub changes: Vec<JournalChange>,
}

// ── Index ──

/// Disposable projections over a fresh parse of the journal. Never mutates
/// persisted state; `refresh()` throws the old parse away.
pub struct JournalIndex {
    store: JournalStore,
    project_root: Option<PathBuf>,
    sessions: Vec<JournalSession>,
    mode: ViewMode,
}

impl JournalIndex {
    pub fn new(store: JournalStore, project_root: Option<PathBuf>) -> anyhow::Result<Self> {
        let sessions = store.parse_file()?;
        Ok(JournalIndex {
            store,
            project_root,
            sessions,
            mode: ViewMode::BySession,
        })
    }

    /// Re-parse from persisted storage, discarding the cached projection.
    pub fn refresh(&mut self) -> anyhow::Result<()> {
        self.sessions = self.store.parse_file()?;
        tracing::debug!(sessions = self.sessions.len(), "journal index refreshed");
        Ok(())
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    fn normalize(&self, path: &str) -> String {
        normalize_path(path, self.project_root.as_deref())
    }

    /// Sessions in persisted (reverse-chronological) order, files and
    /// changes in original order.
    pub fn by_session(&self) -> &[JournalSession] {
        &self.sessions
    }

    /// Distinct normalized files across all sessions, in first-appearance
    /// order, each with its combined change count. Counts are recomputed by
    /// re-normalizing every session, never cached.
    pub fn by_file(&self) -> Vec<FileEntry> {
        let mut entries: Vec<FileEntry> = Vec::new();
        for session in &self.sessions {
            for file in &session.files {
                let norm = self.normalize(&file.path);
                match entries.iter_mut().find(|e| e.path == norm) {
                    Some(entry) => entry.total_changes += file.changes.len(),
                    None => entries.push(FileEntry {
                        path: norm,
                        total_changes: file.changes.len(),
                    }),
                }
            }
        }
        entries
    }

    /// Sessions touching one normalized path, in persisted order, each
    /// restricted to that file's changes.
    pub fn file_sessions(&self, normalized_path: &str) -> Vec<FileSessionEntry> {
        let want = normalize_path(normalized_path, self.project_root.as_deref());
        let mut out = Vec::new();
        for session in &self.sessions {
            let mut changes = Vec::new();
            for file in &session.files {
                if self.normalize(&file.path) == want {
                    changes.extend(file.changes.iter().cloned());
                }
            }
            if !changes.is_empty() {
                out.push(FileSessionEntry {
                    session_title: session.title.clone(),
                    changes,
                });
            }
        }
        out
    }

    // ── Line locator ──

    /// Find the 1-based line number of the first change line matching
    /// `(timestamp, description)` in the *live* persisted text, optionally
    /// scoped to a session header and a file header inside that session.
    /// Once inside a matched session scope, a different session header ends
    /// the search. Returns `None` (never an error) when the file vanished,
    /// was edited away, or the scoped pair does not exist.
    pub fn locate(
        &self,
        timestamp: &str,
        description: &str,
        session_title: Option<&str>,
        file_path: Option<&str>,
    ) -> Option<usize> {
        let text = self.store.read().ok()?;
        let want_file = file_path.map(|f| self.normalize(f));

        // With no session scope we are "inside" from the start.
        let mut in_session = session_title.is_none();
        let mut in_file = want_file.is_none();

        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if let Some(header) = trimmed.strip_prefix("## ") {
                if let Some(want) = session_title {
                    if in_session && header.trim() != want {
                        // Left the matched session without a hit; a later
                        // session must not satisfy this request.
                        return None;
                    }
                    in_session = header.trim() == want;
                }
                in_file = want_file.is_none();
            } else if let Some(header) = trimmed.strip_prefix("### ") {
                if let Some(want) = &want_file {
                    in_file = in_session && self.normalize(header) == *want;
                }
            } else if in_session && in_file {
                if let Some(change) = saga_journal::parse_change_line(trimmed) {
                    if change.timestamp == timestamp && change.description == description {
                        return Some(idx + 1);
                    }
                }
            }
        }
        None
    }
}
