use serde::Serialize;

use crate::JournalIndex;

/// Which projection the root of the tree exposes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    BySession,
    ByFile,
}

/// Stable address of a tree node. Session/file/change indices refer to the
/// current parse; a `refresh()` invalidates them, which is why the view
/// consumer re-queries from the root after refreshing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeId {
    Session { session: usize },
    SessionFile { session: usize, file: usize },
    SessionChange { session: usize, file: usize, change: usize },
    File { path: String },
    FileSession { path: String, session: usize },
    FileChange { path: String, session: usize, change: usize },
}

/// Child descriptor handed to the view consumer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub has_children: bool,
}

impl JournalIndex {
    /// Children of the root (`None`) or of a given node. Unknown or stale
    /// ids yield an empty list rather than an error.
    pub fn children(&self, node: Option<&NodeId>) -> Vec<Node> {
        match node {
            None => match self.mode() {
                ViewMode::BySession => self.root_sessions(),
                ViewMode::ByFile => self.root_files(),
            },
            Some(NodeId::Session { session }) => self.session_files(*session),
            Some(NodeId::SessionFile { session, file }) => self.session_changes(*session, *file),
            Some(NodeId::File { path }) => self.file_session_nodes(path),
            Some(NodeId::FileSession { path, session }) => self.file_change_nodes(path, *session),
            Some(NodeId::SessionChange { .. }) | Some(NodeId::FileChange { .. }) => Vec::new(),
        }
    }

    fn root_sessions(&self) -> Vec<Node> {
        self.by_session()
            .iter()
            .enumerate()
            .map(|(i, s)| Node {
                id: NodeId::Session { session: i },
                label: s.title.clone(),
                has_children: !s.files.is_empty(),
            })
            .collect()
    }

    fn root_files(&self) -> Vec<Node> {
        self.by_file()
            .into_iter()
            .map(|entry| Node {
                label: format!("{} ({})", entry.path, entry.total_changes),
                id: NodeId::File { path: entry.path },
                has_children: true,
            })
            .collect()
    }

    fn session_files(&self, session: usize) -> Vec<Node> {
        let Some(sess) = self.by_session().get(session) else {
            return Vec::new();
        };
        sess.files
            .iter()
            .enumerate()
            .map(|(i, f)| Node {
                id: NodeId::SessionFile { session, file: i },
                label: f.path.clone(),
                has_children: !f.changes.is_empty(),
            })
            .collect()
    }

    fn session_changes(&self, session: usize, file: usize) -> Vec<Node> {
        let Some(f) = self
            .by_session()
            .get(session)
            .and_then(|s| s.files.get(file))
        else {
            return Vec::new();
        };
        f.changes
            .iter()
            .enumerate()
            .map(|(i, c)| Node {
                id: NodeId::SessionChange {
                    session,
                    file,
                    change: i,
                },
                label: format!("{} {}", c.timestamp, c.description),
                has_children: false,
            })
            .collect()
    }

    fn file_session_nodes(&self, path: &str) -> Vec<Node> {
        self.file_sessions(path)
            .into_iter()
            .enumerate()
            .map(|(i, entry)| Node {
                id: NodeId::FileSession {
                    path: path.to_string(),
                    session: i,
                },
                label: entry.session_title,
                has_children: true,
            })
            .collect()
    }

    fn file_change_nodes(&self, path: &str, session: usize) -> Vec<Node> {
        let Some(entry) = self.file_sessions(path).into_iter().nth(session) else {
            return Vec::new();
        };
        entry
            .changes
            .iter()
            .enumerate()
            .map(|(i, c)| Node {
                id: NodeId::FileChange {
                    path: path.to_string(),
                    session,
                    change: i,
                },
                label: format!("{} {}", c.timestamp, c.description),
                has_children: false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JournalIndex;
    use saga_core::summarize::{FileSummary, SessionSummary, SummaryLine};
    use saga_journal::{render_session_block, JournalStore};
    use std::path::PathBuf;

    fn index(tmp: &tempfile::TempDir) -> JournalIndex {
        let store = JournalStore::new(tmp.path().join("journal.md"), "Development Journal");
        store
            .append_session(&render_session_block(
                "2026-03-05 09:00:00",
                &SessionSummary {
                    files: vec![FileSummary {
                        file_path: "/root/src/a.ts".into(),
                        changes: vec![SummaryLine {
                            timestamp: "09:01:00".into(),
                            description: "added parser".into(),
                        }],
                    }],
                },
            ))
            .unwrap();
        store
            .append_session(&render_session_block(
                "2026-03-05 10:00:00",
                &SessionSummary {
                    files: vec![FileSummary {
                        file_path: "src/a.ts".into(),
                        changes: vec![SummaryLine {
                            timestamp: "10:01:00".into(),
                            description: "tests".into(),
                        }],
                    }],
                },
            ))
            .unwrap();
        JournalIndex::new(store, Some(PathBuf::from("/root"))).unwrap()
    }

    #[test]
    fn session_mode_walks_session_file_change() {
        let tmp = tempfile::tempdir().unwrap();
        let idx = index(&tmp);

        let roots = idx.children(None);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].label, "Session 2026-03-05 10:00:00");

        let files = idx.children(Some(&roots[1].id));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].label, "/root/src/a.ts");

        let changes = idx.children(Some(&files[0].id));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].label, "09:01:00 added parser");
        assert!(!changes[0].has_children);
        assert!(idx.children(Some(&changes[0].id)).is_empty());
    }

    #[test]
    fn file_mode_aggregates_then_drills_into_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let mut idx = index(&tmp);
        idx.set_mode(ViewMode::ByFile);

        let roots = idx.children(None);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].label, "src/a.ts (2)");

        let sessions = idx.children(Some(&roots[0].id));
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].label, "Session 2026-03-05 10:00:00");

        let changes = idx.children(Some(&sessions[1].id));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].label, "09:01:00 added parser");
    }

    #[test]
    fn stale_ids_yield_empty_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let idx = index(&tmp);
        assert!(idx.children(Some(&NodeId::Session { session: 99 })).is_empty());
        assert!(idx
            .children(Some(&NodeId::File {
                path: "nope.ts".into()
            }))
            .is_empty());
    }
}
