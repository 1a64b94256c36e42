use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A bounded recording interval. `end_time` is stamped exactly once, at
/// stop; after that the session is immutable and never resumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<OffsetDateTime>,
}

impl Session {
    pub fn begin() -> Self {
        Session {
            id: crate::new_session_id(),
            start_time: crate::now(),
            end_time: None,
        }
    }

    /// Journal header label for this session, derived from its start time.
    pub fn label(&self) -> String {
        crate::session_label(self.start_time)
    }
}

/// One captured file mutation. `session_id` is the session active at
/// capture time; `None` means the change is unreachable from any session
/// query — discarded history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

/// Closed variant set. Every consumption site (prompt builder, formatter,
/// size estimator) matches exhaustively, so a new kind is a compile-checked
/// addition everywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    Save {
        old_content: String,
        new_content: String,
    },
    Create {
        content: String,
    },
    Delete {
        last_content: String,
    },
    Rename {
        new_file_path: String,
    },
}

impl Change {
    pub fn new(session_id: Option<String>, file_path: impl Into<String>, kind: ChangeKind) -> Self {
        Change {
            id: crate::new_change_id(),
            timestamp: crate::now(),
            file_path: file_path.into(),
            session_id,
            kind,
        }
    }

    /// Short tag for log lines and CLI output.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ChangeKind::Save { .. } => "save",
            ChangeKind::Create { .. } => "create",
            ChangeKind::Delete { .. } => "delete",
            ChangeKind::Rename { .. } => "rename",
        }
    }
}
