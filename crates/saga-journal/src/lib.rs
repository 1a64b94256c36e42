use std::path::{Path, PathBuf};

use saga_core::summarize::SessionSummary;
use serde::{Deserialize, Serialize};

// ── Parsed model ──

/// One `## ` block as parsed back from the journal text. `title` is the
/// full header text after the marker, e.g. `Session 2026-03-05 09:07:02`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalSession {
    pub title: String,
    pub files: Vec<JournalFile>,
}

/// One `### ` block inside a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalFile {
    pub path: String,
    pub changes: Vec<JournalChange>,
}

/// One `- **<timestamp>** <description>` line inside a file block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalChange {
    pub timestamp: String,
    pub description: String,
}

// ── Store ──

/// The durable journal file. Line-oriented Markdown grammar:
///
/// ```text
/// # <Title>                       -- exactly once, first line
/// ## Session <timestamp label>    -- one per session block
/// ### <filePath>                  -- one per file block
/// - **<timestamp>** <description> -- one per change line
/// ```
///
/// New session blocks are inserted directly under the single top header, so
/// repeated appends keep the file in reverse-chronological order. Unknown
/// lines survive writes untouched and are ignored by the parser, keeping
/// the format forward-parseable and safe to hand-edit.
#[derive(Clone)]
pub struct JournalStore {
    path: PathBuf,
    title: String,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        JournalStore {
            path: path.into(),
            title: title.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current journal text. An absent file is an empty journal, never an
    /// error.
    pub fn read(&self) -> anyhow::Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    /// Insert one rendered session block directly under the top header,
    /// creating the file (and parent directory) on first write.
    pub fn append_session(&self, block: &str) -> anyhow::Result<()> {
        let existing = self.read()?;
        let rest = strip_top_header(&existing);

        let mut out = format!("# {}\n\n", self.title);
        out.push_str(block.trim_end());
        out.push('\n');
        if !rest.trim().is_empty() {
            out.push('\n');
            out.push_str(rest.trim_start_matches('\n'));
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, out)?;
        tracing::debug!("appended session block to {}", self.path.display());
        Ok(())
    }

    /// Parse the persisted journal into structured sessions.
    pub fn parse_file(&self) -> anyhow::Result<Vec<JournalSession>> {
        Ok(parse(&self.read()?))
    }
}

/// Render one session's summary as a journal block.
pub fn render_session_block(session_label: &str, summary: &SessionSummary) -> String {
    let mut out = format!("## Session {session_label}\n\n");
    for file in &summary.files {
        out.push_str(&format!("### {}\n\n", file.file_path));
        for line in &file.changes {
            out.push_str(&format!("- **{}** {}\n", line.timestamp, line.description));
        }
        out.push('\n');
    }
    out
}

/// Drop the single `# ` top header (plus trailing blank lines) from
/// existing journal content, returning the remainder.
fn strip_top_header(content: &str) -> &str {
    let trimmed = content.trim_start_matches('\n');
    if !trimmed.starts_with("# ") {
        return content;
    }
    match trimmed.find('\n') {
        Some(pos) => trimmed[pos + 1..].trim_start_matches('\n'),
        None => "",
    }
}

/// Single forward line scan with two pending pointers. A session header
/// flushes file-then-session; a file header (only inside a session)
/// flushes the pending file; a change line (only inside a file) must match
/// `- **X** Y`. Anything else is ignored, never fatal.
pub fn parse(content: &str) -> Vec<JournalSession> {
    let mut sessions: Vec<JournalSession> = Vec::new();
    let mut cur_session: Option<JournalSession> = None;
    let mut cur_file: Option<JournalFile> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(title) = trimmed.strip_prefix("## ") {
            if let Some(file) = cur_file.take() {
                if let Some(sess) = cur_session.as_mut() {
                    sess.files.push(file);
                }
            }
            if let Some(sess) = cur_session.take() {
                sessions.push(sess);
            }
            cur_session = Some(JournalSession {
                title: title.trim().to_string(),
                files: Vec::new(),
            });
        } else if let Some(path) = trimmed.strip_prefix("### ") {
            if cur_session.is_none() {
                continue;
            }
            if let Some(file) = cur_file.take() {
                if let Some(sess) = cur_session.as_mut() {
                    sess.files.push(file);
                }
            }
            cur_file = Some(JournalFile {
                path: path.trim().to_string(),
                changes: Vec::new(),
            });
        } else if let Some(change) = parse_change_line(trimmed) {
            if let Some(file) = cur_file.as_mut() {
                file.changes.push(change);
            }
        }
    }

    if let Some(file) = cur_file.take() {
        if let Some(sess) = cur_session.as_mut() {
            sess.files.push(file);
        }
    }
    if let Some(sess) = cur_session.take() {
        sessions.push(sess);
    }
    sessions
}

/// Parse one `- **<timestamp>** <description>` line; `None` for anything
/// malformed.
pub fn parse_change_line(line: &str) -> Option<JournalChange> {
    let rest = line.strip_prefix("- **")?;
    let close = rest.find("**")?;
    let timestamp = rest[..close].to_string();
    let description = rest[close + 2..].trim().to_string();
    if timestamp.is_empty() || description.is_empty() {
        return None;
    }
    Some(JournalChange {
        timestamp,
        description,
    })
}
