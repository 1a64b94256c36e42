use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_JOURNAL_PATH: &str = ".saga/journal.md";
pub const DEFAULT_JOURNAL_TITLE: &str = "Development Journal";
const DEFAULT_PROMPT_BUDGET_CHARS: usize = 24_000;

/// Engine configuration, loaded leniently: a missing or unparseable file
/// yields defaults rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the journal Markdown lives, relative to the project root.
    pub journal_path: PathBuf,
    /// Top-level `# <title>` header written once per journal file.
    pub journal_title: String,
    /// Keep content-cache entries when a document is closed, so a later
    /// reopen still diffs against the last observed text.
    pub retain_on_close: bool,
    /// Keep changes captured while no session is active. They stay tagged
    /// with no session id and are unreachable from session queries.
    pub record_sessionless: bool,
    /// Char budget for summarizer prompt assembly; content blobs are
    /// truncated to fit.
    pub prompt_budget_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            journal_title: DEFAULT_JOURNAL_TITLE.to_string(),
            retain_on_close: true,
            record_sessionless: false,
            prompt_budget_chars: DEFAULT_PROMPT_BUDGET_CHARS,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing file, unreadable file, or bad JSON
    /// all fall back to defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("ignoring unparseable config {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Journal path resolved against a project root.
    pub fn journal_file(&self, project_root: &Path) -> PathBuf {
        if self.journal_path.is_absolute() {
            self.journal_path.clone()
        } else {
            project_root.join(&self.journal_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = EngineConfig::load(Path::new("/nonexistent/saga.json"));
        assert_eq!(cfg.journal_title, DEFAULT_JOURNAL_TITLE);
        assert!(cfg.retain_on_close);
        assert!(!cfg.record_sessionless);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"journal_title":"My Log","retain_on_close":false}"#).unwrap();
        let cfg = EngineConfig::load(&path);
        assert_eq!(cfg.journal_title, "My Log");
        assert!(!cfg.retain_on_close);
        assert_eq!(cfg.journal_path, PathBuf::from(DEFAULT_JOURNAL_PATH));
    }

    #[test]
    fn bad_json_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let cfg = EngineConfig::load(&path);
        assert_eq!(cfg.journal_title, DEFAULT_JOURNAL_TITLE);
    }

    #[test]
    fn journal_file_resolves_relative() {
        let cfg = EngineConfig::default();
        let resolved = cfg.journal_file(Path::new("/proj"));
        assert_eq!(resolved, PathBuf::from("/proj/.saga/journal.md"));
    }
}
