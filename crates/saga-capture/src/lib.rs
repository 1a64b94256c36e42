use std::collections::HashMap;
use std::path::{Path, PathBuf};

use saga_core::{Change, ChangeKind};

// ── TextSource port ──

/// Read access to live file content. Injected so capture never touches the
/// filesystem directly; tests supply an in-memory source.
pub trait TextSource {
    fn read_text(&self, path: &Path) -> anyhow::Result<String>;
}

/// Default adapter over `std::fs`.
pub struct FsTextSource;

impl TextSource for FsTextSource {
    fn read_text(&self, path: &Path) -> anyhow::Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

// ── ChangeCapture ──

/// Consumes file mutation notifications and turns them into typed `Change`
/// records tagged with the active session id. Owns the content cache (last
/// observed full text per path) used to detect no-op saves and to
/// reconstruct prior content on delete/rename.
///
/// Every handler side-effects the cache unconditionally; session state only
/// gates whether a change record is emitted. Handlers never return errors:
/// read failures degrade to "no change for that file".
pub struct ChangeCapture {
    cache: HashMap<PathBuf, String>,
    changes: Vec<Change>,
    retain_on_close: bool,
    record_sessionless: bool,
}

impl ChangeCapture {
    pub fn new(retain_on_close: bool, record_sessionless: bool) -> Self {
        ChangeCapture {
            cache: HashMap::new(),
            changes: Vec::new(),
            retain_on_close,
            record_sessionless,
        }
    }

    fn record(&mut self, session: Option<&str>, file_path: &Path, kind: ChangeKind) {
        if session.is_none() && !self.record_sessionless {
            return;
        }
        let change = Change::new(
            session.map(|s| s.to_string()),
            file_path.display().to_string(),
            kind,
        );
        tracing::debug!(
            kind = change.kind_name(),
            path = %file_path.display(),
            session = session.unwrap_or("-"),
            "captured change"
        );
        self.changes.push(change);
    }

    /// Document saved with `new_text`. Emits a Save change only when a
    /// session is active and the text differs exactly from the cached text;
    /// the cache is updated either way.
    pub fn on_save(&mut self, session: Option<&str>, path: &Path, new_text: &str) {
        let old = self.cache.get(path).cloned().unwrap_or_default();
        if old != new_text {
            self.record(
                session,
                path,
                ChangeKind::Save {
                    old_content: old,
                    new_content: new_text.to_string(),
                },
            );
        }
        self.cache.insert(path.to_path_buf(), new_text.to_string());
    }

    /// File created. Reads the full text via the source; a failed read
    /// leaves no cache entry and emits nothing.
    pub fn on_create(&mut self, session: Option<&str>, path: &Path, source: &dyn TextSource) {
        let content = match source.read_text(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("cannot read created file {}: {e}", path.display());
                return;
            }
        };
        self.record(
            session,
            path,
            ChangeKind::Create {
                content: content.clone(),
            },
        );
        self.cache.insert(path.to_path_buf(), content);
    }

    /// File deleted. The cache entry is removed regardless of session
    /// state; its last content rides along on the emitted change.
    pub fn on_delete(&mut self, session: Option<&str>, path: &Path) {
        let last = self.cache.remove(path).unwrap_or_default();
        self.record(session, path, ChangeKind::Delete { last_content: last });
    }

    /// File renamed. Migrates the cache entry old→new; tries to read the
    /// live content at the new path, falling back to the old cached text.
    pub fn on_rename(
        &mut self,
        session: Option<&str>,
        old_path: &Path,
        new_path: &Path,
        source: &dyn TextSource,
    ) {
        let old_content = self.cache.remove(old_path).unwrap_or_default();
        let content = match source.read_text(new_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    "cannot read renamed file {}, keeping cached text: {e}",
                    new_path.display()
                );
                old_content
            }
        };
        self.cache.insert(new_path.to_path_buf(), content);
        self.record(
            session,
            old_path,
            ChangeKind::Rename {
                new_file_path: new_path.display().to_string(),
            },
        );
    }

    /// Document opened (or seen by an initial scan): seed the cache so a
    /// later save diffs against this text. Read failures are ignored.
    pub fn on_open(&mut self, path: &Path, source: &dyn TextSource) {
        if self.cache.contains_key(path) {
            return;
        }
        if let Ok(content) = source.read_text(path) {
            self.cache.insert(path.to_path_buf(), content);
        }
    }

    /// Document closed. Entries survive close by default so diffs stay
    /// correct across reopen; `retain_on_close = false` drops them here.
    pub fn on_close(&mut self, path: &Path) {
        if !self.retain_on_close {
            self.cache.remove(path);
        }
    }

    // ── Read accessors (owned copies, never live references) ──

    pub fn changes(&self) -> Vec<Change> {
        self.changes.clone()
    }

    pub fn changes_for_session(&self, session_id: &str) -> Vec<Change> {
        self.changes
            .iter()
            .filter(|c| c.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect()
    }

    pub fn cached_text(&self, path: &Path) -> Option<&str> {
        self.cache.get(path).map(String::as_str)
    }

    // ── Explicit purges ──

    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    pub fn clear_session_changes(&mut self, session_id: &str) {
        self.changes
            .retain(|c| c.session_id.as_deref() != Some(session_id));
    }
}

impl Default for ChangeCapture {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory text source for tests.
    struct MapSource(HashMap<PathBuf, String>);

    impl MapSource {
        fn with(entries: &[(&str, &str)]) -> Self {
            MapSource(
                entries
                    .iter()
                    .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                    .collect(),
            )
        }
    }

    impl TextSource for MapSource {
        fn read_text(&self, path: &Path) -> anyhow::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
        }
    }

    #[test]
    fn identical_save_emits_nothing() {
        let mut cap = ChangeCapture::default();
        let p = Path::new("/p/a.rs");
        cap.on_save(Some("s1"), p, "hello");
        cap.on_save(Some("s1"), p, "hello");
        let changes = cap.changes();
        assert_eq!(changes.len(), 1);
        match &changes[0].kind {
            ChangeKind::Save {
                old_content,
                new_content,
            } => {
                assert_eq!(old_content, "");
                assert_eq!(new_content, "hello");
            }
            other => panic!("expected save, got {other:?}"),
        }
    }

    #[test]
    fn differing_save_carries_old_and_new() {
        let mut cap = ChangeCapture::default();
        let p = Path::new("/p/a.rs");
        let src = MapSource::with(&[("/p/a.rs", "v1")]);
        cap.on_open(p, &src);
        cap.on_save(Some("s1"), p, "v2");
        let changes = cap.changes_for_session("s1");
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].kind,
            ChangeKind::Save {
                old_content: "v1".into(),
                new_content: "v2".into()
            }
        );
        assert_eq!(cap.cached_text(p), Some("v2"));
    }

    #[test]
    fn idle_changes_are_discarded_by_default() {
        let mut cap = ChangeCapture::default();
        cap.on_save(None, Path::new("/p/a.rs"), "text");
        assert!(cap.changes().is_empty());
        // Cache is still updated while idle.
        assert_eq!(cap.cached_text(Path::new("/p/a.rs")), Some("text"));
    }

    #[test]
    fn sessionless_recording_is_unreachable_from_session_queries() {
        let mut cap = ChangeCapture::new(true, true);
        cap.on_save(None, Path::new("/p/a.rs"), "text");
        assert_eq!(cap.changes().len(), 1);
        assert!(cap.changes_for_session("s1").is_empty());
    }

    #[test]
    fn create_reads_content_and_seeds_cache() {
        let mut cap = ChangeCapture::default();
        let src = MapSource::with(&[("/p/new.rs", "fn f() {}")]);
        cap.on_create(Some("s1"), Path::new("/p/new.rs"), &src);
        assert_eq!(cap.cached_text(Path::new("/p/new.rs")), Some("fn f() {}"));
        assert_eq!(
            cap.changes()[0].kind,
            ChangeKind::Create {
                content: "fn f() {}".into()
            }
        );
    }

    #[test]
    fn unreadable_create_degrades_to_no_change() {
        let mut cap = ChangeCapture::default();
        let src = MapSource::with(&[]);
        cap.on_create(Some("s1"), Path::new("/p/gone.rs"), &src);
        assert!(cap.changes().is_empty());
        assert_eq!(cap.cached_text(Path::new("/p/gone.rs")), None);
    }

    #[test]
    fn delete_captures_last_content_and_evicts() {
        let mut cap = ChangeCapture::default();
        let p = Path::new("/p/a.rs");
        cap.on_save(None, p, "last text");
        cap.on_delete(Some("s1"), p);
        assert_eq!(cap.cached_text(p), None);
        assert_eq!(
            cap.changes_for_session("s1")[0].kind,
            ChangeKind::Delete {
                last_content: "last text".into()
            }
        );
    }

    #[test]
    fn rename_migrates_cache_and_records_both_paths() {
        let mut cap = ChangeCapture::default();
        let src = MapSource::with(&[]);
        cap.on_save(None, Path::new("/p/a.ts"), "body");
        cap.on_rename(Some("s1"), Path::new("/p/a.ts"), Path::new("/p/b.ts"), &src);

        assert_eq!(cap.cached_text(Path::new("/p/a.ts")), None);
        // Live read failed, so the old cached text migrated.
        assert_eq!(cap.cached_text(Path::new("/p/b.ts")), Some("body"));

        let changes = cap.changes_for_session("s1");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file_path, "/p/a.ts");
        assert_eq!(
            changes[0].kind,
            ChangeKind::Rename {
                new_file_path: "/p/b.ts".into()
            }
        );
    }

    #[test]
    fn close_retains_cache_by_default() {
        let mut cap = ChangeCapture::default();
        let p = Path::new("/p/a.rs");
        cap.on_save(None, p, "kept");
        cap.on_close(p);
        assert_eq!(cap.cached_text(p), Some("kept"));

        let mut strict = ChangeCapture::new(false, false);
        strict.on_save(None, p, "dropped");
        strict.on_close(p);
        assert_eq!(strict.cached_text(p), None);
    }

    #[test]
    fn purges_are_scoped() {
        let mut cap = ChangeCapture::default();
        cap.on_save(Some("s1"), Path::new("/p/a.rs"), "a");
        cap.on_save(Some("s2"), Path::new("/p/b.rs"), "b");
        cap.clear_session_changes("s1");
        assert!(cap.changes_for_session("s1").is_empty());
        assert_eq!(cap.changes_for_session("s2").len(), 1);
        cap.clear_changes();
        assert!(cap.changes().is_empty());
    }

    #[test]
    fn accessors_return_copies() {
        let mut cap = ChangeCapture::default();
        cap.on_save(Some("s1"), Path::new("/p/a.rs"), "a");
        let mut copy = cap.changes();
        copy.clear();
        assert_eq!(cap.changes().len(), 1);
    }

    #[test]
    fn fs_source_reads_real_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.txt");
        std::fs::write(&path, "on disk").unwrap();
        let mut cap = ChangeCapture::default();
        cap.on_create(Some("s1"), &path, &FsTextSource);
        assert_eq!(cap.cached_text(&path), Some("on disk"));
    }
}
