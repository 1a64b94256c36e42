use std::path::Path;

pub struct FilesParams<'a> {
    pub root: &'a Path,
    pub journal: Option<&'a Path>,
    pub json: bool,
}

pub fn execute(params: &FilesParams<'_>) -> anyhow::Result<()> {
    let index = crate::open_index(params.root, params.journal)?;
    let files = index.by_file();

    if files.is_empty() {
        println!("No files in the journal.");
        return Ok(());
    }

    if params.json {
        for entry in &files {
            println!("{}", serde_json::to_string(entry)?);
        }
        return Ok(());
    }

    for entry in &files {
        println!("{} ({})", entry.path, entry.total_changes);
        for sess in index.file_sessions(&entry.path) {
            println!("  {}", sess.session_title);
            for c in &sess.changes {
                println!("    {} {}", c.timestamp, c.description);
            }
        }
    }
    Ok(())
}
