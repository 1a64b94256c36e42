use std::path::Path;

use saga_core::config::EngineConfig;

pub fn execute(root: &Path, journal: Option<&Path>) -> anyhow::Result<()> {
    let config = EngineConfig::load(&root.join(".saga/config.json"));
    let journal_path = match journal {
        Some(p) => p.to_path_buf(),
        None => config.journal_file(root),
    };

    let index = crate::open_index(root, journal)?;
    let sessions = index.by_session();
    let files = index.by_file();
    let changes: usize = files.iter().map(|f| f.total_changes).sum();

    println!("journal:  {}", journal_path.display());
    println!("title:    {}", config.journal_title);
    println!("sessions: {}", sessions.len());
    println!("files:    {}", files.len());
    println!("changes:  {changes}");
    Ok(())
}
