use std::path::Path;

pub struct SessionsParams<'a> {
    pub root: &'a Path,
    pub journal: Option<&'a Path>,
    pub limit: usize,
    pub json: bool,
}

pub fn execute(params: &SessionsParams<'_>) -> anyhow::Result<()> {
    let index = crate::open_index(params.root, params.journal)?;
    let mut sessions = index.by_session().to_vec();
    if params.limit > 0 {
        sessions.truncate(params.limit);
    }

    if sessions.is_empty() {
        println!("No sessions in the journal.");
        return Ok(());
    }

    if params.json {
        for s in &sessions {
            println!("{}", serde_json::to_string(s)?);
        }
    } else {
        for s in &sessions {
            let changes: usize = s.files.iter().map(|f| f.changes.len()).sum();
            println!("{}  ({} files, {} changes)", s.title, s.files.len(), changes);
            for f in &s.files {
                println!("  {}", f.path);
                for c in &f.changes {
                    println!("    {} {}", c.timestamp, c.description);
                }
            }
        }
        println!("\n({} sessions shown)", sessions.len());
    }
    Ok(())
}
