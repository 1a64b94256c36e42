use std::path::Path;

pub struct LocateParams<'a> {
    pub root: &'a Path,
    pub journal: Option<&'a Path>,
    pub time: &'a str,
    pub desc: &'a str,
    pub session: Option<&'a str>,
    pub file: Option<&'a str>,
}

pub fn execute(params: &LocateParams<'_>) -> anyhow::Result<()> {
    let index = crate::open_index(params.root, params.journal)?;
    match index.locate(params.time, params.desc, params.session, params.file) {
        Some(line) => {
            println!("{line}");
            Ok(())
        }
        None => {
            eprintln!("not found");
            std::process::exit(1);
        }
    }
}
