pub mod config;
pub mod summarize;
pub mod types;

pub use types::*;

/// Fresh session id: `ses_<ulid>`
pub fn new_session_id() -> String {
    format!("ses_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Fresh change id: `chg_<ulid>`
pub fn new_change_id() -> String {
    format!("chg_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Current instant, UTC.
pub fn now() -> time::OffsetDateTime {
    time::OffsetDateTime::now_utc()
}

/// Session label as written into journal headers: `YYYY-MM-DD HH:MM:SS`.
pub fn session_label(ts: time::OffsetDateTime) -> String {
    let fmt = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    ts.format(&fmt)
        .expect("session label formatting should not fail")
}

/// Wall-clock timestamp for change lines: `HH:MM:SS`.
pub fn change_clock(ts: time::OffsetDateTime) -> String {
    let fmt = time::macros::format_description!("[hour]:[minute]:[second]");
    ts.format(&fmt)
        .expect("clock formatting should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_prefixes() {
        assert!(new_session_id().starts_with("ses_"));
        assert!(new_change_id().starts_with("chg_"));
        assert_ne!(new_change_id(), new_change_id());
    }

    #[test]
    fn label_formats() {
        let ts = time::macros::datetime!(2026-03-05 09:07:02 UTC);
        assert_eq!(session_label(ts), "2026-03-05 09:07:02");
        assert_eq!(change_clock(ts), "09:07:02");
    }
}
