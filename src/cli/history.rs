//! `purrchat history`: list saved sessions newest first.

use std::error::Error;
use std::io::{self, Write};

use crate::cli::bootstrap::Paths;
use crate::core::session::{Session, SessionStore};
use crate::ui::history::HistoryEntry;

pub fn write_history<W: Write>(out: &mut W, sessions: &[Session]) -> io::Result<()> {
    if sessions.is_empty() {
        writeln!(out, "No saved sessions yet.")?;
        return Ok(());
    }
    for session in sessions {
        let entry = HistoryEntry::from_session(session);
        write!(
            out,
            "{}  {}  {} ({} turns)",
            entry.when, entry.id, entry.title, entry.turn_count
        )?;
        match &entry.preview {
            Some(preview) => writeln!(out, "  · {preview}")?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

pub fn run_history(paths: &Paths) -> Result<(), Box<dyn Error>> {
    let store = SessionStore::open(paths.history_store())?;
    let mut stdout = io::stdout().lock();
    write_history(&mut stdout, &store.list_all())?;
    Ok(())
}
