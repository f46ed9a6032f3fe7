//! Generated documents on disk
//!
//! The outline lives as a plain markdown file the user can edit with any
//! tool; the report stage re-reads it at request time, so edits always win
//! over whatever the outline stage originally returned. The stored report
//! is only ever replaced by a successful generation, which keeps the last
//! good report around when a later attempt fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};

/// The user-editable outline between the two generation stages
pub struct EditableOutline {
    path: PathBuf,
}

impl EditableOutline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an outline exists to base a report on
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the outline with freshly generated content. Edits made to
    /// the previous outline are discarded with it.
    pub fn write(&self, outline: &str) -> Result<()> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, outline)
            .with_context(|| format!("failed to write outline at {}", self.path.display()))
    }

    /// The outline as it stands right now, user edits included
    pub fn read_current(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(anyhow!("no outline has been generated yet"))
            }
            Err(e) => {
                Err(e).with_context(|| format!("failed to read outline at {}", self.path.display()))
            }
        }
    }

    /// Open the outline in `$EDITOR` and wait for the editor to close
    pub fn edit(&self) -> Result<()> {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
        let status = Command::new(&editor)
            .arg(&self.path)
            .status()
            .with_context(|| format!("failed to launch editor '{editor}'"))?;

        if !status.success() {
            return Err(anyhow!("editor exited with {status}"));
        }
        Ok(())
    }
}

/// The last successfully generated report
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the stored report. Called only on generation success.
    pub fn replace(&self, report: &str) -> Result<()> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, report)
            .with_context(|| format!("failed to write report at {}", self.path.display()))
    }

    /// The raw markdown source of the last successful report
    pub fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(anyhow!("no report has been generated yet"))
            }
            Err(e) => {
                Err(e).with_context(|| format!("failed to read report at {}", self.path.display()))
            }
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let outline = EditableOutline::new(dir.path().join("outline.md"));

        assert!(!outline.exists());
        outline.write("- A\n- B\n- C").unwrap();
        assert!(outline.exists());
        assert_eq!(outline.read_current().unwrap(), "- A\n- B\n- C");
    }

    #[test]
    fn test_read_current_sees_user_edits() {
        let dir = tempfile::tempdir().unwrap();
        let outline = EditableOutline::new(dir.path().join("outline.md"));

        outline.write("- A\n- B\n- C").unwrap();
        // The user edits the file out from under us.
        fs::write(outline.path(), "- A\n- B\n- D").unwrap();

        assert_eq!(outline.read_current().unwrap(), "- A\n- B\n- D");
    }

    #[test]
    fn test_regenerating_discards_previous_edits() {
        let dir = tempfile::tempdir().unwrap();
        let outline = EditableOutline::new(dir.path().join("outline.md"));

        outline.write("- old").unwrap();
        fs::write(outline.path(), "- old, edited").unwrap();
        outline.write("- new").unwrap();

        assert_eq!(outline.read_current().unwrap(), "- new");
    }

    #[test]
    fn test_missing_outline_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let outline = EditableOutline::new(dir.path().join("outline.md"));
        assert!(outline.read_current().is_err());
    }

    #[test]
    fn test_report_persists_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReportStore::new(dir.path().join("report.md"));

        assert!(!report.exists());
        assert!(report.read().is_err());

        report.replace("# Findings\n\nText.").unwrap();
        assert_eq!(report.read().unwrap(), "# Findings\n\nText.");
    }
}
