//! Transcript buffer
//!
//! Fragments arrive in socket order and are appended verbatim; the
//! recognizer includes its own spacing, so there are no separators. The
//! buffer is append-only while streaming and survives across invocations
//! on disk. Only an explicit clear empties it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub struct TranscriptStore {
    path: PathBuf,
    fragments: Vec<String>,
}

impl TranscriptStore {
    /// Open the store at `path`, restoring any previously captured text
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let fragments = match fs::read_to_string(&path) {
            Ok(text) if !text.is_empty() => vec![text],
            Ok(_) => Vec::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read transcript at {}", path.display()))
            }
        };

        Ok(Self { path, fragments })
    }

    /// Append one fragment, persisting it immediately
    pub fn append(&mut self, fragment: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open transcript at {}", self.path.display()))?;
        file.write_all(fragment.as_bytes())
            .context("failed to append transcript fragment")?;

        self.fragments.push(fragment.to_string());
        Ok(())
    }

    /// The full transcript in arrival order
    pub fn snapshot(&self) -> String {
        self.fragments.concat()
    }

    /// Whether there is any transcribable content
    pub fn is_blank(&self) -> bool {
        self.fragments.iter().all(|f| f.trim().is_empty())
    }

    /// Discard the transcript, on disk as well
    pub fn clear(&mut self) -> Result<()> {
        self.fragments.clear();
        fs::write(&self.path, "")
            .with_context(|| format!("failed to clear transcript at {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_append_in_order_without_separators() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TranscriptStore::open(dir.path().join("transcript.txt")).unwrap();

        store.append(" hello").unwrap();
        store.append(" world").unwrap();
        store.append(".").unwrap();

        assert_eq!(store.snapshot(), " hello world.");
    }

    #[test]
    fn test_transcript_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.txt");

        {
            let mut store = TranscriptStore::open(&path).unwrap();
            store.append("first session").unwrap();
        }

        let store = TranscriptStore::open(&path).unwrap();
        assert_eq!(store.snapshot(), "first session");
    }

    #[test]
    fn test_clear_empties_memory_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.txt");

        let mut store = TranscriptStore::open(&path).unwrap();
        store.append("some words").unwrap();
        store.clear().unwrap();

        assert_eq!(store.snapshot(), "");
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        let reopened = TranscriptStore::open(&path).unwrap();
        assert_eq!(reopened.snapshot(), "");
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::open(dir.path().join("none.txt")).unwrap();
        assert!(store.is_blank());
    }

    #[test]
    fn test_whitespace_only_counts_as_blank() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TranscriptStore::open(dir.path().join("transcript.txt")).unwrap();

        store.append("  \n ").unwrap();
        assert!(store.is_blank());

        store.append(" words").unwrap();
        assert!(!store.is_blank());
    }
}
