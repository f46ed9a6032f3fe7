//! Exported artifacts and clipboard copy
//!
//! The transcript exports as dated plain text and the report as its dated
//! raw markdown source; the clipboard instead receives rendered reading
//! text. Clipboard access goes through the session's native tool, wl-copy
//! or xclip.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context, Result};
use jiff::Zoned;

#[derive(Debug, Clone)]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

impl DisplayServer {
    /// Detect which display server is currently running
    pub fn detect() -> Self {
        if env::var("WAYLAND_DISPLAY").is_ok()
            || env::var("XDG_SESSION_TYPE").as_ref().map(|s| s.as_str()) == Ok("wayland")
        {
            return DisplayServer::Wayland;
        }
        if env::var("DISPLAY").is_ok() {
            return DisplayServer::X11;
        }
        DisplayServer::Unknown
    }

    fn clipboard_command(&self) -> Result<Command> {
        match self {
            DisplayServer::Wayland => {
                let mut cmd = Command::new("wl-copy");
                cmd.args(["--type", "text/plain;charset=utf-8"]);
                Ok(cmd)
            }
            DisplayServer::X11 => {
                let mut cmd = Command::new("xclip");
                cmd.args(["-selection", "clipboard"]);
                Ok(cmd)
            }
            DisplayServer::Unknown => Err(anyhow!(
                "no display server detected; clipboard copy is unavailable"
            )),
        }
    }
}

/// Copy text to the system clipboard
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut cmd = DisplayServer::detect().clipboard_command()?;
    let tool = cmd.get_program().to_string_lossy().to_string();

    let mut child = cmd
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to run {tool} (is it installed?)"))?;

    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("failed to pipe text to {tool}"))?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{tool} failed: {stderr}"));
    }

    Ok(())
}

/// Export file name for the transcript: `transcript_YYYY-MM-DD.txt`
pub fn transcript_filename() -> String {
    format!("transcript_{}.txt", Zoned::now().strftime("%Y-%m-%d"))
}

/// Export file name for the report: `report-YYYY-MM-DD.md`
pub fn report_filename() -> String {
    format!("report-{}.md", Zoned::now().strftime("%Y-%m-%d"))
}

/// Write an export into `dir`, returning the full path
pub fn write_export(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)
        .with_context(|| format!("failed to write export at {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_filename_is_dated_text() {
        let name = transcript_filename();
        assert!(name.starts_with("transcript_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "transcript_2025-01-01.txt".len());
    }

    #[test]
    fn test_report_filename_is_dated_markdown() {
        let name = report_filename();
        assert!(name.starts_with("report-"));
        assert!(name.ends_with(".md"));
        assert_eq!(name.len(), "report-2025-01-01.md".len());
    }

    #[test]
    fn test_write_export_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "report-2025-01-01.md", "# Title").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "# Title");
    }
}
