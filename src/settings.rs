//! Persistent user settings
//!
//! A small JSON record in the config directory. Field names mirror the
//! stored record of the original web client, so an existing settings file
//! carries over unchanged.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Named article style presets and the description text each expands to
pub const STYLE_PRESETS: &[(&str, &str)] = &[
    (
        "academic",
        "Formal, structured writing with citations, technical terminology, and evidence-based arguments. Suitable for research papers and scholarly articles.",
    ),
    (
        "business",
        "Clear, concise, and action-oriented with executive summaries, data-driven insights, and professional tone. Ideal for business reports and proposals.",
    ),
    (
        "creative",
        "Expressive, imaginative writing with vivid descriptions, narrative elements, and engaging storytelling techniques.",
    ),
    (
        "journalistic",
        "Objective, fact-based reporting with clear headlines, concise paragraphs, and the inverted pyramid structure (most important information first).",
    ),
    (
        "technical",
        "Precise, detailed explanations with specialized terminology, step-by-step instructions, and diagrams or code examples where appropriate.",
    ),
    (
        "narrative",
        "Story-driven approach with character development, plot progression, and descriptive scenes that engage the reader emotionally.",
    ),
    (
        "blog",
        "Conversational, accessible tone with personal insights, practical advice, and engaging headings. Often includes lists and actionable takeaways.",
    ),
];

/// Expand a preset name to its description text; anything else is treated
/// as a custom style description and passed through verbatim
pub fn resolve_style(style: &str) -> &str {
    for (name, description) in STYLE_PRESETS {
        if style.eq_ignore_ascii_case(name) {
            return description;
        }
    }
    style
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub language: String,
    pub transcription_model: String,
    pub report_model: String,
    pub report_type: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            transcription_model: "distil-large-v3".to_string(),
            report_model: "google/gemini-2.0-flash-001".to_string(),
            report_type: "summary".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when no file
    /// exists yet
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("invalid settings file at {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read settings at {}", path.display()))
            }
        }
    }

    /// Write settings to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write settings at {}", path.display()))
    }

    /// Update one field by its CLI key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "language" => self.language = value.to_string(),
            "transcription-model" => self.transcription_model = value.to_string(),
            "report-model" => self.report_model = value.to_string(),
            "report-type" => self.report_type = value.to_string(),
            other => {
                return Err(anyhow!(
                    "unknown setting '{other}' (expected language, transcription-model, report-model or report-type)"
                ))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_client() {
        let settings = Settings::default();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.transcription_model, "distil-large-v3");
        assert_eq!(settings.report_model, "google/gemini-2.0-flash-001");
        assert_eq!(settings.report_type, "summary");
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.set("language", "de").unwrap();
        settings.set("report-type", "detailed").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.language, "de");
        assert_eq!(loaded.report_type, "detailed");
        assert_eq!(loaded.transcription_model, "distil-large-v3");
    }

    #[test]
    fn test_stored_record_uses_camel_case_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json.get("transcriptionModel").is_some());
        assert!(json.get("reportModel").is_some());
        assert!(json.get("reportType").is_some());
    }

    #[test]
    fn test_partial_record_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"language": "fr"}"#).unwrap();
        assert_eq!(settings.language, "fr");
        assert_eq!(settings.report_type, "summary");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut settings = Settings::default();
        assert!(settings.set("volume", "11").is_err());
    }

    #[test]
    fn test_resolve_style_expands_presets() {
        assert!(resolve_style("academic").contains("scholarly articles"));
        assert!(resolve_style("Blog").contains("Conversational"));
        assert_eq!(resolve_style("in the style of a pirate"), "in the style of a pirate");
    }
}
