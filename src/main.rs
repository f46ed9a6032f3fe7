mod audio;
mod documents;
mod export;
mod generation;
mod markdown;
mod protocol;
mod settings;
mod streaming;
mod transcript;
mod visualizer;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::documents::{EditableOutline, ReportStore};
use crate::generation::{GenerationError, GenerationWorkflow};
use crate::settings::Settings;
use crate::streaming::SessionConfig;
use crate::transcript::TranscriptStore;

const DEFAULT_SERVER: &str = "localhost:8000";

#[derive(Parser)]
#[command(name = "voicescribe")]
#[command(about = "Streaming dictation with two-stage report generation")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dictate: stream the microphone and watch the transcript build
    Stream {
        /// Server to stream against (host:port)
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Connect over TLS
        #[arg(long)]
        secure: bool,

        /// Stop after this many seconds (0 = until interrupted)
        #[arg(long, default_value = "0")]
        max_duration: u64,

        /// Disable the input meter
        #[arg(long)]
        no_meter: bool,
    },

    /// Show, clear or save the accumulated transcript
    Transcript {
        #[command(subcommand)]
        action: TranscriptAction,
    },

    /// Generate an outline from the transcript
    Outline {
        /// Server hosting the generation endpoints (host:port)
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Connect over TLS
        #[arg(long)]
        secure: bool,

        /// Article style: a preset (academic, business, creative,
        /// journalistic, technical, narrative, blog) or a free-text
        /// description
        #[arg(long, default_value = "academic")]
        style: String,

        /// Open the outline in $EDITOR once it is generated
        #[arg(long)]
        edit: bool,
    },

    /// Generate a report from the transcript and the edited outline
    Report {
        /// Server hosting the generation endpoints (host:port)
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,

        /// Connect over TLS
        #[arg(long)]
        secure: bool,

        /// Article style: a preset name or a free-text description
        #[arg(long, default_value = "academic")]
        style: String,
    },

    /// Export the last report as a dated markdown file
    Export {
        /// Copy the rendered text to the clipboard instead of writing
        /// a file
        #[arg(long)]
        copy: bool,
    },

    /// Show or change persistent settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List available audio input devices
    Devices,
}

#[derive(Subcommand)]
enum TranscriptAction {
    /// Print the transcript
    Show,
    /// Discard the transcript
    Clear,
    /// Write the transcript to a dated text file
    Save,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,
    /// Change one setting (language, transcription-model, report-model,
    /// report-type)
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}

fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "voicescribe", "voicescribe")
        .ok_or_else(|| anyhow!("could not determine config directory"))?;
    Ok(dirs.config_dir().join("settings.json"))
}

fn data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "voicescribe", "voicescribe")
        .ok_or_else(|| anyhow!("could not determine data directory"))?;
    Ok(dirs.data_local_dir().to_path_buf())
}

fn transcript_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("transcript.txt"))
}

fn outline_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("outline.md"))
}

fn report_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("report.md"))
}

async fn run_stream(server: &str, secure: bool, max_duration: u64, no_meter: bool) -> Result<()> {
    // Settings are read here, at session start, not cached anywhere.
    let settings = Settings::load(&config_path()?)?;
    let url = protocol::stream_url(
        server,
        secure,
        &settings.language,
        &settings.transcription_model,
    );

    let mut transcript = TranscriptStore::open(transcript_path()?)?;
    let config = SessionConfig {
        url,
        max_duration: (max_duration > 0).then(|| Duration::from_secs(max_duration)),
        show_meter: !no_meter,
    };

    streaming::run_session(config, &mut transcript).await?;
    eprintln!("transcript at {}", transcript_path()?.display());
    Ok(())
}

async fn run_outline(server: &str, secure: bool, style: &str, edit: bool) -> Result<()> {
    let transcript = TranscriptStore::open(transcript_path()?)?;
    if transcript.is_blank() {
        return Err(GenerationError::EmptyInput.into());
    }

    let workflow = GenerationWorkflow::new(server, secure);
    let style_text = settings::resolve_style(style);

    eprintln!("generating outline");
    let outline = workflow
        .generate_outline(&transcript.snapshot(), style_text)
        .await?;

    let outline_doc = EditableOutline::new(outline_path()?);
    if outline_doc.exists() {
        eprintln!("replacing the previous outline; edits to it are discarded");
    }
    outline_doc.write(&outline)?;

    println!("{outline}");
    eprintln!();
    eprintln!(
        "outline saved to {}; edit it freely before generating the report",
        outline_doc.path().display()
    );

    if edit {
        outline_doc.edit()?;
    }
    Ok(())
}

async fn run_report(server: &str, secure: bool, style: &str) -> Result<()> {
    let transcript = TranscriptStore::open(transcript_path()?)?;
    if transcript.is_blank() {
        return Err(GenerationError::EmptyInput.into());
    }

    // Read the outline as it stands right now; the user may have edited
    // it since the outline stage returned. Its absence means the outline
    // stage has not run, so the report stage stays gated.
    let outline_doc = EditableOutline::new(outline_path()?);
    let outline = outline_doc.read_current()?;

    let workflow = GenerationWorkflow::new(server, secure);
    let report_store = ReportStore::new(report_path()?);

    eprintln!("generating report");
    match workflow
        .generate_report(
            &transcript.snapshot(),
            &outline,
            settings::resolve_style(style),
        )
        .await
    {
        Ok(report) => {
            report_store.replace(&report)?;
            println!("{report}");
            eprintln!();
            eprintln!(
                "report saved to {}; export it with: voicescribe export",
                report_path()?.display()
            );
            Ok(())
        }
        Err(e) => {
            if report_store.exists() {
                eprintln!("previous report kept at {}", report_path()?.display());
            }
            Err(e.into())
        }
    }
}

fn run_export(copy: bool) -> Result<()> {
    let report_store = ReportStore::new(report_path()?);
    let source = report_store.read()?;

    if copy {
        export::copy_to_clipboard(&markdown::to_plain_text(&source))?;
        eprintln!("report copied to clipboard");
    } else {
        let dir = std::env::current_dir()?;
        let path = export::write_export(&dir, &export::report_filename(), &source)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn run_transcript(action: TranscriptAction) -> Result<()> {
    let mut store = TranscriptStore::open(transcript_path()?)?;
    match action {
        TranscriptAction::Show => {
            if store.is_blank() {
                eprintln!("transcript is empty");
            } else {
                println!("{}", store.snapshot());
            }
        }
        TranscriptAction::Clear => {
            store.clear()?;
            eprintln!("transcript cleared");
        }
        TranscriptAction::Save => {
            if store.is_blank() {
                return Err(anyhow!("no transcript to save"));
            }
            let dir = std::env::current_dir()?;
            let path = export::write_export(&dir, &export::transcript_filename(), &store.snapshot())?;
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn run_settings(action: SettingsAction) -> Result<()> {
    let path = config_path()?;
    match action {
        SettingsAction::Show => {
            let settings = Settings::load(&path)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set { key, value } => {
            let mut settings = Settings::load(&path)?;
            settings.set(&key, &value)?;
            settings.save(&path)?;
            eprintln!("updated {key}");
        }
        SettingsAction::Path => {
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn run_devices() -> Result<()> {
    let devices = audio::list_devices()?;

    println!("Available Audio Devices:");
    println!(
        "{:<40} {:<10} {:<14} Channels",
        "Name", "Default", "Sample Rate"
    );
    println!("{}", "-".repeat(72));

    for device in devices {
        let default_str = if device.is_default { "YES" } else { "NO" };
        println!(
            "{:<40} {:<10} {:<14} {}",
            device.name, default_str, device.sample_rate, device.channels
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stream {
            server,
            secure,
            max_duration,
            no_meter,
        } => run_stream(&server, secure, max_duration, no_meter).await,

        Commands::Transcript { action } => run_transcript(action),

        Commands::Outline {
            server,
            secure,
            style,
            edit,
        } => run_outline(&server, secure, &style, edit).await,

        Commands::Report {
            server,
            secure,
            style,
        } => run_report(&server, secure, &style).await,

        Commands::Export { copy } => run_export(copy),

        Commands::Settings { action } => run_settings(action),

        Commands::Devices => run_devices(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
