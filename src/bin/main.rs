use clap::{Parser, Subcommand};
use log::{debug, error};
use mentionkit::config::{self, MentionSettings};
use mentionkit::text::offsets::slice_chars;
use mentionkit::{
    EditSource, MentionController, MentionDirectory, MentionError, MentionResult, MentionSpan,
    SyntaxRegistry,
};
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Mention-aware plain-text buffers: decode, encode and replay edits
#[derive(Parser)]
#[command(name = "mentionkit")]
#[command(version)]
#[command(about = "Track mention spans in plain text across edits")]
struct Cli {
    /// Config file applied over the user and project configs
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root searched for mentionkit.toml (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a markup file and print its plain text and spans as JSON
    Decode {
        markup: PathBuf,

        /// JSON file mapping syntax names to lists of mention objects
        #[arg(long)]
        directory: Option<PathBuf>,
    },
    /// Encode a JSON document of text and spans back into markup
    Encode { document: PathBuf },
    /// Load markup, then feed successive buffer states as user edits
    Replay {
        markup: PathBuf,

        /// JSON file holding an array of buffer states
        steps: PathBuf,

        /// JSON file mapping syntax names to lists of mention objects
        #[arg(long)]
        directory: Option<PathBuf>,
    },
    /// Print the merged settings as TOML
    Config,
}

/// Input of the `encode` subcommand
#[derive(Deserialize)]
struct EncodeDocument {
    text: String,
    #[serde(default)]
    spans: Vec<SpanDocument>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpanDocument {
    id: String,
    start: usize,
    end: usize,
    syntax: String,
    /// Defaults to the buffer slice `[start, end)`
    #[serde(default)]
    display_text: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "mentionkit::cli", "{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> MentionResult<()> {
    let root = match cli.root {
        Some(root) => Some(root),
        None => std::env::current_dir().ok(),
    };
    let outcome = config::load_settings(root.as_deref(), cli.config.as_deref());
    for event in &outcome.events {
        event.log();
    }
    let settings = outcome.settings;

    match cli.command {
        Commands::Decode { markup, directory } => {
            let registry = settings.build_registry()?;
            let directory = load_directory(directory.as_deref())?;
            let markup = fs::read_to_string(markup)?;
            let decoded = mentionkit::decode(&markup, &registry, &directory);
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
        Commands::Encode { document } => {
            let registry = settings.build_registry()?;
            let document: EncodeDocument = serde_json::from_str(&fs::read_to_string(document)?)?;
            let spans = build_spans(&document, &registry)?;
            println!("{}", mentionkit::encode(&document.text, &spans));
        }
        Commands::Replay {
            markup,
            steps,
            directory,
        } => replay(&settings, &markup, &steps, directory.as_deref())?,
        Commands::Config => {
            let rendered = toml::to_string_pretty(&settings)
                .map_err(|err| MentionError::config(err.to_string()))?;
            print!("{}", rendered);
        }
    }
    Ok(())
}

fn load_directory(path: Option<&Path>) -> MentionResult<MentionDirectory> {
    match path {
        Some(path) => {
            let directory: MentionDirectory = serde_json::from_str(&fs::read_to_string(path)?)?;
            debug!(
                target: "mentionkit::cli",
                "Loaded {} mention object(s) from {}",
                directory.len(),
                path.display()
            );
            Ok(directory)
        }
        None => Ok(MentionDirectory::new()),
    }
}

fn build_spans(
    document: &EncodeDocument,
    registry: &SyntaxRegistry,
) -> MentionResult<Vec<MentionSpan>> {
    let mut spans = document
        .spans
        .iter()
        .map(|span| {
            let syntax = registry.get(&span.syntax).ok_or_else(|| {
                MentionError::config(format!("unknown syntax '{}'", span.syntax))
            })?;
            let display_text = match &span.display_text {
                Some(display_text) => display_text.clone(),
                None => slice_chars(&document.text, span.start, span.end)
                    .unwrap_or_default()
                    .to_string(),
            };
            Ok(MentionSpan {
                id: span.id.clone(),
                display_text,
                start: span.start,
                end: span.end,
                syntax: Arc::clone(syntax),
            })
        })
        .collect::<MentionResult<Vec<_>>>()?;
    spans.sort_by_key(|span| span.start);
    Ok(spans)
}

fn replay(
    settings: &MentionSettings,
    markup: &Path,
    steps: &Path,
    directory: Option<&Path>,
) -> MentionResult<()> {
    let directory = load_directory(directory)?;
    let markup = fs::read_to_string(markup)?;
    let steps: Vec<String> = serde_json::from_str(&fs::read_to_string(steps)?)?;

    let mut controller = MentionController::from_settings(settings)?;
    controller.on_composition_changed(|changed| {
        debug!(
            target: "mentionkit::cli",
            "Composition changed: syntax={:?} search={:?}",
            changed.syntax.as_ref().map(|syntax| syntax.name()),
            changed.search_text
        );
    });
    controller.load_markup(&markup, &directory);

    for (index, step) in steps.iter().enumerate() {
        let outcome = controller.apply_edit(step, EditSource::User)?;
        let removed: Vec<&str> = outcome.removed.iter().map(|span| span.id.as_str()).collect();
        let line = json!({
            "step": index,
            "text": controller.text(),
            "spans": controller.spans(),
            "removed": removed,
            "replacement": outcome.replacement,
            "caret": outcome.caret,
            "composing": controller.search_syntax().map(|syntax| syntax.name()),
            "searchText": controller.search_text(),
        });
        println!("{}", line);
    }
    println!("{}", json!({ "markup": controller.export_markup() }));
    Ok(())
}
