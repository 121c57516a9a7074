//! Analyze command - find criticisms in a single news text.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use newsrisk_core::{
    Analysis, AnalysisSession, ExtractionRecord, HighlightColors, InputValidationError, ModelId,
    ModelReply, NewsRiskConfig, OpenAiTransport, report_file_name,
};

use super::{load_config, resolve_api_key};
use crate::terminal;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input text file (default: stdin)
    input: Option<PathBuf>,

    /// Analyze this text instead of reading a file
    #[arg(short, long, conflicts_with = "input")]
    text: Option<String>,

    /// Output file or directory (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    model: Option<ModelId>,

    /// API key (overrides OPENAI_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Use a saved model reply (JSON envelope or raw content) instead of
    /// calling the API
    #[arg(long)]
    reply_file: Option<PathBuf>,

    /// Show which parser step produced the records
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full analysis as JSON
    Json,
    /// Standalone HTML report
    Html,
    /// Highlighted text and summary for the terminal
    Text,
    /// One row per extraction record
    Csv,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Text => "txt",
            OutputFormat::Csv => "csv",
        }
    }
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model) = args.model {
        config.api.model = model;
    }
    resolve_api_key(&mut config, args.api_key.as_deref());

    let text = read_input(&args)?;

    let analysis = match &args.reply_file {
        Some(reply_path) => {
            if text.trim().is_empty() {
                return Err(InputValidationError::EmptyText.into());
            }
            info!("Using saved reply from {}", reply_path.display());
            let reply = read_reply(reply_path)?;
            Analysis::from_reply(text.trim(), &reply)
        }
        None => analyze_remote(&text, &config).await?,
    };

    let generated_at = Local::now().naive_local();
    let output = format_analysis(&analysis, args.format, &config.colors, generated_at)?;

    if let Some(output_path) = &args.output {
        let output_path = resolve_output_path(output_path, args.format, generated_at);
        fs::write(&output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }

    if args.diagnostics {
        eprintln!();
        match analysis.strategy {
            Some(strategy) => eprintln!(
                "{} {} records via {:?}",
                style("ℹ").blue(),
                analysis.records.len(),
                strategy
            ),
            None => eprintln!("{} No records parsed", style("ℹ").blue()),
        }
        for diagnostic in &analysis.diagnostics {
            eprintln!("  - {}", diagnostic);
        }
    }

    debug!("Total analysis time: {:?}", start.elapsed());

    Ok(())
}

fn read_input(args: &AnalyzeArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }

    match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            Ok(fs::read_to_string(path)?)
        }
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// A saved reply: a JSON value is taken as the envelope, anything else as
/// message content.
pub fn read_reply(path: &Path) -> anyhow::Result<ModelReply> {
    let raw = fs::read_to_string(path)?;
    Ok(match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) if value.is_object() => ModelReply::Envelope(value),
        _ => ModelReply::Content(raw),
    })
}

/// Build a transport for the configured endpoint.
pub fn build_transport(config: &NewsRiskConfig) -> anyhow::Result<OpenAiTransport> {
    Ok(OpenAiTransport::with_options(
        config.api.api_key.clone(),
        config.api.base_url.clone(),
        config.api.timeout(),
    )?)
}

async fn analyze_remote(text: &str, config: &NewsRiskConfig) -> anyhow::Result<Analysis> {
    let transport = build_transport(config)?;
    let session = AnalysisSession::new(transport, config.clone());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("Analyzing with {}...", config.api.model));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = session.analyze(text).await;
    pb.finish_and_clear();

    Ok(result?)
}

/// Render an analysis in the requested format.
pub fn format_analysis(
    analysis: &Analysis,
    format: OutputFormat,
    colors: &HighlightColors,
    generated_at: NaiveDateTime,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        OutputFormat::Html => Ok(analysis.report_html(colors, generated_at)),
        OutputFormat::Text => Ok(terminal::render_analysis(analysis)),
        OutputFormat::Csv => format_csv(&analysis.records),
    }
}

fn format_csv(records: &[ExtractionRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["company", "citation", "criticized_by"])?;
    for record in records {
        wtr.write_record([&record.company, &record.citation, &record.criticized_by])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// An existing directory receives a dated default file name.
fn resolve_output_path(path: &Path, format: OutputFormat, generated_at: NaiveDateTime) -> PathBuf {
    if path.is_dir() {
        path.join(Path::new(&report_file_name(generated_at)).with_extension(format.extension()))
    } else {
        path.to_path_buf()
    }
}
