//! Batch command - analyze multiple news text files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use newsrisk_core::{Analysis, AnalysisSession, ModelId, OpenAiTransport};

use super::analyze::{OutputFormat, build_transport, format_analysis, read_reply};
use super::{load_config, resolve_api_key};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of text files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    model: Option<ModelId>,

    /// API key (overrides OPENAI_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Directory of saved replies named `<file stem>.json` or `<file stem>.txt`;
    /// when given, no API calls are made
    #[arg(long)]
    replies_dir: Option<PathBuf>,
}

/// Result of analyzing a single file.
struct FileResult {
    path: PathBuf,
    analysis: Option<Analysis>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model) = args.model {
        config.api.model = model;
    }
    resolve_api_key(&mut config, args.api_key.as_deref());

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "md" | "text")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to analyze",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let session = match args.replies_dir {
        Some(_) => None,
        None => Some(AnalysisSession::new(build_transport(&config)?, config.clone())),
    };

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // One call in flight at a time
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let result = analyze_file(&path, session.as_ref(), args.replies_dir.as_deref()).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(analysis) => results.push(FileResult {
                path,
                analysis: Some(analysis),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to analyze {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        analysis: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to analyze {}: {}", path.display(), error_msg);
                    anyhow::bail!("Analysis failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.analysis.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        let generated_at = Local::now().naive_local();
        for result in &successful {
            let Some(analysis) = &result.analysis else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("analysis");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            let content = format_analysis(analysis, args.format, &config.colors, generated_at)?;
            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Analyzed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn analyze_file(
    path: &Path,
    session: Option<&AnalysisSession<OpenAiTransport>>,
    replies_dir: Option<&Path>,
) -> anyhow::Result<Analysis> {
    let text = fs::read_to_string(path)?;

    match (session, replies_dir) {
        (Some(session), _) => Ok(session.analyze(&text).await?),
        (None, Some(dir)) => {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            let reply_path = ["json", "txt"]
                .iter()
                .map(|ext| dir.join(format!("{}.{}", stem, ext)))
                .find(|p| p.exists())
                .ok_or_else(|| anyhow::anyhow!("No saved reply for {} in {}", stem, dir.display()))?;

            if text.trim().is_empty() {
                anyhow::bail!("File is empty");
            }
            Ok(Analysis::from_reply(text.trim(), &read_reply(&reply_path)?))
        }
        (None, None) => anyhow::bail!("No transport or saved replies configured"),
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "records",
        "companies",
        "strategy",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(analysis) = &result.analysis {
            let companies = analysis
                .summary
                .summary()
                .map(|s| s.companies().collect::<Vec<_>>().join("; "))
                .unwrap_or_default();
            let strategy = analysis
                .strategy
                .map(|s| format!("{:?}", s))
                .unwrap_or_default();

            wtr.write_record([
                filename,
                "success",
                &analysis.records.len().to_string(),
                &companies,
                &strategy,
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
