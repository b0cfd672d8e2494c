//! `vavrecon` — reconcile HVAC terminal-unit schedules against
//! selection-tool output.

mod exit_codes;
mod sink;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_MAPPING, EXIT_MISMATCH, EXIT_PERSISTENCE,
    EXIT_SUCCESS, EXIT_USAGE,
};
use sink::CsvWriteBack;
use vavrecon_engine::model::{Comparison, ComparisonSummary};
use vavrecon_engine::{
    load_csv_table, mapping, EngineError, JobConfig, PendingEdit, Table,
};

#[derive(Parser)]
#[command(name = "vavrecon")]
#[command(about = "Reconcile terminal-unit schedules against selection-tool output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a column mapping from the secondary source's headers
    #[command(after_help = "\
Examples:
  vavrecon suggest job.toml
  vavrecon suggest job.toml --json")]
    Suggest {
        /// Path to the job .toml config file
        config: PathBuf,

        /// Output the full suggestion as JSON instead of a TOML block
        #[arg(long)]
        json: bool,
    },

    /// Validate a job config without running
    #[command(after_help = "\
Examples:
  vavrecon validate job.toml")]
    Validate {
        /// Path to the job .toml config file
        config: PathBuf,
    },

    /// Run the comparison and report per-unit classifications
    #[command(after_help = "\
Examples:
  vavrecon run job.toml
  vavrecon run job.toml --json
  vavrecon run job.toml --output report.json")]
    Run {
        /// Path to the job .toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Apply coil-row edits to the primary schedule file
    #[command(after_help = "\
Examples:
  vavrecon apply job.toml --edits edits.json")]
    Apply {
        /// Path to the job .toml config file
        config: PathBuf,

        /// JSON file with {\"edits\": [{\"identifier\", \"hw_rows\"}]}
        #[arg(long)]
        edits: PathBuf,
    },
}

struct CliError {
    code: u8,
    message: String,
}

fn cli_err(code: u8, message: impl Into<String>) -> CliError {
    CliError { code, message: message.into() }
}

fn engine_err(e: EngineError) -> CliError {
    let code = match &e {
        EngineError::ConfigParse(_) | EngineError::InvalidThreshold { .. } => EXIT_INVALID_CONFIG,
        EngineError::TagUnmapped => EXIT_MAPPING,
        EngineError::Persistence { .. } => EXIT_PERSISTENCE,
        EngineError::InvalidHwRows { .. } => EXIT_USAGE,
        _ => EXIT_ERROR,
    };
    cli_err(code, e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Suggest { config, json } => cmd_suggest(config, json),
        Commands::Validate { config } => cmd_validate(config),
        Commands::Run { config, json, output } => cmd_run(config, json, output),
        Commands::Apply { config, edits } => cmd_apply(config, edits),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}

fn load_config(path: &Path) -> Result<JobConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| cli_err(EXIT_ERROR, format!("cannot read config: {e}")))?;
    JobConfig::from_toml(&config_str).map_err(engine_err)
}

/// Resolve source file paths relative to the config file's directory.
fn load_table(config_path: &Path, file: &str, role: &str) -> Result<Table, CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let path = base_dir.join(file);
    let data = std::fs::read_to_string(&path)
        .map_err(|e| cli_err(EXIT_ERROR, format!("cannot read {}: {e}", path.display())))?;
    let table = load_csv_table(&data).map_err(engine_err)?;
    info!(role, path = %path.display(), rows = table.rows.len(), "loaded table");
    Ok(table)
}

fn cmd_suggest(config_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let secondary = load_table(&config_path, &config.sources.secondary.file, "secondary")?;

    let suggestion = mapping::MappingSuggestion {
        target_fields: vavrecon_engine::model::TARGET_FIELDS
            .iter()
            .map(|f| f.to_string())
            .collect(),
        source_fields: secondary.columns.clone(),
        suggested: mapping::suggest_default(&secondary.columns),
    };

    if suggestion.suggested.tag_source().is_none() {
        warn!("no column matched the mandatory 'Tag' field; map it by hand");
    }

    if json_output {
        let json_str = serde_json::to_string_pretty(&suggestion)
            .map_err(|e| cli_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        // TOML block, ready to paste into the job config.
        println!("[mapping]");
        for (target, source) in suggestion.suggested.iter() {
            println!("{target} = {source:?}");
        }
    }
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let mapped = config.mapping.iter().count();
    eprintln!(
        "valid: job '{}', {} field(s) mapped, tag {}",
        config.name,
        mapped,
        match config.mapping.tag_source() {
            Some(col) => format!("mapped to '{col}'"),
            None => "unmapped (required before `run`)".to_string(),
        },
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunMeta {
    job_name: String,
    engine_version: String,
    run_at: String,
}

#[derive(Serialize)]
struct RunReport {
    meta: RunMeta,
    summary: ComparisonSummary,
    results: Vec<ResultLine>,
}

/// One result row with a display tag that shows the normalization when
/// it changed anything, e.g. `v-1-1 -> v-1-01`.
#[derive(Serialize)]
struct ResultLine {
    display_tag: String,
    #[serde(flatten)]
    result: vavrecon_engine::ComparisonResult,
}

fn run_report(job_name: &str, comparison: Comparison) -> RunReport {
    let results = comparison
        .results
        .into_iter()
        .map(|result| {
            let display_tag = if result.unit_tag != result.normalized_tag {
                format!("{} -> {}", result.unit_tag, result.normalized_tag)
            } else {
                result.unit_tag.clone()
            };
            ResultLine { display_tag, result }
        })
        .collect();
    RunReport {
        meta: RunMeta {
            job_name: job_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: comparison.summary,
        results,
    }
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let primary = load_table(&config_path, &config.sources.primary.file, "primary")?;
    let secondary = load_table(&config_path, &config.sources.secondary.file, "secondary")?;

    let comparison =
        vavrecon_engine::compare(&primary, &secondary, &config.mapping, &config.thresholds)
            .map_err(engine_err)?;
    let summary = comparison.summary.clone();
    info!(total = summary.total, fail = summary.fail, "comparison complete");

    let report = run_report(&config.name, comparison);
    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| cli_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| cli_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    eprintln!(
        "'{}': {} unit(s): {} pass, {} warning, {} fail, {} not found",
        config.name, summary.total, summary.pass, summary.warning, summary.fail,
        summary.not_found,
    );

    if summary.fail > 0 || summary.not_found > 0 {
        return Err(cli_err(EXIT_MISMATCH, "failing or unmatched units found"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EditsFile {
    edits: Vec<PendingEdit>,
}

fn cmd_apply(config_path: PathBuf, edits_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let primary = load_table(&config_path, &config.sources.primary.file, "primary")?;

    let edits_str = std::fs::read_to_string(&edits_path)
        .map_err(|e| cli_err(EXIT_ERROR, format!("cannot read edits: {e}")))?;
    let edits_file: EditsFile = serde_json::from_str(&edits_str)
        .map_err(|e| cli_err(EXIT_USAGE, format!("malformed edits file: {e}")))?;
    if edits_file.edits.is_empty() {
        return Err(cli_err(EXIT_USAGE, "no edits provided"));
    }

    // Baseline from the schedule itself, so unchanged values are dropped
    // rather than rewritten.
    let mut batch = vavrecon_engine::EditBatch::new();
    for row in &primary.rows {
        if let (Some(tag), Some(rows)) = (
            row.display(vavrecon_engine::model::TAG_FIELD),
            row.number(vavrecon_engine::model::HW_ROWS_FIELD),
        ) {
            batch.set_baseline(&tag, rows as i64);
        }
    }
    for edit in &edits_file.edits {
        batch.stage(&edit.identifier, edit.hw_rows).map_err(engine_err)?;
    }
    if !batch.is_dirty() {
        eprintln!("nothing to do: all edits match the committed values");
        return Ok(());
    }

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let target = base_dir.join(&config.sources.primary.file);
    let mut sink = CsvWriteBack::new(target);
    let report = batch.commit(&mut sink).map_err(engine_err)?;

    eprintln!(
        "committed {} edit(s), backup at {}",
        report.committed_count, report.backup_file,
    );
    for failure in &report.failures {
        warn!(identifier = %failure.identifier, reason = %failure.reason, "edit not applied");
        eprintln!("  failed: {}: {}", failure.identifier, failure.reason);
    }

    if !report.failures.is_empty() {
        return Err(cli_err(
            EXIT_PERSISTENCE,
            format!("{} edit(s) could not be applied", report.failures.len()),
        ));
    }
    Ok(())
}
