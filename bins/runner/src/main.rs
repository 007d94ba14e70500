//! Ledgerflow batch runner
//!
//! Reads journal entries, mapping rules and the chart of accounts from JSON
//! files, runs the processing pipeline, and writes the report as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgerflow_core::hierarchy::AccountHierarchy;
use ledgerflow_core::journal::{JournalEntry, TypeMapping, TypeMappingRow};
use ledgerflow_core::pipeline::{ProcessingInput, ProcessingPipeline, ProcessingReport};
use ledgerflow_core::rules::MappingRule;
use ledgerflow_shared::config::LoggingConfig;
use ledgerflow_shared::{AppConfig, AppError};

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(&LoggingConfig::default());
            let err = AppError::from(err);
            error!(code = err.error_code(), "{err}");
            return exit_code(&err);
        }
    };
    init_tracing(&config.logging);

    match run(&config) {
        Ok(path) => {
            info!(path = %path.display(), "Report written");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let app = err.downcast_ref::<AppError>();
            error!(
                code = app.map_or("INTERNAL_ERROR", AppError::error_code),
                "{err:#}"
            );
            app.map_or(ExitCode::FAILURE, exit_code)
        }
    }
}

fn exit_code(err: &AppError) -> ExitCode {
    u8::try_from(err.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn run(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let input = load_input(config)?;
    info!(
        entries = input.entries.len(),
        rules = input.rules.len(),
        hierarchy = input.hierarchy.is_some(),
        type_mapping = input.type_mapping.is_some(),
        "Loaded inputs"
    );

    let report = ProcessingPipeline::new(&config.engine)
        .run(input)
        .map_err(AppError::from)?;
    log_summary(&report);

    let path = Path::new(&config.output.directory).join(&config.output.report_file);
    write_report(&report, &path)?;
    Ok(path)
}

/// Reads every configured input file.
fn load_input(config: &AppConfig) -> anyhow::Result<ProcessingInput> {
    let entries: Vec<JournalEntry> = read_json(&config.input.journal_file)?;
    let rules: Vec<MappingRule> = read_json(&config.input.rules_file)?;

    let hierarchy = config
        .input
        .hierarchy_file
        .as_deref()
        .map(read_json::<AccountHierarchy>)
        .transpose()?;

    let type_mapping = config
        .input
        .type_mapping_file
        .as_deref()
        .map(read_json::<Vec<TypeMappingRow>>)
        .transpose()?
        .map(|rows| TypeMapping::from_rows(rows, config.engine.type_mapping_floor_year));

    Ok(ProcessingInput {
        entries,
        rules,
        hierarchy,
        type_mapping,
    })
}

fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&raw)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to parse {path}"))
}

fn write_report(report: &ProcessingReport, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(AppError::from)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    fs::write(path, json)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn log_summary(report: &ProcessingReport) {
    let s = &report.summary;
    info!(
        run_id = %report.run_id,
        entries = s.total_entries,
        rejected = s.rejected_entries,
        active_rules = s.active_rules,
        postings = s.postings,
        unmatched = s.unmatched_entries,
        total_cr = %s.total_cr,
        total_dr = %s.total_dr,
        net = %s.net,
        "Processing summary"
    );
    if report.has_blocking_issues() {
        warn!(
            rule_issues = s.blocking_rule_issues,
            "Run finished with blocking issues"
        );
    }
    if s.totals_mismatches > 0 {
        warn!(mismatches = s.totals_mismatches, "Hierarchy totals mismatches");
    }
}
