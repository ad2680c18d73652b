//! Regression suite runner CLI
//!
//! The `regress` command runs a set of simulation input cases against two
//! simulator builds and classifies how their outputs differ.
//!
//! ## Commands
//!
//! - `run`: Run a suite and write its JSON and markdown reports
//! - `validate`: Check the on-disk layout of builds and install directory
//! - `summarize`: Render a previously written JSON report

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use regress_core::reporting::{
    read_summary_json, render_summary_md, suite_fingerprint, write_summary_json,
    write_summary_md, SuiteReport, REPORT_SCHEMA_VERSION,
};
use regress_core::validation::all_ok;
use regress_core::{
    obs, verify_suite_layout, DiffClassifier, RunMode, SuiteEvent, SuiteGate, SuiteRequest,
    SuiteScheduler,
};
use regress_pipeline::CasePipeline;
use tracing::{debug, info, warn, Level};

use crate::config::{Overrides, SuiteConfig};

const SUMMARY_JSON: &str = "regress-summary.json";
const SUMMARY_MD: &str = "regress-summary.md";

#[derive(Parser)]
#[command(name = "regress")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulation regression suite runner", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every case against the configured builds and diff the outputs
    Run {
        #[command(flatten)]
        suite: SuiteArgs,

        /// Directory receiving the summary reports
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Skip the directory layout check before running
        #[arg(long)]
        skip_verify: bool,

        /// Also fail on small numeric and textual differences
        #[arg(long)]
        strict: bool,
    },

    /// Verify build directories and install-directory tools
    Validate {
        #[command(flatten)]
        suite: SuiteArgs,
    },

    /// Print the markdown summary of a JSON suite report
    Summarize {
        /// JSON report written by `regress run`
        report: PathBuf,
    },
}

#[derive(Args)]
struct SuiteArgs {
    /// Suite configuration file (JSON)
    #[arg(short, long, env = "REGRESS_CONFIG")]
    config: PathBuf,

    /// Worker count
    #[arg(short, long, env = "REGRESS_THREADS")]
    threads: Option<usize>,

    /// Install directory holding the auxiliary tools
    #[arg(long, env = "REGRESS_INSTALL_DIR")]
    install_dir: Option<PathBuf>,

    /// Run mode (none, design_day_only, annual, reverse_design_day)
    #[arg(short, long, env = "REGRESS_MODE")]
    mode: Option<RunMode>,
}

impl SuiteArgs {
    fn load(&self) -> Result<SuiteConfig> {
        let mut config = SuiteConfig::load(&self.config)?;
        config.apply(&Overrides {
            threads: self.threads,
            install_dir: self.install_dir.clone(),
            mode: self.mode,
        });
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    regress_core::telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            suite,
            output_dir,
            skip_verify,
            strict,
        } => cmd_run(&suite, &output_dir, skip_verify, strict).await,
        Commands::Validate { suite } => cmd_validate(&suite),
        Commands::Summarize { report } => cmd_summarize(&report),
    }
}

async fn cmd_run(suite: &SuiteArgs, output_dir: &Path, skip_verify: bool, strict: bool) -> Result<()> {
    let config = suite.load()?;
    config.validate()?;

    if !skip_verify {
        verify_layout(&config)?;
    }

    let (cases, skipped) = config.eligible_cases();
    for case_id in &skipped {
        info!(case_id = %case_id, mode = %config.run.mode, "case has no weather file, skipped");
    }

    let gate = if strict { SuiteGate::strict() } else { config.gate };
    let fingerprint = suite_fingerprint(
        cases.iter().map(|c| c.id.as_str()),
        config.run.mode,
        &config.builds(),
    );
    let request = SuiteRequest::new(
        cases,
        config.build_a.clone(),
        config.build_b.clone(),
        config.run.clone(),
    );
    let scheduler = SuiteScheduler::new(
        Arc::new(CasePipeline::new()),
        DiffClassifier::with_defaults(config.run.tolerances),
    );

    let mut handle = scheduler.spawn(request);
    let cancel = handle.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after in-flight cases");
            cancel.cancel();
        }
    });

    while let Some(event) = handle.events.recv().await {
        let terminal = event.is_terminal();
        log_event(&event);
        if terminal {
            break;
        }
    }

    let outcome = handle.join().await.context("suite run failed")?;
    let summary = outcome.summary();
    let verdict = gate.evaluate(&summary);
    obs::emit_gate_evaluated(&outcome.suite_id, verdict.violations.len(), verdict.passed);

    let report = SuiteReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now(),
        suite_id: outcome.suite_id.clone(),
        suite_fingerprint: fingerprint,
        mode: config.run.mode,
        cancelled: outcome.cancelled,
        duration_ms: outcome.duration_ms,
        summary,
        verdict,
        pair_results: outcome.pair_results,
    };
    write_reports(output_dir, &report);

    print!("{}", render_summary_md(&report));

    if report.cancelled {
        anyhow::bail!("suite cancelled before every case finished");
    }
    if !report.verdict.passed {
        anyhow::bail!("{}", report.verdict.message);
    }
    Ok(())
}

fn cmd_validate(suite: &SuiteArgs) -> Result<()> {
    let config = suite.load()?;
    config.validate()?;
    verify_layout(&config)?;
    println!("Suite layout OK");
    Ok(())
}

fn cmd_summarize(path: &Path) -> Result<()> {
    let report = read_summary_json(path)?;
    print!("{}", render_summary_md(&report));
    Ok(())
}

fn verify_layout(config: &SuiteConfig) -> Result<()> {
    let checks = verify_suite_layout(
        config.build_a.as_ref(),
        config.build_b.as_ref(),
        config.run.install_dir(),
    );
    for check in &checks {
        if check.ok {
            debug!(check = %check.label, path = %check.path.display(), "ok");
        } else {
            warn!(check = %check.label, path = %check.path.display(), "missing");
        }
    }
    if !all_ok(&checks) {
        let failed = checks.iter().filter(|c| !c.ok).count();
        anyhow::bail!("suite layout verification failed: {failed} check(s) missing");
    }
    Ok(())
}

/// Report writing is best effort; a failure is logged and the run's verdict
/// still decides the exit code.
fn write_reports(output_dir: &Path, report: &SuiteReport) {
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        warn!(dir = %output_dir.display(), error = %e, "cannot create report directory");
        return;
    }
    let json_path = output_dir.join(SUMMARY_JSON);
    if let Err(e) = write_summary_json(&json_path, report) {
        warn!(path = %json_path.display(), error = %format!("{e:#}"), "report write failed");
    }
    let md_path = output_dir.join(SUMMARY_MD);
    if let Err(e) = write_summary_md(&md_path, report) {
        warn!(path = %md_path.display(), error = %format!("{e:#}"), "report write failed");
    }
}

fn log_event(event: &SuiteEvent) {
    match event {
        SuiteEvent::SuiteStarting {
            total_work_units,
            builds,
            cases,
        } => info!(total_work_units, cases, builds = builds.len(), "suite starting"),
        SuiteEvent::CaseCompleted { result, progress } => {
            let percent = format!("{:.1}", progress.percent());
            match result.failure_reason() {
                None => info!(case_id = %result.case_id, build = %result.build, percent = %percent, "case finished"),
                Some(reason) => warn!(case_id = %result.case_id, build = %result.build, percent = %percent, reason = %reason, "case failed"),
            }
        }
        SuiteEvent::BuildSimulationsComplete { build } => {
            info!(build = %build, "all simulations for build complete")
        }
        SuiteEvent::EndProcessingCompleted { case_id, build } => {
            debug!(case_id = %case_id, build = %build, "end processing complete")
        }
        SuiteEvent::DiffCompleted { case_id, progress } => {
            debug!(case_id = %case_id, completed = progress.completed, total = progress.total, "diff complete")
        }
        SuiteEvent::Log { message } => info!("{message}"),
        SuiteEvent::AllDone { pair_results } => info!(pairs = pair_results.len(), "suite complete"),
        SuiteEvent::Cancelled {
            case_results,
            pair_results,
        } => warn!(
            results = case_results.len(),
            pairs = pair_results.len(),
            "suite cancelled"
        ),
    }
}
