//! The per-case pipeline: prepare a run directory, chain the preprocessing
//! tools, run the simulator, postprocess and judge the outcome.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regress_core::scheduler::{CaseExecutor, CaseJob};
use regress_core::{
    BuildConfig, BuildSlot, Case, CaseResult, EndSummary, EventSink, InstallTool, RunConfig,
    RunMode,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::end_summary::{parse_end_summary, END_FILE};
use crate::env::RunEnvironment;
use crate::error::{StageError, StageResult};
use crate::reorder::reorder_run_outputs;
use crate::runner::ToolRunner;
use crate::stage::{PipelineStage, ToolCommand};

/// Written into the run directory when a pipeline fails.
pub const ERROR_FILE: &str = "aa_testSuite_error.txt";

const INPUT_IDF: &str = "in.idf";
const INPUT_IMF: &str = "in.imf";
const INPUT_EPW: &str = "in.epw";
const IDD_FILE: &str = "Energy+.idd";
const MACRO_MARKER: &str = "##fileprefix";
const METER_MVI: &str = "test.mvi";

/// A ground heat transfer preprocessor, triggered by its input file appearing
/// after object expansion.
struct GroundModel {
    trigger: &'static str,
    program: InstallTool,
    idd: InstallTool,
    output: &'static str,
    support_files: &'static [&'static str],
}

const BASEMENT: GroundModel = GroundModel {
    trigger: "BasementGHTIn.idf",
    program: InstallTool::Basement,
    idd: InstallTool::BasementIdd,
    output: "EPObjects.TXT",
    support_files: &[
        "RunINPUT.TXT",
        "RunDEBUGOUT.TXT",
        "EPObjects.TXT",
        "BasementGHTIn.idf",
        "MonthlyResults.csv",
        "BasementGHT.idd",
    ],
};

const SLAB: GroundModel = GroundModel {
    trigger: "GHTIn.idf",
    program: InstallTool::Slab,
    idd: InstallTool::SlabIdd,
    output: "SLABSurfaceTemps.TXT",
    support_files: &[
        "SLABINP.TXT",
        "GHTIn.idf",
        "SLABSurfaceTemps.TXT",
        "SLABSplit Surface Temps.TXT",
        "SlabGHT.idd",
    ],
};

/// A stage error tagged with the stage it happened in.
#[derive(Debug)]
struct Failed {
    stage: PipelineStage,
    error: StageError,
}

trait AtStage<T> {
    fn at(self, stage: PipelineStage) -> Result<T, Failed>;
}

impl<T> AtStage<T> for StageResult<T> {
    fn at(self, stage: PipelineStage) -> Result<T, Failed> {
        self.map_err(|error| Failed { stage, error })
    }
}

/// Everything one pipeline run needs, borrowed for its duration.
struct RunContext<'a> {
    case: &'a Case,
    slot: BuildSlot,
    build: &'a BuildConfig,
    run_config: &'a RunConfig,
    run_dir: PathBuf,
    log: &'a EventSink,
}

impl RunContext<'_> {
    /// Announce a stage on the suite's event stream.
    fn enter(&self, stage: PipelineStage) {
        debug!(stage = %stage, "stage started");
        self.log.log(format!("{} ({}): {}", self.case.id, self.slot, stage));
    }

    fn path(&self, name: &str) -> PathBuf {
        self.run_dir.join(name)
    }

    fn install_dir(&self) -> &Path {
        self.run_config.install_dir()
    }

    async fn tool(&self, command: ToolCommand, env: &RunEnvironment) -> StageResult<u64> {
        let output =
            ToolRunner::execute(&command, &self.run_dir, env, self.run_config.tool_timeout_secs)
                .await?;
        if !output.succeeded() {
            debug!(tool = %output.tool, exit_code = output.exit_code, "tool exited non-zero");
        }
        Ok(output.duration_ms)
    }

    async fn install_tool(&self, tool: InstallTool, args: &[&str]) -> StageResult<u64> {
        let command = args.iter().fold(
            ToolCommand::install_tool(tool, self.install_dir()),
            |cmd, arg| cmd.arg(*arg),
        );
        self.tool(command, &RunEnvironment::empty()).await
    }
}

/// Successful pipeline output.
struct Completed {
    runtime_secs: f64,
    end_summary: EndSummary,
}

/// Runs one case against one build.
///
/// Every tool is launched with the run directory as its working directory;
/// the process working directory and environment are never touched, so many
/// pipelines can run concurrently.
#[derive(Debug, Clone, Default)]
pub struct CasePipeline;

impl CasePipeline {
    pub fn new() -> Self {
        Self
    }

    /// Run the pipeline. Never fails: every problem becomes an unsuccessful
    /// [`CaseResult`] naming the stage, and the message is also written to
    /// [`ERROR_FILE`] in the run directory.
    pub async fn run(
        &self,
        case: &Case,
        slot: BuildSlot,
        build: &BuildConfig,
        run_config: &RunConfig,
        tests_dir: &str,
    ) -> CaseResult {
        self.run_logged(case, slot, build, run_config, tests_dir, &EventSink::noop())
            .await
    }

    /// [`CasePipeline::run`], reporting each stage and any failure as a
    /// `Log` event on `log`.
    #[instrument(skip_all, fields(case_id = %case.id, build = %slot))]
    pub async fn run_logged(
        &self,
        case: &Case,
        slot: BuildSlot,
        build: &BuildConfig,
        run_config: &RunConfig,
        tests_dir: &str,
        log: &EventSink,
    ) -> CaseResult {
        let ctx = RunContext {
            case,
            slot,
            build,
            run_config,
            run_dir: build.run_dir(tests_dir, &case.id),
            log,
        };

        match run_stages(&ctx).await {
            Ok(done) => CaseResult::succeeded(&case.id, slot, &ctx.run_dir, done.runtime_secs)
                .with_end_summary(done.end_summary),
            Err(Failed { stage, error }) => {
                warn!(stage = %stage, error = %error, "pipeline failed");
                let message = error.to_string();
                log.log(format!("{} ({}): failed in {stage}: {message}", case.id, slot));
                if ctx.run_dir.is_dir() {
                    let error_file = ctx.path(ERROR_FILE);
                    if let Err(e) = tokio::fs::write(&error_file, format!("{message}\n")).await {
                        warn!(path = %error_file.display(), error = %e, "could not write error file");
                    }
                }
                CaseResult::failed(&case.id, slot, &ctx.run_dir, stage.name(), message)
            }
        }
    }
}

#[async_trait]
impl CaseExecutor for CasePipeline {
    async fn execute(&self, job: &CaseJob) -> CaseResult {
        self.run_logged(
            &job.case,
            job.slot,
            &job.build,
            &job.run_config,
            &job.tests_dir,
            &job.log,
        )
        .await
    }
}

async fn run_stages(ctx: &RunContext<'_>) -> Result<Completed, Failed> {
    ctx.enter(PipelineStage::Init);
    init(ctx).await.at(PipelineStage::Init)?;

    if ctx.path(INPUT_IMF).is_file() {
        ctx.enter(PipelineStage::Macro);
        expand_macros(ctx).await.at(PipelineStage::Macro)?;
    }

    if ctx.case.parametric {
        ctx.enter(PipelineStage::Parametric);
        select_parametric_variant(ctx)
            .await
            .at(PipelineStage::Parametric)?;
    }

    ctx.enter(PipelineStage::Expand);
    let expanded = expand_objects(ctx).await.at(PipelineStage::Expand)?;
    if expanded {
        for model in [&BASEMENT, &SLAB] {
            if ctx.path(model.trigger).is_file() {
                ctx.enter(PipelineStage::GroundHeatTransfer);
                run_ground_model(ctx, model)
                    .await
                    .at(PipelineStage::GroundHeatTransfer)?;
            }
        }
    }

    ctx.enter(PipelineStage::EnvConfigure);
    let env = RunEnvironment::for_run(ctx.run_config);
    debug!(mode = %ctx.run_config.mode, "run environment prepared");

    ctx.enter(PipelineStage::Simulate);
    let simulate_ms = ctx
        .tool(ToolCommand::simulator(ctx.build), &env)
        .await
        .at(PipelineStage::Simulate)?;
    let runtime_secs = simulate_ms as f64 / 1000.0;

    ctx.enter(PipelineStage::Postprocess);
    postprocess(ctx).await.at(PipelineStage::Postprocess)?;

    if ctx.run_config.mode == RunMode::ReverseDesignDay {
        ctx.enter(PipelineStage::Reorder);
        reorder_run_outputs(&ctx.run_dir)
            .await
            .at(PipelineStage::Reorder)?;
    }

    ctx.enter(PipelineStage::Cleanup);
    remove_if_present(&ctx.path(IDD_FILE))
        .await
        .at(PipelineStage::Cleanup)?;

    ctx.enter(PipelineStage::Done);
    let end_summary = judge_end_file(ctx).await.at(PipelineStage::Done)?;
    Ok(Completed {
        runtime_secs,
        end_summary,
    })
}

/// Fresh run directory holding the input, the IDD and (when the mode uses
/// one) the weather file. Reverse design-day runs copy the weather file when
/// the case has one; only weather-driven modes require it.
async fn init(ctx: &RunContext<'_>) -> StageResult<()> {
    if ctx.run_dir.exists() {
        tokio::fs::remove_dir_all(&ctx.run_dir)
            .await
            .map_err(StageError::io(&ctx.run_dir))?;
    }
    tokio::fs::create_dir_all(&ctx.run_dir)
        .await
        .map_err(StageError::io(&ctx.run_dir))?;

    let input_dir = ctx.build.input_dir();
    let imf = input_dir.join(format!("{}.imf", ctx.case.id));
    let idf = input_dir.join(format!("{}.idf", ctx.case.id));
    if imf.is_file() {
        copy_required(&imf, &ctx.path(INPUT_IMF)).await?;
    } else if ctx.case.macro_input {
        return Err(StageError::MissingInput(imf));
    } else {
        copy_required(&idf, &ctx.path(INPUT_IDF)).await?;
    }

    copy_required(&ctx.build.idd_path(), &ctx.path(IDD_FILE)).await?;

    if ctx.run_config.mode.needs_weather() {
        match ctx.case.weather.as_deref() {
            Some(weather) => {
                copy_required(&ctx.build.weather_path(weather), &ctx.path(INPUT_EPW)).await?
            }
            None if ctx.run_config.mode.requires_weather() => {
                return Err(StageError::NoWeather {
                    case_id: ctx.case.id.clone(),
                })
            }
            None => {}
        }
    }
    Ok(())
}

async fn expand_macros(ctx: &RunContext<'_>) -> StageResult<()> {
    let imf = ctx.path(INPUT_IMF);
    let text = read_lossy(&imf).await?;
    let kept: String = text
        .split_inclusive('\n')
        .filter(|line| !line.contains(MACRO_MARKER))
        .collect();
    tokio::fs::write(&imf, kept)
        .await
        .map_err(StageError::io(&imf))?;

    ctx.install_tool(InstallTool::EpMacro, &[]).await?;

    let out = ctx.path("out.idf");
    if !out.is_file() {
        return Err(StageError::MissingOutput(out));
    }
    rename(&out, &ctx.path(INPUT_IDF)).await
}

/// Run the parametric preprocessor and keep the first variant it writes.
async fn select_parametric_variant(ctx: &RunContext<'_>) -> StageResult<()> {
    ctx.install_tool(InstallTool::ParametricPreprocessor, &[INPUT_IDF])
        .await?;

    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(&ctx.run_dir)
        .await
        .map_err(StageError::io(&ctx.run_dir))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(StageError::io(&ctx.run_dir))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("in-") && name.ends_with(".idf") {
            candidates.push(name);
        }
    }
    candidates.sort();

    let Some((chosen, rest)) = candidates.split_first() else {
        return Err(StageError::MissingOutput(ctx.path("in-*.idf")));
    };
    debug!(chosen = %chosen, others = rest.len(), "parametric variant selected");

    remove_if_present(&ctx.path(INPUT_IDF)).await?;
    rename(&ctx.path(chosen), &ctx.path(INPUT_IDF)).await?;
    for other in rest {
        remove_if_present(&ctx.path(other)).await?;
    }
    Ok(())
}

/// Returns whether an expanded input replaced `in.idf`.
async fn expand_objects(ctx: &RunContext<'_>) -> StageResult<bool> {
    ctx.install_tool(InstallTool::ExpandObjects, &[]).await?;

    let expanded = ctx.path("expanded.idf");
    if !expanded.is_file() {
        return Ok(false);
    }
    remove_if_present(&ctx.path(INPUT_IDF)).await?;
    rename(&expanded, &ctx.path(INPUT_IDF)).await?;
    Ok(true)
}

async fn run_ground_model(ctx: &RunContext<'_>, model: &GroundModel) -> StageResult<()> {
    copy_required(
        &model.idd.path_in(ctx.install_dir()),
        &ctx.path(model.idd.name()),
    )
    .await?;
    ctx.install_tool(model.program, &[]).await?;

    let output = ctx.path(model.output);
    if !output.is_file() {
        return Err(StageError::MissingOutput(output));
    }
    let objects = read_lossy(&output).await?;

    let input = ctx.path(INPUT_IDF);
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(&input)
        .await
        .map_err(StageError::io(&input))?;
    file.write_all(format!("\n{objects}\n").as_bytes())
        .await
        .map_err(StageError::io(&input))?;
    file.flush().await.map_err(StageError::io(&input))?;

    for support in model.support_files {
        remove_if_present(&ctx.path(support)).await?;
    }
    debug!(model = %model.program, "ground heat transfer objects appended");
    Ok(())
}

async fn postprocess(ctx: &RunContext<'_>) -> StageResult<()> {
    ctx.install_tool(InstallTool::ReadVarsEso, &[]).await?;

    let mvi = ctx.path(METER_MVI);
    tokio::fs::write(&mvi, "eplusout.mtr\neplusmtr.csv\n")
        .await
        .map_err(StageError::io(&mvi))?;
    ctx.install_tool(InstallTool::ReadVarsEso, &[METER_MVI])
        .await?;
    Ok(())
}

async fn judge_end_file(ctx: &RunContext<'_>) -> StageResult<EndSummary> {
    let end = ctx.path(END_FILE);
    if !end.is_file() {
        return Err(StageError::MissingOutput(end));
    }
    let text = read_lossy(&end).await?;
    parse_end_summary(&text).ok_or_else(|| {
        StageError::MalformedOutput(format!(
            "simulation did not complete successfully: {}",
            text.trim()
        ))
    })
}

async fn copy_required(from: &Path, to: &Path) -> StageResult<()> {
    if !from.is_file() {
        return Err(StageError::MissingInput(from.to_path_buf()));
    }
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(StageError::io(from))
}

async fn rename(from: &Path, to: &Path) -> StageResult<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(StageError::io(from))
}

async fn read_lossy(path: &Path) -> StageResult<String> {
    let bytes = tokio::fs::read(path).await.map_err(StageError::io(path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn remove_if_present(path: &Path) -> StageResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StageError::io(path)(e)),
    }
}
