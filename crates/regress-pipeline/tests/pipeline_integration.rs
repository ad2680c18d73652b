//! Integration tests for the case pipeline driven by shell-script stand-ins
//! for the simulator and its auxiliary tools.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regress_core::{
    ArtifactKind, BuildConfig, BuildSlot, CancelFlag, Case, CaseResult, DiffClassifier,
    DiffTolerances, EventSink, InstallTool, RunConfig, RunMode, SuiteEvent, SuiteRequest,
    SuiteScheduler,
};
use regress_pipeline::{CasePipeline, ERROR_FILE};
use tempfile::TempDir;

const SIMULATOR: &str = r#"[ -f in.idf ] || exit 1
[ -f Energy+.idd ] || exit 1
echo "DDONLY=$DDONLY REVERSEDD=$REVERSEDD FULLANNUALRUN=$FULLANNUALRUN" > env.log
printf 'Date/Time,T\nw1,1\nw2,2\ns1,3\ns2,4\n' > eplusout.csv
printf 'Program Version,EnergyPlus\n1,2.5\n' > eplusout.eso
echo "EnergyPlus Completed Successfully-- 3 Warning; 0 Severe Errors; Elapsed Time=00hr 00min  0.10sec" > eplusout.end"#;

fn script(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).unwrap();
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}

struct Fixture {
    tmp: TempDir,
    build: BuildConfig,
    install: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let build = prepare_build(&tmp.path().join("base"), SIMULATOR);
        let install = tmp.path().join("install");

        let fixture = Self {
            tmp,
            build,
            install,
        };
        fixture.tool(InstallTool::ExpandObjects, "exit 0");
        fixture.tool(InstallTool::EpMacro, "cp in.imf out.idf");
        fixture.tool(InstallTool::ReadVarsEso, r#"echo "readvars $*" >> readvars.log"#);
        fixture
    }

    fn tool(&self, tool: InstallTool, body: &str) {
        script(&tool.path_in(&self.install), body);
    }

    fn data_file(&self, tool: InstallTool, contents: &str) {
        let path = tool.path_in(&self.install);
        std::fs::create_dir_all(path.parent().expect("parent")).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn simulator(&self, body: &str) {
        script(&self.build.executable_path(), body);
    }

    fn input(&self, name: &str, contents: &str) {
        std::fs::write(self.build.input_dir().join(name), contents).unwrap();
    }

    fn config(&self, mode: RunMode) -> RunConfig {
        let mut config = RunConfig::new(mode, &self.install);
        config.tool_timeout_secs = 30;
        config
    }

    fn run_dir(&self, mode: RunMode, case_id: &str) -> PathBuf {
        self.build.run_dir(mode.tests_dir(), case_id)
    }

    async fn run(&self, case: &Case, mode: RunMode) -> CaseResult {
        CasePipeline::new()
            .run(case, BuildSlot::A, &self.build, &self.config(mode), mode.tests_dir())
            .await
    }
}

fn prepare_build(root: &Path, simulator: &str) -> BuildConfig {
    let build = BuildConfig::new(root, "energyplus");
    std::fs::create_dir_all(build.input_dir()).unwrap();
    std::fs::create_dir_all(build.weather_dir()).unwrap();
    std::fs::write(build.idd_path(), "!IDD\n").unwrap();
    script(&build.executable_path(), simulator);
    build
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).expect("readable file")
}

fn failed_stage(result: &CaseResult) -> Option<&str> {
    result.failure.as_ref().map(|f| f.stage.as_str())
}

/// Test: plain idf case runs every mandatory stage and succeeds
#[tokio::test]
async fn test_successful_design_day_run() {
    let fx = Fixture::new();
    fx.input("Simple.idf", "Version,9.0;\n");

    let result = fx.run(&Case::new("Simple", None), RunMode::DesignDayOnly).await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    assert_eq!(result.case_id, "Simple");
    assert!(result.runtime_secs.is_some());
    let summary = result.end_summary.expect("end summary");
    assert_eq!(summary.warnings, 3);
    assert_eq!(summary.severe_errors, 0);

    let run_dir = fx.run_dir(RunMode::DesignDayOnly, "Simple");
    assert_eq!(result.run_dir, run_dir);
    assert_eq!(read(run_dir.join("in.idf")), "Version,9.0;\n");
    assert!(!run_dir.join("Energy+.idd").exists(), "IDD removed in cleanup");
    assert!(!run_dir.join(ERROR_FILE).exists());
    assert_eq!(read(run_dir.join("test.mvi")), "eplusout.mtr\neplusmtr.csv\n");
    assert_eq!(read(run_dir.join("readvars.log")), "readvars \nreadvars test.mvi\n");
    assert_eq!(
        read(run_dir.join("env.log")).trim(),
        "DDONLY=Y REVERSEDD= FULLANNUALRUN="
    );
}

/// Test: a stale run directory is replaced, not merged
#[tokio::test]
async fn test_run_directory_is_recreated() {
    let fx = Fixture::new();
    fx.input("Simple.idf", "Version,9.0;\n");
    let run_dir = fx.run_dir(RunMode::DesignDayOnly, "Simple");
    std::fs::create_dir_all(&run_dir).unwrap();
    std::fs::write(run_dir.join("stale.txt"), "old").unwrap();

    let result = fx.run(&Case::new("Simple", None), RunMode::DesignDayOnly).await;

    assert!(result.success);
    assert!(!run_dir.join("stale.txt").exists());
}

/// Test: simulator that never writes its end file fails in the final stage
#[tokio::test]
async fn test_missing_end_file_fails() {
    let fx = Fixture::new();
    fx.input("Broken.idf", "Version,9.0;\n");
    fx.simulator("exit 1");

    let result = fx.run(&Case::new("Broken", None), RunMode::DesignDayOnly).await;

    assert!(!result.success);
    assert_eq!(failed_stage(&result), Some("done"));
    let message = result.failure_reason().expect("reason");
    assert!(message.contains("eplusout.end"), "{message}");
    let error_file = fx.run_dir(RunMode::DesignDayOnly, "Broken").join(ERROR_FILE);
    assert!(read(error_file).contains("eplusout.end"));
}

/// Test: an end file reporting termination is a failure
#[tokio::test]
async fn test_terminated_run_fails() {
    let fx = Fixture::new();
    fx.input("Fatal.idf", "Version,9.0;\n");
    fx.simulator(
        "echo \"EnergyPlus Terminated--Fatal Error Detected. 0 Warning; 1 Severe Errors;\" > eplusout.end",
    );

    let result = fx.run(&Case::new("Fatal", None), RunMode::DesignDayOnly).await;

    assert_eq!(failed_stage(&result), Some("done"));
    assert!(result
        .failure_reason()
        .expect("reason")
        .contains("did not complete successfully"));
}

/// Test: macro inputs lose their file-prefix lines before expansion
#[tokio::test]
async fn test_macro_input_is_expanded() {
    let fx = Fixture::new();
    fx.input(
        "Macro.imf",
        "##fileprefix C:\\data\\\n##include shared.imf\nVersion,9.0;\n",
    );

    let mut case = Case::new("Macro", None);
    case.macro_input = true;
    let result = fx.run(&case, RunMode::DesignDayOnly).await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    let run_dir = fx.run_dir(RunMode::DesignDayOnly, "Macro");
    assert_eq!(read(run_dir.join("in.idf")), "##include shared.imf\nVersion,9.0;\n");
    assert!(!run_dir.join("out.idf").exists());
}

/// Test: macro case whose macro tool writes nothing fails in the macro stage
#[tokio::test]
async fn test_macro_without_output_fails() {
    let fx = Fixture::new();
    fx.input("Macro.imf", "Version,9.0;\n");
    fx.tool(InstallTool::EpMacro, "exit 0");

    let result = fx.run(&Case::new("Macro", None), RunMode::DesignDayOnly).await;

    assert_eq!(failed_stage(&result), Some("macro"));
}

/// Test: parametric case keeps the first variant and removes the others
#[tokio::test]
async fn test_parametric_selects_first_variant() {
    let fx = Fixture::new();
    fx.input("Param.idf", "Parametric:SetValueForRun,...;\n");
    fx.tool(
        InstallTool::ParametricPreprocessor,
        r#"[ "$1" = "in.idf" ] || exit 2
echo variant-b > in-b.idf
echo variant-a > in-a.idf
echo variant-c > in-c.idf"#,
    );

    let result = fx
        .run(&Case::new("Param", None).with_parametric(), RunMode::DesignDayOnly)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    let run_dir = fx.run_dir(RunMode::DesignDayOnly, "Param");
    assert_eq!(read(run_dir.join("in.idf")), "variant-a\n");
    assert!(!run_dir.join("in-b.idf").exists());
    assert!(!run_dir.join("in-c.idf").exists());
}

/// Test: parametric preprocessor producing no variants fails
#[tokio::test]
async fn test_parametric_without_variants_fails() {
    let fx = Fixture::new();
    fx.input("Param.idf", "Version,9.0;\n");
    fx.tool(InstallTool::ParametricPreprocessor, "exit 0");

    let result = fx
        .run(&Case::new("Param", None).with_parametric(), RunMode::DesignDayOnly)
        .await;

    assert_eq!(failed_stage(&result), Some("parametric"));
}

/// Test: basement preprocessor objects are appended to the expanded input
#[tokio::test]
async fn test_basement_ground_heat_transfer() {
    let fx = Fixture::new();
    fx.input("Basement.idf", "Version,9.0;\n");
    fx.tool(
        InstallTool::ExpandObjects,
        "printf 'expanded;\\n' > expanded.idf\nprintf 'basement input' > BasementGHTIn.idf",
    );
    fx.data_file(InstallTool::BasementIdd, "!basement idd\n");
    fx.tool(
        InstallTool::Basement,
        r#"[ -f BasementGHT.idd ] || exit 1
printf 'SurfaceProperty:OtherSideCoefficients,B1;' > EPObjects.TXT
echo run > RunINPUT.TXT
echo debug > RunDEBUGOUT.TXT
echo monthly > MonthlyResults.csv"#,
    );

    let result = fx
        .run(&Case::new("Basement", None), RunMode::DesignDayOnly)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    let run_dir = fx.run_dir(RunMode::DesignDayOnly, "Basement");
    assert_eq!(
        read(run_dir.join("in.idf")),
        "expanded;\n\nSurfaceProperty:OtherSideCoefficients,B1;\n"
    );
    for leftover in [
        "expanded.idf",
        "BasementGHTIn.idf",
        "EPObjects.TXT",
        "RunINPUT.TXT",
        "RunDEBUGOUT.TXT",
        "MonthlyResults.csv",
        "BasementGHT.idd",
    ] {
        assert!(!run_dir.join(leftover).exists(), "{leftover} not removed");
    }
}

/// Test: slab preprocessor failing to write its output fails the stage
#[tokio::test]
async fn test_slab_without_output_fails() {
    let fx = Fixture::new();
    fx.input("Slab.idf", "Version,9.0;\n");
    fx.tool(
        InstallTool::ExpandObjects,
        "echo expanded > expanded.idf\necho slab > GHTIn.idf",
    );
    fx.data_file(InstallTool::SlabIdd, "!slab idd\n");
    fx.tool(InstallTool::Slab, "exit 0");

    let result = fx.run(&Case::new("Slab", None), RunMode::DesignDayOnly).await;

    assert_eq!(failed_stage(&result), Some("ground_heat_transfer"));
    assert!(result
        .failure_reason()
        .expect("reason")
        .contains("SLABSurfaceTemps.TXT"));
}

/// Test: ground heat transfer only follows a successful expansion
#[tokio::test]
async fn test_ground_input_without_expansion_is_ignored() {
    let fx = Fixture::new();
    fx.input("NoExpand.idf", "Version,9.0;\n");
    fx.tool(InstallTool::ExpandObjects, "echo slab > GHTIn.idf");

    let result = fx
        .run(&Case::new("NoExpand", None), RunMode::DesignDayOnly)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    assert!(fx.run_dir(RunMode::DesignDayOnly, "NoExpand").join("GHTIn.idf").exists());
}

/// Test: reverse design-day output is swapped back with a backup
#[tokio::test]
async fn test_reverse_design_day_reorders_outputs() {
    let fx = Fixture::new();
    fx.input(
        "Reverse.idf",
        "SizingPeriod:DesignDay,\n  Winter;\nSizingPeriod:DesignDay,\n  Summer;\n",
    );

    let result = fx
        .run(&Case::new("Reverse", None), RunMode::ReverseDesignDay)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    let run_dir = fx.run_dir(RunMode::ReverseDesignDay, "Reverse");
    assert_eq!(
        read(run_dir.join("eplusout.csv")),
        "Date/Time,T\ns1,3\ns2,4\nw1,1\nw2,2\n"
    );
    assert_eq!(
        read(run_dir.join("eplusout-before_revDD_swapback.csv")),
        "Date/Time,T\nw1,1\nw2,2\ns1,3\ns2,4\n"
    );
    assert!(read(run_dir.join("env.log")).contains("REVERSEDD=Y"));
}

/// Test: reverse design-day runs still receive the case weather file
#[tokio::test]
async fn test_reverse_design_day_copies_weather() {
    let fx = Fixture::new();
    fx.input(
        "Reverse.idf",
        "SizingPeriod:DesignDay,\n  Winter;\nSizingPeriod:DesignDay,\n  Summer;\n",
    );
    std::fs::write(fx.build.weather_path("USA_CO_Golden"), "LOCATION,Golden\n").unwrap();

    let result = fx
        .run(&Case::new("Reverse", Some("USA_CO_Golden")), RunMode::ReverseDesignDay)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    let run_dir = fx.run_dir(RunMode::ReverseDesignDay, "Reverse");
    assert_eq!(read(run_dir.join("in.epw")), "LOCATION,Golden\n");
}

/// Test: design-day-only runs never copy weather, even when the case has one
#[tokio::test]
async fn test_design_day_run_skips_weather() {
    let fx = Fixture::new();
    fx.input("Simple.idf", "Version,9.0;\n");
    std::fs::write(fx.build.weather_path("USA_CO_Golden"), "LOCATION,Golden\n").unwrap();

    let result = fx
        .run(&Case::new("Simple", Some("USA_CO_Golden")), RunMode::DesignDayOnly)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    assert!(!fx.run_dir(RunMode::DesignDayOnly, "Simple").join("in.epw").exists());
}

/// Test: reverse design-day run with a single design day fails to reorder
#[tokio::test]
async fn test_reverse_design_day_needs_two_design_days() {
    let fx = Fixture::new();
    fx.input("One.idf", "SizingPeriod:DesignDay,\n  Winter;\n");

    let result = fx.run(&Case::new("One", None), RunMode::ReverseDesignDay).await;

    assert_eq!(failed_stage(&result), Some("reorder"));
}

/// Test: weather-driven run copies the case weather file
#[tokio::test]
async fn test_annual_run_copies_weather() {
    let fx = Fixture::new();
    fx.input("Annual.idf", "Version,9.0;\n");
    std::fs::write(fx.build.weather_path("USA_IL_Chicago"), "LOCATION,Chicago\n").unwrap();

    let result = fx
        .run(&Case::new("Annual", Some("USA_IL_Chicago")), RunMode::Annual)
        .await;

    assert!(result.success, "unexpected failure: {:?}", result.failure);
    let run_dir = fx.run_dir(RunMode::Annual, "Annual");
    assert_eq!(read(run_dir.join("in.epw")), "LOCATION,Chicago\n");
    assert!(read(run_dir.join("env.log")).contains("FULLANNUALRUN=Y"));
}

/// Test: missing weather file is an init failure
#[tokio::test]
async fn test_missing_weather_file_fails() {
    let fx = Fixture::new();
    fx.input("Annual.idf", "Version,9.0;\n");

    let result = fx
        .run(&Case::new("Annual", Some("Nowhere")), RunMode::Annual)
        .await;

    assert_eq!(failed_stage(&result), Some("init"));
    assert!(result.failure_reason().expect("reason").contains("Nowhere.epw"));
}

/// Test: missing auxiliary tool surfaces as a launch failure
#[tokio::test]
async fn test_missing_tool_fails_stage() {
    let fx = Fixture::new();
    fx.input("Simple.idf", "Version,9.0;\n");
    std::fs::remove_file(InstallTool::ExpandObjects.path_in(&fx.install)).unwrap();

    let result = fx.run(&Case::new("Simple", None), RunMode::DesignDayOnly).await;

    assert_eq!(failed_stage(&result), Some("expand"));
    assert!(result
        .failure_reason()
        .expect("reason")
        .contains("failed to launch ExpandObjects"));
}

/// Test: the pipeline as the scheduler's executor, comparing two builds
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_suite_with_two_builds() {
    let fx = Fixture::new();
    let build_b = prepare_build(
        &fx.tmp.path().join("mod"),
        &SIMULATOR.replace("1,2.5", "1,9.5"),
    );
    for build in [&fx.build, &build_b] {
        for id in ["First", "Second"] {
            std::fs::write(build.input_dir().join(format!("{id}.idf")), "Version,9.0;\n").unwrap();
        }
    }

    let scheduler = SuiteScheduler::new(
        Arc::new(CasePipeline::new()),
        DiffClassifier::with_defaults(DiffTolerances::default()),
    );
    let request = SuiteRequest::new(
        vec![Case::new("First", None), Case::new("Second", None)],
        Some(fx.build.clone()),
        Some(build_b),
        fx.config(RunMode::DesignDayOnly).with_threads(2),
    );

    let (sink, mut events) = EventSink::channel();
    let outcome = scheduler
        .run(request, sink, CancelFlag::new())
        .await
        .expect("suite runs");

    let mut lines = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SuiteEvent::Log { message } = event {
            lines.push(message);
        }
    }
    for expected in [
        "First (build_a): init",
        "Second (build_b): simulate",
        "Second (build_a): done",
    ] {
        assert!(lines.iter().any(|l| l == expected), "missing {expected:?} in {lines:?}");
    }
    assert!(!lines.iter().any(|l| l.contains("failed in")));

    assert!(!outcome.cancelled);
    assert_eq!(outcome.case_results.len(), 4);
    assert!(outcome.case_results.iter().all(|r| r.success));
    assert_eq!(outcome.pair_results.len(), 2);
    for pair in &outcome.pair_results {
        let eso = pair.outcomes.get(&ArtifactKind::Eso).expect("eso compared");
        assert!(!eso.is_clean(), "{}: eso should differ", pair.case_id);
    }

    let summary = outcome.summary();
    assert_eq!(summary.big_math.count, 2);
    assert_eq!(summary.build(BuildSlot::A).succeeded.count, 2);
    assert_eq!(summary.build(BuildSlot::B).failed.count, 0);
    assert!(fx.run_dir(RunMode::DesignDayOnly, "First").join("eplusout.eso").is_file());
}
