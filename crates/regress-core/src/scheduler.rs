//! Suite scheduling: fans (case, build) pipelines out over a bounded worker
//! pool, joins each case's results and classifies them.
//!
//! The pipeline itself is injected through [`CaseExecutor`], so the scheduler
//! can be driven by deterministic stubs in tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::diff::DiffClassifier;
use crate::domain::{
    selected_builds, validate_case_list, BuildConfig, BuildSlot, Case, CaseResult, PairResult,
    RegressError, Result, RunConfig, RunMode,
};
use crate::events::{EventSink, Progress, SuiteEvent};
use crate::metrics::METRICS;
use crate::obs;
use crate::summary::{summarize, SuiteSummary};

/// One unit of work: run `case` against `build` under `run_config`.
#[derive(Debug, Clone)]
pub struct CaseJob {
    pub case: Case,
    pub slot: BuildSlot,
    pub build: BuildConfig,
    /// Effective configuration for this job; its mode may differ from the
    /// suite mode when a reverse design-day run is paired with a forward one.
    pub run_config: RunConfig,
    /// Directory under the build root holding per-case run directories.
    pub tests_dir: String,
    /// Receives progress lines while the job runs.
    pub log: EventSink,
}

impl CaseJob {
    pub fn run_dir(&self) -> PathBuf {
        self.build.run_dir(&self.tests_dir, &self.case.id)
    }
}

/// Runs one (case, build) pipeline to completion.
///
/// Implementations must not fail past this boundary: every failure is
/// reported as an unsuccessful [`CaseResult`].
#[async_trait]
pub trait CaseExecutor: Send + Sync {
    async fn execute(&self, job: &CaseJob) -> CaseResult;
}

/// Cooperative cancellation flag shared between the caller and the workers.
///
/// Workers check it between work items; pipelines already running finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything needed to run one suite.
#[derive(Debug, Clone)]
pub struct SuiteRequest {
    pub suite_id: String,
    pub cases: Vec<Case>,
    pub build_a: Option<BuildConfig>,
    pub build_b: Option<BuildConfig>,
    pub run_config: RunConfig,
}

impl SuiteRequest {
    pub fn new(
        cases: Vec<Case>,
        build_a: Option<BuildConfig>,
        build_b: Option<BuildConfig>,
        run_config: RunConfig,
    ) -> Self {
        Self {
            suite_id: format!("suite-{}", Uuid::new_v4()),
            cases,
            build_a,
            build_b,
            run_config,
        }
    }
}

/// Resolved work list for a suite.
#[derive(Debug, Clone)]
pub struct SuitePlan {
    /// Slots every case is scheduled on.
    pub slots: Vec<BuildSlot>,
    /// Jobs in dispatch order (case-major).
    pub jobs: Vec<CaseJob>,
}

impl SuitePlan {
    /// One unit per simulation attempt plus one per case diffed.
    pub fn total_work_units(&self, case_count: usize) -> usize {
        case_count * self.slots.len() + case_count
    }
}

/// Final state of a suite run.
#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub suite_id: String,
    /// Every completed (case, build) result, in case order.
    pub case_results: Vec<CaseResult>,
    /// Every classified case, in case order.
    pub pair_results: Vec<PairResult>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl SuiteOutcome {
    pub fn summary(&self) -> SuiteSummary {
        summarize(&self.pair_results)
    }
}

/// A suite running on a background task.
pub struct SuiteHandle {
    pub events: UnboundedReceiver<SuiteEvent>,
    pub cancel: CancelFlag,
    task: JoinHandle<Result<SuiteOutcome>>,
}

impl SuiteHandle {
    /// Wait for the suite to finish.
    pub async fn join(self) -> Result<SuiteOutcome> {
        self.task
            .await
            .map_err(|e| RegressError::Scheduler(format!("suite task failed: {e}")))?
    }
}

/// Drives a suite through the injected [`CaseExecutor`] and classifies the
/// joined results.
#[derive(Clone)]
pub struct SuiteScheduler {
    executor: Arc<dyn CaseExecutor>,
    classifier: DiffClassifier,
}

impl SuiteScheduler {
    pub fn new(executor: Arc<dyn CaseExecutor>, classifier: DiffClassifier) -> Self {
        Self {
            executor,
            classifier,
        }
    }

    /// Expand a request into its job list.
    ///
    /// A reverse design-day suite with a single selected build is paired
    /// against a forward design-day run of that same build: slot A runs
    /// forward under `Tests-DDOnly/`, slot B runs reversed under
    /// `Tests-ReverseDD/`. Every job runs under its own mode's tests
    /// directory, so runs in different modes never share a run directory.
    pub fn plan(request: &SuiteRequest) -> Result<SuitePlan> {
        let builds = selected_builds(request.build_a.as_ref(), request.build_b.as_ref())?;

        let lanes: Vec<(BuildSlot, BuildConfig, RunConfig)> =
            match (request.run_config.mode, builds.as_slice()) {
                (RunMode::ReverseDesignDay, [(_, build)]) => {
                    let mut forward = request.run_config.clone();
                    forward.mode = RunMode::DesignDayOnly;
                    vec![
                        (BuildSlot::A, build.clone(), forward),
                        (BuildSlot::B, build.clone(), request.run_config.clone()),
                    ]
                }
                _ => builds
                    .iter()
                    .map(|(slot, build)| (*slot, build.clone(), request.run_config.clone()))
                    .collect(),
            };

        let slots = lanes.iter().map(|(slot, ..)| *slot).collect();
        let mut jobs = Vec::with_capacity(request.cases.len() * lanes.len());
        for case in &request.cases {
            for (slot, build, run_config) in &lanes {
                jobs.push(CaseJob {
                    case: case.clone(),
                    slot: *slot,
                    build: build.clone(),
                    run_config: run_config.clone(),
                    tests_dir: run_config.mode.tests_dir().to_string(),
                    log: EventSink::noop(),
                });
            }
        }

        Ok(SuitePlan { slots, jobs })
    }

    /// Run a suite to completion or cancellation.
    ///
    /// Only configuration problems are returned as errors, before any work
    /// starts. Pipeline failures are recorded on the results.
    pub async fn run(
        &self,
        request: SuiteRequest,
        sink: EventSink,
        cancel: CancelFlag,
    ) -> Result<SuiteOutcome> {
        let span = obs::suite_span(&request.suite_id);
        self.run_inner(request, sink, cancel).instrument(span).await
    }

    /// Run a suite on a background task, returning its event stream and
    /// cancellation flag.
    pub fn spawn(&self, request: SuiteRequest) -> SuiteHandle {
        let (sink, events) = EventSink::channel();
        let cancel = CancelFlag::new();
        let scheduler = self.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { scheduler.run(request, sink, task_cancel).await });
        SuiteHandle {
            events,
            cancel,
            task,
        }
    }

    async fn run_inner(
        &self,
        request: SuiteRequest,
        sink: EventSink,
        cancel: CancelFlag,
    ) -> Result<SuiteOutcome> {
        validate_case_list(&request.cases)?;
        let plan = Self::plan(&request)?;
        let started = Instant::now();

        let case_count = request.cases.len();
        let job_count = plan.jobs.len();
        let total = plan.total_work_units(case_count);
        let workers = request.run_config.worker_count();

        obs::emit_suite_started(
            &request.suite_id,
            request.run_config.mode,
            case_count,
            plan.slots.len(),
            workers,
        );
        sink.emit(SuiteEvent::SuiteStarting {
            total_work_units: total,
            builds: plan.slots.clone(),
            cases: case_count,
        });

        let order: HashMap<String, usize> = request
            .cases
            .iter()
            .enumerate()
            .map(|(i, case)| (case.id.clone(), i))
            .collect();

        let jobs: VecDeque<CaseJob> = plan
            .jobs
            .into_iter()
            .map(|job| CaseJob {
                log: sink.clone(),
                ..job
            })
            .collect();
        let queue = Arc::new(Mutex::new(jobs));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<CaseResult>();
        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|worker| {
                tokio::spawn(
                    worker_loop(
                        worker,
                        Arc::clone(&self.executor),
                        Arc::clone(&queue),
                        done_tx.clone(),
                        cancel.clone(),
                    )
                    .in_current_span(),
                )
            })
            .collect();
        drop(done_tx);

        let mut remaining: BTreeMap<BuildSlot, usize> =
            plan.slots.iter().map(|slot| (*slot, case_count)).collect();
        let mut pending: HashMap<String, Vec<CaseResult>> = HashMap::new();
        let mut case_results = Vec::with_capacity(job_count);
        let mut pair_results = Vec::with_capacity(case_count);
        let mut completed = 0usize;

        while let Some(result) = done_rx.recv().await {
            METRICS.record_pipeline(result.success);
            obs::emit_case_completed(&result);
            completed += 1;
            sink.emit(SuiteEvent::CaseCompleted {
                result: result.clone(),
                progress: Progress { completed, total },
            });

            if let Some(left) = remaining.get_mut(&result.build) {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    obs::emit_build_complete(result.build);
                    sink.emit(SuiteEvent::BuildSimulationsComplete {
                        build: result.build,
                    });
                }
            }

            case_results.push(result.clone());
            let case_id = result.case_id.clone();
            let ready = {
                let collected = pending.entry(case_id.clone()).or_default();
                collected.push(result);
                collected.len() == plan.slots.len()
            };
            if !ready {
                continue;
            }

            let results = pending.remove(&case_id).unwrap_or_default();
            for r in &results {
                sink.emit(SuiteEvent::EndProcessingCompleted {
                    case_id: case_id.clone(),
                    build: r.build,
                });
            }

            let pair = self.classify(&case_id, results).await;
            METRICS.inc_cases_classified();
            obs::emit_case_classified(&case_id, pair.outcomes.len(), pair.is_clean());
            completed += 1;
            sink.emit(SuiteEvent::DiffCompleted {
                case_id,
                progress: Progress { completed, total },
            });
            pair_results.push(pair);
        }

        for joined in futures::future::join_all(handles).await {
            if let Err(e) = joined {
                warn!(error = %e, "worker task ended abnormally");
            }
        }

        let by_case = |id: &str| order.get(id).copied().unwrap_or(usize::MAX);
        case_results.sort_by_key(|r| (by_case(&r.case_id), r.build));
        pair_results.sort_by_key(|p| by_case(&p.case_id));

        let cancelled = case_results.len() < job_count;
        if cancelled {
            obs::emit_suite_cancelled(&request.suite_id, case_results.len());
            sink.emit(SuiteEvent::Cancelled {
                case_results: case_results.clone(),
                pair_results: pair_results.clone(),
            });
        } else {
            sink.emit(SuiteEvent::AllDone {
                pair_results: pair_results.clone(),
            });
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        obs::emit_suite_finished(&request.suite_id, duration_ms, pair_results.len(), cancelled);
        METRICS.flush();

        Ok(SuiteOutcome {
            suite_id: request.suite_id,
            case_results,
            pair_results,
            cancelled,
            duration_ms,
        })
    }

    /// Classify one joined case off the async runtime; comparators read files.
    async fn classify(&self, case_id: &str, results: Vec<CaseResult>) -> PairResult {
        let mut result_a = None;
        let mut result_b = None;
        for result in results {
            match result.build {
                BuildSlot::A => result_a = Some(result),
                BuildSlot::B => result_b = Some(result),
            }
        }

        let classifier = self.classifier.clone();
        let id = case_id.to_string();
        let (fallback_a, fallback_b) = (result_a.clone(), result_b.clone());
        match tokio::task::spawn_blocking(move || classifier.classify(&id, result_a, result_b))
            .await
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!(case_id = %case_id, error = %e, "classification task failed");
                PairResult::new(case_id, fallback_a, fallback_b)
            }
        }
    }
}

impl std::fmt::Debug for SuiteScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteScheduler")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

async fn worker_loop(
    worker: usize,
    executor: Arc<dyn CaseExecutor>,
    queue: Arc<Mutex<VecDeque<CaseJob>>>,
    done: UnboundedSender<CaseResult>,
    cancel: CancelFlag,
) {
    loop {
        if cancel.is_cancelled() {
            debug!(worker, "cancellation observed, worker stopping");
            break;
        }
        let next = queue.lock().await.pop_front();
        let Some(job) = next else { break };

        debug!(worker, case_id = %job.case.id, build = %job.slot, "pipeline starting");
        let result = match AssertUnwindSafe(executor.execute(&job)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                warn!(case_id = %job.case.id, build = %job.slot, "pipeline panicked");
                CaseResult::failed(
                    &job.case.id,
                    job.slot,
                    job.run_dir(),
                    "executor",
                    "pipeline panicked",
                )
            }
        };
        if done.send(result).is_err() {
            break;
        }
    }
}
