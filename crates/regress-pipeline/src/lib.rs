//! Regression pipeline - per-case simulation tool chain
//!
//! Runs one case against one build inside its own run directory:
//! - Prepares inputs (macro expansion, parametric selection, object expansion)
//! - Runs ground heat transfer preprocessors when an expansion asks for them
//! - Launches the simulator with the run-mode environment
//! - Postprocesses outputs and judges the end-of-run marker

pub mod end_summary;
pub mod env;
pub mod error;
pub mod pipeline;
pub mod reorder;
pub mod runner;
pub mod stage;

// Re-export key types
pub use end_summary::parse_end_summary;
pub use env::RunEnvironment;
pub use error::{StageError, StageResult};
pub use pipeline::{CasePipeline, ERROR_FILE};
pub use reorder::{reorder_design_day_blocks, reorder_run_outputs};
pub use runner::{ToolOutput, ToolRunner};
pub use stage::{PipelineStage, ToolCommand};
