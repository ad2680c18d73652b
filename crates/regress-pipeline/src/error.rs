//! Failures inside a single case pipeline.

use std::path::PathBuf;

/// Why a pipeline stage could not complete.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to launch {tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {secs}s")]
    ToolTimeout { tool: String, secs: u64 },

    #[error("required input missing: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("case {case_id} has no weather file for a weather-driven run")]
    NoWeather { case_id: String },

    #[error("expected output not produced: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("malformed output: {0}")]
    MalformedOutput(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StageError {
        let path = path.into();
        move |source| StageError::Io { path, source }
    }
}

pub type StageResult<T> = std::result::Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_path() {
        let err = StageError::MissingOutput(PathBuf::from("/runs/c1/out.idf"));
        assert_eq!(err.to_string(), "expected output not produced: /runs/c1/out.idf");
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = StageError::io("/runs/c1/in.idf")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(err.to_string().starts_with("io error on /runs/c1/in.idf"));
    }
}
