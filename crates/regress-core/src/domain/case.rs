//! Input cases scheduled by a suite run.

use serde::{Deserialize, Serialize};

use crate::domain::error::{RegressError, Result};

/// One named simulation input scenario.
///
/// `id` is the input file base name without extension. Flags are inherited
/// from the case catalog and decide which optional pipeline stages run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Case {
    pub id: String,

    /// Weather file identifier (base name, no `.epw`). `None` means the case
    /// is only eligible for design-day runs.
    #[serde(default)]
    pub weather: Option<String>,

    #[serde(default)]
    pub parametric: bool,

    #[serde(default)]
    pub macro_input: bool,
}

impl Case {
    /// Create a case with no catalog flags set.
    pub fn new(id: impl Into<String>, weather: Option<&str>) -> Self {
        Self {
            id: id.into(),
            weather: weather.map(str::to_string),
            parametric: false,
            macro_input: false,
        }
    }

    /// Mark the case as requiring the parametric preprocessor.
    pub fn with_parametric(mut self) -> Self {
        self.parametric = true;
        self
    }

    /// Whether the case carries a weather file association.
    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }
}

/// Reject empty identifiers and duplicates; case ids key every result map.
pub fn validate_case_list(cases: &[Case]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for case in cases {
        if case.id.trim().is_empty() {
            return Err(RegressError::Config("case id must not be empty".to_string()));
        }
        if !seen.insert(case.id.as_str()) {
            return Err(RegressError::Config(format!(
                "duplicate case id: {}",
                case.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_defaults_from_json() {
        let case: Case = serde_json::from_str(r#"{"id":"1ZoneUncontrolled"}"#).expect("parse");
        assert_eq!(case.id, "1ZoneUncontrolled");
        assert!(!case.has_weather());
        assert!(!case.parametric);
        assert!(!case.macro_input);
    }

    #[test]
    fn test_duplicate_case_ids_rejected() {
        let cases = vec![
            Case::new("5ZoneAirCooled", Some("USA_IL_Chicago")),
            Case::new("5ZoneAirCooled", None),
        ];
        let err = validate_case_list(&cases).unwrap_err();
        assert!(err.to_string().contains("duplicate case id"));
    }

    #[test]
    fn test_empty_case_id_rejected() {
        assert!(validate_case_list(&[Case::new(" ", None)]).is_err());
        assert!(validate_case_list(&[Case::new("a", None), Case::new("b", None)]).is_ok());
    }
}
