//! The contract every check and insight implements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::{AuditError, ParamError};
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, Params, RawParams, ValidationMode};
use crate::result::AuditResult;

/// Plugin category; names are unique within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    /// Rule checks producing issue results
    #[default]
    Check,
    /// Profiling insights producing statistic results
    Insight,
}

impl PluginCategory {
    /// All categories in display order.
    pub const ALL: [PluginCategory; 2] = [PluginCategory::Check, PluginCategory::Insight];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginCategory::Check => "check",
            PluginCategory::Insight => "insight",
        }
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginCategory {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "check" | "checks" => Ok(PluginCategory::Check),
            "insight" | "insights" => Ok(PluginCategory::Insight),
            other => Err(AuditError::configuration(format!(
                "unknown plugin category '{}', expected 'check' or 'insight'",
                other
            ))),
        }
    }
}

/// A named, parameterized computation over a single column.
///
/// Implementations must not fail on malformed data: nulls, empty columns and
/// mixed-type cells are simply non-matching. Errors are reserved for
/// parameter problems and internal faults, which the
/// [`Runner`](crate::runner::Runner) records as failed invocations.
pub trait Plugin: Send + Sync {
    /// Registered name, unique within the category.
    fn name(&self) -> &'static str;

    /// Category the plugin is registered under.
    fn category(&self) -> PluginCategory;

    /// One-line description for listings.
    fn description(&self) -> &'static str;

    /// Declared parameters.
    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new()
    }

    /// Validates raw arguments.
    ///
    /// The default delegates to [`Plugin::parameter_schema`]; override to add
    /// cross-field rules, calling the schema first.
    fn validate_params(
        &self,
        raw: &RawParams,
        mode: ValidationMode,
    ) -> std::result::Result<Params, ParamError> {
        self.parameter_schema().validate(raw, mode)
    }

    /// Evaluates the column and returns zero or more results.
    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>>;
}

/// Creates a fresh plugin instance.
pub type PluginConstructor = fn() -> Box<dyn Plugin>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in PluginCategory::ALL {
            assert_eq!(category.as_str().parse::<PluginCategory>().unwrap(), category);
            assert_eq!(category.to_string(), category.as_str());
        }
        assert_eq!("Insights".parse::<PluginCategory>().unwrap(), PluginCategory::Insight);
        assert!("metric".parse::<PluginCategory>().is_err());
    }

    #[test]
    fn test_category_serde() {
        assert_eq!(serde_json::to_string(&PluginCategory::Insight).unwrap(), "\"insight\"");
        let parsed: PluginCategory = serde_json::from_str("\"check\"").unwrap();
        assert_eq!(parsed, PluginCategory::Check);
        assert_eq!(PluginCategory::default(), PluginCategory::Check);
    }
}
