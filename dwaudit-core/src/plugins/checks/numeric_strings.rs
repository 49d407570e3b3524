//! String columns that mostly hold numbers.

use regex::Regex;

use crate::Result;
use crate::error::AuditError;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};

const NUMERIC_PATTERN: &str = r"^-?\d+\.?\d*$";

/// Flags string columns whose numeric share exceeds a threshold.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericStrings;

impl Plugin for NumericStrings {
    fn name(&self) -> &'static str {
        "numeric_strings"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "String columns that contain mostly numbers"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("threshold", ParamType::Float)
                .default_value(0.8)
                .between(0.0, 1.0)
                .describe("Share of numeric strings above which the column is flagged"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let threshold = params.float("threshold")?;
        let numeric = Regex::new(NUMERIC_PATTERN)
            .map_err(|e| AuditError::execution(self.name(), column.name(), e.to_string()))?;
        let format = ctx.number_format();

        let mut evaluated = 0u64;
        let mut count = 0u64;
        let mut examples = ExampleCollector::for_context(ctx);
        for (row, value) in column.strings() {
            evaluated += 1;
            if numeric.is_match(&format.normalize(value)) {
                count += 1;
                examples.offer(column, row);
            }
        }

        if evaluated == 0 {
            return Ok(Vec::new());
        }
        let share = count as f64 / evaluated as f64;
        if share <= threshold {
            return Ok(Vec::new());
        }

        let result = AuditResult::issue(self.name(), column.name(), "NUMERIC_STRINGS", Severity::Info)
            .message(format!(
                "{:.1}% of values are numeric strings; consider converting to a numeric type",
                share * 100.0
            ))
            .value(share)
            .affected(count, evaluated)
            .examples(examples.into_examples())
            .build()?;
        Ok(vec![result])
    }
}
