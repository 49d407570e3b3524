//! Null share over all rows.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity, percentage};

/// Flags columns whose null percentage exceeds a maximum.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRatio;

impl Plugin for NullRatio {
    fn name(&self) -> &'static str {
        "null_ratio"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Share of null values above an allowed maximum"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("max_null_pct", ParamType::Float)
                .default_value(0.0)
                .between(0.0, 100.0)
                .describe("Highest acceptable percentage of null rows"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let max_pct = params.float("max_null_pct")?;
        let total = column.len() as u64;
        let nulls = column.null_count();
        let pct = percentage(nulls, total);
        if total == 0 || pct <= max_pct {
            return Ok(Vec::new());
        }

        // Examples identify the rows by primary key
        let mut examples = ExampleCollector::for_context(ctx);
        for (row, value) in column.values().iter().enumerate() {
            if examples.is_full() {
                break;
            }
            if value.is_null() {
                examples.offer(column, row);
            }
        }

        let result = AuditResult::issue(self.name(), column.name(), "NULL_RATIO", Severity::Warning)
            .message(format!(
                "{:.1}% of rows are null, above the allowed {:.1}%",
                pct, max_pct
            ))
            .value(pct)
            .affected(nulls, total)
            .examples(examples.into_examples())
            .build()?;
        Ok(vec![result])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{column, run};
    use serde_json::json;

    #[test]
    fn test_null_ratio_over_all_rows() {
        let col = column(vec![json!(null), json!("a"), json!(null), json!(1)]);
        let results = run(&NullRatio, &col, json!({"max_null_pct": 25}));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].count(), 2);
        assert_eq!(results[0].evaluated(), 4);
        assert_eq!(results[0].value(), Some(50.0));
        assert_eq!(results[0].examples()[1].primary_key, Some(json!(2)));
    }

    #[test]
    fn test_within_allowance() {
        let col = column(vec![json!(null), json!("a")]);
        assert!(run(&NullRatio, &col, json!({"max_null_pct": 50})).is_empty());
        assert!(run(&NullRatio, &column(vec![json!("a")]), json!({})).is_empty());
        assert!(run(&NullRatio, &column(vec![]), json!({})).is_empty());
    }
}
