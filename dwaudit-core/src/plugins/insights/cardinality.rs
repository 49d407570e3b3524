//! Distinct value counts.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::Params;
use crate::plugin::{Plugin, PluginCategory};
use crate::result::AuditResult;

/// Reports the distinct count and distinct ratio over non-null values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cardinality;

impl Plugin for Cardinality {
    fn name(&self) -> &'static str {
        "cardinality"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Insight
    }

    fn description(&self) -> &'static str {
        "Number and ratio of distinct values"
    }

    fn run(
        &self,
        column: &ColumnData,
        _params: &Params,
        _ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let evaluated = column.non_null_count();
        if evaluated == 0 {
            return Ok(Vec::new());
        }
        let distinct = column.distinct_count();
        let ratio = distinct as f64 / evaluated as f64;

        Ok(vec![
            AuditResult::statistic(self.name(), column.name(), "distinct_count")
                .message(format!("{} distinct values in {} rows", distinct, evaluated))
                .value(distinct as f64)
                .affected(distinct, evaluated)
                .build()?,
            AuditResult::statistic(self.name(), column.name(), "distinct_ratio")
                .message(format!("distinct ratio is {:.3}", ratio))
                .value(ratio)
                .evaluated(evaluated)
                .build()?,
        ])
    }
}
