//! String length statistics.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::Params;
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, Example};

/// Reports minimum, maximum and mean length of string values in characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthStats;

impl Plugin for LengthStats {
    fn name(&self) -> &'static str {
        "length_stats"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Insight
    }

    fn description(&self) -> &'static str {
        "Minimum, maximum and mean string length"
    }

    fn run(
        &self,
        column: &ColumnData,
        _params: &Params,
        _ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let mut evaluated = 0u64;
        let mut total = 0u64;
        // (length, row) of the shortest and longest values seen first
        let mut shortest: Option<(usize, usize)> = None;
        let mut longest: Option<(usize, usize)> = None;

        for (row, value) in column.strings() {
            let len = value.chars().count();
            evaluated += 1;
            total += len as u64;
            if shortest.is_none_or(|(min, _)| len < min) {
                shortest = Some((len, row));
            }
            if longest.is_none_or(|(max, _)| len > max) {
                longest = Some((len, row));
            }
        }

        let (Some((min, min_row)), Some((max, max_row))) = (shortest, longest) else {
            return Ok(Vec::new());
        };
        let mean = total as f64 / evaluated as f64;

        Ok(vec![
            AuditResult::statistic(self.name(), column.name(), "min_length")
                .message(format!("shortest value has {} characters", min))
                .value(min as f64)
                .evaluated(evaluated)
                .examples(vec![Example::from_row(column, min_row)])
                .build()?,
            AuditResult::statistic(self.name(), column.name(), "max_length")
                .message(format!("longest value has {} characters", max))
                .value(max as f64)
                .evaluated(evaluated)
                .examples(vec![Example::from_row(column, max_row)])
                .build()?,
            AuditResult::statistic(self.name(), column.name(), "mean_length")
                .message(format!("mean length is {:.2} characters", mean))
                .value(mean)
                .evaluated(evaluated)
                .build()?,
        ])
    }
}
