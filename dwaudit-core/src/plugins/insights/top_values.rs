//! Most frequent values.

use std::collections::HashMap;

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, Example};
use crate::values::{display_value, group_key};

/// Reports the most frequent non-null values, one statistic per value.
///
/// Values with equal counts keep the order in which they first appeared.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopValues;

impl Plugin for TopValues {
    fn name(&self) -> &'static str {
        "top_values"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Insight
    }

    fn description(&self) -> &'static str {
        "Most frequent values and their share of rows"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("limit", ParamType::Integer)
                .default_value(5_i64)
                .between(1.0, 100.0)
                .describe("Number of values to report"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        _ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let limit = usize::try_from(params.int("limit")?).unwrap_or(1);

        // (first row, count) in first-seen order
        let mut counts: Vec<(usize, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut evaluated = 0u64;
        for (row, value) in column.non_null() {
            evaluated += 1;
            let slot = *index.entry(group_key(value, false)).or_insert_with(|| {
                counts.push((row, 0));
                counts.len() - 1
            });
            if let Some(entry) = counts.get_mut(slot) {
                entry.1 += 1;
            }
        }

        // Stable sort keeps first appearance as the tie-breaker
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        counts
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(rank, (row, count))| {
                let example = Example::from_row(column, row);
                AuditResult::statistic(self.name(), column.name(), "top_value")
                    .message(format!(
                        "#{} '{}' occurs {} times",
                        rank + 1,
                        display_value(&example.value),
                        count
                    ))
                    .value(count as f64)
                    .affected(count, evaluated)
                    .examples(vec![example])
                    .build()
                    .map_err(Into::into)
            })
            .collect()
    }
}
