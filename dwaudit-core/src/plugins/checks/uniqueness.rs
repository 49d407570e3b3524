//! Duplicate values in columns expected to be unique.

use std::collections::HashMap;

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};
use crate::values::{display_value, group_key};

/// Reports each group of rows sharing a value.
///
/// Strings can be compared case-insensitively; other values compare by their
/// canonical JSON form. Nulls never count as duplicates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uniqueness;

impl Plugin for Uniqueness {
    fn name(&self) -> &'static str {
        "uniqueness"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Duplicate values in a column expected to be unique"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("case_insensitive", ParamType::Bool)
                .default_value(false)
                .describe("Compare strings ignoring letter case"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let case_insensitive = params.bool("case_insensitive")?;
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut evaluated = 0u64;

        for (row, value) in column.non_null() {
            evaluated += 1;
            let slot = *index
                .entry(group_key(value, case_insensitive))
                .or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
            if let Some(rows) = groups.get_mut(slot) {
                rows.push(row);
            }
        }

        let mut results = Vec::new();
        for rows in groups.iter().filter(|rows| rows.len() > 1) {
            let first = rows
                .first()
                .and_then(|row| column.values().get(*row))
                .map(display_value)
                .unwrap_or_default();
            let mut examples = ExampleCollector::for_context(ctx);
            for row in rows {
                examples.offer(column, *row);
            }

            results.push(
                AuditResult::issue(self.name(), column.name(), "DUPLICATE_VALUES", Severity::Critical)
                    .message(format!("value '{}' appears {} times", first, rows.len()))
                    .affected(rows.len() as u64, evaluated)
                    .examples(examples.into_examples())
                    .build()?,
            );
        }

        if !results.is_empty() {
            tracing::debug!(
                "Column '{}' has {} duplicate groups",
                column.name(),
                results.len()
            );
        }
        Ok(results)
    }
}
