//! Strings containing characters outside an allowed set.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};

const DEFAULT_PATTERN: &str = r"[^a-zA-Z0-9\s\.,\-_@]";

/// Distinct matched fragments listed in the message.
const MAX_LISTED: usize = 10;

/// Flags strings where the configured pattern finds a match.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecialCharacters;

impl Plugin for SpecialCharacters {
    fn name(&self) -> &'static str {
        "special_characters"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Strings containing special characters"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("pattern", ParamType::Regex)
                .default_value(DEFAULT_PATTERN)
                .describe("Regex matching a disallowed character"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let pattern = params.regex("pattern")?;
        let mut evaluated = 0u64;
        let mut count = 0u64;
        let mut found: Vec<&str> = Vec::new();
        let mut examples = ExampleCollector::for_context(ctx);

        for (row, value) in column.strings() {
            evaluated += 1;
            let mut matched = false;
            for m in pattern.find_iter(value) {
                matched = true;
                if found.len() < MAX_LISTED && !m.as_str().is_empty() && !found.contains(&m.as_str()) {
                    found.push(m.as_str());
                }
            }
            if matched {
                count += 1;
                examples.offer(column, row);
            }
        }

        if count == 0 {
            return Ok(Vec::new());
        }

        let listed: Vec<String> = found.iter().map(|s| format!("'{}'", s)).collect();
        let result = AuditResult::issue(self.name(), column.name(), "SPECIAL_CHARACTERS", Severity::Warning)
            .message(format!(
                "{} of {} values contain special characters: {}",
                count,
                evaluated,
                listed.join(", ")
            ))
            .affected(count, evaluated)
            .examples(examples.into_examples())
            .build()?;
        Ok(vec![result])
    }
}
