//! Regular-expression conformance.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    MustMatch,
    MustNotMatch,
}

impl MatchMode {
    fn parse(mode: &str) -> Self {
        if mode == "must_not_match" {
            MatchMode::MustNotMatch
        } else {
            MatchMode::MustMatch
        }
    }
}

/// Flags strings that violate a required or forbidden pattern.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternMatch;

impl Plugin for PatternMatch {
    fn name(&self) -> &'static str {
        "pattern_match"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Strings that must or must not match a regular expression"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new()
            .field(
                ParamSpec::new("pattern", ParamType::Regex)
                    .required()
                    .describe("Regular expression searched within each value"),
            )
            .field(
                ParamSpec::new("mode", ParamType::String)
                    .default_value("must_match")
                    .one_of(&["must_match", "must_not_match"]),
            )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let pattern = params.regex("pattern")?;
        let mode = MatchMode::parse(params.str("mode")?);

        let mut evaluated = 0u64;
        let mut count = 0u64;
        let mut examples = ExampleCollector::for_context(ctx);
        for (row, value) in column.strings() {
            evaluated += 1;
            let violates = match mode {
                MatchMode::MustMatch => !pattern.is_match(value),
                MatchMode::MustNotMatch => pattern.is_match(value),
            };
            if violates {
                count += 1;
                examples.offer(column, row);
            }
        }

        if count == 0 {
            return Ok(Vec::new());
        }

        let (label, verb) = match mode {
            MatchMode::MustMatch => ("PATTERN_MISMATCH", "do not match"),
            MatchMode::MustNotMatch => ("FORBIDDEN_PATTERN", "match forbidden pattern"),
        };
        let result = AuditResult::issue(self.name(), column.name(), label, Severity::Warning)
            .message(format!(
                "{} of {} values {} {}",
                count,
                evaluated,
                verb,
                pattern.as_str()
            ))
            .affected(count, evaluated)
            .examples(examples.into_examples())
            .build()?;
        Ok(vec![result])
    }
}
