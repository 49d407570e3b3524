//! Leading and trailing character checks.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Leading,
    Trailing,
}

impl Edge {
    fn label(self) -> &'static str {
        match self {
            Edge::Leading => "LEADING_CHARACTERS",
            Edge::Trailing => "TRAILING_CHARACTERS",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Edge::Leading => "start",
            Edge::Trailing => "end",
        }
    }

    fn trim<'a>(self, value: &'a str, characters: &[char]) -> &'a str {
        match self {
            Edge::Leading => value.trim_start_matches(characters),
            Edge::Trailing => value.trim_end_matches(characters),
        }
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new().field(
        ParamSpec::new("characters", ParamType::String)
            .default_value(" ")
            .non_empty()
            .describe("Characters to look for; any of them counts"),
    )
}

fn scan(
    plugin: &'static str,
    edge: Edge,
    column: &ColumnData,
    params: &Params,
    ctx: &EvaluationContext,
) -> Result<Vec<AuditResult>> {
    let characters: Vec<char> = params.str("characters")?.chars().collect();
    let mut evaluated = 0u64;
    let mut count = 0u64;
    let mut examples = ExampleCollector::for_context(ctx);

    for (row, value) in column.strings() {
        evaluated += 1;
        if edge.trim(value, &characters).len() != value.len() {
            count += 1;
            examples.offer(column, row);
        }
    }

    if count == 0 {
        return Ok(Vec::new());
    }

    let result = AuditResult::issue(plugin, column.name(), edge.label(), Severity::Warning)
        .message(format!(
            "{} of {} values have unwanted characters at the {}",
            count,
            evaluated,
            edge.noun()
        ))
        .affected(count, evaluated)
        .examples(examples.into_examples())
        .build()?;
    Ok(vec![result])
}

/// Flags strings ending with any of the configured characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrailingCharacters;

impl Plugin for TrailingCharacters {
    fn name(&self) -> &'static str {
        "trailing_characters"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Strings ending with unwanted characters such as spaces"
    }

    fn parameter_schema(&self) -> ParamSchema {
        schema()
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        scan(self.name(), Edge::Trailing, column, params, ctx)
    }
}

/// Flags strings starting with any of the configured characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeadingCharacters;

impl Plugin for LeadingCharacters {
    fn name(&self) -> &'static str {
        "leading_characters"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Strings starting with unwanted characters such as spaces"
    }

    fn parameter_schema(&self) -> ParamSchema {
        schema()
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        scan(self.name(), Edge::Leading, column, params, ctx)
    }
}
