//! Values that differ only in letter case.

use std::collections::HashMap;

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::Params;
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};

#[derive(Debug, Default)]
struct CaseGroup<'a> {
    /// Distinct spellings with the row each first appeared in
    casings: Vec<(&'a str, usize)>,
    rows: u64,
}

/// Groups strings by lower-case form and reports groups spelled more than one way.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseDuplicates;

impl Plugin for CaseDuplicates {
    fn name(&self) -> &'static str {
        "case_duplicates"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Values that differ only in letter case"
    }

    fn run(
        &self,
        column: &ColumnData,
        _params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, CaseGroup<'_>> = HashMap::new();
        let mut evaluated = 0u64;

        for (row, value) in column.strings() {
            evaluated += 1;
            let lower = value.to_lowercase();
            let group = groups.entry(lower.clone()).or_insert_with(|| {
                order.push(lower);
                CaseGroup::default()
            });
            group.rows += 1;
            if !group.casings.iter().any(|(casing, _)| *casing == value) {
                group.casings.push((value, row));
            }
        }

        let mut results = Vec::new();
        for lower in &order {
            let Some(group) = groups.get(lower) else {
                continue;
            };
            if group.casings.len() < 2 {
                continue;
            }

            let mut examples = ExampleCollector::for_context(ctx);
            for (_, row) in &group.casings {
                examples.offer(column, *row);
            }
            let spellings: Vec<&str> = group.casings.iter().map(|(casing, _)| *casing).collect();

            results.push(
                AuditResult::issue(self.name(), column.name(), "CASE_DUPLICATES", Severity::Warning)
                    .message(format!(
                        "'{}' is spelled {} ways: {}",
                        lower,
                        spellings.len(),
                        spellings.join(", ")
                    ))
                    .affected(group.rows, evaluated)
                    .examples(examples.into_examples())
                    .build()?,
            );
        }
        Ok(results)
    }
}
