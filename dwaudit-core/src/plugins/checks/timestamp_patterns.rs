//! Timestamps that behave like dates.
//!
//! Hours are read from the wall-clock time as written. A value with a UTC
//! offset such as `+02:00` keeps its local hour.

use chrono::Timelike;

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};
use crate::values::parse_timestamp;

/// Constant-hour detection only applies to columns with at most this many distinct hours.
const MAX_DISTINCT_HOURS: usize = 3;

/// Flags timestamp columns stuck on one hour or always at midnight.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampPatterns;

impl Plugin for TimestampPatterns {
    fn name(&self) -> &'static str {
        "timestamp_patterns"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Timestamps that are effectively dates (local wall-clock hour)"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new()
            .field(
                ParamSpec::new("constant_hour_threshold", ParamType::Float)
                    .default_value(0.9)
                    .between(0.0, 1.0),
            )
            .field(
                ParamSpec::new("midnight_threshold", ParamType::Float)
                    .default_value(0.95)
                    .between(0.0, 1.0),
            )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let hour_threshold = params.float("constant_hour_threshold")?;
        let midnight_threshold = params.float("midnight_threshold")?;

        // Date-only cells carry no time of day and are left out.
        let mut hour_counts = [0u64; 24];
        let mut hour_order: Vec<usize> = Vec::new();
        let mut midnight = 0u64;
        let mut evaluated = 0u64;
        let mut examples = ExampleCollector::for_context(ctx);

        for (row, value) in column.non_null() {
            let Some(parsed) = parse_timestamp(value) else {
                continue;
            };
            if parsed.date_only {
                continue;
            }
            evaluated += 1;
            examples.offer(column, row);

            let time = parsed.local.time();
            let hour = time.hour() as usize;
            if let Some(slot) = hour_counts.get_mut(hour) {
                if *slot == 0 {
                    hour_order.push(hour);
                }
                *slot += 1;
            }
            if time.hour() == 0 && time.minute() == 0 && time.second() == 0 {
                midnight += 1;
            }
        }

        if evaluated == 0 {
            return Ok(Vec::new());
        }

        let examples = examples.into_examples();
        let mut results = Vec::new();

        if hour_order.len() <= MAX_DISTINCT_HOURS {
            // Ties go to the hour seen first
            let mut dominant = (0usize, 0u64);
            for hour in &hour_order {
                let count = hour_counts.get(*hour).copied().unwrap_or_default();
                if count > dominant.1 {
                    dominant = (*hour, count);
                }
            }
            let share = dominant.1 as f64 / evaluated as f64;
            if share > hour_threshold {
                results.push(
                    AuditResult::issue(self.name(), column.name(), "CONSTANT_HOUR", Severity::Info)
                        .message(format!(
                            "{:.1}% of timestamps fall in hour {:02}; the column may be date-only",
                            share * 100.0,
                            dominant.0
                        ))
                        .value(dominant.0 as f64)
                        .affected(dominant.1, evaluated)
                        .examples(examples.clone())
                        .build()?,
                );
            }
        }

        let share = midnight as f64 / evaluated as f64;
        if share > midnight_threshold {
            results.push(
                AuditResult::issue(self.name(), column.name(), "ALWAYS_MIDNIGHT", Severity::Info)
                    .message(format!(
                        "{:.1}% of timestamps are at midnight; consider a date type",
                        share * 100.0
                    ))
                    .affected(midnight, evaluated)
                    .examples(examples)
                    .build()?,
            );
        }
        Ok(results)
    }
}
