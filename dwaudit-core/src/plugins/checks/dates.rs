//! Timestamp checks relative to the evaluation instant.
//!
//! Both checks read `now` from the [`EvaluationContext`] so results do not
//! depend on when the audit happens to execute.

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};

use crate::Result;
use crate::error::ParamError;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};
use crate::values::parse_timestamp;

/// Rows matching a predicate over parsed timestamps.
struct Scan {
    evaluated: u64,
    count: u64,
    examples: ExampleCollector,
}

fn scan(
    column: &ColumnData,
    ctx: &EvaluationContext,
    mut predicate: impl FnMut(DateTime<Utc>) -> bool,
) -> Scan {
    let mut scan = Scan {
        evaluated: 0,
        count: 0,
        examples: ExampleCollector::for_context(ctx),
    };
    for (row, value) in column.non_null() {
        let Some(parsed) = parse_timestamp(value) else {
            continue;
        };
        scan.evaluated += 1;
        if predicate(parsed.instant) {
            scan.count += 1;
            scan.examples.offer(column, row);
        }
    }
    scan
}

/// Flags timestamps later than the evaluation instant plus a tolerance.
#[derive(Debug, Default, Clone, Copy)]
pub struct FutureDates;

impl Plugin for FutureDates {
    fn name(&self) -> &'static str {
        "future_dates"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Timestamps later than the evaluation time"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("tolerance_days", ParamType::Integer)
                .default_value(0_i64)
                .at_least(0.0)
                .describe("Days past the evaluation time still accepted"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let tolerance = params.int("tolerance_days")?;
        // A tolerance beyond the representable range accepts everything
        let Some(cutoff) = TimeDelta::try_days(tolerance)
            .and_then(|delta| ctx.now().checked_add_signed(delta))
        else {
            return Ok(Vec::new());
        };

        let found = scan(column, ctx, |instant| instant > cutoff);
        if found.count == 0 {
            return Ok(Vec::new());
        }

        let result = AuditResult::issue(self.name(), column.name(), "FUTURE_DATES", Severity::Warning)
            .message(format!(
                "{} of {} timestamps are after {}",
                found.count,
                found.evaluated,
                cutoff.to_rfc3339()
            ))
            .affected(found.count, found.evaluated)
            .examples(found.examples.into_examples())
            .build()?;
        Ok(vec![result])
    }
}

/// Typed settings for [`DateOutliers`].
struct OutlierWindow {
    earliest: DateTime<Utc>,
    latest: Option<DateTime<Utc>>,
}

impl OutlierWindow {
    fn from_params(params: &Params, now: DateTime<Utc>) -> std::result::Result<Self, ParamError> {
        let min_year = params.int("min_year")?;
        let earliest = i32::try_from(min_year)
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| ParamError::range("min_year", format!("{} is not a valid year", min_year)))?;

        let years_ahead = params.int("max_years_ahead")?;
        let latest = u32::try_from(years_ahead)
            .ok()
            .and_then(|years| years.checked_mul(12))
            .and_then(|months| now.checked_add_months(Months::new(months)));

        Ok(Self { earliest, latest })
    }
}

/// Flags implausibly old timestamps and ones too far in the future.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateOutliers;

impl Plugin for DateOutliers {
    fn name(&self) -> &'static str {
        "date_outliers"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Timestamps before a minimum year or too far in the future"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new()
            .field(
                ParamSpec::new("min_year", ParamType::Integer)
                    .default_value(1950_i64)
                    .between(1.0, 9999.0)
                    .describe("Timestamps before January 1st of this year are flagged"),
            )
            .field(
                ParamSpec::new("max_years_ahead", ParamType::Integer)
                    .default_value(1_i64)
                    .between(0.0, 1000.0)
                    .describe("Years past the evaluation time still accepted"),
            )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let window = OutlierWindow::from_params(params, ctx.now())?;
        let mut results = Vec::new();

        let old = scan(column, ctx, |instant| instant < window.earliest);
        if old.count > 0 {
            results.push(
                AuditResult::issue(self.name(), column.name(), "DATE_TOO_OLD", Severity::Warning)
                    .message(format!(
                        "{} of {} timestamps are before {}",
                        old.count,
                        old.evaluated,
                        window.earliest.date_naive()
                    ))
                    .affected(old.count, old.evaluated)
                    .examples(old.examples.into_examples())
                    .build()?,
            );
        }

        if let Some(latest) = window.latest {
            let ahead = scan(column, ctx, |instant| instant > latest);
            if ahead.count > 0 {
                results.push(
                    AuditResult::issue(self.name(), column.name(), "DATE_TOO_FAR_AHEAD", Severity::Warning)
                        .message(format!(
                            "{} of {} timestamps are after {}",
                            ahead.count,
                            ahead.evaluated,
                            latest.date_naive()
                        ))
                        .affected(ahead.count, ahead.evaluated)
                        .examples(ahead.examples.into_examples())
                        .build()?,
                );
            }
        }
        Ok(results)
    }
}
