//! Numeric distribution statistics.
//!
//! Values come from numeric cells and from strings that parse as finite
//! numbers under the context's number format.

use crate::Result;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::AuditResult;

/// Nearest-rank quantile of sorted values.
fn nearest_rank(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.clamp(1, sorted.len()) - 1).copied()
}

/// Label such as `p25` or `p99.9`.
fn quantile_label(q: f64) -> String {
    format!("p{}", (q * 100.0 * 1e4).round() / 1e4)
}

/// Reports nearest-rank quantiles of numeric values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quantiles;

impl Plugin for Quantiles {
    fn name(&self) -> &'static str {
        "quantiles"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Insight
    }

    fn description(&self) -> &'static str {
        "Quantiles of numeric values"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new().field(
            ParamSpec::new("quantiles", ParamType::FloatList)
                .default_value(vec![0.25, 0.5, 0.75])
                .between(0.0, 1.0)
                .non_empty()
                .describe("Quantiles to compute, each in [0, 1]"),
        )
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let mut values: Vec<f64> = column.numbers(ctx.number_format()).map(|(_, v)| v).collect();
        values.sort_by(f64::total_cmp);
        let evaluated = values.len() as u64;

        let mut results = Vec::new();
        for q in params.float_list("quantiles")? {
            let Some(value) = nearest_rank(&values, *q) else {
                break;
            };
            results.push(
                AuditResult::statistic(self.name(), column.name(), quantile_label(*q))
                    .message(format!("{} quantile is {}", quantile_label(*q), value))
                    .value(value)
                    .evaluated(evaluated)
                    .build()?,
            );
        }
        Ok(results)
    }
}

/// Reports min, max, mean and population standard deviation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericSummary;

impl Plugin for NumericSummary {
    fn name(&self) -> &'static str {
        "numeric_summary"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Insight
    }

    fn description(&self) -> &'static str {
        "Minimum, maximum, mean and standard deviation of numeric values"
    }

    fn run(
        &self,
        column: &ColumnData,
        _params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let values: Vec<f64> = column.numbers(ctx.number_format()).map(|(_, v)| v).collect();
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let evaluated = values.len() as u64;

        [
            ("min", min),
            ("max", max),
            ("mean", mean),
            ("std_dev", variance.sqrt()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_finite())
        .map(|(label, value)| {
            AuditResult::statistic(self.name(), column.name(), label)
                .message(format!("{} is {}", label, value))
                .value(value)
                .evaluated(evaluated)
                .build()
                .map_err(Into::into)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{column, run};
    use serde_json::json;

    #[test]
    fn test_nearest_rank() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(nearest_rank(&sorted, 0.0), Some(1.0));
        assert_eq!(nearest_rank(&sorted, 0.25), Some(1.0));
        assert_eq!(nearest_rank(&sorted, 0.5), Some(2.0));
        assert_eq!(nearest_rank(&sorted, 0.51), Some(3.0));
        assert_eq!(nearest_rank(&sorted, 1.0), Some(4.0));
        assert_eq!(nearest_rank(&[], 0.5), None);
    }

    #[test]
    fn test_quantile_labels() {
        assert_eq!(quantile_label(0.25), "p25");
        assert_eq!(quantile_label(0.1), "p10");
        assert_eq!(quantile_label(0.999), "p99.9");
    }

    #[test]
    fn test_quantiles_over_mixed_cells() {
        let col = column(vec![
            json!(15),
            json!("20"),
            json!(null),
            json!("abc"),
            json!(35),
            json!(50.5),
            json!(40),
        ]);
        let results = run(&Quantiles, &col, json!({}));

        let labels: Vec<_> = results.iter().map(|r| r.label().to_string()).collect();
        assert_eq!(labels, vec!["p25", "p50", "p75"]);
        let values: Vec<_> = results.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![Some(20.0), Some(35.0), Some(40.0)]);
        assert_eq!(results[0].evaluated(), 5);
        assert_eq!(results[0].count(), 0);
    }

    #[test]
    fn test_quantiles_empty_column() {
        assert!(run(&Quantiles, &column(vec![json!("x")]), json!({"quantiles": [0.5]})).is_empty());
    }

    #[test]
    fn test_numeric_summary() {
        let col = column(vec![json!(2), json!(4), json!(4), json!(4), json!(5), json!(5), json!(7), json!(9)]);
        let results = run(&NumericSummary, &col, json!({}));

        let stats: Vec<_> = results.iter().map(|r| (r.label(), r.value())).collect();
        assert_eq!(
            stats,
            vec![
                ("min", Some(2.0)),
                ("max", Some(9.0)),
                ("mean", Some(5.0)),
                ("std_dev", Some(2.0)),
            ]
        );
    }

    #[test]
    fn test_numeric_summary_no_numbers() {
        assert!(run(&NumericSummary, &column(vec![json!(null), json!("x")]), json!({})).is_empty());
    }
}
