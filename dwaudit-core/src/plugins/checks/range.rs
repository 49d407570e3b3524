//! Numeric values outside exclusive bounds.

use std::collections::HashMap;

use crate::Result;
use crate::error::ParamError;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params, RawParams, ValidationMode};
use crate::plugin::{Plugin, PluginCategory};
use crate::result::{AuditResult, ExampleCollector, Severity};

/// Typed settings for [`NumericRange`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    greater_than: Option<f64>,
    less_than: Option<f64>,
}

impl Bounds {
    fn from_params(params: &Params) -> std::result::Result<Self, ParamError> {
        Ok(Self {
            greater_than: params.opt_float("greater_than")?,
            less_than: params.opt_float("less_than")?,
        })
    }

    /// The violated bound, if any.
    fn violation(&self, value: f64) -> Option<Bound> {
        match (self.greater_than, self.less_than) {
            (Some(min), _) if value <= min => Some(Bound::Lower(min)),
            (_, Some(max)) if value >= max => Some(Bound::Upper(max)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    Lower(f64),
    Upper(f64),
}

impl Bound {
    fn label(self) -> &'static str {
        match self {
            Bound::Lower(_) => "VALUE_TOO_LOW",
            Bound::Upper(_) => "VALUE_TOO_HIGH",
        }
    }

    fn requirement(self) -> String {
        match self {
            Bound::Lower(min) => format!("must be greater than {}", min),
            Bound::Upper(max) => format!("must be less than {}", max),
        }
    }
}

struct Violation {
    value: f64,
    bound: Bound,
    examples: ExampleCollector,
    count: u64,
}

/// Flags numeric values not strictly between the configured bounds.
///
/// Null and non-numeric cells are excluded from the evaluated rows. Each
/// distinct violating value yields its own issue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericRange;

impl Plugin for NumericRange {
    fn name(&self) -> &'static str {
        "numeric_range"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Numeric values outside exclusive bounds"
    }

    fn parameter_schema(&self) -> ParamSchema {
        ParamSchema::new()
            .field(
                ParamSpec::new("greater_than", ParamType::Float)
                    .describe("Values must be strictly greater than this"),
            )
            .field(
                ParamSpec::new("less_than", ParamType::Float)
                    .describe("Values must be strictly less than this"),
            )
    }

    fn validate_params(
        &self,
        raw: &RawParams,
        mode: ValidationMode,
    ) -> std::result::Result<Params, ParamError> {
        let params = self.parameter_schema().validate(raw, mode)?;
        match Bounds::from_params(&params)? {
            Bounds {
                greater_than: None,
                less_than: None,
            } => Err(ParamError::MissingRequired {
                field: "greater_than or less_than".to_string(),
            }),
            Bounds {
                greater_than: Some(min),
                less_than: Some(max),
            } if min >= max => Err(ParamError::range(
                "less_than",
                format!("{} must be greater than greater_than ({})", max, min),
            )),
            _ => Ok(params),
        }
    }

    fn run(
        &self,
        column: &ColumnData,
        params: &Params,
        ctx: &EvaluationContext,
    ) -> Result<Vec<AuditResult>> {
        let bounds = Bounds::from_params(params)?;
        let mut evaluated = 0u64;
        let mut violations: Vec<Violation> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();

        for (row, value) in column.numbers(ctx.number_format()) {
            evaluated += 1;
            let Some(bound) = bounds.violation(value) else {
                continue;
            };
            // -0.0 and 0.0 share a group
            let key = if value == 0.0 { 0.0f64.to_bits() } else { value.to_bits() };
            let slot = *index.entry(key).or_insert_with(|| {
                violations.push(Violation {
                    value,
                    bound,
                    examples: ExampleCollector::for_context(ctx),
                    count: 0,
                });
                violations.len() - 1
            });
            if let Some(violation) = violations.get_mut(slot) {
                violation.count += 1;
                violation.examples.offer(column, row);
            }
        }

        violations
            .into_iter()
            .map(|violation| {
                AuditResult::issue(self.name(), column.name(), violation.bound.label(), Severity::Warning)
                    .message(format!(
                        "value {} occurs {} times but {}",
                        violation.value,
                        violation.count,
                        violation.bound.requirement()
                    ))
                    .value(violation.value)
                    .affected(violation.count, evaluated)
                    .examples(violation.examples.into_examples())
                    .build()
                    .map_err(Into::into)
            })
            .collect()
    }
}
