//! Fixtures shared by plugin unit tests.

use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::error::ParamError;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{RawParams, ValidationMode};
use crate::plugin::Plugin;
use crate::result::AuditResult;

/// Context evaluated at 2024-06-01T12:00:00Z.
pub(crate) fn ctx() -> EvaluationContext {
    EvaluationContext::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

/// Column named `col` with primary keys `0..n`.
pub(crate) fn column(values: Vec<Value>) -> ColumnData {
    let keys = (0..values.len()).map(Value::from).collect();
    ColumnData::new("col", values).with_primary_key(keys).unwrap()
}

fn raw(params: Value) -> RawParams {
    params.as_object().cloned().unwrap_or_default()
}

/// Validates `params` strictly and runs the plugin.
pub(crate) fn run(plugin: &dyn Plugin, column: &ColumnData, params: Value) -> Vec<AuditResult> {
    run_with(plugin, column, params, &ctx())
}

/// Same as [`run`] with an explicit context.
pub(crate) fn run_with(
    plugin: &dyn Plugin,
    column: &ColumnData,
    params: Value,
    ctx: &EvaluationContext,
) -> Vec<AuditResult> {
    let params = plugin
        .validate_params(&raw(params), ValidationMode::Strict)
        .unwrap();
    plugin.run(column, &params, ctx).unwrap()
}

/// Returns the validation error for `params`.
pub(crate) fn param_error(plugin: &dyn Plugin, params: Value) -> ParamError {
    plugin
        .validate_params(&raw(params), ValidationMode::Strict)
        .unwrap_err()
}
