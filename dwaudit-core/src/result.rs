//! Result records produced by plugin execution.
//!
//! An [`AuditResult`] is created only inside a plugin's `run`, through a
//! builder that enforces its invariants, and is immutable afterwards. Message
//! and example fields may carry input-derived text; escaping is the
//! responsibility of whichever exporter renders them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DataInvariantError;
use crate::models::{ColumnData, EvaluationContext};

/// Hard cap on examples attached to a single result.
pub const MAX_EXAMPLES: usize = 10;

/// Whether a result reports a rule violation or a descriptive statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Rows violating a rule
    Issue,
    /// Profiling statistic
    Statistic,
}

/// Severity of an issue result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth knowing, rarely wrong
    Info,
    /// Likely a data problem
    Warning,
    /// Breaks a rule the data must hold
    Critical,
}

impl Severity {
    /// Lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sample row value attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// The offending or representative value
    pub value: Value,
    /// Primary-key value of the row the example came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Value>,
}

impl Example {
    /// Creates an example without a primary key.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            primary_key: None,
        }
    }

    /// Creates an example from a row of a column, attaching its primary key.
    pub fn from_row(column: &ColumnData, row: usize) -> Self {
        Self {
            value: column.values().get(row).cloned().unwrap_or(Value::Null),
            primary_key: column.primary_key_at(row).cloned(),
        }
    }
}

/// Collects the first N examples in evaluation order.
#[derive(Debug, Clone)]
pub struct ExampleCollector {
    limit: usize,
    examples: Vec<Example>,
}

impl ExampleCollector {
    /// Creates a collector; `limit` is clamped to [`MAX_EXAMPLES`].
    pub fn new(limit: usize) -> Self {
        let limit = limit.min(MAX_EXAMPLES);
        Self {
            limit,
            examples: Vec::with_capacity(limit),
        }
    }

    /// Creates a collector honoring the context's example limit.
    pub fn for_context(ctx: &EvaluationContext) -> Self {
        Self::new(ctx.example_limit())
    }

    /// Offers an example; ignored once the collector is full.
    pub fn push(&mut self, example: Example) {
        if !self.is_full() {
            self.examples.push(example);
        }
    }

    /// Offers the value at `row` of `column`.
    pub fn offer(&mut self, column: &ColumnData, row: usize) {
        if !self.is_full() {
            self.examples.push(Example::from_row(column, row));
        }
    }

    /// Returns true once the limit is reached.
    pub fn is_full(&self) -> bool {
        self.examples.len() >= self.limit
    }

    /// Consumes the collector.
    pub fn into_examples(self) -> Vec<Example> {
        self.examples
    }
}

/// Percentage of `count` over `total`, 0 when `total` is 0.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// One finding or statistic produced by a single plugin invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditResult {
    plugin: String,
    column: String,
    kind: ResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    label: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    examples: Vec<Example>,
    count: u64,
    percentage: f64,
    evaluated: u64,
}

impl AuditResult {
    /// Starts an issue result.
    pub fn issue(
        plugin: impl Into<String>,
        column: impl Into<String>,
        label: impl Into<String>,
        severity: Severity,
    ) -> ResultBuilder {
        ResultBuilder::new(plugin, column, ResultKind::Issue, Some(severity), label)
    }

    /// Starts a statistic result.
    pub fn statistic(
        plugin: impl Into<String>,
        column: impl Into<String>,
        label: impl Into<String>,
    ) -> ResultBuilder {
        ResultBuilder::new(plugin, column, ResultKind::Statistic, None, label)
    }

    /// Name of the plugin that produced the result.
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Column the result refers to.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Issue or statistic.
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Severity, present for issues only.
    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    /// Issue code or statistic name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional numeric or ratio value.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Bounded list of example rows.
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Number of affected rows.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Percentage of evaluated rows affected, in [0, 100].
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Number of rows the percentage is relative to.
    pub fn evaluated(&self) -> u64 {
        self.evaluated
    }

    /// Returns true for issue results.
    pub fn is_issue(&self) -> bool {
        self.kind == ResultKind::Issue
    }
}

/// Builder validating [`AuditResult`] invariants on `build`.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    result: AuditResult,
}

impl ResultBuilder {
    fn new(
        plugin: impl Into<String>,
        column: impl Into<String>,
        kind: ResultKind,
        severity: Option<Severity>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            result: AuditResult {
                plugin: plugin.into(),
                column: column.into(),
                kind,
                severity,
                label: label.into(),
                message: String::new(),
                value: None,
                examples: Vec::new(),
                count: 0,
                percentage: 0.0,
                evaluated: 0,
            },
        }
    }

    /// Sets the message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.result.message = message.into();
        self
    }

    /// Sets the numeric value.
    pub fn value(mut self, value: f64) -> Self {
        self.result.value = Some(value);
        self
    }

    /// Sets the examples.
    pub fn examples(mut self, examples: Vec<Example>) -> Self {
        self.result.examples = examples;
        self
    }

    /// Sets the affected count and the evaluated rows, deriving the percentage.
    pub fn affected(mut self, count: u64, evaluated: u64) -> Self {
        self.result.count = count;
        self.result.evaluated = evaluated;
        self.result.percentage = percentage(count, evaluated);
        self
    }

    /// Sets the evaluated rows without marking any as affected.
    pub fn evaluated(mut self, evaluated: u64) -> Self {
        self.result.evaluated = evaluated;
        self.result.percentage = percentage(self.result.count, evaluated);
        self
    }

    /// Overrides the derived percentage.
    pub fn percentage(mut self, percentage: f64) -> Self {
        self.result.percentage = percentage;
        self
    }

    /// Validates invariants and returns the result.
    ///
    /// # Errors
    /// Returns [`DataInvariantError`] when the percentage is outside [0, 100]
    /// or not finite, the count exceeds the evaluated rows, or more than
    /// [`MAX_EXAMPLES`] examples are attached.
    pub fn build(self) -> Result<AuditResult, DataInvariantError> {
        let result = self.result;
        if !result.percentage.is_finite() || !(0.0..=100.0).contains(&result.percentage) {
            return Err(DataInvariantError::PercentageOutOfRange(result.percentage));
        }
        if result.count > result.evaluated {
            return Err(DataInvariantError::CountExceedsEvaluated {
                count: result.count,
                evaluated: result.evaluated,
            });
        }
        if result.examples.len() > MAX_EXAMPLES {
            return Err(DataInvariantError::TooManyExamples {
                len: result.examples.len(),
                cap: MAX_EXAMPLES,
            });
        }
        Ok(result)
    }
}
