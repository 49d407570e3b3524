//! Column data views and evaluation context supplied to plugins.
//!
//! Tables arrive as materialized rows of JSON objects, the same shape sampled
//! rows have everywhere in the workspace. The core never mutates them.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::MAX_EXAMPLES;
use crate::values::{extract_numeric, group_key, parse_timestamp};
use crate::{AuditError, Result};

/// Example limit used when the configuration does not set one.
pub const DEFAULT_EXAMPLE_LIMIT: usize = 5;

/// Type inferred from the non-null values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// No non-null values
    Empty,
    /// JSON booleans
    Boolean,
    /// Whole numbers
    Integer,
    /// Numbers with a fractional part
    Float,
    /// Text that is not a timestamp or date
    String,
    /// Strings that parse as timestamps with a time component
    Timestamp,
    /// Strings that parse as calendar dates only
    Date,
    /// More than one incompatible type
    Mixed,
}

impl ColumnType {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::Integer),
            Value::Number(_) => Some(Self::Float),
            Value::String(_) => match parse_timestamp(value) {
                Some(ts) if ts.date_only => Some(Self::Date),
                Some(_) => Some(Self::Timestamp),
                None => Some(Self::String),
            },
            Value::Array(_) | Value::Object(_) => Some(Self::Mixed),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Empty, b) => b,
            (Self::Integer, Self::Float) | (Self::Float, Self::Integer) => Self::Float,
            (Self::Timestamp, Self::Date) | (Self::Date, Self::Timestamp) => Self::Timestamp,
            _ => Self::Mixed,
        }
    }

    /// Lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Mixed => "mixed",
        }
    }
}

/// Number formatting hint for numeric values that arrive as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    /// Character separating the integer and fractional parts
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
        }
    }
}

impl NumberFormat {
    /// Rewrites a locale-formatted numeric string into the `.` form.
    pub fn normalize<'a>(&self, raw: &'a str) -> std::borrow::Cow<'a, str> {
        if self.decimal_separator == '.' {
            std::borrow::Cow::Borrowed(raw)
        } else {
            std::borrow::Cow::Owned(raw.replace(self.decimal_separator, "."))
        }
    }
}

/// Evaluation context injected into every plugin invocation.
///
/// The evaluation instant is supplied rather than read from the clock inside
/// plugins, which keeps execution deterministic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationContext {
    now: DateTime<Utc>,
    example_limit: usize,
    number_format: NumberFormat,
}

impl EvaluationContext {
    /// Creates a context evaluated at `now` with default settings.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            example_limit: DEFAULT_EXAMPLE_LIMIT,
            number_format: NumberFormat::default(),
        }
    }

    /// Builder method to set the example limit, clamped to `1..=MAX_EXAMPLES`.
    pub fn with_example_limit(mut self, limit: usize) -> Self {
        if !(1..=MAX_EXAMPLES).contains(&limit) {
            tracing::warn!(
                "example_limit {} clamped to valid range [1, {}]",
                limit,
                MAX_EXAMPLES
            );
        }
        self.example_limit = limit.clamp(1, MAX_EXAMPLES);
        self
    }

    /// Builder method to set the number format hint.
    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    /// The evaluation instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Maximum number of examples a single result may carry.
    pub fn example_limit(&self) -> usize {
        self.example_limit
    }

    /// Number formatting hint.
    pub fn number_format(&self) -> NumberFormat {
        self.number_format
    }
}

fn cell(row: &Value, column: &str) -> Value {
    row.as_object()
        .and_then(|obj| obj.get(column))
        .cloned()
        .unwrap_or(Value::Null)
}

/// One column's values plus aligned primary-key values.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    name: String,
    values: Vec<Value>,
    primary_key: Vec<Value>,
}

impl ColumnData {
    /// Creates a column view without primary-key annotations.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
            primary_key: Vec::new(),
        }
    }

    /// Builds a column view from JSON-object rows.
    ///
    /// Missing keys and non-object rows become nulls. A single primary-key
    /// column yields its value per row; a composite key yields an object of
    /// column to value.
    pub fn from_rows(name: &str, rows: &[Value], primary_key: &[String]) -> Result<Self> {
        let values = rows.iter().map(|row| cell(row, name)).collect();
        let column = Self::new(name, values);

        match primary_key {
            [] => Ok(column),
            [single] => {
                let keys = rows.iter().map(|row| cell(row, single)).collect();
                column.with_primary_key(keys)
            }
            composite => {
                let keys = rows
                    .iter()
                    .map(|row| {
                        let map = composite
                            .iter()
                            .map(|key| (key.clone(), cell(row, key)))
                            .collect();
                        Value::Object(map)
                    })
                    .collect();
                column.with_primary_key(keys)
            }
        }
    }

    /// Attaches primary-key values aligned by row position.
    ///
    /// # Errors
    /// Returns a configuration error when the key count differs from the row count.
    pub fn with_primary_key(mut self, keys: Vec<Value>) -> Result<Self> {
        if keys.len() != self.values.len() {
            return Err(AuditError::configuration(format!(
                "column '{}' has {} rows but {} primary-key values",
                self.name,
                self.values.len(),
                keys.len()
            )));
        }
        self.primary_key = keys;
        Ok(self)
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All cell values, nulls included.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Primary-key value aligned with `row`, if keys were supplied.
    pub fn primary_key_at(&self, row: usize) -> Option<&Value> {
        self.primary_key.get(row)
    }

    /// Iterates non-null cells with their row positions.
    pub fn non_null(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.values.iter().enumerate().filter(|(_, v)| !v.is_null())
    }

    /// Iterates non-null string cells with their row positions.
    pub fn strings(&self) -> impl Iterator<Item = (usize, &str)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_str().map(|s| (i, s)))
    }

    /// Iterates finite numeric cells with their row positions.
    pub fn numbers(&self, format: NumberFormat) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(move |(i, v)| extract_numeric(v, format).map(|n| (i, n)))
    }

    /// Count of null cells.
    pub fn null_count(&self) -> u64 {
        self.values.iter().filter(|v| v.is_null()).count() as u64
    }

    /// Count of non-null cells.
    pub fn non_null_count(&self) -> u64 {
        (self.values.len() as u64).saturating_sub(self.null_count())
    }

    /// Count of distinct non-null values.
    pub fn distinct_count(&self) -> u64 {
        let distinct: HashSet<String> = self.non_null().map(|(_, v)| group_key(v, false)).collect();
        distinct.len() as u64
    }

    /// Infers the column type from its non-null values.
    pub fn inferred_type(&self) -> ColumnType {
        self.values
            .iter()
            .filter_map(ColumnType::of)
            .fold(ColumnType::Empty, ColumnType::merge)
    }
}

/// A materialized table: rows of JSON objects plus primary-key column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    /// Table name used in reports
    pub name: String,
    /// Row objects; non-object rows are treated as all-null
    pub rows: Vec<Value>,
    /// Columns forming the primary key, used to annotate examples
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl TableData {
    /// Creates a table without a declared primary key.
    pub fn new(name: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            rows,
            primary_key: Vec::new(),
        }
    }

    /// Builder method to declare primary-key columns.
    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Union of keys across all rows, in first-seen order.
    pub fn column_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut names = Vec::new();
        for row in &self.rows {
            if let Some(obj) = row.as_object() {
                for key in obj.keys() {
                    if seen.insert(key.clone()) {
                        names.push(key.clone());
                    }
                }
            }
        }
        names
    }

    /// Builds the view for one column; missing keys become nulls.
    pub fn column(&self, name: &str) -> Result<ColumnData> {
        ColumnData::from_rows(name, &self.rows, &self.primary_key)
    }
}
