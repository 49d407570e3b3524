//! Audit plan configuration.
//!
//! A plan lists, per table and column, which checks and insights run with
//! which raw parameters. Columns without explicit entries can fall back to
//! defaults chosen from the inferred column type. Unknown plugin names are
//! rejected at load time by [`AuditConfig::validate_against`], before any
//! data is touched.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AuditError;
use crate::models::{ColumnType, DEFAULT_EXAMPLE_LIMIT, EvaluationContext, NumberFormat};
use crate::params::{RawParams, ValidationMode};
use crate::plugin::PluginCategory;
use crate::registry::Registry;
use crate::result::MAX_EXAMPLES;
use crate::sampling::{DEFAULT_SAMPLE_SEED, DEFAULT_SAMPLE_SIZE, DEFAULT_SAMPLE_THRESHOLD, SamplingPolicy};

/// Default global timeout for an audit run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Validation errors for audit settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    /// Example limit outside `1..=MAX_EXAMPLES`
    #[error("example_limit must be between 1 and {max}, got {0}", max = MAX_EXAMPLES)]
    InvalidExampleLimit(usize),
    /// Zero timeout
    #[error("timeout_secs must be greater than 0")]
    InvalidTimeout,
    /// Zero workers
    #[error("max_workers must be greater than 0")]
    InvalidMaxWorkers,
    /// Zero sample size
    #[error("sample_size must be greater than 0")]
    InvalidSampleSize,
    /// Blank table name
    #[error("table name must not be empty")]
    EmptyTableName,
    /// Same table listed twice
    #[error("table '{0}' is configured more than once")]
    DuplicateTable(String),
}

impl From<ConfigValidationError> for AuditError {
    fn from(error: ConfigValidationError) -> Self {
        AuditError::configuration(error.to_string())
    }
}

/// Run-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSettings {
    /// Examples kept per result (1..=10)
    pub example_limit: usize,
    /// Reject parameter keys a plugin does not declare
    pub strict_params: bool,
    /// Global timeout for the whole run
    pub timeout_secs: u64,
    /// Worker pool size; defaults to available parallelism
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Run type-based default checks on columns without explicit entries
    pub auto_checks: bool,
    /// Formatting of numbers stored as strings
    pub number_format: NumberFormat,
    /// Rows kept when a table is sampled
    pub sample_size: usize,
    /// Tables with more rows than this are sampled
    pub sample_threshold: usize,
    /// Seed of the sampling generator
    pub sample_seed: u64,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            example_limit: DEFAULT_EXAMPLE_LIMIT,
            strict_params: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_workers: None,
            auto_checks: true,
            number_format: NumberFormat::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            sample_threshold: DEFAULT_SAMPLE_THRESHOLD,
            sample_seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

impl AuditSettings {
    /// Creates settings with defaults.
    pub fn new() -> Self {
        Self::default()
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

    /// Builder method to enable strict parameter validation.
    pub fn with_strict_params(mut self, strict: bool) -> Self {
        self.strict_params = strict;
        self
    }

    /// Builder method to set the global timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Builder method to set the worker pool size.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Builder method to enable/disable type-based default checks.
    pub fn with_auto_checks(mut self, enabled: bool) -> Self {
        self.auto_checks = enabled;
        self
    }

    /// Builder method to set sample size and threshold.
    pub fn with_sampling(mut self, sample_size: usize, sample_threshold: usize) -> Self {
        self.sample_size = sample_size;
        self.sample_threshold = sample_threshold;
        self
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(1..=MAX_EXAMPLES).contains(&self.example_limit) {
            return Err(ConfigValidationError::InvalidExampleLimit(self.example_limit));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.max_workers == Some(0) {
            return Err(ConfigValidationError::InvalidMaxWorkers);
        }
        if self.sample_size == 0 {
            return Err(ConfigValidationError::InvalidSampleSize);
        }
        Ok(())
    }

    /// Parameter validation mode.
    pub fn validation_mode(&self) -> ValidationMode {
        if self.strict_params {
            ValidationMode::Strict
        } else {
            ValidationMode::Lenient
        }
    }

    /// Global timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        self.max_workers.unwrap_or_else(default_workers)
    }

    /// Row sampling policy.
    pub fn sampling(&self) -> SamplingPolicy {
        SamplingPolicy::new(self.sample_size, self.sample_threshold).with_seed(self.sample_seed)
    }

    /// Evaluation context for a run at `now`.
    pub fn context(&self, now: DateTime<Utc>) -> EvaluationContext {
        EvaluationContext::new(now)
            .with_example_limit(self.example_limit)
            .with_number_format(self.number_format)
    }
}

/// Available parallelism, or 1 when it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// One configured plugin invocation for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckSpec {
    /// Registered plugin name
    pub plugin: String,
    /// Category the plugin is registered under
    #[serde(default)]
    pub category: PluginCategory,
    /// Raw arguments, validated against the plugin's schema at run time
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: RawParams,
}

impl CheckSpec {
    /// Creates a check entry without parameters.
    pub fn new(category: PluginCategory, plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            category,
            params: RawParams::new(),
        }
    }

    /// Builder method to set raw parameters.
    pub fn with_params(mut self, params: RawParams) -> Self {
        self.params = params;
        self
    }
}

/// Per-table plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Table name, matched against the supplied data
    pub name: String,
    /// Columns used to annotate examples
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Explicit checks per column
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<CheckSpec>>,
    /// Columns excluded from the audit
    #[serde(default)]
    pub skip_columns: Vec<String>,
}

impl TableConfig {
    /// Creates an empty table plan.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: Vec::new(),
            columns: BTreeMap::new(),
            skip_columns: Vec::new(),
        }
    }

    /// Builder method to set primary-key columns.
    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Builder method to add a check for a column.
    pub fn with_check(mut self, column: impl Into<String>, check: CheckSpec) -> Self {
        self.columns.entry(column.into()).or_default().push(check);
        self
    }

    /// Builder method to skip a column.
    pub fn with_skipped(mut self, column: impl Into<String>) -> Self {
        self.skip_columns.push(column.into());
        self
    }

    /// Returns true if the column is excluded.
    pub fn is_skipped(&self, column: &str) -> bool {
        self.skip_columns.iter().any(|c| c == column)
    }
}

/// A `(category, name, raw params)` triple scheduled for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCheck {
    /// Category the plugin is registered under
    pub category: PluginCategory,
    /// Registered plugin name
    pub plugin: String,
    /// Raw arguments
    pub params: RawParams,
}

impl From<&CheckSpec> for PlannedCheck {
    fn from(spec: &CheckSpec) -> Self {
        Self {
            category: spec.category,
            plugin: spec.plugin.clone(),
            params: spec.params.clone(),
        }
    }
}

const STRING_DEFAULTS: &[&str] = &[
    "trailing_characters",
    "leading_characters",
    "case_duplicates",
    "special_characters",
    "numeric_strings",
];

const TIMESTAMP_DEFAULTS: &[&str] = &["timestamp_patterns", "future_dates"];

/// Default checks for a column of the given inferred type.
pub fn default_checks(column_type: ColumnType) -> Vec<PlannedCheck> {
    let names: &[&str] = match column_type {
        ColumnType::String => STRING_DEFAULTS,
        ColumnType::Timestamp | ColumnType::Date => TIMESTAMP_DEFAULTS,
        _ => &[],
    };
    names
        .iter()
        .map(|name| PlannedCheck {
            category: PluginCategory::Check,
            plugin: (*name).to_string(),
            params: RawParams::new(),
        })
        .collect()
}

/// A complete audit plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Run-wide settings
    #[serde(default)]
    pub settings: AuditSettings,
    /// Per-table plans, audited in this order
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl AuditConfig {
    /// Creates an empty plan with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the settings.
    pub fn with_settings(mut self, settings: AuditSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builder method to add a table plan.
    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.tables.push(table);
        self
    }

    /// Parses a plan from JSON and validates its settings.
    ///
    /// # Errors
    /// Returns a serialization error for malformed JSON and a configuration
    /// error for invalid settings.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| AuditError::Serialization {
            context: "Failed to parse audit configuration".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates settings and table names.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.settings.validate()?;
        let mut seen = HashSet::new();
        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyTableName);
            }
            if !seen.insert(table.name.as_str()) {
                return Err(ConfigValidationError::DuplicateTable(table.name.clone()));
            }
        }
        Ok(())
    }

    /// Rejects plugin names that are not registered.
    ///
    /// # Errors
    /// Returns [`AuditError::UnknownPlugin`] for the first unknown entry.
    pub fn validate_against(&self, registry: &Registry) -> crate::Result<()> {
        for table in &self.tables {
            for (column, checks) in &table.columns {
                for check in checks {
                    if !registry.contains(check.category, &check.plugin) {
                        tracing::error!(
                            "Table '{}' column '{}' references unknown {} '{}'",
                            table.name,
                            column,
                            check.category,
                            check.plugin
                        );
                        return Err(AuditError::unknown_plugin(check.category, &check.plugin));
                    }
                }
            }
        }
        Ok(())
    }

    /// Looks up a table plan by name.
    pub fn table(&self, name: &str) -> Option<&TableConfig> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Checks scheduled for a column: explicit entries, else type-based
    /// defaults when `auto_checks` is enabled.
    pub fn checks_for(
        &self,
        table: &TableConfig,
        column: &str,
        column_type: ColumnType,
    ) -> Vec<PlannedCheck> {
        if table.is_skipped(column) {
            return Vec::new();
        }
        match table.columns.get(column) {
            Some(checks) => checks.iter().map(PlannedCheck::from).collect(),
            None if self.settings.auto_checks => default_checks(column_type),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLAN: &str = r#"{
        "settings": { "example_limit": 3, "strict_params": true, "timeout_secs": 60, "max_workers": 2 },
        "tables": [{
            "name": "users",
            "primary_key": ["id"],
            "columns": {
                "email": [
                    { "plugin": "trailing_characters" },
                    { "plugin": "top_values", "category": "insight", "params": { "limit": 3 } }
                ]
            },
            "skip_columns": ["password_hash"]
        }]
    }"#;

    #[test]
    fn test_parse_plan() {
        let config = AuditConfig::from_json_str(PLAN).unwrap();

        assert_eq!(config.settings.example_limit, 3);
        assert_eq!(config.settings.validation_mode(), ValidationMode::Strict);
        assert_eq!(config.settings.worker_count(), 2);
        assert!(config.settings.auto_checks);

        let users = config.table("users").unwrap();
        let email = &users.columns["email"];
        assert_eq!(email[0].category, PluginCategory::Check);
        assert_eq!(email[1].category, PluginCategory::Insight);
        assert_eq!(email[1].params.get("limit"), Some(&json!(3)));
        assert!(users.is_skipped("password_hash"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = AuditSettings::default();
        assert_eq!(settings.example_limit, DEFAULT_EXAMPLE_LIMIT);
        assert_eq!(settings.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(settings.worker_count() >= 1);
        assert_eq!(settings.validation_mode(), ValidationMode::Lenient);
        assert_eq!(settings.sampling(), SamplingPolicy::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_sampling_settings_from_json() {
        let config = AuditConfig::from_json_str(
            r#"{"settings": {"sample_size": 500, "sample_threshold": 2000, "sample_seed": 7}}"#,
        )
        .unwrap();
        assert_eq!(
            config.settings.sampling(),
            SamplingPolicy::new(500, 2000).with_seed(7)
        );

        let err = AuditConfig::from_json_str(r#"{"settings": {"sample_size": 0}}"#).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_settings_validation() {
        let cases = [
            (
                AuditSettings {
                    example_limit: 11,
                    ..AuditSettings::default()
                },
                ConfigValidationError::InvalidExampleLimit(11),
            ),
            (
                AuditSettings::new().with_timeout_secs(0),
                ConfigValidationError::InvalidTimeout,
            ),
            (
                AuditSettings::new().with_max_workers(0),
                ConfigValidationError::InvalidMaxWorkers,
            ),
            (
                AuditSettings::new().with_sampling(0, 10),
                ConfigValidationError::InvalidSampleSize,
            ),
        ];
        for (settings, expected) in cases {
            assert_eq!(settings.validate().unwrap_err(), expected);
        }
    }

    #[test]
    fn test_example_limit_builder_clamps() {
        assert_eq!(AuditSettings::new().with_example_limit(0).example_limit, 1);
        assert_eq!(
            AuditSettings::new().with_example_limit(99).example_limit,
            MAX_EXAMPLES
        );
    }

    #[test]
    fn test_invalid_settings_rejected_at_load() {
        let err = AuditConfig::from_json_str(r#"{"settings": {"timeout_secs": 0}}"#).unwrap_err();
        assert!(err.is_fatal());

        let err = AuditConfig::from_json_str(r#"{"settings": {"colour": 1}}"#).unwrap_err();
        assert_eq!(err.kind(), "serialization");
    }

    #[test]
    fn test_duplicate_tables_rejected() {
        let config = AuditConfig::new()
            .with_table(TableConfig::new("a"))
            .with_table(TableConfig::new("a"));
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::DuplicateTable("a".into())
        );
    }

    #[test]
    fn test_validate_against_registry() {
        let registry = Registry::with_builtins().unwrap();
        let config = AuditConfig::from_json_str(PLAN).unwrap();
        assert!(config.validate_against(&registry).is_ok());

        let bad = AuditConfig::new().with_table(
            TableConfig::new("t").with_check("c", CheckSpec::new(PluginCategory::Check, "top_values")),
        );
        let err = bad.validate_against(&registry).unwrap_err();
        assert!(matches!(err, AuditError::UnknownPlugin { .. }));
    }

    #[test]
    fn test_checks_for_defaults_and_explicit() {
        let config = AuditConfig::from_json_str(PLAN).unwrap();
        let users = config.table("users").unwrap();

        let explicit = config.checks_for(users, "email", ColumnType::String);
        assert_eq!(explicit.len(), 2);

        let defaults = config.checks_for(users, "name", ColumnType::String);
        let names: Vec<_> = defaults.iter().map(|c| c.plugin.as_str()).collect();
        assert_eq!(names, STRING_DEFAULTS);

        let ts = config.checks_for(users, "created_at", ColumnType::Timestamp);
        assert_eq!(ts.len(), 2);

        assert!(config.checks_for(users, "age", ColumnType::Integer).is_empty());
        assert!(config.checks_for(users, "password_hash", ColumnType::String).is_empty());

        let manual = config
            .clone()
            .with_settings(AuditSettings::new().with_auto_checks(false));
        assert!(manual.checks_for(users, "name", ColumnType::String).is_empty());
    }
}
