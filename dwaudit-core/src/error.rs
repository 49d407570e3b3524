//! Error types for the audit framework.
//!
//! Configuration-time errors (duplicate registration, unknown plugin names,
//! invalid settings) are fatal and surface as `Err` from startup code.
//! Per-invocation errors (parameter validation, execution faults) are caught
//! by the [`Runner`](crate::runner::Runner) and recorded as failure outcomes
//! instead of aborting the audit.

use thiserror::Error;

use crate::plugin::PluginCategory;

/// Main error type for dwaudit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// No plugin with this name is registered in the category
    #[error("Unknown {category} plugin '{name}'")]
    UnknownPlugin {
        /// Category that was searched
        category: PluginCategory,
        /// Requested plugin name
        name: String,
    },

    /// A plugin with this name is already registered in the category
    #[error("Duplicate {category} plugin '{name}'")]
    DuplicatePlugin {
        /// Category of the existing entry
        category: PluginCategory,
        /// Name registered twice
        name: String,
    },

    /// Parameter validation failed
    #[error("Invalid parameters: {0}")]
    Parameter(#[from] ParamError),

    /// A result record violated its invariants
    #[error("Malformed result: {0}")]
    DataInvariant(#[from] DataInvariantError),

    /// Plugin failed while executing against a column
    #[error("Plugin '{plugin}' failed on column '{column}': {message}")]
    PluginExecution {
        /// Plugin that failed
        plugin: String,
        /// Column it ran against
        column: String,
        /// Error or panic message
        message: String,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration
        message: String,
    },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        /// Operation that failed
        context: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        /// Document being read or written
        context: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with AuditError
pub type Result<T> = std::result::Result<T, AuditError>;

/// Field-level parameter validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// A required parameter was absent and has no default
    #[error("missing required parameter '{field}'")]
    MissingRequired {
        /// Parameter name
        field: String,
    },

    /// The supplied value cannot be coerced to the declared type
    #[error("parameter '{field}' expects {expected}, got {found}")]
    Type {
        /// Parameter name
        field: String,
        /// Declared type
        expected: String,
        /// JSON type that was supplied
        found: String,
    },

    /// The value is outside declared bounds, not in the enum, or an invalid regex
    #[error("parameter '{field}' is out of range: {reason}")]
    Range {
        /// Parameter name
        field: String,
        /// Which bound or rule was violated
        reason: String,
    },

    /// Key not declared by the schema (strict mode only)
    #[error("unknown parameter '{field}'")]
    Unknown {
        /// Undeclared key
        field: String,
    },
}

impl ParamError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequired { field }
            | Self::Type { field, .. }
            | Self::Range { field, .. }
            | Self::Unknown { field } => field,
        }
    }

    /// Creates a range error
    pub fn range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Range {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Raised when an [`AuditResult`](crate::result::AuditResult) would violate its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataInvariantError {
    /// Percentage outside `[0, 100]` or not finite
    #[error("percentage must be within [0, 100], got {0}")]
    PercentageOutOfRange(f64),

    /// More affected rows than evaluated rows
    #[error("count {count} exceeds the {evaluated} rows evaluated")]
    CountExceedsEvaluated {
        /// Affected rows
        count: u64,
        /// Evaluated rows
        evaluated: u64,
    },

    /// More examples than the hard cap
    #[error("{len} examples exceed the cap of {cap}")]
    TooManyExamples {
        /// Examples supplied
        len: usize,
        /// Maximum allowed
        cap: usize,
    },
}

impl AuditError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unknown plugin error
    pub fn unknown_plugin(category: PluginCategory, name: impl Into<String>) -> Self {
        Self::UnknownPlugin {
            category,
            name: name.into(),
        }
    }

    /// Creates a plugin execution error for a single invocation
    pub fn execution(
        plugin: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::PluginExecution {
            plugin: plugin.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Stable identifier of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownPlugin { .. } => "unknown_plugin",
            Self::DuplicatePlugin { .. } => "duplicate_plugin",
            Self::Parameter(ParamError::MissingRequired { .. }) => "missing_required_parameter",
            Self::Parameter(ParamError::Type { .. }) => "parameter_type",
            Self::Parameter(ParamError::Range { .. }) => "parameter_range",
            Self::Parameter(ParamError::Unknown { .. }) => "unknown_parameter",
            Self::DataInvariant(_) => "data_invariant",
            Self::PluginExecution { .. } => "plugin_execution",
            Self::Configuration { .. } => "configuration",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// Returns true for errors that indicate a misconfigured system rather than bad data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownPlugin { .. } | Self::DuplicatePlugin { .. } | Self::Configuration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = AuditError::configuration("example_limit must be positive");
        assert!(error.to_string().contains("example_limit must be positive"));

        let error = AuditError::unknown_plugin(PluginCategory::Check, "no_such_check");
        assert!(error.to_string().contains("no_such_check"));
        assert!(error.to_string().contains("check"));
    }

    #[test]
    fn test_error_kinds() {
        let missing: AuditError = ParamError::MissingRequired {
            field: "pattern".into(),
        }
        .into();
        assert_eq!(missing.kind(), "missing_required_parameter");

        let range: AuditError = ParamError::range("limit", "must be >= 1").into();
        assert_eq!(range.kind(), "parameter_range");

        let fault = AuditError::execution("uniqueness", "email", "boom");
        assert_eq!(fault.kind(), "plugin_execution");
        assert!(fault.to_string().contains("email"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AuditError::unknown_plugin(PluginCategory::Insight, "x").is_fatal());
        assert!(AuditError::configuration("bad").is_fatal());
        assert!(!AuditError::execution("p", "c", "m").is_fatal());
        assert!(
            !AuditError::from(ParamError::Unknown {
                field: "extra".into()
            })
            .is_fatal()
        );
    }

    #[test]
    fn test_param_error_field() {
        let error = ParamError::Type {
            field: "threshold".into(),
            expected: "float".into(),
            found: "string".into(),
        };
        assert_eq!(error.field(), "threshold");
        assert!(error.to_string().contains("expects float"));
    }
}
