//! Executes a single plugin invocation with fault isolation.
//!
//! Parameter problems, plugin errors and panics inside a plugin are all
//! converted into [`Outcome::Failed`] so that one misbehaving plugin cannot
//! abort an audit. Only an unknown plugin name is returned as `Err`, since it
//! indicates a misconfigured plan rather than bad data.
//!
//! Catching a panic does not silence the process panic hook: unless the
//! host installs its own hook, the default one still prints the panic
//! message to stderr before the failure is recorded.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::Result;
use crate::error::AuditError;
use crate::models::{ColumnData, EvaluationContext};
use crate::params::{RawParams, ValidationMode};
use crate::plugin::PluginCategory;
use crate::registry::Registry;
use crate::result::AuditResult;

/// Kind and message of a failed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureInfo {
    /// Stable error kind, see [`AuditError::kind`]
    pub kind: String,
    /// Human-readable reason
    pub message: String,
}

impl From<&AuditError> for FailureInfo {
    fn from(error: &AuditError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The plugin ran and returned its results
    Success,
    /// Validation or execution failed
    Failed(FailureInfo),
    /// The invocation never produced a result, e.g. due to a timeout
    NotRun {
        /// Why the plugin did not run
        reason: String,
    },
}

impl Outcome {
    /// Returns true for successful invocations.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Record of one `(column, plugin)` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    /// Category the plugin was looked up in
    pub category: PluginCategory,
    /// Plugin name
    pub plugin: String,
    /// Column the plugin ran against
    pub column: String,
    /// How the invocation ended
    pub outcome: Outcome,
    /// Results in the order the plugin produced them; empty unless successful
    pub results: Vec<AuditResult>,
    /// Time spent in validation and `run`
    pub elapsed_ms: u64,
}

impl Invocation {
    /// Creates a record for an invocation that never ran.
    pub fn not_run(
        category: PluginCategory,
        plugin: impl Into<String>,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            category,
            plugin: plugin.into(),
            column: column.into(),
            outcome: Outcome::NotRun {
                reason: reason.into(),
            },
            results: Vec::new(),
            elapsed_ms: 0,
        }
    }

    /// Creates a record for a failed invocation.
    pub fn failed(
        category: PluginCategory,
        plugin: impl Into<String>,
        column: impl Into<String>,
        error: &AuditError,
    ) -> Self {
        Self {
            category,
            plugin: plugin.into(),
            column: column.into(),
            outcome: Outcome::Failed(FailureInfo::from(error)),
            results: Vec::new(),
            elapsed_ms: 0,
        }
    }

    fn with_elapsed(mut self, started: Instant) -> Self {
        self.elapsed_ms = elapsed_ms(started);
        self
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Text of a panic payload; `&str` and `String` payloads are returned as is.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "panic with a non-string payload"
    }
}

/// Looks plugins up, validates their parameters and runs them.
#[derive(Debug, Clone)]
pub struct Runner {
    registry: Arc<Registry>,
    mode: ValidationMode,
}

impl Runner {
    /// Creates a runner over a fully populated registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            mode: ValidationMode::default(),
        }
    }

    /// Builder method to set the parameter validation mode.
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// The registry this runner resolves plugins from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Executes one plugin against one column.
    ///
    /// # Errors
    /// Returns [`AuditError::UnknownPlugin`] when `(category, name)` is not
    /// registered. Every other failure is reported through
    /// [`Invocation::outcome`].
    pub fn execute(
        &self,
        category: PluginCategory,
        name: &str,
        column: &ColumnData,
        raw: &RawParams,
        ctx: &EvaluationContext,
    ) -> Result<Invocation> {
        let plugin = self.registry.instantiate(category, name)?;
        let started = Instant::now();
        debug!("Running {} '{}' on column '{}'", category, name, column.name());

        let params = match plugin.validate_params(raw, self.mode) {
            Ok(params) => params,
            Err(e) => {
                let error = AuditError::from(e);
                warn!(
                    "Invalid parameters for {} '{}' on column '{}': {}",
                    category,
                    name,
                    column.name(),
                    error
                );
                return Ok(Invocation::failed(category, name, column.name(), &error)
                    .with_elapsed(started));
            }
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| plugin.run(column, &params, ctx)));
        let error = match outcome {
            Ok(Ok(results)) => {
                debug!(
                    "{} '{}' on column '{}' produced {} results",
                    category,
                    name,
                    column.name(),
                    results.len()
                );
                return Ok(Invocation {
                    category,
                    plugin: name.to_string(),
                    column: column.name().to_string(),
                    outcome: Outcome::Success,
                    results,
                    elapsed_ms: elapsed_ms(started),
                });
            }
            Ok(Err(AuditError::PluginExecution { message, .. })) => {
                AuditError::execution(name, column.name(), message)
            }
            Ok(Err(e)) => AuditError::execution(name, column.name(), e.to_string()),
            Err(payload) => AuditError::execution(name, column.name(), panic_message(&*payload).to_string()),
        };

        warn!("{}", error);
        Ok(Invocation::failed(category, name, column.name(), &error).with_elapsed(started))
    }
}
