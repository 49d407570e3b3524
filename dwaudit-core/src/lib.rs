//! Core library for dwaudit, a data warehouse column auditor.
//!
//! This crate provides the plugin contract, the registry of built-in checks
//! and insights, parameter validation, the fault-isolating runner and the
//! orchestrator that fans invocations out over a worker pool. It performs no
//! I/O: callers hand it materialized tables and receive an [`AuditReport`].
//!
//! # Guarantees
//! - One failing or panicking plugin never aborts the rest of a run
//! - Every scheduled invocation appears in the report exactly once
//! - Plugins see a fixed evaluation instant, so runs are reproducible
//!
//! # Example
//! ```rust
//! use dwaudit_core::{AuditConfig, Auditor, TableData, builtin_registry};
//! use serde_json::json;
//!
//! let registry = builtin_registry()?;
//! let config = AuditConfig::new();
//! let now = chrono::Utc::now();
//! let auditor = Auditor::from_config(registry, &config, now);
//!
//! let table = TableData::new("users", vec![json!({"email": "a@example.com "})]);
//! let report = auditor.audit_sequential(&config, &[table])?;
//! assert_eq!(report.summary.issues, 1);
//! # Ok::<(), dwaudit_core::AuditError>(())
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod params;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod result;
pub mod runner;
pub mod sampling;
pub mod values;

// Re-export commonly used types
pub use audit::{AuditReport, AuditSummary, Auditor, ColumnReport, ColumnStatus, TableReport};
pub use config::{AuditConfig, AuditSettings, CheckSpec, TableConfig};
pub use error::{AuditError, DataInvariantError, ParamError, Result};
pub use logging::init_logging;
pub use models::{ColumnData, ColumnType, EvaluationContext, NumberFormat, TableData};
pub use params::{ParamSchema, ParamSpec, ParamType, Params, ValidationMode};
pub use plugin::{Plugin, PluginCategory};
pub use registry::{PluginInfo, Registry, builtin_registry};
pub use result::{AuditResult, Example, ResultKind, Severity};
pub use runner::{Invocation, Outcome, Runner};
pub use sampling::SamplingPolicy;
