//! Audit orchestration.
//!
//! The [`Auditor`] expands an [`AuditConfig`] against materialized tables into
//! one task per `(column, plugin)` pair, executes the tasks through the
//! [`Runner`], and assembles an [`AuditReport`]. Tasks are independent, so
//! besides the sequential baseline they can be fanned out over a bounded
//! worker pool with a global timeout. Tables above the sampling threshold
//! are audited on a seeded subset of their rows.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::Result;
use crate::config::{AuditConfig, DEFAULT_TIMEOUT_SECS, PlannedCheck, TableConfig, default_workers};
use crate::error::AuditError;
use crate::models::{ColumnData, ColumnType, EvaluationContext, TableData};
use crate::params::ValidationMode;
use crate::registry::Registry;
use crate::result::{AuditResult, ResultKind, percentage};
use crate::runner::{Invocation, Outcome, Runner};
use crate::sampling::SamplingPolicy;

/// One scheduled `(column, plugin)` invocation.
#[derive(Debug, Clone)]
pub struct AuditTask {
    /// Table the column belongs to
    pub table: String,
    /// Column view shared by every task on the column
    pub column: Arc<ColumnData>,
    /// Plugin and raw parameters
    pub check: PlannedCheck,
    /// Position of the column in the plan
    position: (usize, usize),
}

impl AuditTask {
    /// Creates a task outside of a plan.
    pub fn new(table: impl Into<String>, column: Arc<ColumnData>, check: PlannedCheck) -> Self {
        Self {
            table: table.into(),
            column,
            check,
            position: (0, 0),
        }
    }

    fn not_run(&self, reason: impl Into<String>) -> Invocation {
        Invocation::not_run(
            self.check.category,
            self.check.plugin.clone(),
            self.column.name(),
            reason,
        )
    }
}

/// Overall state of an audited column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStatus {
    /// Every invocation succeeded without issues
    Ok,
    /// At least one issue was reported
    Issues,
    /// At least one invocation failed or did not run
    Failed,
    /// The column holds no non-null values and nothing was reported
    Empty,
}

impl ColumnStatus {
    /// Lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnStatus::Ok => "ok",
            ColumnStatus::Issues => "issues",
            ColumnStatus::Failed => "failed",
            ColumnStatus::Empty => "empty",
        }
    }
}

/// Profile of one audited column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Column name
    pub name: String,
    /// Type inferred from the non-null values
    pub column_type: ColumnType,
    /// Rows analyzed, after sampling
    pub row_count: u64,
    /// Null cells among the analyzed rows
    pub null_count: u64,
    /// `null_count` as a percentage of `row_count`
    pub null_pct: f64,
    /// Distinct non-null values
    pub distinct_count: u64,
    /// Overall state after every invocation ran
    pub status: ColumnStatus,
}

impl ColumnSummary {
    /// Profiles a column; the status starts as `ok` or `empty`.
    pub fn from_column(column: &ColumnData) -> Self {
        let row_count = column.len() as u64;
        let null_count = column.null_count();
        Self {
            name: column.name().to_string(),
            column_type: column.inferred_type(),
            row_count,
            null_count,
            null_pct: percentage(null_count, row_count),
            distinct_count: column.distinct_count(),
            status: if column.non_null_count() == 0 {
                ColumnStatus::Empty
            } else {
                ColumnStatus::Ok
            },
        }
    }

    fn has_issues(invocations: &[Invocation]) -> bool {
        invocations
            .iter()
            .flat_map(|i| &i.results)
            .any(AuditResult::is_issue)
    }

    fn settle(&mut self, invocations: &[Invocation]) {
        if invocations.iter().any(|i| !i.outcome.is_success()) {
            self.status = ColumnStatus::Failed;
        } else if Self::has_issues(invocations) {
            self.status = ColumnStatus::Issues;
        }
    }
}

/// Column profile plus the invocations run against it.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    /// Column profile and status
    #[serde(flatten)]
    pub summary: ColumnSummary,
    /// One record per scheduled plugin, in plan order
    pub invocations: Vec<Invocation>,
}

impl ColumnReport {
    /// True if any invocation reported an issue.
    pub fn has_issues(&self) -> bool {
        ColumnSummary::has_issues(&self.invocations)
    }
}

/// Results for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    /// Table name
    pub name: String,
    /// Rows supplied for the table
    pub total_rows: u64,
    /// Rows the plugins evaluated
    pub analyzed_rows: u64,
    /// True when `analyzed_rows` is a sample of `total_rows`
    pub sampled: bool,
    /// Audited columns, data order first, then configured-only columns
    pub columns: Vec<ColumnReport>,
}

/// Aggregate counts over a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    /// Tables audited
    pub tables: usize,
    /// Columns audited
    pub columns: usize,
    /// Columns with at least one issue
    pub columns_with_issues: usize,
    /// Invocations scheduled
    pub invocations: usize,
    /// Invocations that ran to completion
    pub succeeded: usize,
    /// Invocations that returned an error or panicked
    pub failed: usize,
    /// Invocations skipped by the timeout
    pub not_run: usize,
    /// Issue results
    pub issues: usize,
    /// Statistic results
    pub statistics: usize,
    /// Issue results per label
    pub issue_breakdown: BTreeMap<String, usize>,
}

impl AuditSummary {
    fn from_tables(tables: &[TableReport]) -> Self {
        let mut summary = Self {
            tables: tables.len(),
            ..Self::default()
        };
        for column in tables.iter().flat_map(|t| &t.columns) {
            summary.columns += 1;
            if column.has_issues() {
                summary.columns_with_issues += 1;
            }
            for invocation in &column.invocations {
                summary.invocations += 1;
                match invocation.outcome {
                    Outcome::Success => summary.succeeded += 1,
                    Outcome::Failed(_) => summary.failed += 1,
                    Outcome::NotRun { .. } => summary.not_run += 1,
                }
                for result in &invocation.results {
                    match result.kind() {
                        ResultKind::Issue => {
                            summary.issues += 1;
                            *summary
                                .issue_breakdown
                                .entry(result.label().to_string())
                                .or_default() += 1;
                        }
                        ResultKind::Statistic => summary.statistics += 1,
                    }
                }
            }
        }
        summary
    }
}

/// Output of a complete audit run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Instant the plugins evaluated against
    pub evaluated_at: DateTime<Utc>,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
    /// Per-table results, in plan order
    pub tables: Vec<TableReport>,
    /// Aggregate counts
    pub summary: AuditSummary,
}

impl AuditReport {
    /// All issue results with their table name.
    pub fn issues(&self) -> impl Iterator<Item = (&str, &AuditResult)> {
        self.results().filter(|(_, result)| result.is_issue())
    }

    /// All results with their table name.
    pub fn results(&self) -> impl Iterator<Item = (&str, &AuditResult)> {
        self.invocations()
            .flat_map(|(table, invocation)| invocation.results.iter().map(move |r| (table, r)))
    }

    /// Invocations that failed or did not run.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Invocation)> {
        self.invocations()
            .filter(|(_, invocation)| !invocation.outcome.is_success())
    }

    /// All invocations with their table name.
    pub fn invocations(&self) -> impl Iterator<Item = (&str, &Invocation)> {
        self.tables.iter().flat_map(|table| {
            table
                .columns
                .iter()
                .flat_map(|column| &column.invocations)
                .map(move |invocation| (table.name.as_str(), invocation))
        })
    }

    /// Finds a column report.
    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnReport> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .and_then(|t| t.columns.iter().find(|c| c.summary.name == column))
    }
}

#[derive(Debug, Clone)]
struct PlannedTable {
    name: String,
    total_rows: u64,
    analyzed_rows: u64,
    columns: Vec<ColumnSummary>,
}

/// Expanded plan: column profiles plus scheduled tasks.
#[derive(Debug, Clone)]
pub struct AuditPlan {
    tables: Vec<PlannedTable>,
    tasks: Vec<AuditTask>,
}

impl AuditPlan {
    /// Scheduled tasks in plan order.
    pub fn tasks(&self) -> &[AuditTask] {
        &self.tasks
    }

    /// `(table, total rows, analyzed rows)` for each planned table.
    pub fn row_counts(&self) -> impl Iterator<Item = (&str, u64, u64)> {
        self.tables
            .iter()
            .map(|t| (t.name.as_str(), t.total_rows, t.analyzed_rows))
    }

    /// Assembles a report from one invocation per task, in task order.
    fn into_report(
        self,
        invocations: Vec<Invocation>,
        started_at: DateTime<Utc>,
        evaluated_at: DateTime<Utc>,
    ) -> AuditReport {
        let mut tables: Vec<TableReport> = self
            .tables
            .into_iter()
            .map(|table| TableReport {
                name: table.name,
                total_rows: table.total_rows,
                analyzed_rows: table.analyzed_rows,
                sampled: table.analyzed_rows < table.total_rows,
                columns: table
                    .columns
                    .into_iter()
                    .map(|summary| ColumnReport {
                        summary,
                        invocations: Vec::new(),
                    })
                    .collect(),
            })
            .collect();

        for (task, invocation) in self.tasks.iter().zip(invocations) {
            let (t, c) = task.position;
            if let Some(column) = tables.get_mut(t).and_then(|table| table.columns.get_mut(c)) {
                column.invocations.push(invocation);
            }
        }
        for column in tables.iter_mut().flat_map(|t| &mut t.columns) {
            column.summary.settle(&column.invocations);
        }

        let summary = AuditSummary::from_tables(&tables);
        let elapsed = Utc::now().signed_duration_since(started_at);
        AuditReport {
            run_id: Uuid::new_v4(),
            started_at,
            evaluated_at,
            duration_ms: u64::try_from(elapsed.num_milliseconds()).unwrap_or(0),
            tables,
            summary,
        }
    }
}

/// Drives a configured audit.
#[derive(Debug, Clone)]
pub struct Auditor {
    runner: Runner,
    ctx: EvaluationContext,
    max_workers: usize,
    timeout: Duration,
    sampling: SamplingPolicy,
}

impl Auditor {
    /// Creates an auditor with default pool settings.
    pub fn new(registry: Arc<Registry>, ctx: EvaluationContext) -> Self {
        Self {
            runner: Runner::new(registry),
            ctx,
            max_workers: default_workers(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sampling: SamplingPolicy::default(),
        }
    }

    /// Creates an auditor from configuration settings, evaluated at `now`.
    pub fn from_config(registry: Arc<Registry>, config: &AuditConfig, now: DateTime<Utc>) -> Self {
        let settings = &config.settings;
        Self::new(registry, settings.context(now))
            .with_mode(settings.validation_mode())
            .with_timeout(settings.timeout())
            .with_max_workers(settings.worker_count())
            .with_sampling(settings.sampling())
    }

    /// Builder method to set the parameter validation mode.
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.runner = self.runner.with_mode(mode);
        self
    }

    /// Builder method to set the global timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder method to set the worker pool size (at least 1).
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Builder method to set the row sampling policy.
    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    /// The evaluation context passed to every plugin.
    pub fn context(&self) -> &EvaluationContext {
        &self.ctx
    }

    /// Expands the configuration against materialized tables.
    ///
    /// Configured tables come first, in configuration order; tables with data
    /// but no configuration follow with type-based defaults. A table with more
    /// rows than the sampling threshold is profiled and audited on the
    /// sampled rows only.
    ///
    /// # Errors
    /// Fails when the configuration is invalid, references unknown plugins,
    /// or names a table for which no data was supplied.
    pub fn plan(&self, config: &AuditConfig, data: &[TableData]) -> Result<AuditPlan> {
        config.validate()?;
        config.validate_against(self.runner.registry())?;

        let mut plans: Vec<(&TableConfig, &TableData)> = Vec::new();
        for table in &config.tables {
            let rows = data.iter().find(|d| d.name == table.name).ok_or_else(|| {
                AuditError::configuration(format!("no data supplied for table '{}'", table.name))
            })?;
            plans.push((table, rows));
        }
        let defaults: Vec<TableConfig> = data
            .iter()
            .filter(|d| config.table(&d.name).is_none())
            .map(|d| TableConfig::new(d.name.clone()))
            .collect();
        for table in &defaults {
            if let Some(rows) = data.iter().find(|d| d.name == table.name) {
                plans.push((table, rows));
            }
        }

        let mut plan = AuditPlan {
            tables: Vec::new(),
            tasks: Vec::new(),
        };
        for (t, (table, rows)) in plans.into_iter().enumerate() {
            let primary_key = if table.primary_key.is_empty() {
                &rows.primary_key
            } else {
                &table.primary_key
            };

            let total_rows = rows.row_count();
            let analyzed: Cow<'_, [serde_json::Value]> = match self.sampling.select(total_rows) {
                Some(indices) => {
                    info!(
                        "Table '{}' has {} rows; auditing a sample of {}",
                        table.name,
                        total_rows,
                        indices.len()
                    );
                    Cow::Owned(
                        indices
                            .into_iter()
                            .filter_map(|i| rows.rows.get(i).cloned())
                            .collect(),
                    )
                }
                None => Cow::Borrowed(rows.rows.as_slice()),
            };

            let mut names = rows.column_names();
            let known: HashSet<String> = names.iter().cloned().collect();
            for configured in table.columns.keys() {
                if !known.contains(configured) {
                    warn!(
                        "Column '{}' is configured for table '{}' but absent from the data",
                        configured, table.name
                    );
                    names.push(configured.clone());
                }
            }

            let mut summaries = Vec::new();
            for name in names.iter().filter(|n| !table.is_skipped(n)) {
                let column = Arc::new(ColumnData::from_rows(name, &analyzed, primary_key)?);
                let summary = ColumnSummary::from_column(&column);
                let position = (t, summaries.len());
                for check in config.checks_for(table, name, summary.column_type) {
                    plan.tasks.push(AuditTask {
                        table: table.name.clone(),
                        column: Arc::clone(&column),
                        check,
                        position,
                    });
                }
                summaries.push(summary);
            }
            debug!(
                "Planned {} columns for table '{}'",
                summaries.len(),
                table.name
            );
            plan.tables.push(PlannedTable {
                name: table.name.clone(),
                total_rows: total_rows as u64,
                analyzed_rows: analyzed.len() as u64,
                columns: summaries,
            });
        }

        info!(
            "Planned {} invocations across {} tables",
            plan.tasks.len(),
            plan.tables.len()
        );
        Ok(plan)
    }

    fn execute(runner: &Runner, task: &AuditTask, ctx: &EvaluationContext) -> Invocation {
        let check = &task.check;
        runner
            .execute(check.category, &check.plugin, &task.column, &check.params, ctx)
            .unwrap_or_else(|e| {
                Invocation::failed(check.category, check.plugin.clone(), task.column.name(), &e)
            })
    }

    /// Runs tasks one after another; returns one invocation per task, in order.
    pub fn run_sequential(&self, tasks: &[AuditTask]) -> Vec<Invocation> {
        tasks
            .iter()
            .map(|task| Self::execute(&self.runner, task, &self.ctx))
            .collect()
    }

    /// Runs tasks on a bounded worker pool; returns one invocation per task, in order.
    ///
    /// Each task runs on the blocking thread pool once it holds a semaphore
    /// permit. When the global timeout expires, collection stops: tasks that
    /// have not started are skipped, and every task without a result is
    /// reported as [`Outcome::NotRun`].
    ///
    /// Plugin calls already running on the blocking pool cannot be
    /// interrupted and keep running after this returns. Dropping the runtime
    /// waits for them; a caller that must exit promptly should end the
    /// runtime with `shutdown_background` or `shutdown_timeout`.
    pub async fn run(&self, tasks: Vec<AuditTask>) -> Vec<Invocation> {
        let total = tasks.len();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Invocation)>();
        let deadline = tokio::time::Instant::now() + self.timeout;

        debug!(
            "Running {} tasks on {} workers with a {:?} timeout",
            total, self.max_workers, self.timeout
        );

        let mut pending: Vec<AuditTask> = Vec::with_capacity(total);
        for (index, task) in tasks.into_iter().enumerate() {
            pending.push(task.clone());
            let semaphore = Arc::clone(&semaphore);
            let cancelled = Arc::clone(&cancelled);
            let tx = tx.clone();
            let runner = self.runner.clone();
            let ctx = self.ctx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                if cancelled.load(Ordering::Acquire) {
                    return;
                }
                let blocking = task.clone();
                let invocation =
                    match tokio::task::spawn_blocking(move || Self::execute(&runner, &blocking, &ctx))
                        .await
                    {
                        Ok(invocation) => invocation,
                        Err(e) => Invocation::failed(
                            task.check.category,
                            task.check.plugin.clone(),
                            task.column.name(),
                            &AuditError::execution(&task.check.plugin, task.column.name(), e.to_string()),
                        ),
                    };
                // The receiver is gone once the deadline passed
                let _ = tx.send((index, invocation));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Invocation>> = vec![None; total];
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some((index, invocation))) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(invocation);
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    cancelled.store(true, Ordering::Release);
                    warn!(
                        "Audit timed out after {:?}; {} of {} invocations completed",
                        self.timeout,
                        slots.iter().filter(|s| s.is_some()).count(),
                        total
                    );
                    break;
                }
            }
        }

        let reason = format!("not completed within the {}s timeout", self.timeout.as_secs_f64());
        slots
            .into_iter()
            .zip(pending)
            .map(|(slot, task)| slot.unwrap_or_else(|| task.not_run(reason.clone())))
            .collect()
    }

    /// Plans and runs an audit on the worker pool.
    pub async fn audit(&self, config: &AuditConfig, data: &[TableData]) -> Result<AuditReport> {
        let started_at = Utc::now();
        let plan = self.plan(config, data)?;
        let invocations = self.run(plan.tasks.clone()).await;
        let report = plan.into_report(invocations, started_at, self.ctx.now());
        log_summary(&report);
        Ok(report)
    }

    /// Plans and runs an audit sequentially.
    pub fn audit_sequential(&self, config: &AuditConfig, data: &[TableData]) -> Result<AuditReport> {
        let started_at = Utc::now();
        let plan = self.plan(config, data)?;
        let invocations = self.run_sequential(&plan.tasks);
        let report = plan.into_report(invocations, started_at, self.ctx.now());
        log_summary(&report);
        Ok(report)
    }
}

fn log_summary(report: &AuditReport) {
    let summary = &report.summary;
    info!(
        "Audit {} finished in {}ms: {} invocations, {} issues, {} failed, {} not run",
        report.run_id,
        report.duration_ms,
        summary.invocations,
        summary.issues,
        summary.failed,
        summary.not_run
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuditSettings, CheckSpec};
    use crate::plugin::PluginCategory;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn create_auditor() -> Auditor {
        Auditor::new(Arc::new(Registry::with_builtins().unwrap()), EvaluationContext::new(now()))
    }

    fn create_users() -> TableData {
        TableData::new(
            "users",
            vec![
                json!({"id": 1, "email": "a@example.com ", "age": 30, "notes": null}),
                json!({"id": 2, "email": "b@example.com", "age": -4, "notes": null}),
                json!({"id": 3, "email": "A@example.com ", "age": 41, "notes": null}),
            ],
        )
    }

    fn create_config() -> AuditConfig {
        AuditConfig::new().with_table(
            TableConfig::new("users")
                .with_primary_key(vec!["id".into()])
                .with_check(
                    "age",
                    CheckSpec::new(PluginCategory::Check, "numeric_range").with_params(
                        json!({"greater_than": 0}).as_object().cloned().unwrap(),
                    ),
                )
                .with_check("age", CheckSpec::new(PluginCategory::Insight, "numeric_summary"))
                .with_skipped("id"),
        )
    }

    #[test]
    fn test_plan_expands_explicit_and_default_checks() {
        let plan = create_auditor().plan(&create_config(), &[create_users()]).unwrap();

        let scheduled: Vec<_> = plan
            .tasks()
            .iter()
            .map(|t| (t.column.name().to_string(), t.check.plugin.clone()))
            .collect();
        assert!(scheduled.contains(&("age".into(), "numeric_range".into())));
        assert!(scheduled.contains(&("email".into(), "trailing_characters".into())));
        assert!(!scheduled.iter().any(|(column, _)| column == "id"));
        assert!(!scheduled.iter().any(|(column, _)| column == "notes"));
    }

    #[test]
    fn test_plan_rejects_unknown_plugins_and_missing_tables() {
        let auditor = create_auditor();
        let unknown = AuditConfig::new().with_table(
            TableConfig::new("users").with_check("email", CheckSpec::new(PluginCategory::Check, "nope")),
        );
        let err = auditor.plan(&unknown, &[create_users()]).unwrap_err();
        assert!(err.is_fatal());

        let err = auditor.plan(&create_config(), &[]).unwrap_err();
        assert!(matches!(err, AuditError::Configuration { .. }));
    }

    #[test]
    fn test_sequential_report() {
        let report = create_auditor()
            .audit_sequential(&create_config(), &[create_users()])
            .unwrap();

        assert_eq!(report.summary.tables, 1);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.evaluated_at, now());

        let age = report.column("users", "age").unwrap();
        assert_eq!(age.summary.status, ColumnStatus::Issues);
        assert_eq!(age.summary.column_type, ColumnType::Integer);
        let range = &age.invocations[0].results[0];
        assert_eq!(range.value(), Some(-4.0));
        assert_eq!(range.examples()[0].primary_key, Some(json!(2)));

        let notes = report.column("users", "notes").unwrap();
        assert_eq!(notes.summary.status, ColumnStatus::Empty);
        assert_eq!(notes.summary.null_pct, 100.0);
        assert!(notes.invocations.is_empty());

        let email = report.column("users", "email").unwrap();
        assert_eq!(email.summary.status, ColumnStatus::Issues);
        assert!(report.issues().count() >= 3);
    }

    #[test]
    fn test_unconfigured_tables_use_defaults() {
        let auditor = create_auditor();
        let report = auditor
            .audit_sequential(&AuditConfig::new(), &[create_users()])
            .unwrap();
        let email = report.column("users", "email").unwrap();
        assert_eq!(email.invocations.len(), 5);

        let manual = AuditConfig::new().with_settings(AuditSettings::new().with_auto_checks(false));
        let report = auditor.audit_sequential(&manual, &[create_users()]).unwrap();
        assert_eq!(report.summary.invocations, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pool_matches_sequential() {
        let auditor = create_auditor().with_max_workers(3);
        let config = create_config();
        let data = [create_users()];

        let sequential = auditor.audit_sequential(&config, &data).unwrap();
        let pooled = auditor.audit(&config, &data).await.unwrap();

        assert_eq!(sequential.summary, pooled.summary);
        let order = |report: &AuditReport| -> Vec<(String, String)> {
            report
                .invocations()
                .map(|(_, i)| (i.column.clone(), i.plugin.clone()))
                .collect()
        };
        assert_eq!(order(&sequential), order(&pooled));
    }

    #[test]
    fn test_summary_breakdown_and_columns_with_issues() {
        let report = create_auditor()
            .audit_sequential(&create_config(), &[create_users()])
            .unwrap();
        let summary = &report.summary;

        // age (VALUE_TOO_LOW) and email (trailing whitespace, case duplicates)
        assert_eq!(summary.columns_with_issues, 2);
        assert_eq!(summary.issue_breakdown.get("VALUE_TOO_LOW"), Some(&1));
        assert_eq!(summary.issue_breakdown.get("TRAILING_CHARACTERS"), Some(&1));
        assert_eq!(summary.issue_breakdown.values().sum::<usize>(), summary.issues);

        let users = &report.tables[0];
        assert_eq!((users.total_rows, users.analyzed_rows), (3, 3));
        assert!(!users.sampled);
    }

    #[test]
    fn test_large_tables_are_sampled_deterministically() {
        let rows: Vec<_> = (0..200)
            .map(|i| json!({"id": i, "code": format!("c{} ", i)}))
            .collect();
        let data = [TableData::new("events", rows).with_primary_key(vec!["id".into()])];
        let auditor = create_auditor().with_sampling(SamplingPolicy::new(40, 100));

        let first = auditor.audit_sequential(&AuditConfig::new(), &data).unwrap();
        let second = auditor.audit_sequential(&AuditConfig::new(), &data).unwrap();

        let events = &first.tables[0];
        assert_eq!((events.total_rows, events.analyzed_rows), (200, 40));
        assert!(events.sampled);
        let code = first.column("events", "code").unwrap();
        assert_eq!(code.summary.row_count, 40);
        let trailing = &code.invocations[0].results[0];
        assert_eq!(trailing.label(), "TRAILING_CHARACTERS");
        assert_eq!((trailing.count(), trailing.evaluated()), (40, 40));

        let keys = |report: &AuditReport| -> Vec<Option<serde_json::Value>> {
            report
                .issues()
                .flat_map(|(_, r)| r.examples())
                .map(|e| e.primary_key.clone())
                .collect()
        };
        assert_eq!(keys(&first), keys(&second));

        let unsampled = create_auditor().with_sampling(SamplingPolicy::new(40, 200));
        let report = unsampled.audit_sequential(&AuditConfig::new(), &data).unwrap();
        assert!(!report.tables[0].sampled);
        assert_eq!(report.tables[0].analyzed_rows, 200);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        assert!(create_auditor().run(Vec::new()).await.is_empty());
    }
}
