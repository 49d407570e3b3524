//! Integration tests for the audit orchestrator and its worker pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use dwaudit_core::audit::AuditTask;
use dwaudit_core::config::PlannedCheck;
use dwaudit_core::params::RawParams;
use dwaudit_core::{
    AuditConfig, AuditResult, AuditSettings, Auditor, CheckSpec, ColumnData, ColumnStatus,
    EvaluationContext, Outcome, Params, Plugin, PluginCategory, Registry, Result, TableConfig,
    TableData,
};
use serde_json::json;

struct Panicking;

impl Plugin for Panicking {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Check
    }

    fn description(&self) -> &'static str {
        "Panics on every column"
    }

    fn run(&self, _: &ColumnData, _: &Params, _: &EvaluationContext) -> Result<Vec<AuditResult>> {
        panic!("index out of bounds");
    }
}

struct Slow;

impl Plugin for Slow {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Insight
    }

    fn description(&self) -> &'static str {
        "Sleeps before reporting nothing"
    }

    fn run(&self, _: &ColumnData, _: &Params, _: &EvaluationContext) -> Result<Vec<AuditResult>> {
        std::thread::sleep(Duration::from_millis(1000));
        Ok(Vec::new())
    }
}

fn panicking() -> Box<dyn Plugin> {
    Box::new(Panicking)
}

fn slow() -> Box<dyn Plugin> {
    Box::new(Slow)
}

fn create_registry() -> Arc<Registry> {
    let mut registry = Registry::with_builtins().unwrap();
    registry.register_constructor(panicking).unwrap();
    registry.register_constructor(slow).unwrap();
    Arc::new(registry)
}

fn create_auditor() -> Auditor {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Auditor::new(create_registry(), EvaluationContext::new(now))
}

fn task(column: &Arc<ColumnData>, category: PluginCategory, plugin: &str) -> AuditTask {
    AuditTask::new(
        "orders",
        Arc::clone(column),
        PlannedCheck {
            category,
            plugin: plugin.to_string(),
            params: RawParams::new(),
        },
    )
}

fn create_orders(rows: usize) -> TableData {
    let rows = (0..rows)
        .map(|i| {
            json!({
                "id": i,
                "customer": if i % 3 == 0 { format!("Customer {} ", i) } else { format!("customer {}", i) },
                "amount": if i % 7 == 0 { -1.0 } else { i as f64 * 2.5 },
                "placed_at": format!("2024-05-{:02}T00:00:00Z", i % 28 + 1),
            })
        })
        .collect();
    TableData::new("orders", rows).with_primary_key(vec!["id".into()])
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_integration_panic_is_isolated() {
    let column = Arc::new(ColumnData::new("name", vec![json!("a "), json!("b")]));
    let tasks = vec![
        task(&column, PluginCategory::Check, "panicking"),
        task(&column, PluginCategory::Check, "trailing_characters"),
    ];

    let invocations = create_auditor().with_max_workers(2).run(tasks).await;

    assert_eq!(invocations.len(), 2);
    match &invocations[0].outcome {
        Outcome::Failed(failure) => {
            assert_eq!(failure.kind, "plugin_execution");
            assert!(failure.message.contains("index out of bounds"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(invocations[1].outcome.is_success());
    assert_eq!(invocations[1].results[0].count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_integration_timeout_marks_unfinished_work() {
    let column = Arc::new(ColumnData::new("amount", vec![json!(1), json!(2)]));
    let tasks = vec![
        task(&column, PluginCategory::Insight, "cardinality"),
        task(&column, PluginCategory::Insight, "slow"),
        task(&column, PluginCategory::Insight, "slow"),
        task(&column, PluginCategory::Insight, "slow"),
    ];

    let invocations = create_auditor()
        .with_max_workers(4)
        .with_timeout(Duration::from_millis(200))
        .run(tasks)
        .await;

    assert_eq!(invocations.len(), 4);
    assert!(invocations[0].outcome.is_success());
    for invocation in &invocations[1..] {
        assert!(
            matches!(invocation.outcome, Outcome::NotRun { ref reason } if reason.contains("timeout")),
            "unexpected outcome {:?}",
            invocation.outcome
        );
        assert!(invocation.results.is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_integration_pool_matches_sequential() {
    let data = [create_orders(60)];
    let config = AuditConfig::new().with_table(
        TableConfig::new("orders")
            .with_check(
                "amount",
                CheckSpec::new(PluginCategory::Check, "numeric_range")
                    .with_params(json!({"greater_than": 0}).as_object().cloned().unwrap()),
            )
            .with_check("amount", CheckSpec::new(PluginCategory::Insight, "quantiles"))
            .with_check("customer", CheckSpec::new(PluginCategory::Check, "case_duplicates"))
            .with_check("customer", CheckSpec::new(PluginCategory::Insight, "top_values")),
    );
    let auditor = create_auditor().with_max_workers(4);

    let sequential = auditor.audit_sequential(&config, &data).unwrap();
    let pooled = auditor.audit(&config, &data).await.unwrap();

    assert_eq!(sequential.summary, pooled.summary);
    let flatten = |report: &dwaudit_core::AuditReport| {
        report
            .results()
            .map(|(_, r)| serde_json::to_value(r).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(flatten(&sequential), flatten(&pooled));
    assert_ne!(sequential.run_id, pooled.run_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_integration_example_limit_applies_to_every_plugin() {
    let data = [create_orders(40)];
    let config = AuditConfig::new()
        .with_settings(AuditSettings::new().with_example_limit(2))
        .with_table(
            TableConfig::new("orders").with_check(
                "customer",
                CheckSpec::new(PluginCategory::Check, "trailing_characters"),
            ),
        );
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let auditor = Auditor::from_config(create_registry(), &config, now);

    let report = auditor.audit(&config, &data).await.unwrap();

    let customer = report.column("orders", "customer").unwrap();
    let result = &customer.invocations[0].results[0];
    assert_eq!(result.count(), 14);
    assert_eq!(result.examples().len(), 2);
    assert_eq!(result.examples()[0].primary_key, Some(json!(0)));
    for (_, result) in report.results() {
        assert!(result.examples().len() <= 2);
    }
}

#[tokio::test]
async fn test_integration_failure_marks_column() {
    let data = [create_orders(5)];
    let config = AuditConfig::new().with_table(
        TableConfig::new("orders")
            .with_check("id", CheckSpec::new(PluginCategory::Check, "panicking"))
            .with_check(
                "amount",
                CheckSpec::new(PluginCategory::Check, "pattern_match"),
            ),
    );

    let report = create_auditor().audit(&config, &data).await.unwrap();

    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.failures().count(), 2);
    assert_eq!(
        report.column("orders", "id").unwrap().summary.status,
        ColumnStatus::Failed
    );
    let amount = &report.column("orders", "amount").unwrap().invocations[0];
    match &amount.outcome {
        Outcome::Failed(failure) => assert_eq!(failure.kind, "missing_required_parameter"),
        other => panic!("expected parameter failure, got {:?}", other),
    }
}
