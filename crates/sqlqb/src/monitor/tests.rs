use super::*;
use crate::client::{GenericClient, WriteResult};
use crate::error::{QbError, QbResult};
use crate::query::{query, Query};
use crate::row::Row;
use crate::value::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Recording client: remembers every statement it was handed ──

#[derive(Default)]
struct RecordingClient {
    seen: Mutex<Vec<Query>>,
    delay: Option<Duration>,
}

impl RecordingClient {
    fn slow(delay: Duration) -> Self {
        Self {
            seen: Mutex::default(),
            delay: Some(delay),
        }
    }

    fn seen(&self) -> Vec<Query> {
        self.seen.lock().unwrap().clone()
    }

    async fn record(&self, query: &Query) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.seen.lock().unwrap().push(query.clone());
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, query: &Query) -> QbResult<Vec<Row>> {
        self.record(query).await;
        let columns: Arc<[String]> = Arc::from(vec!["n".to_string()]);
        Ok(vec![Row::new(columns, vec![Value::Int(1)])])
    }

    async fn execute(&self, query: &Query) -> QbResult<u64> {
        self.record(query).await;
        Ok(2)
    }
}

#[derive(Default)]
struct Capture(Mutex<Vec<(Option<String>, String, QueryResult)>>);

impl QueryMonitor for Capture {
    fn on_query_complete(&self, ctx: &QueryContext, _: Duration, result: &QueryResult) {
        self.0
            .lock()
            .unwrap()
            .push((ctx.tag.clone(), ctx.sql.clone(), result.clone()));
    }
}

#[test]
fn test_query_type_detection() {
    assert_eq!(QueryType::from_sql("SELECT * FROM users;"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  select * FROM users"), QueryType::Select);
    assert_eq!(QueryType::from_sql("(SELECT 1) UNION (SELECT 2)"), QueryType::Select);
    assert_eq!(QueryType::from_sql("SHOW TABLES"), QueryType::Select);
    assert_eq!(QueryType::from_sql("DESCRIBE users"), QueryType::Select);
    assert_eq!(
        QueryType::from_sql("INSERT IGNORE INTO users (name) VALUES (?)"),
        QueryType::Insert
    );
    assert_eq!(
        QueryType::from_sql("REPLACE INTO users (id) VALUES (?)"),
        QueryType::Replace
    );
    assert_eq!(
        QueryType::from_sql("UPDATE IGNORE users SET name = ?"),
        QueryType::Update
    );
    assert_eq!(
        QueryType::from_sql("DELETE u FROM users u JOIN t ON t.id = u.id"),
        QueryType::Delete
    );
    assert_eq!(QueryType::from_sql("CREATE TABLE users (id INT)"), QueryType::Other);
    assert_eq!(QueryType::from_sql("DESCRIPTION"), QueryType::Other);
}

#[test]
fn test_query_type_skips_comments() {
    assert_eq!(
        QueryType::from_sql("-- fetch\n/* hint */ # mysql\nSELECT 1"),
        QueryType::Select
    );
    assert_eq!(QueryType::from_sql("/* unterminated"), QueryType::Other);
}

#[test]
fn query_type_cte_dml() {
    assert_eq!(
        QueryType::from_sql("WITH cte AS (SELECT 1) INSERT INTO t SELECT * FROM cte"),
        QueryType::Insert
    );
    assert_eq!(
        QueryType::from_sql("WITH cte AS (SELECT ')') DELETE FROM t WHERE id = 1"),
        QueryType::Delete
    );
    assert_eq!(
        QueryType::from_sql("WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a JOIN b"),
        QueryType::Select
    );
}

#[test]
fn test_context_from_query() {
    let q = query("UPDATE t SET a = ? WHERE id = ?").bind(1).bind(2);
    let ctx = QueryContext::from_query(&q).with_tag("t.update").with_field("shard", "a");
    assert_eq!(ctx.sql, "UPDATE t SET a = ? WHERE id = ?;");
    assert_eq!(ctx.param_count, 2);
    assert_eq!(ctx.query_type, QueryType::Update);
    assert_eq!(ctx.tag.as_deref(), Some("t.update"));
    assert_eq!(ctx.fields.get("shard").map(String::as_str), Some("a"));
}

#[test]
fn stats_monitor_tracks_all_query_types() {
    let monitor = StatsMonitor::new();
    let record = |sql: &str, ms: u64, result: QueryResult| {
        monitor.on_query_complete(&QueryContext::new(sql, 0), Duration::from_millis(ms), &result);
    };

    record("SELECT 1", 1, QueryResult::Rows(1));
    record("INSERT INTO t (x) VALUES (1)", 2, QueryResult::Affected(1));
    record("REPLACE INTO t (x) VALUES (1)", 2, QueryResult::Affected(2));
    record("UPDATE t SET x = 1", 3, QueryResult::Affected(1));
    record("DELETE FROM t WHERE id = 1", 4, QueryResult::Affected(1));
    record("CREATE TABLE t (id INT)", 5, QueryResult::Affected(0));
    record("SELECT bad", 1, QueryResult::error("some error".to_string()));

    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 7);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.insert_count, 1);
    assert_eq!(stats.replace_count, 1);
    assert_eq!(stats.update_count, 1);
    assert_eq!(stats.delete_count, 1);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.total_duration, Duration::from_millis(18));
}

#[test]
fn stats_monitor_tracks_slowest_query_and_resets() {
    let monitor = StatsMonitor::new();
    for (sql, ms) in [("SELECT fast", 10), ("SELECT slow", 100), ("SELECT medium", 50)] {
        monitor.on_query_complete(
            &QueryContext::new(sql, 0),
            Duration::from_millis(ms),
            &QueryResult::Rows(0),
        );
    }

    let stats = monitor.stats();
    assert_eq!(stats.max_duration, Duration::from_millis(100));
    assert_eq!(stats.slowest_query.as_deref(), Some("SELECT slow"));

    monitor.reset();
    assert_eq!(monitor.stats(), QueryStats::default());
}

#[test]
fn stats_monitor_duration_saturates_on_overflow() {
    let monitor = StatsMonitor::new();
    monitor.on_query_complete(
        &QueryContext::new("SELECT 1", 0),
        Duration::from_nanos(u64::MAX - 10),
        &QueryResult::Rows(0),
    );
    monitor.on_query_complete(
        &QueryContext::new("SELECT 2", 0),
        Duration::from_nanos(100),
        &QueryResult::Rows(0),
    );
    assert_eq!(monitor.stats().total_duration, Duration::from_nanos(u64::MAX));
}

#[test]
fn composite_hook_chains_multiple_modifiers() {
    struct PrefixHook(&'static str);
    impl QueryHook for PrefixHook {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            HookAction::ModifySql(format!("{}{}", self.0, ctx.sql))
        }
    }

    let hook = CompositeHook::new()
        .add(PrefixHook("/* a */ "))
        .add(PrefixHook("/* b */ "));

    let ctx = QueryContext::new("SELECT 1", 0);
    assert_eq!(
        hook.before_query(&ctx),
        HookAction::ModifySql("/* b */ /* a */ SELECT 1".to_string())
    );
}

#[test]
fn composite_hook_abort_stops_chain() {
    struct AbortHook;
    impl QueryHook for AbortHook {
        fn before_query(&self, _ctx: &QueryContext) -> HookAction {
            HookAction::Abort("blocked".to_string())
        }
    }
    struct PanicHook;
    impl QueryHook for PanicHook {
        fn before_query(&self, _ctx: &QueryContext) -> HookAction {
            panic!("should not be called");
        }
    }

    let hook = CompositeHook::new().add(AbortHook).add(PanicHook);
    let ctx = QueryContext::new("SELECT 1", 0);
    assert_eq!(hook.before_query(&ctx), HookAction::Abort("blocked".to_string()));
}

#[test]
fn composite_hook_continue_only_returns_continue() {
    struct NoopHook;
    impl QueryHook for NoopHook {}

    let hook = CompositeHook::new().add(NoopHook).add(NoopHook);
    let ctx = QueryContext::new("SELECT 1", 0);
    assert_eq!(hook.before_query(&ctx), HookAction::Continue);
}

#[test]
fn query_result_error_truncation() {
    let short = QueryResult::error("short error".to_string());
    assert_eq!(short, QueryResult::Error("short error".to_string()));

    match QueryResult::error("é".repeat(600)) {
        QueryResult::Error(s) => {
            assert!(s.len() <= 515);
            assert!(s.ends_with("..."));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[test]
fn query_result_display() {
    assert_eq!(QueryResult::Rows(5).to_string(), "5 rows");
    assert_eq!(QueryResult::Affected(3).to_string(), "3 affected");
    assert_eq!(QueryResult::Error("oops".to_string()).to_string(), "error: oops");
}

#[tokio::test]
async fn tagged_queries_propagate_to_monitor() {
    let capture = Arc::new(Capture::default());
    let client = InstrumentedClient::new(RecordingClient::default())
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(capture.clone());

    client.query_tagged("users.list", &query("SELECT 1")).await.unwrap();
    client.execute(&query("DELETE FROM t")).await.unwrap();

    let seen = capture.0.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (Some("users.list".to_string()), "SELECT 1;".to_string(), QueryResult::Rows(1)),
            (None, "DELETE FROM t;".to_string(), QueryResult::Affected(2)),
        ]
    );
}

#[tokio::test]
async fn timeout_returns_error() {
    let client = InstrumentedClient::new(RecordingClient::slow(Duration::from_secs(60)))
        .with_config(
            MonitorConfig::new()
                .with_query_timeout(Duration::from_millis(10))
                .enable_monitoring(),
        );

    let err = client.query(&query("SELECT SLEEP(60)")).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(client.inner().seen().is_empty());
}

#[tokio::test]
async fn instrumented_client_hook_abort_prevents_execution() {
    struct BlockDelete;
    impl QueryHook for BlockDelete {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            if ctx.query_type == QueryType::Delete {
                HookAction::Abort("DELETE not allowed".to_string())
            } else {
                HookAction::Continue
            }
        }
    }

    let client = InstrumentedClient::new(RecordingClient::default()).with_hook(BlockDelete);

    let err = client.execute(&query("DELETE FROM users")).await.unwrap_err();
    assert!(matches!(err, QbError::Validation(ref msg) if msg.contains("DELETE not allowed")));
    assert!(client.inner().seen().is_empty());

    client.execute(&query("UPDATE users SET a = 1")).await.unwrap();
    assert_eq!(client.inner().seen().len(), 1);
}

#[tokio::test]
async fn instrumented_client_hook_rewrite_keeps_params() {
    struct AddComment;
    impl QueryHook for AddComment {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            HookAction::ModifySql(format!("/* traced */ {}", ctx.sql))
        }
    }

    let capture = Arc::new(Capture::default());
    let client = InstrumentedClient::new(RecordingClient::default())
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(capture.clone())
        .with_hook(AddComment);

    let q = query("SELECT * FROM t WHERE id = ?").bind(9);
    client.query(&q).await.unwrap();

    let sent = client.inner().seen();
    assert_eq!(sent[0].statement(), "/* traced */ SELECT * FROM t WHERE id = ?;");
    assert_eq!(sent[0].params(), &[Value::Int(9)]);
    assert_eq!(capture.0.lock().unwrap()[0].1, "/* traced */ SELECT * FROM t WHERE id = ?;");
}

#[tokio::test]
async fn instrumented_client_monitoring_disabled_skips_monitor() {
    struct FailMonitor;
    impl QueryMonitor for FailMonitor {
        fn on_query_complete(&self, _: &QueryContext, _: Duration, _: &QueryResult) {
            panic!("should not be called when monitoring is disabled");
        }
    }

    let client = InstrumentedClient::new(RecordingClient::default())
        .with_config(MonitorConfig::new())
        .with_monitor(FailMonitor);

    client.query(&query("SELECT 1")).await.unwrap();
    assert!(!client.is_monitoring_enabled());
}

#[tokio::test]
async fn instrumented_client_after_hook_runs_without_monitoring() {
    #[derive(Default)]
    struct Outcomes(Mutex<Vec<QueryResult>>);
    impl QueryHook for Outcomes {
        fn before_query(&self, _: &QueryContext) -> HookAction {
            HookAction::Continue
        }
        fn after_query(&self, _: &QueryContext, _: Duration, result: &QueryResult) {
            self.0.lock().unwrap().push(result.clone());
        }
    }

    let outcomes = Arc::new(Outcomes::default());
    let client = InstrumentedClient::new(RecordingClient::default()).add_hook_arc(outcomes.clone());
    assert!(!client.is_monitoring_enabled());

    client.query(&query("SELECT 1")).await.unwrap();
    client.execute(&query("DELETE FROM t")).await.unwrap();

    assert_eq!(
        *outcomes.0.lock().unwrap(),
        vec![QueryResult::Rows(1), QueryResult::Affected(2)]
    );
}

#[tokio::test]
async fn instrumented_client_forwards_insert_id() {
    struct Inserting;
    impl GenericClient for Inserting {
        async fn query(&self, _: &Query) -> QbResult<Vec<Row>> {
            Ok(Vec::new())
        }
        async fn execute(&self, _: &Query) -> QbResult<u64> {
            Ok(1)
        }
        async fn execute_write(&self, _: &Query) -> QbResult<WriteResult> {
            Ok(WriteResult {
                rows_affected: 1,
                last_insert_id: Some(7),
            })
        }
    }

    let client = InstrumentedClient::new(Inserting);
    let rows = client.exec(&query("INSERT INTO t (a) VALUES (?)").bind(1)).await.unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.last_insert_id(), Some(7));

    // clients that only implement `execute` report no id
    let rows = InstrumentedClient::new(RecordingClient::default())
        .exec(&query("INSERT INTO t (a) VALUES (1)"))
        .await
        .unwrap();
    assert_eq!(rows.last_insert_id(), None);
}

#[tokio::test]
async fn instrumented_client_slow_query_threshold() {
    #[derive(Default)]
    struct SlowCapture(Mutex<bool>);

    impl QueryMonitor for SlowCapture {
        fn on_query_complete(&self, _: &QueryContext, _: Duration, _: &QueryResult) {}
        fn on_slow_query(&self, _: &QueryContext, _: Duration) {
            *self.0.lock().unwrap() = true;
        }
    }

    let capture = Arc::new(SlowCapture::default());
    let client = InstrumentedClient::new(RecordingClient::slow(Duration::from_millis(50)))
        .with_config(
            MonitorConfig::new()
                .with_slow_query_threshold(Duration::from_millis(10))
                .enable_monitoring(),
        )
        .with_monitor_arc(capture.clone());

    client.query(&query("SELECT SLEEP(0.05)")).await.unwrap();
    assert!(*capture.0.lock().unwrap());
}

#[tokio::test]
async fn exec_dispatches_by_statement_kind() {
    let client = InstrumentedClient::new(RecordingClient::default());

    let rows = client.exec(&query("SELECT n FROM t")).await.unwrap();
    assert_eq!(rows.row_count(), 1);
    assert_eq!(rows.all()[0].get("n"), Some(&Value::Int(1)));

    let rows = client.exec(&query("UPDATE t SET n = 2")).await.unwrap();
    assert_eq!(rows.row_count(), 2);
    assert_eq!(rows.count(), 0);

    // the empty query never reaches the driver
    let rows = client.exec(&Query::empty()).await.unwrap();
    assert_eq!(rows.row_count(), 0);
    assert_eq!(client.inner().seen().len(), 2);
}

#[cfg(feature = "tracing")]
#[test]
fn tracing_hook_truncates_and_continues() {
    let hook = TracingSqlHook::new().max_sql_length(10);
    assert_eq!(hook.truncate_sql("SELECT * FROM users"), "SELECT * F...");
    assert_eq!(hook.truncate_sql("SELECT 1"), "SELECT 1");
    assert_eq!(
        hook.before_query(&QueryContext::new("SELECT 1", 0)),
        HookAction::Continue
    );
}
