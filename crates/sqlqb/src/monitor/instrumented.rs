use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};
use crate::client::{GenericClient, WriteResult};
use crate::config::MonitorConfig;
use crate::error::{QbError, QbResult};
use crate::query::Query;
use crate::row::Row;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An instrumented database client that wraps a `GenericClient` with monitoring.
///
/// Monitoring must be explicitly enabled via `MonitorConfig::enable_monitoring()`.
/// Hooks (`before_query` and `after_query`) run for every query regardless.
pub struct InstrumentedClient<C> {
    pub(super) client: C,
    pub(super) monitor: Arc<dyn QueryMonitor>,
    pub(super) hook: Option<Arc<dyn QueryHook>>,
    pub(super) config: MonitorConfig,
}

impl<C: GenericClient> InstrumentedClient<C> {
    /// Create a new instrumented client with no monitoring.
    pub fn new(client: C) -> Self {
        Self {
            client,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    /// Set the monitor configuration.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the query monitor.
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Set the query monitor from an Arc.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set a query hook, replacing any existing one.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a query hook.
    ///
    /// If a hook is already set, this composes it with the new hook (existing first).
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    /// Add a query hook from an `Arc`.
    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    /// Set the query timeout.
    ///
    /// Queries exceeding this duration are dropped and return [`QbError::Timeout`].
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = Some(timeout);
        self
    }

    /// Enable monitoring.
    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    /// Disable monitoring.
    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    /// Check if monitoring is enabled.
    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    /// Get the current configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get a reference to the inner client.
    pub fn inner(&self) -> &C {
        &self.client
    }

    /// Get the inner client, consuming this wrapper.
    pub fn into_inner(self) -> C {
        self.client
    }

    /// Run the hook and return the statement to execute.
    pub(super) fn apply_hook<'q>(
        &self,
        ctx: &mut QueryContext,
        query: &'q Query,
    ) -> QbResult<Cow<'q, Query>> {
        let Some(hook) = &self.hook else {
            return Ok(Cow::Borrowed(query));
        };

        match hook.before_query(ctx) {
            HookAction::Continue => Ok(Cow::Borrowed(query)),
            HookAction::ModifySql(sql) => {
                let rewritten = Query::new(sql, query.params().to_vec());
                ctx.sql = rewritten.statement().to_string();
                ctx.query_type = QueryType::from_sql(&ctx.sql);
                Ok(Cow::Owned(rewritten))
            }
            HookAction::Abort(reason) => Err(QbError::validation(format!(
                "Query aborted by hook: {reason}"
            ))),
        }
    }

    pub(super) fn report_result(
        &self,
        ctx: &QueryContext,
        duration: Duration,
        result: &QueryResult,
    ) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }

        if !self.config.monitoring_enabled {
            return;
        }

        self.monitor.on_query_complete(ctx, duration, result);

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }

    pub(super) async fn execute_with_timeout<T, F>(&self, future: F) -> QbResult<T>
    where
        F: std::future::Future<Output = QbResult<T>> + Send,
    {
        match self.config.query_timeout {
            // dropping the driver future abandons the statement
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .unwrap_or(Err(QbError::Timeout(timeout))),
            None => future.await,
        }
    }

    fn start(&self, query: &Query, tag: Option<&str>) -> QueryContext {
        let mut ctx = QueryContext::from_query(query);
        if let Some(tag) = tag {
            ctx.tag = Some(tag.to_string());
        }
        ctx
    }

    pub(super) async fn query_inner(&self, query: &Query, tag: Option<&str>) -> QbResult<Vec<Row>> {
        let mut ctx = self.start(query, tag);
        let query = self.apply_hook(&mut ctx, query)?;

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.execute_with_timeout(self.client.query(&query)).await;
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(QbError::Timeout(d)) => QueryResult::Error(format!("timeout after {d:?}")),
            Err(e) => QueryResult::error(e.to_string()),
        };

        self.report_result(&ctx, duration, &query_result);
        result
    }

    pub(super) async fn execute_inner(
        &self,
        query: &Query,
        tag: Option<&str>,
    ) -> QbResult<WriteResult> {
        let mut ctx = self.start(query, tag);
        let query = self.apply_hook(&mut ctx, query)?;

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.execute_with_timeout(self.client.execute_write(&query)).await;
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(done) => QueryResult::Affected(done.rows_affected),
            Err(QbError::Timeout(d)) => QueryResult::Error(format!("timeout after {d:?}")),
            Err(e) => QueryResult::error(e.to_string()),
        };

        self.report_result(&ctx, duration, &query_result);
        result
    }
}

impl<C: GenericClient> GenericClient for InstrumentedClient<C> {
    async fn query(&self, query: &Query) -> QbResult<Vec<Row>> {
        self.query_inner(query, None).await
    }

    async fn query_tagged(&self, tag: &str, query: &Query) -> QbResult<Vec<Row>> {
        self.query_inner(query, Some(tag)).await
    }

    async fn execute(&self, query: &Query) -> QbResult<u64> {
        Ok(self.execute_inner(query, None).await?.rows_affected)
    }

    async fn execute_tagged(&self, tag: &str, query: &Query) -> QbResult<u64> {
        Ok(self.execute_inner(query, Some(tag)).await?.rows_affected)
    }

    async fn execute_write(&self, query: &Query) -> QbResult<WriteResult> {
        self.execute_inner(query, None).await
    }
}
