use std::sync::Arc;
use std::time::Duration;

use herald_audit::{IntegrationLog, IntegrationLogStore, LogCompletion, LogStatus};
use herald_core::{
    AudienceIntegration, Integration, IntegrationId, LogId, SubscriberContext, SubscriberId,
};
use herald_provider::{ProviderError, ProviderRegistry};
use herald_store::EntityStore;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::builtin::builtin_registry;
use crate::error::DispatchError;
use crate::metrics::DispatchMetrics;

/// Time bound applied to each provider call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one integration attempt within a dispatch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub log_id: LogId,
    pub integration_id: IntegrationId,
    pub integration_name: String,
    pub kind: String,
    pub status: LogStatus,
    pub error: Option<String>,
}

/// Everything one dispatch run attempted, in link order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub subscriber_id: SubscriberId,
    pub attempts: Vec<AttemptSummary>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(LogStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(LogStatus::Failed)
    }

    fn count(&self, status: LogStatus) -> usize {
        self.attempts.iter().filter(|a| a.status == status).count()
    }
}

/// Fans a new subscriber out to every active integration of its audience.
///
/// Each attempt is recorded as an [`IntegrationLog`] row that starts
/// `pending` and is completed exactly once. A failing integration never stops
/// its siblings; only failures to load the subscriber graph abort the run.
/// Runs are not idempotent: dispatching the same subscriber twice writes two
/// independent sets of rows.
pub struct DispatchPipeline {
    store: Arc<dyn EntityStore>,
    logs: Arc<dyn IntegrationLogStore>,
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
    metrics: Arc<DispatchMetrics>,
}

impl DispatchPipeline {
    pub fn builder() -> DispatchPipelineBuilder {
        DispatchPipelineBuilder::new()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deliver a subscriber to all active integrations of its audience.
    #[instrument(name = "dispatch.subscriber", skip_all, fields(%subscriber_id))]
    pub async fn dispatch(
        &self,
        subscriber_id: &SubscriberId,
    ) -> Result<DispatchReport, DispatchError> {
        self.metrics.increment_dispatched();

        let ctx = self.store.load_context(subscriber_id).await?;
        let links = self.store.active_links(&ctx.subscriber.audience_id).await?;
        info!(
            audience = %ctx.audience.name,
            links = links.len(),
            "dispatching subscriber"
        );

        let mut attempts = Vec::with_capacity(links.len());
        for (link, integration) in links {
            if !integration.is_active {
                debug!(integration = %integration.name, "skipping inactive integration");
                continue;
            }
            attempts.push(self.attempt(&ctx, &link, &integration).await);
        }

        let report = DispatchReport {
            subscriber_id: subscriber_id.clone(),
            attempts,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "dispatch complete"
        );
        Ok(report)
    }

    #[instrument(
        name = "dispatch.attempt",
        skip_all,
        fields(integration = %integration.name, kind = %integration.integration_type)
    )]
    async fn attempt(
        &self,
        ctx: &SubscriberContext,
        link: &AudienceIntegration,
        integration: &Integration,
    ) -> AttemptSummary {
        self.metrics.increment_attempts();

        let entry = IntegrationLog::pending(
            ctx.subscriber.id.clone(),
            integration.id.clone(),
            integration.integration_type.clone(),
        );
        let mut summary = AttemptSummary {
            log_id: entry.id.clone(),
            integration_id: integration.id.clone(),
            integration_name: integration.name.clone(),
            kind: integration.integration_type.clone(),
            status: LogStatus::Pending,
            error: None,
        };

        // No provider call without a pending row to finalize.
        if let Err(e) = self.logs.record(entry).await {
            warn!(error = %e, "failed to record integration log, skipping delivery");
            self.metrics.increment_failed();
            summary.status = LogStatus::Failed;
            summary.error = Some(format!("log store error: {e}"));
            return summary;
        }

        let completion = match self.execute(ctx, link, integration).await {
            Ok(response) => {
                self.metrics.increment_succeeded();
                info!("integration delivered");
                summary.status = LogStatus::Success;
                LogCompletion::success(response)
            }
            Err(e) => {
                if matches!(e, ProviderError::Timeout(_)) {
                    self.metrics.increment_timed_out();
                }
                self.metrics.increment_failed();
                warn!(error = %e, category = %e.category(), "integration failed");
                summary.status = LogStatus::Failed;
                summary.error = Some(e.to_string());
                LogCompletion::failed(e.to_string())
            }
        };

        if let Err(e) = self.logs.complete(&summary.log_id, completion).await {
            warn!(log_id = %summary.log_id, error = %e, "failed to complete integration log");
        }
        summary
    }

    async fn execute(
        &self,
        ctx: &SubscriberContext,
        link: &AudienceIntegration,
        integration: &Integration,
    ) -> Result<serde_json::Value, ProviderError> {
        let provider = self
            .registry
            .build(&integration.integration_type, integration.config.clone())?;

        match tokio::time::timeout(self.timeout, provider.execute(ctx, link.settings_override()))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

/// Fluent builder for a [`DispatchPipeline`].
///
/// An entity store and a log store are required. The registry defaults to
/// [`builtin_registry`] and the timeout to [`DEFAULT_TIMEOUT`].
pub struct DispatchPipelineBuilder {
    store: Option<Arc<dyn EntityStore>>,
    logs: Option<Arc<dyn IntegrationLogStore>>,
    registry: Option<Arc<ProviderRegistry>>,
    timeout: Duration,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl DispatchPipelineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            logs: None,
            registry: None,
            timeout: DEFAULT_TIMEOUT,
            metrics: None,
        }
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn log_store(mut self, logs: Arc<dyn IntegrationLogStore>) -> Self {
        self.logs = Some(logs);
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Time bound for a single provider call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share an existing metrics instance (e.g. with the health endpoint).
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<DispatchPipeline, DispatchError> {
        let store = self
            .store
            .ok_or_else(|| DispatchError::Configuration("entity store is required".into()))?;
        let logs = self
            .logs
            .ok_or_else(|| DispatchError::Configuration("log store is required".into()))?;
        if self.timeout.is_zero() {
            return Err(DispatchError::Configuration(
                "dispatch timeout must be greater than zero".into(),
            ));
        }

        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(
                builtin_registry().map_err(|e| DispatchError::Configuration(e.to_string()))?,
            ),
        };

        Ok(DispatchPipeline {
            store,
            logs,
            registry,
            timeout: self.timeout,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

impl Default for DispatchPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
