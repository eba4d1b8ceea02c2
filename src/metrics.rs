//! Prometheus metrics for the TripGenie pipeline
//!
//! Tracks:
//! - Pipeline outcomes by operation and result
//! - Which parse stage produced the model's JSON
//! - Model call latency by provider
//! - Rate-limit rejections by scope
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::pipeline::parse::ParseStage;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Pipeline operation, used as a metrics label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TripPlan,
    Shuffle,
    Chat,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::TripPlan => "trip_plan",
            Operation::Shuffle => "shuffle",
            Operation::Chat => "chat",
        }
    }
}

/// Terminal state of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ProviderError,
    UnparsableResponse,
    SchemaMismatch,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::ProviderError => "provider_error",
            Outcome::UnparsableResponse => "unparsable_response",
            Outcome::SchemaMismatch => "schema_mismatch",
        }
    }
}

/// Which rate limiter rejected a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    /// Shared by trip planning and shuffle
    Ai,
    Chat,
}

impl LimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitScope::Ai => "ai",
            LimitScope::Chat => "chat",
        }
    }
}

/// Metrics collector
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    pipeline_requests: IntCounterVec,
    parse_stages: IntCounterVec,
    llm_duration: HistogramVec,
    rate_limited: IntCounterVec,
    recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new registry with every metric registered
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 3 operations x 4 outcomes
        let pipeline_requests = IntCounterVec::new(
            Opts::new(
                "tripgenie_pipeline_requests_total",
                "Pipeline runs by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;

        let parse_stages = IntCounterVec::new(
            Opts::new(
                "tripgenie_parse_stage_total",
                "Model responses parsed, by the stage that produced valid JSON. \
                Anything other than direct/extracted means the model needed repair.",
            ),
            &["stage"],
        )?;

        // Model calls are slow; buckets span 100ms to 2 minutes
        let llm_duration = HistogramVec::new(
            HistogramOpts::new(
                "tripgenie_llm_request_duration_ms",
                "Model completion latency in milliseconds",
            )
            .buckets(vec![
                100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 20000.0, 30000.0, 60000.0,
                120000.0,
            ]),
            &["provider", "result"],
        )?;

        let rate_limited = IntCounterVec::new(
            Opts::new(
                "tripgenie_rate_limited_total",
                "Requests rejected by the per-IP rate limiter",
            ),
            &["scope"],
        )?;

        let recording_failures = IntCounterVec::new(
            Opts::new(
                "tripgenie_metrics_recording_failures_total",
                "Metric recording operations that failed. Frequent failures require investigation.",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(pipeline_requests.clone()))?;
        registry.register(Box::new(parse_stages.clone()))?;
        registry.register(Box::new(llm_duration.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;
        registry.register(Box::new(recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            pipeline_requests,
            parse_stages,
            llm_duration,
            rate_limited,
            recording_failures,
        })
    }

    /// Record the terminal state of a pipeline run
    pub fn record_pipeline(&self, operation: Operation, outcome: Outcome) {
        match self
            .pipeline_requests
            .get_metric_with_label_values(&[operation.as_str(), outcome.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => self.recording_failed("record_pipeline", &e),
        }
    }

    /// Record which stage of the parse flow produced valid JSON
    pub fn record_parse_stage(&self, stage: ParseStage) {
        match self
            .parse_stages
            .get_metric_with_label_values(&[stage.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => self.recording_failed("record_parse_stage", &e),
        }
    }

    /// Record model call latency
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite or negative; such
    /// values would corrupt every percentile of the histogram.
    pub fn record_llm_duration(
        &self,
        provider: &str,
        succeeded: bool,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {duration_ms}"
            )));
        }

        let result = if succeeded { "ok" } else { "error" };
        self.llm_duration
            .get_metric_with_label_values(&[provider, result])?
            .observe(duration_ms);
        Ok(())
    }

    /// Record a request rejected by a rate limiter
    pub fn record_rate_limited(&self, scope: LimitScope) {
        match self
            .rate_limited
            .get_metric_with_label_values(&[scope.as_str()])
        {
            Ok(counter) => counter.inc(),
            Err(e) => self.recording_failed("record_rate_limited", &e),
        }
    }

    /// Count a failed recording operation
    ///
    /// Metrics never fail a request; the failure is logged and counted.
    pub fn metrics_recording_failure(&self, operation: &str) {
        self.recording_failures.with_label_values(&[operation]).inc();
    }

    fn recording_failed(&self, operation: &str, error: &prometheus::Error) {
        tracing::warn!(operation, error = %error, "Failed to record metric");
        self.metrics_recording_failure(operation);
    }

    /// Encode all metrics in Prometheus text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_families.len(),
                    "Prometheus text encoder failed"
                );
                e
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Prometheus encoder produced invalid UTF-8 at byte {}",
                e.utf8_error().valid_up_to()
            ))
        })
    }
}
