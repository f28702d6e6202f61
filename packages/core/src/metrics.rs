//! Prometheus metrics registry for the news aggregator.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it to
//! the cycle runner and the HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry,
};

use crate::pipeline::CycleReport;

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Total number of ingestion cycles started.
    pub cycles_total: Counter,
    /// Total number of per-source fetch failures.
    pub source_failures_total: Counter,
    /// Total number of articles newly stored.
    pub articles_inserted_total: Counter,
    /// Total number of entries skipped because their url was already stored.
    pub duplicates_skipped_total: Counter,
    /// Current number of rows in the article table.
    pub articles_stored: Gauge,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles_total = Counter::with_opts(Opts::new(
            "news_aggregator_cycles_total",
            "Ingestion cycles started",
        ))?;

        let source_failures_total = Counter::with_opts(Opts::new(
            "news_aggregator_source_failures_total",
            "Feed sources that failed to fetch or parse",
        ))?;

        let articles_inserted_total = Counter::with_opts(Opts::new(
            "news_aggregator_articles_inserted_total",
            "Articles newly stored",
        ))?;

        let duplicates_skipped_total = Counter::with_opts(Opts::new(
            "news_aggregator_duplicates_skipped_total",
            "Entries skipped because their url was already stored",
        ))?;

        let articles_stored = Gauge::with_opts(Opts::new(
            "news_aggregator_articles_stored",
            "Rows currently in the article table",
        ))?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "news_aggregator_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "news_aggregator_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(source_failures_total.clone()))?;
        registry.register(Box::new(articles_inserted_total.clone()))?;
        registry.register(Box::new(duplicates_skipped_total.clone()))?;
        registry.register(Box::new(articles_stored.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            cycles_total,
            source_failures_total,
            articles_inserted_total,
            duplicates_skipped_total,
            articles_stored,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Fold one ingestion report into the counters.
    pub fn record_cycle(&self, report: &CycleReport) {
        self.cycles_total.inc();
        self.source_failures_total.inc_by(report.failures().count() as f64);
        self.articles_inserted_total.inc_by(report.inserted() as f64);
        self.duplicates_skipped_total.inc_by(report.duplicates() as f64);
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}

/// Axum middleware counting and timing every request.
///
/// Labels use the matched route template, not the raw uri, to keep label
/// cardinality bounded.
pub async fn track_http(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());
    metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();

    response
}

/// `GET /metrics` handler.
pub async fn metrics_endpoint(State(metrics): State<Arc<AppMetrics>>) -> Response {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Failed to render metrics: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SourceOutcome, SourceReport};

    #[test]
    fn all_metrics_register_without_error() {
        let metrics = AppMetrics::new();
        assert!(metrics.is_ok(), "AppMetrics::new() failed: {:?}", metrics.err());
    }

    #[test]
    fn render_produces_non_empty_output_after_increment() {
        let metrics = AppMetrics::new().unwrap();
        metrics.cycles_total.inc();
        let output = metrics.render().unwrap();
        assert!(output.contains("news_aggregator_cycles_total"));
    }

    #[test]
    fn record_cycle_folds_report_into_counters() {
        let metrics = AppMetrics::new().unwrap();
        let report = CycleReport {
            sources: vec![
                SourceReport {
                    source: "A".into(),
                    country: "US".into(),
                    outcome: SourceOutcome::Fetched { entries: 5, inserted: 3, duplicates: 2 },
                },
                SourceReport {
                    source: "B".into(),
                    country: "FR".into(),
                    outcome: SourceOutcome::Failed { reason: "HTTP 503".into() },
                },
            ],
        };

        metrics.record_cycle(&report);
        metrics.record_cycle(&report);

        assert!((metrics.cycles_total.get() - 2.0).abs() < f64::EPSILON);
        assert!((metrics.source_failures_total.get() - 2.0).abs() < f64::EPSILON);
        assert!((metrics.articles_inserted_total.get() - 6.0).abs() < f64::EPSILON);
        assert!((metrics.duplicates_skipped_total.get() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gauge_set_and_get() {
        let metrics = AppMetrics::new().unwrap();
        metrics.articles_stored.set(42.0);
        assert!((metrics.articles_stored.get() - 42.0).abs() < f64::EPSILON);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Method, Request},
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn make_metrics_app() -> (Router, Arc<AppMetrics>) {
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let app = Router::new()
            .route("/metrics", get(metrics_endpoint))
            .route("/items/:id", get(|| async { "item" }))
            .layer(middleware::from_fn_with_state(metrics.clone(), track_http))
            .with_state(metrics.clone());
        (app, metrics)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_text() {
        let (app, _) = make_metrics_app();
        let resp = app.oneshot(get_request("/metrics")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert_eq!(ct, "text/plain; version=0.0.4");
    }

    #[tokio::test]
    async fn metrics_endpoint_contains_all_metric_names_after_increment() {
        let (app, metrics) = make_metrics_app();

        metrics.cycles_total.inc();
        metrics.source_failures_total.inc();
        metrics.articles_inserted_total.inc();
        metrics.duplicates_skipped_total.inc();
        metrics.articles_stored.set(10.0);
        metrics.http_request_duration.observe(0.042);

        let resp = app.oneshot(get_request("/metrics")).await.unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(body.contains("news_aggregator_cycles_total"));
        assert!(body.contains("news_aggregator_source_failures_total"));
        assert!(body.contains("news_aggregator_articles_inserted_total"));
        assert!(body.contains("news_aggregator_duplicates_skipped_total"));
        assert!(body.contains("news_aggregator_articles_stored"));
        assert!(body.contains("news_aggregator_http_request_duration_seconds"));
    }

    #[tokio::test]
    async fn middleware_labels_requests_by_route_template() {
        let (app, metrics) = make_metrics_app();

        app.clone().oneshot(get_request("/items/1")).await.unwrap();
        app.oneshot(get_request("/items/2")).await.unwrap();

        let count = metrics
            .http_requests_total
            .with_label_values(&["GET", "/items/:id", "200"])
            .get();
        assert!((count - 2.0).abs() < f64::EPSILON);
    }
}
