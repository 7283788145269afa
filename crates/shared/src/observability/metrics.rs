//! Prometheus 指标
//!
//! 进程内通过 metrics 宏记录，独立端口上的 axum 服务导出 `/metrics`，并顺带提供 `/health`。

use std::net::SocketAddr;

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::ObservabilityConfig;

const GRPC_REQUESTS: &str = "grpc_requests_total";
const GRPC_DURATION: &str = "grpc_request_duration_seconds";
const ACTION_EVENTS: &str = "notification_events_total";
const NOTIFICATIONS_CREATED: &str = "notifications_created_total";

/// 指标导出服务句柄，drop 时停止导出
pub struct MetricsHandle {
    server: JoinHandle<()>,
}

impl Drop for MetricsHandle {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// 安装全局 recorder 并启动导出服务
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let recorder = PrometheusBuilder::new().install_recorder()?;
    describe(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Metrics server listening");

    let server = tokio::spawn(serve(listener, recorder));
    Ok(MetricsHandle { server })
}

async fn serve(listener: TcpListener, recorder: PrometheusHandle) {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(recorder.render())))
        .route("/health", get(|| async { "OK" }));

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Metrics server error");
    }
}

fn describe(service_name: &str) {
    metrics::describe_counter!(GRPC_REQUESTS, "gRPC requests by method and status");
    metrics::describe_histogram!(GRPC_DURATION, "gRPC request latency in seconds");
    metrics::describe_counter!(ACTION_EVENTS, "Consumed action events by action and outcome");
    metrics::describe_counter!(NOTIFICATIONS_CREATED, "Persisted notifications by type");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 记录一次 gRPC 调用
pub fn record_grpc_request(method: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        GRPC_REQUESTS,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(GRPC_DURATION, "method" => method.to_string()).record(duration_secs);
}

/// 记录一条行为事件的处理结果
///
/// outcome 取值：created / skipped / failed / decode_failed
pub fn record_action_event(action: &str, outcome: &str) {
    metrics::counter!(
        ACTION_EVENTS,
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录一条通知落库
pub fn record_notification_created(notification_type: &str) {
    metrics::counter!(
        NOTIFICATIONS_CREATED,
        "notification_type" => notification_type.to_string()
    )
    .increment(1);
}
