//! Health, readiness, and metrics endpoints.

use axum::{Json, extract::State};
use serde::Serialize;

use super::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    cluster_active: bool,
    version: &'static str,
}

/// Liveness, plus whether a cluster is currently held
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        cluster_active: state.registry.is_active().await,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
}

/// Readiness check. The registry is in-process, so serving means ready.
pub async fn ready_check() -> Json<ReadyResponse> {
    Json(ReadyResponse { status: "ready" })
}

#[derive(Serialize)]
pub struct MetricsResponse {
    coordinator_id: String,
    uptime_secs: u64,
    cluster_name: String,
    total_nodes: usize,
    active_nodes: usize,
    total_memory_mb: u64,
    total_vcpus: u64,
    tcp_endpoints: usize,
    rdma_endpoints: usize,
    remote_fault_rate: f64,
    remote_miss_ratio: f64,
    avg_fault_latency_us: f64,
}

/// Cluster metrics (for monitoring)
pub async fn metrics(State(state): State<AppState>) -> ApiResult<Json<MetricsResponse>> {
    let metrics = state.registry.metrics().await?;

    Ok(Json(MetricsResponse {
        coordinator_id: state.config.coordinator_id.clone(),
        uptime_secs: state.uptime_secs(),
        cluster_name: metrics.cluster_name,
        total_nodes: metrics.total_nodes,
        active_nodes: metrics.active_nodes,
        total_memory_mb: metrics.total_memory_mb,
        total_vcpus: metrics.total_vcpus,
        tcp_endpoints: metrics.tcp_endpoints,
        rdma_endpoints: metrics.rdma_endpoints,
        remote_fault_rate: metrics.faults.remote_fault_rate,
        remote_miss_ratio: metrics.faults.remote_miss_ratio,
        avg_fault_latency_us: metrics.faults.avg_fault_latency_us,
    }))
}
