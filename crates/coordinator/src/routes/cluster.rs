//! Cluster lifecycle endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use ssi_common::NodeSpec;

use super::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateClusterRequest {
    name: String,
    #[serde(default)]
    nodes: Vec<NodeSpec>,
}

#[derive(Serialize)]
pub struct ClusterCreatedResponse {
    status: &'static str,
    cluster_name: String,
    nodes: usize,
    total_memory_mb: u64,
    total_vcpus: u64,
}

/// Create the cluster (fails if one already exists)
pub async fn create_cluster(
    State(state): State<AppState>,
    Json(payload): Json<CreateClusterRequest>,
) -> ApiResult<(StatusCode, Json<ClusterCreatedResponse>)> {
    tracing::info!(
        cluster = %payload.name,
        nodes = payload.nodes.len(),
        "Creating cluster"
    );

    let summary = state
        .registry
        .create_cluster(payload.name, payload.nodes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ClusterCreatedResponse {
            status: "created",
            cluster_name: summary.name,
            nodes: summary.nodes,
            total_memory_mb: summary.total_memory_mb,
            total_vcpus: summary.total_vcpus,
        }),
    ))
}

#[derive(Serialize)]
pub struct ClusterDestroyedResponse {
    status: &'static str,
    cluster_name: String,
}

/// Destroy the cluster and everything registered in it
pub async fn destroy_cluster(
    State(state): State<AppState>,
) -> ApiResult<Json<ClusterDestroyedResponse>> {
    let destroyed = state.registry.destroy_cluster().await?;

    Ok(Json(ClusterDestroyedResponse {
        status: "destroyed",
        cluster_name: destroyed.name,
    }))
}

#[derive(Serialize)]
pub struct ClusterInfoResponse {
    name: String,
    nodes: usize,
    active_nodes: usize,
    total_memory_mb: u64,
    total_vcpus: u64,
    vm_running: bool,
    created_at: String,
}

pub async fn get_cluster(State(state): State<AppState>) -> ApiResult<Json<ClusterInfoResponse>> {
    let snapshot = state.registry.get_cluster().await?;

    Ok(Json(ClusterInfoResponse {
        name: snapshot.name,
        nodes: snapshot.nodes,
        active_nodes: snapshot.active_nodes,
        total_memory_mb: snapshot.total_memory_mb,
        total_vcpus: snapshot.total_vcpus,
        vm_running: snapshot.vm_running,
        created_at: snapshot.created_at.to_rfc3339(),
    }))
}
