//! Node membership endpoints (dynamic join / graceful leave).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use ssi_common::{NodeRecord, NodeSpec, TransportType};

use super::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NodeJoinedResponse {
    status: &'static str,
    node_id: u32,
    cluster_nodes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    transport_type: Option<TransportType>,
}

pub async fn add_node(
    State(state): State<AppState>,
    Json(spec): Json<NodeSpec>,
) -> ApiResult<Json<NodeJoinedResponse>> {
    let added = state.registry.add_node(spec).await?;

    Ok(Json(NodeJoinedResponse {
        status: "joined",
        node_id: added.node_id,
        cluster_nodes: added.cluster_size,
        transport_type: added.transport,
    }))
}

#[derive(Serialize)]
pub struct NodeRemovedResponse {
    status: &'static str,
    node_id: u32,
    remaining_nodes: usize,
}

pub async fn remove_node(
    State(state): State<AppState>,
    Path(node_id): Path<u32>,
) -> ApiResult<Json<NodeRemovedResponse>> {
    let removed = state.registry.remove_node(node_id).await?;

    Ok(Json(NodeRemovedResponse {
        status: "removed",
        node_id: removed.node_id,
        remaining_nodes: removed.remaining,
    }))
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(node_id): Path<u32>,
) -> ApiResult<Json<NodeRecord>> {
    Ok(Json(state.registry.get_node(node_id).await?))
}

#[derive(Serialize)]
pub struct NodeListResponse {
    nodes: Vec<NodeRecord>,
}

pub async fn list_nodes(State(state): State<AppState>) -> ApiResult<Json<NodeListResponse>> {
    let nodes = state.registry.list_nodes().await?;
    Ok(Json(NodeListResponse { nodes }))
}
