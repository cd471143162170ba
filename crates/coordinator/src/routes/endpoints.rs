//! Transport endpoint registration and peer discovery.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use ssi_common::{TransportEndpoint, TransportTier, TransportType};

use super::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct EndpointRegisteredResponse {
    status: &'static str,
    node_id: u32,
    transport_type: TransportType,
}

/// Register or replace a node's endpoint (TCP -> RDMA upgrade included)
pub async fn register_endpoint(
    State(state): State<AppState>,
    Path(node_id): Path<u32>,
    Json(endpoint): Json<TransportEndpoint>,
) -> ApiResult<(StatusCode, Json<EndpointRegisteredResponse>)> {
    let registered = state.registry.register_endpoint(node_id, endpoint).await?;

    Ok((
        StatusCode::CREATED,
        Json(EndpointRegisteredResponse {
            status: "registered",
            node_id: registered.node_id,
            transport_type: registered.transport_type,
        }),
    ))
}

pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(node_id): Path<u32>,
) -> ApiResult<Json<TransportEndpoint>> {
    Ok(Json(state.registry.get_endpoint(node_id).await?))
}

/// One entry of the endpoint listing: the endpoint plus its latency tier
#[derive(Serialize)]
pub struct EndpointEntry {
    #[serde(flatten)]
    endpoint: TransportEndpoint,
    tier: TransportTier,
    expected_latency_us: u64,
}

#[derive(Serialize)]
pub struct EndpointListResponse {
    cluster_name: String,
    endpoints: BTreeMap<u32, EndpointEntry>,
}

/// Every registered endpoint in one call, for peer discovery
pub async fn list_endpoints(
    State(state): State<AppState>,
) -> ApiResult<Json<EndpointListResponse>> {
    let directory = state.registry.list_endpoints().await?;

    let endpoints = directory
        .endpoints
        .into_iter()
        .map(|(node_id, endpoint)| {
            let tier = endpoint.tier();
            let entry = EndpointEntry {
                endpoint,
                tier,
                expected_latency_us: tier.expected_latency_us(),
            };
            (node_id, entry)
        })
        .collect();

    Ok(Json(EndpointListResponse {
        cluster_name: directory.cluster_name,
        endpoints,
    }))
}
