//! The cluster aggregate: members plus their transport endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ssi_common::{NodeRecord, TransportEndpoint, TransportType};

/// In-memory cluster state.
///
/// Only [`super::ClusterRegistry`] mutates this. Every key of `endpoints`
/// is also a key of `nodes`.
#[derive(Debug, Clone)]
pub struct ClusterState {
    name: String,
    created_at: DateTime<Utc>,
    nodes: BTreeMap<u32, NodeRecord>,
    endpoints: BTreeMap<u32, TransportEndpoint>,
}

impl ClusterState {
    pub fn new(name: String) -> Self {
        Self {
            name,
            created_at: Utc::now(),
            nodes: BTreeMap::new(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn contains(&self, node_id: u32) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn node(&self, node_id: u32) -> Option<&NodeRecord> {
        self.nodes.get(&node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert a member and, if given, its endpoint. Caller checks uniqueness.
    pub(crate) fn insert_node(&mut self, record: NodeRecord, endpoint: Option<TransportEndpoint>) {
        let node_id = record.node_id;
        self.nodes.insert(node_id, record);
        if let Some(endpoint) = endpoint {
            self.endpoints.insert(node_id, endpoint);
        }
    }

    /// Remove a member together with its endpoint
    pub(crate) fn remove_node(
        &mut self,
        node_id: u32,
    ) -> Option<(NodeRecord, Option<TransportEndpoint>)> {
        let record = self.nodes.remove(&node_id)?;
        let endpoint = self.endpoints.remove(&node_id);
        Some((record, endpoint))
    }

    /// Upsert; returns the endpoint it replaced
    pub(crate) fn set_endpoint(
        &mut self,
        node_id: u32,
        endpoint: TransportEndpoint,
    ) -> Option<TransportEndpoint> {
        debug_assert!(self.contains(node_id));
        self.endpoints.insert(node_id, endpoint)
    }

    pub fn endpoint(&self, node_id: u32) -> Option<&TransportEndpoint> {
        self.endpoints.get(&node_id)
    }

    pub fn endpoints(&self) -> &BTreeMap<u32, TransportEndpoint> {
        &self.endpoints
    }

    pub fn endpoint_count(&self, transport: TransportType) -> usize {
        self.endpoints
            .values()
            .filter(|e| e.transport_type() == transport)
            .count()
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values().filter(|n| n.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_nodes().count()
    }

    /// Memory contributed by active nodes only
    pub fn total_memory_mb(&self) -> u64 {
        self.active_nodes().map(|n| n.memory_mb).sum()
    }

    /// vCPUs contributed by active nodes only
    pub fn total_vcpus(&self) -> u64 {
        self.active_nodes().map(|n| u64::from(n.cpu_count)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssi_common::{NodeSpec, NodeStatus};

    fn record(id: u32, cpus: u32, memory_mb: u64, status: NodeStatus) -> NodeRecord {
        NodeSpec::new(id, format!("node{}", id), format!("10.0.0.{}", id), cpus, memory_mb)
            .with_status(status)
            .into_record(Utc::now())
            .0
    }

    #[test]
    fn test_aggregates_count_active_nodes_only() {
        let mut state = ClusterState::new("agg".to_string());
        state.insert_node(record(0, 4, 8192, NodeStatus::Active), None);
        state.insert_node(record(1, 8, 16384, NodeStatus::Active), None);
        assert_eq!(state.total_memory_mb(), 24576);
        assert_eq!(state.total_vcpus(), 12);

        state.insert_node(record(2, 2, 4096, NodeStatus::Joining), None);
        state.insert_node(record(3, 2, 4096, NodeStatus::Leaving), None);
        state.insert_node(record(4, 2, 4096, NodeStatus::Failed), None);

        assert_eq!(state.total_memory_mb(), 24576);
        assert_eq!(state.total_vcpus(), 12);
        assert_eq!(state.active_count(), 2);
        assert_eq!(state.node_count(), 5);
    }

    #[test]
    fn test_remove_node_prunes_endpoint() {
        let mut state = ClusterState::new("prune".to_string());
        state.insert_node(
            record(0, 4, 8192, NodeStatus::Active),
            Some(TransportEndpoint::tcp("10.0.0.0", 50051)),
        );

        let (removed, endpoint) = state.remove_node(0).unwrap();
        assert_eq!(removed.node_id, 0);
        assert!(endpoint.is_some());
        assert!(state.endpoints().is_empty());
        assert!(state.remove_node(0).is_none());
    }

    #[test]
    fn test_set_endpoint_replaces_across_transports() {
        let mut state = ClusterState::new("upsert".to_string());
        state.insert_node(record(0, 4, 8192, NodeStatus::Active), None);

        assert!(state.set_endpoint(0, TransportEndpoint::tcp("10.0.0.0", 50051)).is_none());
        let old = state.set_endpoint(0, TransportEndpoint::rdma(7, 1, "fe80::1", 9));

        assert_eq!(old.map(|e| e.transport_type()), Some(TransportType::Tcp));
        assert_eq!(state.endpoint_count(TransportType::Rdma), 1);
        assert_eq!(state.endpoint_count(TransportType::Tcp), 0);
    }
}
