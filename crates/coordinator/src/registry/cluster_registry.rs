//! Cluster registry: the single writer of cluster state.
//!
//! All of `{cluster existence, nodes, endpoints}` lives behind one lock.
//! Commands take the write half and queries take the read half, so a reader
//! always sees a node and its endpoint at the same point in time. Nothing
//! awaits while a guard is held.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use ssi_common::error::Result;
use ssi_common::{CoordinatorError, NodeRecord, NodeSpec, TransportEndpoint, TransportType};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::state::ClusterState;

/// Result of `create_cluster`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    pub name: String,
    pub nodes: usize,
    pub total_memory_mb: u64,
    pub total_vcpus: u64,
}

/// Result of `destroy_cluster`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDestroyed {
    pub name: String,
    pub nodes_dropped: usize,
    pub endpoints_dropped: usize,
}

/// Point-in-time view of the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSnapshot {
    pub name: String,
    pub nodes: usize,
    pub active_nodes: usize,
    pub total_memory_mb: u64,
    pub total_vcpus: u64,
    /// VMM lifecycle is owned elsewhere; always false here
    pub vm_running: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAdded {
    pub node_id: u32,
    pub cluster_size: usize,
    /// Transport of the endpoint registered with the node, if any
    pub transport: Option<TransportType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRemoved {
    pub node_id: u32,
    pub remaining: usize,
    pub endpoint_pruned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRegistered {
    pub node_id: u32,
    pub transport_type: TransportType,
    /// Transport of the endpoint this one replaced
    pub replaced: Option<TransportType>,
}

/// Every registered endpoint, keyed by node id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDirectory {
    pub cluster_name: String,
    pub endpoints: BTreeMap<u32, TransportEndpoint>,
}

/// Remote-fault statistics reported by pager nodes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaultStats {
    pub remote_fault_rate: f64,
    pub remote_miss_ratio: f64,
    pub avg_fault_latency_us: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMetrics {
    pub cluster_name: String,
    pub total_nodes: usize,
    pub active_nodes: usize,
    pub total_memory_mb: u64,
    pub total_vcpus: u64,
    pub tcp_endpoints: usize,
    pub rdma_endpoints: usize,
    pub faults: FaultStats,
}

/// Owner of the (at most one) cluster
#[derive(Debug, Default)]
pub struct ClusterRegistry {
    current: RwLock<Option<ClusterState>>,
}

fn require(current: &Option<ClusterState>) -> Result<&ClusterState> {
    current.as_ref().ok_or_else(CoordinatorError::cluster_not_found)
}

fn require_mut(current: &mut Option<ClusterState>) -> Result<&mut ClusterState> {
    current.as_mut().ok_or_else(CoordinatorError::cluster_not_found)
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is a cluster currently held?
    pub async fn is_active(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Fails with `NotFound` unless a cluster exists
    pub async fn ensure_cluster(&self) -> Result<()> {
        require(&*self.current.read().await).map(|_| ())
    }

    /// Create the cluster and add `nodes` to it.
    ///
    /// All-or-nothing: a duplicate id anywhere in `nodes` rejects the whole
    /// request and no cluster is created.
    pub async fn create_cluster(
        &self,
        name: impl Into<String>,
        nodes: Vec<NodeSpec>,
    ) -> Result<ClusterSummary> {
        let name = name.into();
        let mut current = self.current.write().await;

        if let Some(existing) = current.as_ref() {
            warn!(cluster = %name, existing = %existing.name(), "Rejected cluster create: cluster exists");
            return Err(CoordinatorError::AlreadyExists(existing.name().to_string()));
        }

        let mut seen = HashSet::with_capacity(nodes.len());
        if let Some(dup) = nodes.iter().find(|n| !seen.insert(n.node_id)) {
            warn!(cluster = %name, node_id = dup.node_id, "Rejected cluster create: duplicate node id");
            return Err(CoordinatorError::duplicate_node(dup.node_id));
        }

        let mut state = ClusterState::new(name);
        let now = Utc::now();
        for spec in nodes {
            let (record, endpoint) = spec.into_record(now);
            info!(
                cluster = %state.name(),
                node_id = record.node_id,
                hostname = %record.hostname,
                status = %record.status,
                "Node joined cluster"
            );
            state.insert_node(record, endpoint);
        }

        let summary = ClusterSummary {
            name: state.name().to_string(),
            nodes: state.node_count(),
            total_memory_mb: state.total_memory_mb(),
            total_vcpus: state.total_vcpus(),
        };
        info!(
            cluster = %summary.name,
            nodes = summary.nodes,
            total_memory_mb = summary.total_memory_mb,
            "Cluster created"
        );

        *current = Some(state);
        Ok(summary)
    }

    /// Drop the cluster with every node and endpoint it holds
    pub async fn destroy_cluster(&self) -> Result<ClusterDestroyed> {
        let state = self
            .current
            .write()
            .await
            .take()
            .ok_or_else(CoordinatorError::cluster_not_found)?;

        let destroyed = ClusterDestroyed {
            name: state.name().to_string(),
            nodes_dropped: state.node_count(),
            endpoints_dropped: state.endpoints().len(),
        };
        info!(
            cluster = %destroyed.name,
            nodes = destroyed.nodes_dropped,
            endpoints = destroyed.endpoints_dropped,
            "Cluster destroyed"
        );
        Ok(destroyed)
    }

    pub async fn get_cluster(&self) -> Result<ClusterSnapshot> {
        let current = self.current.read().await;
        let state = require(&current)?;

        Ok(ClusterSnapshot {
            name: state.name().to_string(),
            nodes: state.node_count(),
            active_nodes: state.active_count(),
            total_memory_mb: state.total_memory_mb(),
            total_vcpus: state.total_vcpus(),
            vm_running: false,
            created_at: state.created_at(),
        })
    }

    /// Join a node, registering its inline endpoint in the same step
    pub async fn add_node(&self, spec: NodeSpec) -> Result<NodeAdded> {
        let mut current = self.current.write().await;
        let state = require_mut(&mut current)?;

        if state.contains(spec.node_id) {
            warn!(cluster = %state.name(), node_id = spec.node_id, "Rejected node add: duplicate id");
            return Err(CoordinatorError::duplicate_node(spec.node_id));
        }

        let (record, endpoint) = spec.into_record(Utc::now());
        let node_id = record.node_id;
        let transport = endpoint.as_ref().map(TransportEndpoint::transport_type);

        info!(
            cluster = %state.name(),
            node_id,
            hostname = %record.hostname,
            status = %record.status,
            transport = ?transport,
            "Node joined cluster"
        );
        state.insert_node(record, endpoint);

        Ok(NodeAdded {
            node_id,
            cluster_size: state.node_count(),
            transport,
        })
    }

    /// Remove a node; its endpoint goes with it
    pub async fn remove_node(&self, node_id: u32) -> Result<NodeRemoved> {
        let mut current = self.current.write().await;
        let state = require_mut(&mut current)?;

        let (record, endpoint) = state
            .remove_node(node_id)
            .ok_or_else(|| CoordinatorError::node_not_found(node_id))?;

        info!(
            cluster = %state.name(),
            node_id,
            hostname = %record.hostname,
            endpoint_pruned = endpoint.is_some(),
            "Node left cluster"
        );

        Ok(NodeRemoved {
            node_id,
            remaining: state.node_count(),
            endpoint_pruned: endpoint.is_some(),
        })
    }

    pub async fn get_node(&self, node_id: u32) -> Result<NodeRecord> {
        let current = self.current.read().await;
        let state = require(&current)?;

        state
            .node(node_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::node_not_found(node_id))
    }

    /// All members, ordered by node id
    pub async fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        let current = self.current.read().await;
        let state = require(&current)?;

        Ok(state.nodes().cloned().collect())
    }

    /// Upsert a node's endpoint.
    ///
    /// Any transport may replace any other; this is how a node that booted
    /// on TCP moves to RDMA.
    pub async fn register_endpoint(
        &self,
        node_id: u32,
        endpoint: TransportEndpoint,
    ) -> Result<EndpointRegistered> {
        let mut current = self.current.write().await;
        let state = require_mut(&mut current)?;

        if !state.contains(node_id) {
            warn!(cluster = %state.name(), node_id, "Rejected endpoint: not a member");
            return Err(CoordinatorError::node_not_found(node_id));
        }

        let transport_type = endpoint.transport_type();
        info!(
            cluster = %state.name(),
            node_id,
            transport = %transport_type,
            endpoint = %endpoint,
            "Endpoint registered"
        );
        let replaced = state
            .set_endpoint(node_id, endpoint)
            .map(|old| old.transport_type());

        Ok(EndpointRegistered {
            node_id,
            transport_type,
            replaced,
        })
    }

    pub async fn get_endpoint(&self, node_id: u32) -> Result<TransportEndpoint> {
        let current = self.current.read().await;
        let state = require(&current)?;

        if !state.contains(node_id) {
            return Err(CoordinatorError::node_not_found(node_id));
        }
        state
            .endpoint(node_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::endpoint_not_found(node_id))
    }

    pub async fn list_endpoints(&self) -> Result<EndpointDirectory> {
        let current = self.current.read().await;
        let state = require(&current)?;

        Ok(EndpointDirectory {
            cluster_name: state.name().to_string(),
            endpoints: state.endpoints().clone(),
        })
    }

    pub async fn metrics(&self) -> Result<ClusterMetrics> {
        let current = self.current.read().await;
        let state = require(&current)?;

        Ok(ClusterMetrics {
            cluster_name: state.name().to_string(),
            total_nodes: state.node_count(),
            active_nodes: state.active_count(),
            total_memory_mb: state.total_memory_mb(),
            total_vcpus: state.total_vcpus(),
            tcp_endpoints: state.endpoint_count(TransportType::Tcp),
            rdma_endpoints: state.endpoint_count(TransportType::Rdma),
            // TODO: fill from pager fault counters once nodes report them
            faults: FaultStats::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssi_common::{NodeStatus, NotFound};
    use std::sync::Arc;

    fn active(id: u32, cpus: u32, memory_mb: u64) -> NodeSpec {
        NodeSpec::new(id, format!("node{}", id), format!("192.168.1.{}", 10 + id), cpus, memory_mb)
            .with_status(NodeStatus::Active)
    }

    #[tokio::test]
    async fn test_single_cluster_until_destroyed() {
        let registry = ClusterRegistry::new();
        registry.create_cluster("alpha", vec![active(0, 4, 8192)]).await.unwrap();

        let err = registry.create_cluster("beta", vec![]).await.unwrap_err();
        assert_eq!(err, CoordinatorError::AlreadyExists("alpha".to_string()));

        registry.destroy_cluster().await.unwrap();
        registry.create_cluster("beta", vec![]).await.unwrap();
        assert_eq!(registry.get_cluster().await.unwrap().name, "beta");
    }

    #[tokio::test]
    async fn test_create_cluster_summary_counts_active_only() {
        let registry = ClusterRegistry::new();
        let joining = NodeSpec::new(2, "node2", "192.168.1.12", 2, 4096);

        let summary = registry
            .create_cluster("agg", vec![active(0, 4, 8192), active(1, 8, 16384), joining])
            .await
            .unwrap();

        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.total_memory_mb, 24576);
        assert_eq!(summary.total_vcpus, 12);
    }

    #[tokio::test]
    async fn test_create_cluster_with_duplicate_ids_leaves_nothing_behind() {
        let registry = ClusterRegistry::new();

        let err = registry
            .create_cluster("dup", vec![active(0, 4, 8192), active(1, 4, 8192), active(0, 2, 1024)])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "conflict");
        assert!(!registry.is_active().await);
        assert_eq!(
            registry.get_cluster().await.unwrap_err(),
            CoordinatorError::NotFound(NotFound::Cluster)
        );
    }

    #[tokio::test]
    async fn test_add_node_conflict_keeps_membership() {
        let registry = ClusterRegistry::new();
        registry.create_cluster("c", vec![active(0, 4, 8192)]).await.unwrap();

        let added = registry.add_node(active(1, 4, 8192)).await.unwrap();
        assert_eq!(added.cluster_size, 2);

        let err = registry.add_node(active(1, 16, 65536)).await.unwrap_err();
        assert_eq!(err, CoordinatorError::duplicate_node(1));

        let snapshot = registry.get_cluster().await.unwrap();
        assert_eq!(snapshot.nodes, 2);
        assert_eq!(snapshot.total_memory_mb, 16384);
    }

    #[tokio::test]
    async fn test_joining_node_does_not_change_totals() {
        let registry = ClusterRegistry::new();
        registry
            .create_cluster("c", vec![active(0, 4, 8192), active(1, 8, 16384)])
            .await
            .unwrap();

        registry
            .add_node(NodeSpec::new(2, "node2", "192.168.1.12", 2, 4096))
            .await
            .unwrap();

        let snapshot = registry.get_cluster().await.unwrap();
        assert_eq!(snapshot.nodes, 3);
        assert_eq!(snapshot.active_nodes, 2);
        assert_eq!(snapshot.total_memory_mb, 24576);
        assert!(!snapshot.vm_running);
        assert_eq!(registry.get_node(2).await.unwrap().status, NodeStatus::Joining);
    }

    #[tokio::test]
    async fn test_add_node_with_inline_endpoint() {
        let registry = ClusterRegistry::new();
        registry.create_cluster("c", vec![]).await.unwrap();

        let spec = active(5, 4, 8192).with_endpoint(TransportEndpoint::tcp("192.168.1.15", 50051));
        let added = registry.add_node(spec).await.unwrap();

        assert_eq!(added.transport, Some(TransportType::Tcp));
        assert_eq!(
            registry.get_endpoint(5).await.unwrap(),
            TransportEndpoint::tcp("192.168.1.15", 50051)
        );
    }

    #[tokio::test]
    async fn test_tcp_to_rdma_upgrade_replaces_endpoint() {
        let registry = ClusterRegistry::new();
        registry.create_cluster("upgrade", vec![active(0, 8, 16384)]).await.unwrap();

        let first = registry
            .register_endpoint(0, TransportEndpoint::tcp("192.168.1.10", 50051))
            .await
            .unwrap();
        assert_eq!(first.replaced, None);

        let rdma = TransportEndpoint::rdma(12345, 1, "fe80::1", 100);
        let second = registry.register_endpoint(0, rdma.clone()).await.unwrap();
        assert_eq!(second.transport_type, TransportType::Rdma);
        assert_eq!(second.replaced, Some(TransportType::Tcp));

        assert_eq!(registry.get_endpoint(0).await.unwrap(), rdma);
        let directory = registry.list_endpoints().await.unwrap();
        assert_eq!(directory.endpoints.len(), 1);
        assert_eq!(directory.endpoints[&0], rdma);
    }

    #[tokio::test]
    async fn test_endpoint_absence_reasons() {
        let registry = ClusterRegistry::new();
        assert_eq!(
            registry.get_endpoint(0).await.unwrap_err(),
            CoordinatorError::NotFound(NotFound::Cluster)
        );

        registry.create_cluster("c", vec![active(0, 4, 8192)]).await.unwrap();
        assert_eq!(
            registry.get_endpoint(0).await.unwrap_err(),
            CoordinatorError::NotFound(NotFound::Endpoint(0))
        );
        assert_eq!(
            registry.get_endpoint(9).await.unwrap_err(),
            CoordinatorError::NotFound(NotFound::Node(9))
        );
        assert_eq!(
            registry
                .register_endpoint(9, TransportEndpoint::tcp("10.0.0.9", 1))
                .await
                .unwrap_err(),
            CoordinatorError::NotFound(NotFound::Node(9))
        );
    }

    #[tokio::test]
    async fn test_remove_node_prunes_endpoint_from_listing() {
        let registry = ClusterRegistry::new();
        registry
            .create_cluster("c", vec![active(0, 4, 8192), active(1, 4, 8192)])
            .await
            .unwrap();
        registry
            .register_endpoint(1, TransportEndpoint::tcp("192.168.1.11", 50051))
            .await
            .unwrap();

        let removed = registry.remove_node(1).await.unwrap();
        assert_eq!(removed.remaining, 1);
        assert!(removed.endpoint_pruned);
        assert!(registry.list_endpoints().await.unwrap().endpoints.is_empty());

        assert_eq!(
            registry.remove_node(1).await.unwrap_err(),
            CoordinatorError::node_not_found(1)
        );
    }

    #[tokio::test]
    async fn test_destroy_clears_everything() {
        let registry = ClusterRegistry::new();
        registry.create_cluster("gone", vec![active(0, 4, 8192)]).await.unwrap();
        registry
            .register_endpoint(0, TransportEndpoint::tcp("192.168.1.10", 50051))
            .await
            .unwrap();

        let destroyed = registry.destroy_cluster().await.unwrap();
        assert_eq!(destroyed.name, "gone");
        assert_eq!(destroyed.endpoints_dropped, 1);

        assert!(registry.get_cluster().await.is_err());
        assert!(registry.list_endpoints().await.is_err());
        assert!(registry.destroy_cluster().await.is_err());

        registry.create_cluster("gone", vec![]).await.unwrap();
        assert!(registry.list_endpoints().await.unwrap().endpoints.is_empty());
    }

    #[tokio::test]
    async fn test_metrics_counts_endpoints_by_transport() {
        let registry = ClusterRegistry::new();
        registry
            .create_cluster("mixed", vec![active(0, 16, 32768), active(1, 8, 16384), active(2, 8, 16384)])
            .await
            .unwrap();
        registry
            .register_endpoint(0, TransportEndpoint::rdma(12345, 1, "fe80::a00:27ff:fe00:0", 100))
            .await
            .unwrap();
        registry
            .register_endpoint(1, TransportEndpoint::tcp("192.168.1.11", 50051))
            .await
            .unwrap();
        registry
            .register_endpoint(2, TransportEndpoint::tcp("192.168.1.12", 50051))
            .await
            .unwrap();

        let metrics = registry.metrics().await.unwrap();
        assert_eq!(metrics.total_memory_mb, 65536);
        assert_eq!(metrics.rdma_endpoints, 1);
        assert_eq!(metrics.tcp_endpoints, 2);
        assert_eq!(metrics.faults, FaultStats::default());
    }

    #[tokio::test]
    async fn test_concurrent_adds_keep_ids_unique() {
        let registry = Arc::new(ClusterRegistry::new());
        registry.create_cluster("race", vec![]).await.unwrap();

        // 64 tasks racing over 16 distinct ids
        let handles: Vec<_> = (0..64u32)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.add_node(active(i % 16, 1, 1024)).await })
            })
            .collect();

        let mut ok = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => {
                    assert_eq!(e.kind(), "conflict");
                    conflicts += 1;
                }
            }
        }

        assert_eq!(ok, 16);
        assert_eq!(conflicts, 48);
        assert_eq!(registry.list_nodes().await.unwrap().len(), 16);
        assert_eq!(registry.get_cluster().await.unwrap().total_memory_mb, 16 * 1024);
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = ClusterRegistry::new();
        assert!(!tokio_test::block_on(registry.is_active()));
        assert!(tokio_test::block_on(registry.ensure_cluster()).is_err());
    }
}
