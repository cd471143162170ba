//! Cluster membership and transport endpoint registry.
//!
//! Holds the singleton cluster aggregate and serializes every access to it.

mod cluster_registry;
mod state;

pub use cluster_registry::{
    ClusterDestroyed, ClusterMetrics, ClusterRegistry, ClusterSnapshot, ClusterSummary,
    EndpointDirectory, EndpointRegistered, FaultStats, NodeAdded, NodeRemoved,
};
pub use state::ClusterState;
