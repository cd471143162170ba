//! Error taxonomy for the cluster registry.
//!
//! Every variant describes a caller-visible precondition violation. None of
//! them are transient, so nothing in the control plane retries on its own.

use std::fmt;

use thiserror::Error;

/// Which entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// No cluster is currently held
    Cluster,
    /// The cluster exists but has no member with this id
    Node(u32),
    /// The node is a member but never registered an endpoint
    Endpoint(u32),
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => write!(f, "No active cluster"),
            Self::Node(id) => write!(f, "Node {} not found", id),
            Self::Endpoint(id) => write!(f, "No endpoint registered for node {}", id),
        }
    }
}

/// Errors surfaced by the coordinator registry and its API boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// A cluster already exists; destroy it before creating another
    #[error("Cluster already exists: {0}")]
    AlreadyExists(String),

    /// Duplicate node id
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing cluster, node, or endpoint
    #[error("{0}")]
    NotFound(NotFound),

    /// Malformed input (e.g. an unparseable guest physical address)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CoordinatorError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AlreadyExists(_) => 400,
            Self::Conflict(_) => 400,
            Self::NotFound(_) => 404,
            Self::InvalidArgument(_) => 400,
        }
    }

    /// Stable machine-readable label, rendered in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "already_exists",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }

    /// Registry errors are never retried internally.
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn cluster_not_found() -> Self {
        Self::NotFound(NotFound::Cluster)
    }

    pub fn node_not_found(node_id: u32) -> Self {
        Self::NotFound(NotFound::Node(node_id))
    }

    pub fn endpoint_not_found(node_id: u32) -> Self {
        Self::NotFound(NotFound::Endpoint(node_id))
    }

    pub fn duplicate_node(node_id: u32) -> Self {
        Self::Conflict(format!("Node {} already exists", node_id))
    }
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, CoordinatorError>;
