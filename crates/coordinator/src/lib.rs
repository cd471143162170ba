//! # SSI-HV Coordinator
//!
//! Control plane for the Single-System-Image Hypervisor. Keeps the
//! authoritative registry of which nodes form the cluster and how peers
//! reach each node's page server (TCP or RDMA).
//!
//! ## Architecture
//! ```text
//! pager nodes / operators
//!          ↓ REST
//!     routes (API gateway)
//!          ↓
//!    ClusterRegistry ── one lock ──> ClusterState { nodes, endpoints }
//! ```

pub mod config;
pub mod pages;
pub mod registry;
pub mod routes;
pub mod state;
