//! Core types shared across SSI-HV components.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CoordinatorError;

/// Lifecycle state of a cluster member.
///
/// Transitions are driven from outside the registry; the registry only
/// stores whatever status a node was added with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Announced but not yet serving memory
    #[default]
    Joining,
    /// Contributes memory and vCPUs to the cluster
    Active,
    /// Draining before removal
    Leaving,
    /// Unreachable or crashed
    Failed,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joining => "joining",
            Self::Active => "active",
            Self::Leaving => "leaving",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a peer reaches a node to fetch pages it owns.
///
/// On the wire this is a flat object discriminated by `transport_type`,
/// carrying only the fields of its own transport:
///
/// ```json
/// {"transport_type": "tcp", "tcp_addr": "192.168.1.10", "tcp_port": 50051}
/// {"transport_type": "rdma", "rdma_qpn": 12345, "rdma_lid": 1, "rdma_gid": "fe80::1", "rdma_psn": 100}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport_type", rename_all = "lowercase")]
pub enum TransportEndpoint {
    /// Plain TCP socket
    Tcp {
        #[serde(rename = "tcp_addr")]
        addr: String,
        #[serde(rename = "tcp_port")]
        port: u16,
    },
    /// RDMA reliable-connected queue pair
    Rdma {
        #[serde(rename = "rdma_qpn")]
        qpn: u32,
        #[serde(rename = "rdma_lid")]
        lid: u16,
        #[serde(rename = "rdma_gid")]
        gid: String,
        #[serde(rename = "rdma_psn")]
        psn: u32,
    },
}

impl TransportEndpoint {
    pub fn tcp(addr: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            addr: addr.into(),
            port,
        }
    }

    pub fn rdma(qpn: u32, lid: u16, gid: impl Into<String>, psn: u32) -> Self {
        Self::Rdma {
            qpn,
            lid,
            gid: gid.into(),
            psn,
        }
    }

    pub fn transport_type(&self) -> TransportType {
        match self {
            Self::Tcp { .. } => TransportType::Tcp,
            Self::Rdma { .. } => TransportType::Rdma,
        }
    }

    pub fn tier(&self) -> TransportTier {
        self.transport_type().tier()
    }
}

impl fmt::Display for TransportEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { addr, port } => write!(f, "tcp://{}:{}", addr, port),
            Self::Rdma { qpn, lid, gid, psn } => {
                write!(f, "rdma://{} qpn={} lid={} psn={}", gid, qpn, lid, psn)
            }
        }
    }
}

/// Transport discriminator without its addressing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Tcp,
    Rdma,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Rdma => "rdma",
        }
    }

    /// Nominal performance tier for page fetches over this transport
    pub fn tier(&self) -> TransportTier {
        match self {
            Self::Rdma => TransportTier::HighPerformance,
            Self::Tcp => TransportTier::Standard,
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected remote page-fault latency class.
///
/// Informational only; peers use it to prefer faster paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportTier {
    /// <100µs (RDMA InfiniBand)
    HighPerformance,
    /// 100-300µs (RoCE)
    MediumPerformance,
    /// 200-500µs (10G Ethernet, TCP)
    Standard,
    /// >500µs (1G Ethernet, TCP)
    Basic,
}

impl TransportTier {
    pub fn expected_latency_us(&self) -> u64 {
        match self {
            Self::HighPerformance => 50,
            Self::MediumPerformance => 150,
            Self::Standard => 350,
            Self::Basic => 1000,
        }
    }
}

/// Node description supplied when creating a cluster or joining one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub node_id: u32,
    pub hostname: String,
    pub ip_address: String,

    /// RDMA GID advertised at join time (descriptive only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdma_gid: Option<String>,

    pub cpu_count: u32,
    pub memory_mb: u64,

    /// Defaults to `joining` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,

    /// Endpoint to register together with the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<TransportEndpoint>,
}

impl NodeSpec {
    pub fn new(
        node_id: u32,
        hostname: impl Into<String>,
        ip_address: impl Into<String>,
        cpu_count: u32,
        memory_mb: u64,
    ) -> Self {
        Self {
            node_id,
            hostname: hostname.into(),
            ip_address: ip_address.into(),
            rdma_gid: None,
            cpu_count,
            memory_mb,
            status: None,
            endpoint: None,
        }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_endpoint(mut self, endpoint: TransportEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Split into the stored record and the optional inline endpoint
    pub fn into_record(self, joined_at: DateTime<Utc>) -> (NodeRecord, Option<TransportEndpoint>) {
        let record = NodeRecord {
            node_id: self.node_id,
            hostname: self.hostname,
            ip_address: self.ip_address,
            rdma_gid: self.rdma_gid,
            cpu_count: self.cpu_count,
            memory_mb: self.memory_mb,
            status: self.status.unwrap_or_default(),
            joined_at,
        };
        (record, self.endpoint)
    }
}

/// Membership and capacity facts about one cluster member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: u32,
    pub hostname: String,
    pub ip_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdma_gid: Option<String>,
    pub cpu_count: u32,
    pub memory_mb: u64,
    pub status: NodeStatus,
    pub joined_at: DateTime<Utc>,
}

impl NodeRecord {
    /// Only active nodes count toward cluster capacity
    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }
}

/// Guest physical address.
///
/// Parses `0x`-prefixed hexadecimal or plain decimal; displays as
/// lowercase `0x` hex, so `"4096"` and `"0x1000"` are the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuestPhysAddr(u64);

impl GuestPhysAddr {
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Guest frame number containing this address
    pub fn page_frame(&self) -> u64 {
        self.0 / crate::constants::PAGE_SIZE
    }
}

impl FromStr for GuestPhysAddr {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordinatorError::InvalidArgument(format!("Invalid GPA format: {:?}", s));

        // from_str_radix tolerates a leading '+', so check digits first
        let (digits, radix) = match s.strip_prefix("0x") {
            Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => (hex, 16),
            Some(_) => return Err(invalid()),
            None if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => (s, 10),
            None => return Err(invalid()),
        };

        u64::from_str_radix(digits, radix)
            .map(Self)
            .map_err(|_| invalid())
    }
}

impl fmt::Display for GuestPhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for GuestPhysAddr {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for GuestPhysAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ownership and heat of one guest page, as reported by the page directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Canonical address
    pub gpa: GuestPhysAddr,
    /// Node currently holding the page
    pub owner_node: u32,
    /// Access-frequency signal used by migration policy
    pub heat: u32,
    pub access_count: u64,
    pub migration_count: u64,
}

impl PageInfo {
    /// A page nobody has touched yet
    pub fn unassigned(gpa: GuestPhysAddr) -> Self {
        Self {
            gpa,
            owner_node: 0,
            heat: 0,
            access_count: 0,
            migration_count: 0,
        }
    }
}
