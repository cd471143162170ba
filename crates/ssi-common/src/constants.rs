//! Shared constants for SSI-HV components.

/// Default coordinator HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Default per-request timeout at the API gateway (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Guest page size in bytes
pub const PAGE_SIZE: u64 = 4096;

/// Prefix for auto-generated coordinator identifiers
pub const COORDINATOR_ID_PREFIX: &str = "coord-";

/// Prefix for environment variable overrides (e.g. `SSI_LISTEN_ADDR`)
pub const ENV_PREFIX: &str = "SSI";
