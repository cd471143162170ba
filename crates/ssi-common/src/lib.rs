//! # SSI-HV Common
//!
//! Shared types, errors, and constants used by the SSI-HV control plane.
//!
//! ## Modules
//! - `types` - Node records, transport endpoints, guest addresses
//! - `error` - Registry error taxonomy
//! - `constants` - Shared configuration constants

pub mod constants;
pub mod error;
pub mod types;

pub use error::{CoordinatorError, NotFound};
pub use types::*;
