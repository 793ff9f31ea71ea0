//! HTTP API for the reconciliation service
//!
//! Every route sits behind the audit middleware; handlers read the resolved
//! tenant from `TenantContextExt`.

mod auth_helpers;
pub mod error;
pub mod handlers;
mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode};
pub use rest::*;
