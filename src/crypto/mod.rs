//! Cryptographic utilities
//!
//! Provides SHA-256 content digests for request/response bodies and rendered
//! documents.

mod hash;

pub use hash::*;
