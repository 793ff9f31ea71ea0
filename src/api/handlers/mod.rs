//! REST API handlers organized by domain.

pub mod audit;
pub mod explanation;
pub mod health;
pub mod ingest;
pub mod reports;

pub use audit::*;
pub use explanation::*;
pub use health::*;
pub use ingest::*;
pub use reports::*;
