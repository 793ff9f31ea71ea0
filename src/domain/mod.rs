//! Domain models for the reconciliation pipeline
//!
//! Invoices, reconciliation outcomes, vendor risk, tenant records and the
//! synthesized report shape.

mod explanation;
mod invoice;
mod reconciliation;
mod report;
mod tenant;
mod types;
mod vendor;

pub use explanation::*;
pub use invoice::*;
pub use reconciliation::*;
pub use report::*;
pub use tenant::*;
pub use types::*;
pub use vendor::*;
