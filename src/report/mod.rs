//! Compliance report synthesis
//!
//! One [`GstRiskReport`](crate::domain::GstRiskReport) is derived from the
//! tenant's stored batch; the JSON and PDF views are both rendered from it.

mod pdf;
mod synthesizer;

use thiserror::Error;

use crate::infra::PipelineError;

pub use pdf::{render_report, DocumentBuilder, RenderedDocument, DISCLAIMER};
pub use synthesizer::{build_report, report_id, risk_score, ReportSynthesizer};

/// Errors that can occur while producing a report
#[derive(Error, Debug)]
pub enum ReportError {
    /// No batch, or a batch with no reconciliation results
    #[error("No reconciliation results found for tenant {0}")]
    NotFound(String),

    /// Document rendering failed
    #[error("report rendering failed: {0}")]
    Render(String),

    /// Store read failed
    #[error(transparent)]
    Store(#[from] PipelineError),
}
