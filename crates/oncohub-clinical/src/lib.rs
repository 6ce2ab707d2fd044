//! oncohub-clinical: Clinical records client.
//! - OAuth2 password-grant authentication against the EHR token endpoint
//! - FHIR `DiagnosticReport` retrieval scoped to one patient
//! - Bounded retry with backoff and cooperative cancellation
//! - Flat CSV export of the retrieved reports

pub mod auth;
pub mod cancel;
pub mod client;
pub mod export;
pub mod reports;
pub mod retry;
pub mod transport;

pub use cancel::CancelToken;
pub use client::{ClinicalRecordsClient, ExportSummary};
pub use reports::DiagnosticReportRecord;
pub use retry::RetryPolicy;
pub use transport::{ClinicalTransport, ReqwestTransport, TransportResponse};
