//! oncohub-common: Shared error taxonomy and session state used across all Oncohub crates.

pub mod error;
pub mod session;

// Re-export commonly used types
pub use error::{ErrorKind, OncohubError, Result};
pub use session::{AuthState, AuthToken, SessionContext};
