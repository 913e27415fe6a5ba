//! Client-side execution workspace for the coding-practice backend.
//!
//! A [`Portal`] wraps the typed [`JudgeClient`] with a shared read cache;
//! a [`Workspace`] drives the run/submit lifecycle of one open problem.

pub mod auth;
pub mod cache;
pub mod client;
pub mod envelope;
pub mod error;
pub mod languages;
pub mod lenient;
pub mod normalize;
pub mod portal;
pub mod session;
pub mod transport;
pub mod types;
pub mod utils;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use auth::{AuthEvent, AuthSession};
pub use cache::{Aggregate, CacheKey, QueryCache};
pub use client::JudgeClient;
pub use error::{ApiError, SessionError, TransportError, WorkspaceError};
pub use languages::LanguageCatalog;
pub use normalize::{ExecutionKind, ExecutionResult, TestResult};
pub use portal::Portal;
pub use session::{ExecutionSession, Phase};
pub use transport::{HttpTransport, Transport};
pub use workspace::Workspace;
