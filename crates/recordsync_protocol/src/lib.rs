//! # RecordSync Protocol
//!
//! Wire types consumed and produced by the RecordSync engine.
//!
//! This crate provides:
//! - `ListEnvelope` and `ServerPagination` for list query results
//! - `ListParams` for list query inputs
//! - `UpdatePayload`, the default update mutation body
//! - `TokenResponse`, `ProtectedRequest` and `ProtectedResponse` for the
//!   replay-protected request protocol
//! - JSON encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod list;
mod mutation;
mod secure;

pub use error::{ProtocolError, ProtocolResult};
pub use list::{ListEnvelope, ListParams, ServerPagination};
pub use mutation::UpdatePayload;
pub use secure::{ProtectedRequest, ProtectedResponse, TokenResponse};
