//! # RecordSync Testkit
//!
//! Test utilities for RecordSync.
//!
//! This crate provides:
//! - Record and filter fixtures with a seeded in-memory service
//! - Property-based test generators using proptest
//! - A scripted HTTP client and an in-process protected endpoint for the
//!   replay-protected request protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recordsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn lists_first_page() {
//!     let (service, orchestrator) = document_orchestrator(25, 10);
//!     orchestrator.refetch().await.unwrap();
//!     assert_eq!(orchestrator.items().len(), 10);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod http;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::http::*;
}

pub use fixtures::*;
pub use generators::*;
pub use http::*;
