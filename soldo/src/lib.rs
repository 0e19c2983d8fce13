#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the Soldo business API.
//!
//! This crate models Soldo resources and everything that can be derived from
//! them without I/O: remote paths, nested casts, relationships, update
//! payloads, fingerprints and webhook events. HTTP transport lives in
//! `soldo-http`.
//!
//! # Modules
//!
//! - [`schema`] - Static definitions of every resource type
//! - [`resource`] - Hydrated resources and their derived data
//! - [`collection`] - Paginated list responses
//! - [`path`] - Remote path templates
//! - [`fingerprint`] - SHA-512 request and webhook fingerprints
//! - [`event`] - Verified webhook envelopes
//! - [`pagination`] - Page selection for list endpoints
//! - [`error`] - Error types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod collection;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod pagination;
pub mod path;
pub mod resource;
pub mod schema;

pub use collection::ResourceCollection;
pub use error::SoldoError;
pub use event::EventEnvelope;
pub use fingerprint::FingerprintOrder;
pub use pagination::Paginator;
pub use resource::{Attribute, Resource};
pub use schema::{ResourceKind, ResourceSchema};
