//! HTTP transport for the Soldo business API.
//!
//! Wraps the resource model of the `soldo` crate with an authenticated
//! reqwest gateway and a typed service facade.
//!
//! # Modules
//!
//! - [`client`] - [`SoldoClient`], the service facade
//! - [`gateway`] - [`RemoteGateway`], one authenticated request per call
//! - [`auth`] - OAuth credential and token providers
//! - [`config`] - client configuration and environment loading
//! - [`constants`] - hosts, paths and header names
//! - [`error`] - HTTP error types
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for requests and token refreshes

pub mod auth;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;

pub use auth::{OAuthCredential, OAuthTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::SoldoClient;
pub use config::{ClientConfig, Environment};
pub use error::HttpError;
pub use gateway::RemoteGateway;
