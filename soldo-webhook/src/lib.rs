//! Webhook receiver for Soldo events.
//!
//! Verifies the `X-Soldo-Fingerprint` of each incoming event with
//! [`soldo::EventEnvelope`] and logs the derived event type.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`error`] - Webhook error types and their HTTP statuses
//! - [`config`] - Server configuration with environment variable expansion

pub mod config;
pub mod error;
pub mod handlers;

pub use config::WebhookConfig;
pub use error::WebhookError;
pub use handlers::{WebhookState, webhook_router};
