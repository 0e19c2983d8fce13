//! Hosts, paths and header names of the Soldo business API.

use std::time::Duration;

/// Production API host.
pub const LIVE_URL: &str = "https://api.soldo.com";

/// Demo (sandbox) API host.
pub const DEMO_URL: &str = "https://api-demo.soldocloud.net";

/// Prefix of every business API path.
pub const API_ENTRY_POINT: &str = "/business/v1";

/// OAuth client-credentials endpoint.
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

pub use soldo::fingerprint::FINGERPRINT_HEADER;

/// A token is treated as expired this long before its actual expiry.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
