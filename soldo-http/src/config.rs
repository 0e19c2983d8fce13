//! Client configuration.
//!
//! Credentials are mandatory. The environment selects the API host and can
//! be overridden with an explicit base URL (useful against a mock server).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use url::Url;

use crate::constants::{DEFAULT_TIMEOUT, DEMO_URL, LIVE_URL};
use crate::error::HttpError;

/// Environment variable holding the OAuth client id.
pub const CLIENT_ID_ENV: &str = "SOLDO_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const CLIENT_SECRET_ENV: &str = "SOLDO_CLIENT_SECRET";
/// Environment variable selecting `live` or `demo`.
pub const ENVIRONMENT_ENV: &str = "SOLDO_ENVIRONMENT";

/// Which Soldo deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production.
    Live,
    /// Sandbox.
    #[default]
    Demo,
}

impl Environment {
    /// Returns the API host of this environment.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Live => LIVE_URL,
            Self::Demo => DEMO_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "demo" => Ok(Self::Demo),
            other => Err(HttpError::Config(format!(
                "unknown environment \"{other}\", expected \"live\" or \"demo\""
            ))),
        }
    }
}

/// Settings needed to build a [`SoldoClient`](crate::client::SoldoClient).
#[serde_as]
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Deployment to talk to.
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the environment's host.
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Per-request timeout, in whole seconds on the wire.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl ClientConfig {
    /// Creates a demo configuration for the given credentials.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            environment: Environment::Demo,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads the configuration from `SOLDO_CLIENT_ID`, `SOLDO_CLIENT_SECRET`
    /// and the optional `SOLDO_ENVIRONMENT`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] if a credential is missing or the
    /// environment name is unknown.
    pub fn from_env() -> Result<Self, HttpError> {
        let client_id = std::env::var(CLIENT_ID_ENV).unwrap_or_default();
        let client_secret = std::env::var(CLIENT_SECRET_ENV).unwrap_or_default();
        let environment = match std::env::var(ENVIRONMENT_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };
        let config = Self::new(client_id, client_secret).with_environment(environment);
        config.validate()?;
        Ok(config)
    }

    /// Sets the environment.
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Overrides the API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that both credentials are present.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] naming the first missing key.
    pub fn validate(&self) -> Result<(), HttpError> {
        if self.client_id.trim().is_empty() {
            return Err(HttpError::Config(
                "Required \"client_id\" key is missing in config".to_owned(),
            ));
        }
        if self.client_secret.trim().is_empty() {
            return Err(HttpError::Config(
                "Required \"client_secret\" key is missing in config".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the API host this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Url`] if the environment host cannot be parsed.
    pub fn resolved_base_url(&self) -> Result<Url, HttpError> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.environment.base_url()).map_err(|source| HttpError::Url {
                context: "Failed to parse environment base url",
                source,
            }),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
