//! Bearer token acquisition.
//!
//! Every API call carries `Authorization: Bearer <token>`. A
//! [`TokenProvider`] hands out that token; [`OAuthTokenProvider`] obtains it
//! with the OAuth client-credentials flow and refreshes it once it expires,
//! [`StaticTokenProvider`] serves a token issued elsewhere.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::constants::{AUTHORIZE_PATH, TOKEN_EXPIRY_MARGIN};
use crate::error::HttpError;

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// A boxed future returned by [`TokenProvider`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Supplies the bearer token for API calls.
pub trait TokenProvider: Send + Sync {
    /// Returns a token that is valid for at least the next request.
    fn access_token(&self) -> BoxFuture<'_, Result<String, HttpError>>;
}

/// OAuth client credentials and the token obtained with them.
#[derive(Clone)]
pub struct OAuthCredential {
    client_id: String,
    client_secret: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
    obtained_at: Option<Instant>,
}

impl OAuthCredential {
    /// Creates an unauthenticated credential.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: None,
            refresh_token: None,
            token_type: None,
            expires_in: None,
            obtained_at: None,
        }
    }

    /// OAuth client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Current access token, if authenticated.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Current refresh token, if authenticated.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Token type, usually `bearer`.
    #[must_use]
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Token lifetime in seconds as reported by the API.
    #[must_use]
    pub const fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Stores the token data returned by the authorize endpoint.
    ///
    /// `access_token`, `refresh_token` and `token_type` must be present and
    /// non-empty; `expires_in` must be a non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Authentication`] if any field fails validation.
    /// The credential is left untouched in that case.
    pub fn update_authentication_data(&mut self, data: &Value) -> Result<(), HttpError> {
        let access_token = required(data, "access_token")?;
        let refresh_token = required(data, "refresh_token")?;
        let token_type = required(data, "token_type")?;
        let expires_in = data
            .get("expires_in")
            .and_then(soldo::path::parse_unsigned)
            .ok_or_else(|| {
                HttpError::Authentication("\"expires_in\" is not an integer".to_owned())
            })?;

        self.access_token = Some(access_token);
        self.refresh_token = Some(refresh_token);
        self.token_type = Some(token_type);
        self.expires_in = Some(expires_in);
        self.obtained_at = Some(Instant::now());
        Ok(())
    }

    /// Returns `true` if no token is held or it expires within the safety
    /// margin.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        match (&self.access_token, self.obtained_at, self.expires_in) {
            (Some(_), Some(obtained_at), Some(expires_in)) => {
                let lifetime = Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
                obtained_at.elapsed() >= lifetime
            }
            _ => true,
        }
    }
}

impl fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("client_id", &self.client_id)
            .field("authenticated", &self.access_token.is_some())
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

fn valid_token(credential: &OAuthCredential) -> Option<String> {
    if credential.is_token_expired() {
        return None;
    }
    credential.access_token().map(str::to_owned)
}

fn required(data: &Value, field: &str) -> Result<String, HttpError> {
    data.get(field)
        .and_then(soldo::path::scalar_to_string)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| HttpError::Authentication(format!("\"{field}\" is missing or empty")))
}

/// [`TokenProvider`] running the OAuth client-credentials flow.
///
/// The credential lives behind an async `RwLock`; concurrent callers share
/// one token and at most one of them re-authenticates when it expires.
pub struct OAuthTokenProvider {
    client: Client,
    authorize_url: Url,
    credential: RwLock<OAuthCredential>,
}

impl OAuthTokenProvider {
    /// Creates a provider authenticating against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Url`] if the authorize URL cannot be built.
    pub fn try_new(
        client: Client,
        base_url: &Url,
        credential: OAuthCredential,
    ) -> Result<Self, HttpError> {
        let authorize_url = base_url
            .join(AUTHORIZE_PATH)
            .map_err(|source| HttpError::Url {
                context: "Failed to construct authorize URL",
                source,
            })?;
        Ok(Self {
            client,
            authorize_url,
            credential: RwLock::new(credential),
        })
    }

    /// Returns the authorize endpoint.
    #[must_use]
    pub const fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    /// Returns a snapshot of the current credential.
    pub async fn credential(&self) -> OAuthCredential {
        self.credential.read().await.clone()
    }

    /// Returns the cached token, authenticating first if it is expired.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Authentication`] if the credentials are rejected
    /// or the token response is incomplete.
    pub async fn token(&self) -> Result<String, HttpError> {
        if let Some(token) = valid_token(&*self.credential.read().await) {
            return Ok(token);
        }

        let mut credential = self.credential.write().await;
        if let Some(token) = valid_token(&credential) {
            return Ok(token);
        }

        #[cfg(feature = "telemetry")]
        tracing::info!(client_id = credential.client_id(), "soldo.auth.token_expired");

        let data = self.authorize(&credential).await?;
        credential.update_authentication_data(&data)?;
        credential
            .access_token()
            .map(str::to_owned)
            .ok_or_else(|| HttpError::Authentication("no access token after authorize".to_owned()))
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "soldo.auth.authorize", skip_all, err)
    )]
    async fn authorize(&self, credential: &OAuthCredential) -> Result<Value, HttpError> {
        let params = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(self.authorize_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                HttpError::Authentication(format!(
                    "Unable to authenticate user. Check your credential: {e}"
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Authentication(format!(
                "Unable to authenticate user. Check your credential ({status})"
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            HttpError::Authentication(format!("Unable to read authorize response: {e}"))
        })
    }
}

impl fmt::Debug for OAuthTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenProvider")
            .field("authorize_url", &self.authorize_url)
            .finish_non_exhaustive()
    }
}

impl TokenProvider for OAuthTokenProvider {
    fn access_token(&self) -> BoxFuture<'_, Result<String, HttpError>> {
        Box::pin(self.token())
    }
}

/// [`TokenProvider`] serving a fixed, pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Creates a provider that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn access_token(&self) -> BoxFuture<'_, Result<String, HttpError>> {
        let token = self.token.clone();
        Box::pin(async move { Ok(token) })
    }
}
