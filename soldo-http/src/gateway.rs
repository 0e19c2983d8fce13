//! HTTP boundary of the Soldo API.
//!
//! [`RemoteGateway`] turns a method, a resource path and its parameters into
//! one authenticated request against `<host>/business/v1<path>` and decodes
//! the JSON object it returns.
//!
//! - GET parameters are sent as a query string
//! - POST parameters are sent as a form body
//! - Non-success statuses map to [`HttpError`] variants
//! - Requests are made once; there is no retry

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderValue, Method, header::AUTHORIZATION};
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

#[cfg(feature = "telemetry")]
use std::fmt::Display;
#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::auth::TokenProvider;
use crate::constants::{API_ENTRY_POINT, DEFAULT_TIMEOUT};
use crate::error::HttpError;

/// Authenticated JSON client for the business API.
#[derive(Clone)]
pub struct RemoteGateway {
    base_url: Url,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    timeout: Option<Duration>,
}

impl RemoteGateway {
    /// Creates a gateway for the API host `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: Url, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url,
            client,
            tokens,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Sets the timeout applied to every request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the API host.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the full URL of a resource path.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Url`] if the result is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, HttpError> {
        let host = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{host}{API_ENTRY_POINT}{path}")).map_err(|source| HttpError::Url {
            context: "Failed to construct endpoint URL",
            source,
        })
    }

    /// Sends one authenticated request and returns the decoded JSON object.
    ///
    /// `params` go into the query string for GET and into a form body for
    /// every other method. An empty or `null` body decodes to an empty map.
    ///
    /// # Errors
    ///
    /// Returns a status variant of [`HttpError`] for non-success responses,
    /// [`HttpError::Transport`] for network failures and
    /// [`HttpError::InvalidResponse`] if the body is not a JSON object.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "soldo.gateway.request",
            skip_all,
            fields(
                method = %method,
                path = %path,
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty
            ),
            err
        )
    )]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &Map<String, Value>,
        headers: HeaderMap,
    ) -> Result<Map<String, Value>, HttpError> {
        let url = self.endpoint(path)?;
        let token = self.tokens.access_token().await?;
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| HttpError::Authentication("token is not a valid header value".to_owned()))?;

        let pairs = form_pairs(params);
        let mut req = self
            .client
            .request(method.clone(), url)
            .headers(headers)
            .header(AUTHORIZATION, bearer);
        req = if method == Method::GET {
            req.query(&pairs)
        } else {
            req.form(&pairs)
        };
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let context = "send request";
        let response = req
            .send()
            .await
            .map_err(|source| HttpError::Transport { context, source })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| HttpError::Transport {
            context: "read response body",
            source,
        })?;

        let result = if status.is_success() {
            decode_object(&body)
        } else {
            Err(HttpError::from_status(status, body))
        };

        record_result_on_span(&result);

        result
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`RemoteGateway::request`].
    pub async fn get(
        &self,
        path: &str,
        query: &Map<String, Value>,
    ) -> Result<Map<String, Value>, HttpError> {
        self.request(Method::GET, path, query, HeaderMap::new())
            .await
    }

    /// Sends a form-encoded POST request.
    ///
    /// # Errors
    ///
    /// See [`RemoteGateway::request`].
    pub async fn post(
        &self,
        path: &str,
        body: &Map<String, Value>,
        headers: HeaderMap,
    ) -> Result<Map<String, Value>, HttpError> {
        self.request(Method::POST, path, body, headers).await
    }
}

impl fmt::Debug for RemoteGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteGateway")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Flattens parameters into string pairs; non-scalar values are sent as JSON text.
fn form_pairs(params: &Map<String, Value>) -> Vec<(&str, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let text = soldo::path::scalar_to_string(value).unwrap_or_else(|| value.to_string());
            (key.as_str(), text)
        })
        .collect()
}

fn decode_object(body: &str) -> Result<Map<String, Value>, HttpError> {
    if body.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(body).map_err(|e| HttpError::InvalidResponse {
        context: "decode JSON body",
        reason: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(HttpError::InvalidResponse {
            context: "decode JSON body",
            reason: format!("expected an object, got {other}"),
        }),
    }
}

/// Records the outcome of a request on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to Soldo failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E>(_result: &Result<R, E>) {}
