//! Axum route handlers for the webhook service.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::Value;
use soldo::EventEnvelope;
use soldo::fingerprint::FINGERPRINT_HEADER;

use crate::config::WebhookConfig;
use crate::error::WebhookError;

/// Shared application state for the webhook service.
pub type WebhookState = Arc<WebhookConfig>;

/// `POST /webhooks` verifies a Soldo event and echoes what was derived from it.
///
/// # Errors
///
/// Returns 400 for a malformed envelope and 401 when the fingerprint is
/// missing or does not match.
pub async fn post_webhook(
    State(config): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError> {
    let fingerprint = headers
        .get(FINGERPRINT_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(WebhookError::MissingFingerprint)?;
    let payload: Value = serde_json::from_slice(&body)?;

    let event = EventEnvelope::new(
        &payload,
        fingerprint,
        &config.fingerprint_order,
        &config.internal_token,
    )
    .inspect_err(|e| tracing::warn!(error = %e, "Rejected webhook"))?;

    tracing::info!(
        event_type = event.event_type().unwrap_or("-"),
        event_name = event.event_name(),
        resource = event.resource().schema().name,
        "Received webhook"
    );

    Ok(Json(serde_json::json!({
        "event_type": event.event_type(),
        "event_name": event.event_name(),
        "resource": event.resource().to_array(),
    })))
}

/// Builds the webhook router with the given state.
pub fn webhook_router(state: WebhookState) -> axum::Router {
    axum::Router::new()
        .route("/webhooks", axum::routing::post(post_webhook))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use soldo::fingerprint::sha512_hex;
    use tower::ServiceExt;

    use super::*;

    const TOKEN: &str = "CNGZ0YEB2ZPFBRHMA";

    fn router() -> axum::Router {
        webhook_router(Arc::new(WebhookConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            fingerprint_order: "id,wallet_id,status,transaction_sign,token".to_owned(),
            internal_token: TOKEN.to_owned(),
        }))
    }

    fn payload() -> Value {
        json!({
            "event_type": "Transaction",
            "event_name": "card_authorization",
            "data": {
                "id": "1309-189704842-1503070696138",
                "wallet_id": "f086f47f-1526-11e7-9287-0a89c8769141",
                "status": "Settled",
                "category": "Refund",
                "transaction_sign": "Positive",
                "amount": 56,
            }
        })
    }

    fn signature() -> String {
        sha512_hex(
            b"1309-189704842-1503070696138f086f47f-1526-11e7-9287-0a89c8769141SettledPositiveCNGZ0YEB2ZPFBRHMA",
        )
    }

    async fn send(body: String, fingerprint: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/webhooks")
            .header("content-type", "application/json");
        if let Some(fingerprint) = fingerprint {
            request = request.header(FINGERPRINT_HEADER, fingerprint);
        }
        let response = router()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_signed_event_is_accepted() {
        let (status, body) = send(payload().to_string(), Some(&signature())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_type"], json!("transaction.refund_settled"));
        assert_eq!(body["event_name"], json!("card_authorization"));
        assert_eq!(body["resource"], payload()["data"]);
    }

    #[tokio::test]
    async fn test_wrong_fingerprint_is_unauthorized() {
        let (status, body) = send(payload().to_string(), Some("nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("cannot verify"));
    }

    #[tokio::test]
    async fn test_lowercase_header_name_is_accepted() {
        let request = Request::builder()
            .method("POST")
            .uri("/webhooks")
            .header("x-soldo-fingerprint", signature())
            .body(Body::from(payload().to_string()))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_fingerprint_is_unauthorized() {
        let (status, _) = send(payload().to_string(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_bad_request() {
        let mut data = payload();
        data.as_object_mut().unwrap().remove("event_name");
        let (status, _) = send(data.to_string(), Some(&signature())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send("not json".to_owned(), Some(&signature())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
