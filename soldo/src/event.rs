//! Verified webhook events.
//!
//! Soldo signs every webhook with a fingerprint computed over a configured
//! list of resource fields and the shared secret. [`EventEnvelope::new`]
//! only returns once that fingerprint has been checked.

use serde_json::Value;

use crate::error::{EventError, EventErrorKind, SoldoError};
use crate::fingerprint::{self, FingerprintOrder};
use crate::resource::Resource;
use crate::schema::ResourceKind;

/// A webhook event whose fingerprint has been verified.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    event_type: Option<String>,
    event_name: String,
    resource: Resource,
}

impl EventEnvelope {
    /// Validates a webhook payload and verifies its fingerprint.
    ///
    /// `payload` must carry a non-empty `event_type` naming a resource kind
    /// that emits events, a non-empty `event_name` and a `data` object.
    /// `order` is the comma-separated field list used to compute the
    /// fingerprint, with `token` standing for `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Event`] if the payload is malformed, its type
    /// is not supported or the fingerprint does not match, and
    /// [`SoldoError::Fingerprint`] if `order` is invalid or names a field
    /// the resource does not have.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(name = "soldo.event.verify", skip_all, err)
    )]
    pub fn new(
        payload: &Value,
        fingerprint: &str,
        order: &str,
        secret: &str,
    ) -> Result<Self, SoldoError> {
        let kind_name = required_str(payload, "event_type")?;
        let event_name = required_str(payload, "event_name")?;
        let data = payload
            .get("data")
            .filter(|data| data.is_object())
            .ok_or_else(|| EventError::new("\"data\" is missing or not an object"))?;

        let kind = kind_name
            .parse::<ResourceKind>()
            .ok()
            .filter(|kind| kind.is_event_source())
            .ok_or_else(|| {
                EventError::new(format!("unsupported event type \"{kind_name}\""))
                    .with_kind(EventErrorKind::Unsupported)
            })?;

        let resource = Resource::from_value(kind.schema(), data)?;

        let order: FingerprintOrder = order.parse()?;
        let expected = resource.build_fingerprint(&order, secret)?;
        if !fingerprint::fingerprints_match(&expected, fingerprint) {
            #[cfg(feature = "telemetry")]
            tracing::warn!(event_type = kind_name, event_name, "fingerprint mismatch");
            return Err(EventError::new("cannot verify fingerprint")
                .with_kind(EventErrorKind::FingerprintMismatch)
                .into());
        }

        let event_type = resource.event_type()?;
        Ok(Self {
            event_type,
            event_name: event_name.to_owned(),
            resource,
        })
    }

    /// Derived event tag such as `transaction.refund_settled`.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// Event name as sent by Soldo, e.g. `card_authorization`.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The verified resource.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Consumes the envelope and returns the verified resource.
    #[must_use]
    pub fn into_resource(self) -> Resource {
        self.resource
    }
}

fn required_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str, EventError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| EventError::new(format!("\"{field}\" is missing or empty")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fingerprint::sha512_hex;
    use crate::schema::TRANSACTION;

    const TOKEN: &str = "CNGZ0YEB2ZPFBRHMA";
    const ORDER: &str = "id,wallet_id,status,transaction_sign,token";

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
                "amount_currency": "EUR",
                "tx_amount": 50,
                "tx_amount_currency": "GBP",
                "date": "2017-08-18T14:36:00",
                "merchant": {"name": "PRET A MANGER LONDON GBR"},
                "tags": [],
                "card_id": "f275d49c-1526-11e7-9287-0a89c8769141",
                "owner_type": "company",
            }
        })
    }

    fn expected_fingerprint() -> String {
        sha512_hex(
            b"1309-189704842-1503070696138f086f47f-1526-11e7-9287-0a89c8769141SettledPositiveCNGZ0YEB2ZPFBRHMA",
        )
    }

    #[test]
    fn test_valid_event() {
        let event = EventEnvelope::new(&payload(), &expected_fingerprint(), ORDER, TOKEN).unwrap();
        assert_eq!(event.event_type(), Some("transaction.refund_settled"));
        assert_eq!(event.event_name(), "card_authorization");
        assert_eq!(event.resource().schema(), &TRANSACTION);
        assert_eq!(
            event.resource().str("id"),
            Some("1309-189704842-1503070696138")
        );
        assert_eq!(
            Value::Object(event.into_resource().to_array()),
            payload()["data"]
        );
    }

    #[test]
    fn test_malformed_envelopes() {
        let mut cases = Vec::new();
        for field in ["event_type", "event_name", "data"] {
            let mut data = payload();
            data.as_object_mut().unwrap().remove(field);
            cases.push(data);
        }
        for (field, bad) in [
            ("data", json!("string")),
            ("event_type", json!("")),
            ("event_type", json!(null)),
            ("event_name", json!(false)),
            ("event_type", json!("ResourceNotSupported")),
            ("event_type", json!("Wallet")),
        ] {
            let mut data = payload();
            data[field] = bad;
            cases.push(data);
        }

        for data in cases {
            let result = EventEnvelope::new(&data, &expected_fingerprint(), ORDER, TOKEN);
            assert!(matches!(result, Err(SoldoError::Event(_))), "{data}");
        }
    }

    #[test]
    fn test_invalid_order() {
        for order in ["", "id,wallet_id,status,transaction_sign"] {
            let result = EventEnvelope::new(&payload(), &expected_fingerprint(), order, TOKEN);
            assert!(matches!(result, Err(SoldoError::Fingerprint(_))), "{order}");
        }
    }

    #[test]
    fn test_order_with_unknown_field() {
        let result = EventEnvelope::new(
            &payload(),
            &expected_fingerprint(),
            "id,not_there,token",
            TOKEN,
        );
        assert!(matches!(result, Err(SoldoError::Fingerprint(_))));
    }

    #[test]
    fn test_invalid_fingerprint() {
        let result = EventEnvelope::new(&payload(), "invalid-fingerprint", ORDER, TOKEN);
        assert!(matches!(
            result,
            Err(SoldoError::Event(EventError {
                kind: EventErrorKind::FingerprintMismatch,
                ..
            }))
        ));
    }

    #[test]
    fn test_invalid_secret() {
        let result = EventEnvelope::new(&payload(), &expected_fingerprint(), ORDER, "123");
        assert!(matches!(
            result,
            Err(SoldoError::Event(EventError {
                kind: EventErrorKind::FingerprintMismatch,
                ..
            }))
        ));
    }

    #[test]
    fn test_unsupported_kind() {
        let mut data = payload();
        data["event_type"] = json!("Wallet");
        let result = EventEnvelope::new(&data, &expected_fingerprint(), ORDER, TOKEN);
        assert!(matches!(
            result,
            Err(SoldoError::Event(EventError {
                kind: EventErrorKind::Unsupported,
                ..
            }))
        ));
    }

    #[test]
    fn test_event_without_template() {
        let data = json!({
            "event_type": "Card",
            "event_name": "card_created",
            "data": {"id": "CARD-1", "status": "Normal"},
        });
        let fingerprint = sha512_hex(b"CARD-1secret");
        let event = EventEnvelope::new(&data, &fingerprint, "id,token", "secret").unwrap();
        assert_eq!(event.event_type(), None);
        assert_eq!(event.event_name(), "card_created");
    }

    #[test]
    fn test_missing_event_attribute() {
        let mut data = payload();
        data["data"].as_object_mut().unwrap().remove("category");
        let result = EventEnvelope::new(&data, &expected_fingerprint(), ORDER, TOKEN);
        assert!(matches!(result, Err(SoldoError::Event(_))));
    }
}
