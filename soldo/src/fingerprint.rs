//! Request and webhook fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-512 digest of attribute values
//! concatenated in a fixed order, with the shared secret placed where the
//! order names `token`.

use std::str::FromStr;

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::error::FingerprintError;

/// Field name standing in for the shared secret.
pub const TOKEN_FIELD: &str = "token";

/// Header carrying the fingerprint of an outbound transfer or an inbound webhook.
pub const FINGERPRINT_HEADER: &str = "X-Soldo-Fingerprint";

/// A validated fingerprint field order.
///
/// Holds at least two fields, one of which is [`TOKEN_FIELD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintOrder(Vec<String>);

impl FingerprintOrder {
    /// Validates a field order.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] if fewer than two fields are given or none
    /// of them is `token`.
    pub fn new<I, S>(fields: I) -> Result<Self, FingerprintError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.len() < 2 {
            return Err(FingerprintError::new(
                "field order needs at least two entries",
            ));
        }
        if !fields.iter().any(|field| field == TOKEN_FIELD) {
            return Err(FingerprintError::new(
                "field order does not contain \"token\"",
            ));
        }
        Ok(Self(fields))
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for FingerprintOrder {
    type Err = FingerprintError;

    /// Parses a comma-separated order such as `id,status,token`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(',').map(str::trim))
    }
}

/// Returns the lowercase hex SHA-512 digest of `input`.
#[must_use]
pub fn sha512_hex(input: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Computes a fingerprint over the values returned by `lookup`.
///
/// `lookup` returns `Ok(None)` for a missing or null attribute and `Err(())`
/// for a value that cannot be rendered as text.
///
/// # Errors
///
/// Returns [`FingerprintError`] if any non-token field cannot be resolved.
pub fn fingerprint<F>(
    order: &FingerprintOrder,
    mut lookup: F,
    secret: &str,
) -> Result<String, FingerprintError>
where
    F: FnMut(&str) -> Result<Option<String>, ()>,
{
    let mut data = String::new();
    for field in order.fields() {
        if field == TOKEN_FIELD {
            data.push_str(secret);
            continue;
        }
        match lookup(field) {
            Ok(Some(value)) => data.push_str(&value),
            Ok(None) => {
                return Err(FingerprintError::new(format!(
                    "attribute \"{field}\" is not set"
                )));
            }
            Err(()) => {
                return Err(FingerprintError::new(format!(
                    "attribute \"{field}\" is not a scalar value"
                )));
            }
        }
    }
    Ok(sha512_hex(data.as_bytes()))
}

/// Compares two fingerprints in constant time.
#[must_use]
pub fn fingerprints_match(expected: &str, received: &str) -> bool {
    if expected.len() != received.len() {
        return false;
    }
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}
