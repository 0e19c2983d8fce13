//! Remote path templates.
//!
//! A template such as `/{fromWalletId}/{toWalletId}` is resolved against a
//! lookup callback. Every substituted value is form-URL-encoded, so a space
//! becomes `+`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

/// A path must start with `/` and contain no whitespace.
static PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/\S+$").expect("valid path pattern"));

/// Non-greedy `{name}` placeholder.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\S+?)\}").expect("valid placeholder pattern"));

/// Why a template could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template does not match `^/\S+$`.
    Malformed(String),
    /// A placeholder names an attribute with no usable value.
    Missing(String),
    /// A placeholder names an attribute that cannot be rendered as text.
    NotScalar(String),
    /// A placeholder resolves to `.` or `..`.
    DotSegment(String),
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(template) => write!(f, "invalid path template \"{template}\""),
            Self::Missing(name) => write!(f, "attribute \"{name}\" is not set"),
            Self::NotScalar(name) => write!(f, "attribute \"{name}\" is not a scalar value"),
            Self::DotSegment(name) => write!(f, "attribute \"{name}\" is a dot segment"),
        }
    }
}

/// Returns `true` if `path` starts with `/` and contains no whitespace.
#[must_use]
pub fn is_valid_path(path: &str) -> bool {
    PATH_PATTERN.is_match(path)
}

/// Returns the placeholder names of `template` in order of appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Renders a scalar JSON value the way the API interpolates it.
///
/// Strings are used verbatim, numbers as by [`number_to_string`] and
/// booleans as `"1"` or the empty string. Returns `None` for null, arrays
/// and objects.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_to_string(n)),
        Value::Bool(true) => Some("1".to_owned()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Renders a number as text.
///
/// Integers keep their digits. Floats with no fractional part drop it, so
/// `100.0` and `1e3` become `100` and `1000`.
#[must_use]
pub fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            if f == 0.0 {
                "0".to_owned()
            } else {
                format!("{f:.0}")
            }
        }
        _ => n.to_string(),
    }
}

/// Reads a non-negative integer given as a JSON number or a digit string.
#[must_use]
pub fn parse_unsigned(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

/// Form-URL-encodes a single path segment.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

/// Resolves the `{name}` placeholders of `template` with values from `lookup`.
///
/// `lookup` returns `Ok(None)` for a missing or null attribute and
/// `Err(())` for a value that cannot be interpolated.
///
/// # Errors
///
/// Returns [`TemplateError`] if the template is malformed or a placeholder
/// cannot be resolved.
pub fn resolve<F>(template: &str, mut lookup: F) -> Result<String, TemplateError>
where
    F: FnMut(&str) -> Result<Option<String>, ()>,
{
    if !is_valid_path(template) {
        return Err(TemplateError::Malformed(template.to_owned()));
    }

    let mut resolved = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = match lookup(name.as_str()) {
            Ok(Some(value)) => value,
            Ok(None) => return Err(TemplateError::Missing(name.as_str().to_owned())),
            Err(()) => return Err(TemplateError::NotScalar(name.as_str().to_owned())),
        };
        if value == "." || value == ".." {
            return Err(TemplateError::DotSegment(name.as_str().to_owned()));
        }
        resolved.push_str(&template[last..whole.start()]);
        resolved.push_str(&encode_segment(&value));
        last = whole.end();
    }
    resolved.push_str(&template[last..]);
    Ok(resolved)
}
