//! Error types for the Soldo resource engine.
//!
//! Every failure kind is its own type so callers can match on the variant of
//! [`SoldoError`] instead of inspecting messages.

use std::fmt;

/// Base error type for resource, collection and event operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SoldoError {
    /// A remote path is unset, malformed or missing an interpolated attribute.
    #[error("{0}")]
    Path(#[from] PathError),

    /// A cast attribute could not be built into a nested resource.
    #[error("{0}")]
    Cast(#[from] CastError),

    /// A collection envelope is missing pagination fields or has wrong types.
    #[error("{0}")]
    Collection(#[from] CollectionError),

    /// A relationship is undeclared or its raw payload is invalid.
    #[error("{0}")]
    Relationship(#[from] RelationshipError),

    /// A fingerprint field order is invalid or a field is unset.
    #[error("{0}")]
    Fingerprint(#[from] FingerprintError),

    /// A webhook envelope is malformed, unsupported or not verifiable.
    #[error("{0}")]
    Event(#[from] EventError),

    /// Generic misuse not covered by the other kinds.
    #[error("{0}")]
    InvalidArgument(#[from] InvalidArgumentError),
}

/// A resource or collection path could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathError {
    /// Name of the resource type whose path failed.
    pub resource: String,
    /// Why resolution failed.
    pub reason: String,
}

impl PathError {
    /// Creates a new path error for the given resource type.
    #[must_use]
    pub fn new(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot resolve remote path for {}: {}",
            self.resource, self.reason
        )
    }
}

impl std::error::Error for PathError {}

/// An attribute declared in a cast map could not be cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastError {
    /// The attribute being assigned.
    pub attribute: String,
    /// Why the cast failed.
    pub reason: String,
}

impl CastError {
    /// Creates a new cast error.
    #[must_use]
    pub fn new(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not cast {}: {}", self.attribute, self.reason)
    }
}

impl std::error::Error for CastError {}

/// A pagination envelope was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionError {
    /// Why the envelope was rejected.
    pub reason: String,
}

impl CollectionError {
    /// Creates a new collection error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not build collection: {}", self.reason)
    }
}

impl std::error::Error for CollectionError {}

/// A relationship could not be resolved or built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipError {
    /// The relationship name requested by the caller.
    pub relationship: String,
    /// Why the relationship failed.
    pub reason: String,
}

impl RelationshipError {
    /// Creates a new relationship error.
    #[must_use]
    pub fn new(relationship: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            relationship: relationship.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RelationshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not build {} relationship: {}",
            self.relationship, self.reason
        )
    }
}

impl std::error::Error for RelationshipError {}

/// A fingerprint could not be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintError {
    /// Why the fingerprint could not be computed.
    pub reason: String,
}

impl FingerprintError {
    /// Creates a new fingerprint error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid fingerprint: {}", self.reason)
    }
}

impl std::error::Error for FingerprintError {}

/// Category of an [`EventError`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventErrorKind {
    /// The envelope or the resource lacks a required field.
    #[default]
    Malformed,
    /// The envelope names a resource type that emits no events.
    Unsupported,
    /// The received fingerprint does not match the computed one.
    FingerprintMismatch,
}

/// A webhook event was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventError {
    /// What kind of rejection this is.
    pub kind: EventErrorKind,
    /// Why the event was rejected.
    pub reason: String,
}

impl EventError {
    /// Creates a new event error of kind [`EventErrorKind::Malformed`].
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            kind: EventErrorKind::Malformed,
            reason: reason.into(),
        }
    }

    /// Sets the error kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: EventErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid event: {}", self.reason)
    }
}

impl std::error::Error for EventError {}

/// Generic misuse of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgumentError {
    /// Description of the invalid argument.
    pub reason: String,
}

impl InvalidArgumentError {
    /// Creates a new invalid-argument error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid argument: {}", self.reason)
    }
}

impl std::error::Error for InvalidArgumentError {}
