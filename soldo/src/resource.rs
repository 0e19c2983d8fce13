//! Hydrated resources.
//!
//! A [`Resource`] is an ordered bag of attributes bound to a static
//! [`ResourceSchema`]. The schema drives path resolution, casting of nested
//! payloads, relationship building, update filtering, fingerprinting and
//! event typing.

use serde_json::{Map, Value};

use crate::error::{
    CastError, EventError, InvalidArgumentError, PathError, RelationshipError, SoldoError,
};
use crate::fingerprint::{self, FingerprintOrder};
use crate::path;
use crate::schema::ResourceSchema;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// A raw JSON value.
    Value(Value),
    /// A nested resource built from a cast attribute.
    Resource(Box<Resource>),
}

impl Attribute {
    /// Returns the raw value, or `None` for a nested resource.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Resource(_) => None,
        }
    }

    /// Returns the nested resource, or `None` for a raw value.
    #[must_use]
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(resource) => Some(resource),
            Self::Value(_) => None,
        }
    }

    /// Expands the attribute into plain JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Resource(resource) => Value::Object(resource.to_array()),
        }
    }

    /// Text form used for paths, fingerprints and event types.
    ///
    /// `Ok(None)` means unset; `Err(())` means not interpolable.
    fn scalar(&self) -> Result<Option<String>, ()> {
        match self {
            Self::Value(Value::Null) => Ok(None),
            Self::Value(value) => path::scalar_to_string(value).map(Some).ok_or(()),
            Self::Resource(_) => Err(()),
        }
    }
}

/// A resource instance: schema plus attributes in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    schema: &'static ResourceSchema,
    attributes: Vec<(String, Attribute)>,
}

impl Resource {
    /// Creates an empty resource of the given schema.
    #[must_use]
    pub const fn new(schema: &'static ResourceSchema) -> Self {
        Self {
            schema,
            attributes: Vec::new(),
        }
    }

    /// Creates a resource and fills it from `data`.
    ///
    /// # Errors
    ///
    /// See [`Resource::fill`].
    pub fn from_value(schema: &'static ResourceSchema, data: &Value) -> Result<Self, SoldoError> {
        let mut resource = Self::new(schema);
        resource.fill(data)?;
        Ok(resource)
    }

    /// Returns the schema this resource was built with.
    #[must_use]
    pub const fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    /// Merges the entries of a JSON object into the attributes.
    ///
    /// Keys declared in the cast map become nested resources. Either every
    /// key is applied or none is.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::InvalidArgument`] if `data` is not an object and
    /// [`SoldoError::Cast`] if a cast attribute is not a non-empty object.
    pub fn fill(&mut self, data: &Value) -> Result<&mut Self, SoldoError> {
        let Value::Object(entries) = data else {
            return Err(InvalidArgumentError::new(format!(
                "cannot fill {} from a non-object value",
                self.schema.name
            ))
            .into());
        };

        let staged = entries
            .iter()
            .map(|(name, value)| Ok((name.clone(), self.prepare(name, value)?)))
            .collect::<Result<Vec<_>, SoldoError>>()?;

        for (name, attribute) in staged {
            self.insert(name, attribute);
        }
        Ok(self)
    }

    /// Assigns a single attribute, casting it if the schema declares a cast.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Cast`] if a cast attribute is not a non-empty
    /// object.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Result<&mut Self, SoldoError> {
        let name = name.into();
        let attribute = self.prepare(&name, &value)?;
        self.insert(name, attribute);
        Ok(self)
    }

    /// Assigns an already built resource to a cast attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Cast`] if `name` is not declared as a cast or
    /// `resource` has a different schema than the declared target.
    pub fn set_resource(
        &mut self,
        name: impl Into<String>,
        resource: Self,
    ) -> Result<&mut Self, SoldoError> {
        let name = name.into();
        let target = self
            .schema
            .cast_target(&name)
            .ok_or_else(|| CastError::new(&name, "attribute is not declared as a cast"))?;
        if target != resource.schema {
            return Err(CastError::new(
                &name,
                format!("expected {}, got {}", target.name, resource.schema.name),
            )
            .into());
        }
        self.insert(name, Attribute::Resource(Box::new(resource)));
        Ok(self)
    }

    /// Returns an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, attribute)| attribute)
    }

    /// Returns a raw attribute value by name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Attribute::as_value)
    }

    /// Returns a raw string attribute by name.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    /// Returns a nested resource by name.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&Self> {
        self.get(name).and_then(Attribute::as_resource)
    }

    /// Iterates over the attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }

    /// Returns `true` if no attribute has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Expands the resource, including nested resources, into plain JSON.
    #[must_use]
    pub fn to_array(&self) -> Map<String, Value> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.clone(), attribute.to_value()))
            .collect()
    }

    /// Resolves the remote path of this resource.
    ///
    /// The base path comes first; the sub-path template, if any, is resolved
    /// against the attributes and appended.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Path`] if the base path is unset or malformed,
    /// or a placeholder has no value.
    pub fn remote_path(&self) -> Result<String, SoldoError> {
        let name = self.schema.name;
        let base = self
            .schema
            .base_path
            .ok_or_else(|| PathError::new(name, "base path is not set"))?;
        if !path::is_valid_path(base) {
            return Err(PathError::new(name, format!("invalid base path \"{base}\"")).into());
        }

        let Some(template) = self.schema.path else {
            return Ok(base.to_owned());
        };
        let sub_path = path::resolve(template, |attr| self.scalar(attr))
            .map_err(|err| PathError::new(name, err.to_string()))?;
        Ok(format!("{base}{sub_path}"))
    }

    /// Builds the resources of a declared relationship from a raw payload.
    ///
    /// `raw` must hold an entry named after the relationship: a non-empty
    /// array of objects. Resources are returned in payload order.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Relationship`] if the relationship is undeclared
    /// or the payload entry is missing, empty or not an array of objects.
    pub fn build_relationship(&self, name: &str, raw: &Value) -> Result<Vec<Self>, SoldoError> {
        let target = self.relationship_target(name)?;
        let items = raw
            .get(name)
            .ok_or_else(|| RelationshipError::new(name, "payload has no such key"))?
            .as_array()
            .ok_or_else(|| RelationshipError::new(name, "payload entry is not an array"))?;
        if items.is_empty() {
            return Err(RelationshipError::new(name, "payload entry is empty").into());
        }

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.is_object() {
                    return Err(RelationshipError::new(
                        name,
                        format!("element {index} is not an object"),
                    )
                    .into());
                }
                Self::from_value(target, item)
            })
            .collect()
    }

    /// Resolves the remote path of a declared relationship.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Relationship`] if the relationship is undeclared
    /// and [`SoldoError::Path`] if the resource path cannot be resolved.
    pub fn relationship_remote_path(&self, name: &str) -> Result<String, SoldoError> {
        self.relationship_target(name)?;
        Ok(format!("{}/{name}", self.remote_path()?))
    }

    /// Keeps only the whitelisted keys of `data`, in `data` order.
    #[must_use]
    pub fn filter_whitelist(&self, data: &Map<String, Value>) -> Map<String, Value> {
        data.iter()
            .filter(|(key, _)| self.schema.whitelist.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Computes the fingerprint of this resource for the given field order.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Fingerprint`] if a field has no value.
    pub fn build_fingerprint(
        &self,
        order: &FingerprintOrder,
        secret: &str,
    ) -> Result<String, SoldoError> {
        Ok(fingerprint::fingerprint(order, |attr| self.scalar(attr), secret)?)
    }

    /// Derives the event type tag from the schema's event template.
    ///
    /// The tag is the lowercased type name, a dot, then the trimmed and
    /// lowercased placeholder values joined by `_`, for example
    /// `transaction.refund_settled`. Returns `None` if the schema declares
    /// no template or the template has no placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`SoldoError::Event`] if a placeholder attribute has no value.
    pub fn event_type(&self) -> Result<Option<String>, SoldoError> {
        let Some(template) = self.schema.event_type else {
            return Ok(None);
        };
        let names = path::placeholders(template);
        if names.is_empty() {
            return Ok(None);
        }

        let parts = names
            .into_iter()
            .map(|attr| match self.scalar(attr) {
                Ok(Some(value)) => Ok(value.trim().to_lowercase()),
                Ok(None) => Err(EventError::new(format!(
                    "cannot build event type, attribute \"{attr}\" is not set"
                ))),
                Err(()) => Err(EventError::new(format!(
                    "cannot build event type, attribute \"{attr}\" is not a scalar value"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(format!(
            "{}.{}",
            self.schema.name.to_lowercase(),
            parts.join("_")
        )))
    }

    fn relationship_target(&self, name: &str) -> Result<&'static ResourceSchema, SoldoError> {
        self.schema.relationship_target(name).ok_or_else(|| {
            RelationshipError::new(
                name,
                format!("{} declares no such relationship", self.schema.name),
            )
            .into()
        })
    }

    fn scalar(&self, name: &str) -> Result<Option<String>, ()> {
        self.get(name).map_or(Ok(None), Attribute::scalar)
    }

    fn prepare(&self, name: &str, value: &Value) -> Result<Attribute, SoldoError> {
        let Some(target) = self.schema.cast_target(name) else {
            return Ok(Attribute::Value(value.clone()));
        };
        match value {
            Value::Object(entries) if !entries.is_empty() => {
                Ok(Attribute::Resource(Box::new(Self::from_value(target, value)?)))
            }
            _ => Err(CastError::new(
                name,
                format!("expected a non-empty object to build {}", target.name),
            )
            .into()),
        }
    }

    fn insert(&mut self, name: String, attribute: Attribute) {
        if let Some(slot) = self.attributes.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = attribute;
        } else {
            self.attributes.push((name, attribute));
        }
    }
}
