//! Static resource definitions.
//!
//! Each Soldo resource type is described by a [`ResourceSchema`] constant:
//! its base path, sub-path template, update whitelist, cast map,
//! relationships and event template. [`ResourceKind`] names the types the
//! API exposes and maps them to their schema.

use std::fmt;
use std::str::FromStr;

use crate::error::{InvalidArgumentError, PathError, SoldoError};
use crate::resource::Resource;

/// HTTP verb used to update a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMethod {
    /// Form-encoded `POST`.
    Post,
}

impl UpdateMethod {
    /// Returns the verb as an uppercase string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
        }
    }
}

/// Declarative description of a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSchema {
    /// Simple type name, e.g. `Transaction`.
    pub name: &'static str,
    /// Collection-level path segment, e.g. `/wallets`.
    pub base_path: Option<&'static str>,
    /// Sub-path template appended to the base path, e.g. `/{id}`.
    pub path: Option<&'static str>,
    /// Attribute names allowed in an update payload.
    pub whitelist: &'static [&'static str],
    /// Attributes that are built into nested resources.
    pub casts: &'static [(&'static str, &'static ResourceSchema)],
    /// Relationship name to target schema.
    pub relationships: &'static [(&'static str, &'static ResourceSchema)],
    /// Event template, e.g. `{category}_{status}`.
    pub event_type: Option<&'static str>,
    /// Verb used to update the resource, if it is updatable.
    pub update_method: Option<UpdateMethod>,
}

impl ResourceSchema {
    /// A schema with only a name; everything else empty.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            base_path: None,
            path: None,
            whitelist: &[],
            casts: &[],
            relationships: &[],
            event_type: None,
            update_method: None,
        }
    }

    /// Returns the target schema if `attribute` is declared as a cast.
    #[must_use]
    pub fn cast_target(&self, attribute: &str) -> Option<&'static Self> {
        self.casts
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, schema)| *schema)
    }

    /// Returns the target schema of a declared relationship.
    #[must_use]
    pub fn relationship_target(&self, relationship: &str) -> Option<&'static Self> {
        self.relationships
            .iter()
            .find(|(name, _)| *name == relationship)
            .map(|(_, schema)| *schema)
    }

    /// Returns `true` if the schema declares an update verb.
    #[must_use]
    pub const fn is_updatable(&self) -> bool {
        self.update_method.is_some()
    }
}

/// A paginated list endpoint and the schema of its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    /// Endpoint path, e.g. `/wallets`.
    pub path: Option<&'static str>,
    /// Schema every item is built with.
    pub item: &'static ResourceSchema,
}

/// A Soldo wallet.
pub static WALLET: ResourceSchema = ResourceSchema {
    base_path: Some("/wallets"),
    path: Some("/{id}"),
    ..ResourceSchema::named("Wallet")
};

/// A card rule; reached only through [`CARD`]'s `rules` relationship.
pub static RULE: ResourceSchema = ResourceSchema {
    base_path: Some("/rules"),
    ..ResourceSchema::named("Rule")
};

/// A payment card.
pub static CARD: ResourceSchema = ResourceSchema {
    base_path: Some("/cards"),
    path: Some("/{id}"),
    relationships: &[("rules", &RULE)],
    ..ResourceSchema::named("Card")
};

/// An employee; `custom_reference_id` and `department` are updatable.
pub static EMPLOYEE: ResourceSchema = ResourceSchema {
    base_path: Some("/employees"),
    path: Some("/{id}"),
    whitelist: &["custom_reference_id", "department"],
    update_method: Some(UpdateMethod::Post),
    ..ResourceSchema::named("Employee")
};

/// An expense centre; `custom_reference_id` and `assignee` are updatable.
pub static EXPENSE_CENTRE: ResourceSchema = ResourceSchema {
    base_path: Some("/expensecentres"),
    path: Some("/{id}"),
    whitelist: &["custom_reference_id", "assignee"],
    update_method: Some(UpdateMethod::Post),
    ..ResourceSchema::named("ExpenseCentre")
};

/// A card or wallet transaction.
pub static TRANSACTION: ResourceSchema = ResourceSchema {
    base_path: Some("/transactions"),
    path: Some("/{id}"),
    event_type: Some("{category}_{status}"),
    ..ResourceSchema::named("Transaction")
};

/// The company owning the API credentials.
pub static COMPANY: ResourceSchema = ResourceSchema {
    base_path: Some("/company"),
    ..ResourceSchema::named("Company")
};

/// A group of employees, cards and wallets.
pub static GROUP: ResourceSchema = ResourceSchema {
    base_path: Some("/groups"),
    path: Some("/{id}"),
    ..ResourceSchema::named("Group")
};

/// A transfer between two wallets of the same company.
pub static INTERNAL_TRANSFER: ResourceSchema = ResourceSchema {
    base_path: Some("/wallets/internalTransfer"),
    path: Some("/{fromWalletId}/{toWalletId}"),
    casts: &[("from_wallet", &WALLET), ("to_wallet", &WALLET)],
    update_method: Some(UpdateMethod::Post),
    ..ResourceSchema::named("InternalTransfer")
};

/// Field order of the fingerprint sent with an internal transfer.
pub const TRANSFER_FINGERPRINT_ORDER: &[&str] =
    &["amount", "currency", "fromWalletId", "toWalletId", "token"];

/// Resource types exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// See [`WALLET`].
    Wallet,
    /// See [`CARD`].
    Card,
    /// See [`EMPLOYEE`].
    Employee,
    /// See [`EXPENSE_CENTRE`].
    ExpenseCentre,
    /// See [`TRANSACTION`].
    Transaction,
    /// See [`COMPANY`].
    Company,
    /// See [`GROUP`].
    Group,
    /// See [`RULE`].
    Rule,
    /// See [`INTERNAL_TRANSFER`].
    InternalTransfer,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Wallet,
        Self::Card,
        Self::Employee,
        Self::ExpenseCentre,
        Self::Transaction,
        Self::Company,
        Self::Group,
        Self::Rule,
        Self::InternalTransfer,
    ];

    /// Returns the static schema of this kind.
    #[must_use]
    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            Self::Wallet => &WALLET,
            Self::Card => &CARD,
            Self::Employee => &EMPLOYEE,
            Self::ExpenseCentre => &EXPENSE_CENTRE,
            Self::Transaction => &TRANSACTION,
            Self::Company => &COMPANY,
            Self::Group => &GROUP,
            Self::Rule => &RULE,
            Self::InternalTransfer => &INTERNAL_TRANSFER,
        }
    }

    /// Returns the list endpoint of this kind, if it has one.
    #[must_use]
    pub fn collection(self) -> Option<CollectionSchema> {
        match self {
            Self::Wallet
            | Self::Card
            | Self::Employee
            | Self::ExpenseCentre
            | Self::Transaction
            | Self::Group => {
                let item = self.schema();
                Some(CollectionSchema {
                    path: item.base_path,
                    item,
                })
            }
            Self::Company | Self::Rule | Self::InternalTransfer => None,
        }
    }

    /// Returns `true` for kinds that webhooks are delivered for.
    #[must_use]
    pub const fn is_event_source(self) -> bool {
        matches!(
            self,
            Self::Card | Self::Transaction | Self::Employee | Self::ExpenseCentre
        )
    }

    /// Returns the type name used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.schema().name
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = InvalidArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InvalidArgumentError::new(format!("unknown resource type \"{s}\"")))
    }
}

/// Resolves the remote path of a `kind`, optionally for a single `id`.
///
/// Without an `id` the base path is returned. With an `id` the kind's
/// sub-path template is resolved against it.
///
/// # Errors
///
/// Returns [`SoldoError::Path`] if the base path is invalid or the template
/// needs attributes other than `id`.
pub fn remote_path(kind: ResourceKind, id: Option<&str>) -> Result<String, SoldoError> {
    let schema = kind.schema();
    match id {
        None => {
            let base = schema
                .base_path
                .ok_or_else(|| PathError::new(schema.name, "base path is not set"))?;
            if !crate::path::is_valid_path(base) {
                return Err(PathError::new(schema.name, format!("invalid base path \"{base}\"")).into());
            }
            Ok(base.to_owned())
        }
        Some(id) => {
            let mut resource = Resource::new(schema);
            resource.set("id", serde_json::Value::String(id.to_owned()))?;
            resource.remote_path()
        }
    }
}
