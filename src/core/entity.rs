//! Entity model: metadata plus a domain payload
//!
//! Every stored entity is a [`Versioned<T>`]: the store-owned [`Metadata`]
//! (identity and optimistic-lock token) next to the domain payload `T`.
//! The two parts are plain named fields and are validated separately.
//!
//! On the wire both parts are flattened into one JSON object:
//!
//! ```json
//! {"id": "…", "version": "3", "summary": "Printer jam", "description": "", "status": "open"}
//! ```

use crate::core::capability::Capabilities;
use crate::core::error::{Error, Result};
use crate::core::field::FieldValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Information common to all entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Unique identifier, assigned by the store on create
    #[serde(default)]
    pub id: String,

    /// Changes every time the entity is updated
    #[serde(default)]
    pub version: String,
}

impl Metadata {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }

    /// Parse the identifier, failing with a request error when malformed
    pub fn parse_id(&self) -> Result<Uuid> {
        parse_id(&self.id)
    }
}

/// Parse an entity identifier
pub fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| Error::request(format!("invalid id: {}", id)))
}

/// A domain payload type that can be stored and queried
///
/// # Example
///
/// ```rust,ignore
/// impl Resource for Ticket {
///     fn resource_name() -> &'static str { "tickets" }
///     fn resource_name_singular() -> &'static str { "ticket" }
///     fn capabilities() -> Result<Capabilities> { ... }
///     fn field_value(&self, field: &str) -> Option<FieldValue> { ... }
/// }
/// ```
pub trait Resource:
    Clone + Send + Sync + Serialize + DeserializeOwned + Validate + 'static
{
    /// The plural resource name (e.g., "tickets"), also the table name
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "ticket")
    fn resource_name_singular() -> &'static str;

    /// Declare which fields may be filtered or sorted
    ///
    /// Called once when a service is built; the result is shared read-only.
    fn capabilities() -> Result<Capabilities>;

    /// Get the value of a payload field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Validate the payload, mapping failures to a request error
    fn validate_payload(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::request(describe_validation(Self::resource_name_singular(), &e)))
    }
}

/// Flatten validator output into a single deterministic message
fn describe_validation(resource: &str, errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("invalid {}: {}", resource, msg),
                None => format!("invalid {}: {}: {}", resource, field, e.code),
            })
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// An entity: store metadata plus payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    pub metadata: Metadata,

    #[serde(flatten)]
    pub data: T,
}

impl<T> Versioned<T> {
    pub fn new(metadata: Metadata, data: T) -> Self {
        Self { metadata, data }
    }

    /// A not-yet-stored entity with empty metadata
    pub fn unsaved(data: T) -> Self {
        Self {
            metadata: Metadata::default(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }
}

impl<T: Resource> Versioned<T> {
    /// Field lookup covering `id` and `version` as well as payload fields
    pub fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::String(self.metadata.id.clone())),
            "version" => Some(FieldValue::String(self.metadata.version.clone())),
            other => self.data.field_value(other),
        }
    }
}
