//! The ticket resource

use crate::core::capability::{Capabilities, FieldCapability};
use crate::core::entity::Versioned;
use crate::core::error::Result;
use crate::core::query::Operator;
use crate::impl_resource;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A support ticket
///
/// Missing fields deserialize as empty strings so that validation, not
/// decoding, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Ticket {
    #[validate(length(min = 1, message = "missing field: summary"))]
    pub summary: String,

    pub description: String,

    #[validate(length(min = 1, message = "missing field: status"))]
    pub status: String,
}

impl Ticket {
    pub fn new(
        summary: impl Into<String>,
        description: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            status: status.into(),
        }
    }
}

/// A ticket with its id and version
pub type TicketWithMetadata = Versioned<Ticket>;

/// Which ticket fields may be filtered and sorted
pub fn ticket_capabilities() -> Result<Capabilities> {
    Capabilities::builder()
        .field(
            "summary",
            FieldCapability::filterable(Operator::STRING).and_sortable(),
        )
        .field(
            "status",
            FieldCapability::filterable(Operator::STRING).and_sortable(),
        )
        .field("description", FieldCapability::sortable())
        .build()
}

impl_resource!(
    Ticket,
    "ticket",
    "tickets",
    [summary, description, status],
    ticket_capabilities
);
