//! Authorization checks for service operations
//!
//! Every public service operation is identified by an [`OperationTag`]
//! such as `QueryTickets` or `UpdateTicket`. Before doing anything else the
//! service asks its [`Authorizer`] whether the operation may proceed for
//! the current request.

use crate::core::error::Result;
use crate::core::service::RequestContext;
use async_trait::async_trait;
use std::fmt;

/// The kind of service operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Read,
    Create,
    Update,
    Delete,
}

/// Named operation, e.g. `QueryTickets` or `ReadTicket`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationTag(String);

impl OperationTag {
    /// Build the tag for an operation on a resource
    ///
    /// Query uses the plural name, the others the singular one.
    pub fn new(operation: Operation, singular: &str, plural: &str) -> Self {
        let (verb, noun) = match operation {
            Operation::Query => ("Query", plural),
            Operation::Read => ("Read", singular),
            Operation::Create => ("Create", singular),
            Operation::Update => ("Update", singular),
            Operation::Delete => ("Delete", singular),
        };
        Self(format!("{}{}", verb, capitalize(noun)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Decides whether an operation may proceed
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns an Unauthorized error if the operation is not permitted
    async fn is_authorized(&self, ctx: &RequestContext, operation: &OperationTag) -> Result<()>;
}

/// Authorizer that permits every operation
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAuthorize;

#[async_trait]
impl Authorizer for AlwaysAuthorize {
    async fn is_authorized(&self, _: &RequestContext, _: &OperationTag) -> Result<()> {
        Ok(())
    }
}
