//! Core module containing the query language, entity model and service layer

pub mod auth;
pub mod capability;
pub mod entity;
pub mod error;
pub mod field;
pub mod parser;
pub mod query;
pub mod repository;
pub mod service;
pub mod sql;
pub mod store;

pub use auth::{AlwaysAuthorize, Authorizer, Operation, OperationTag};
pub use capability::{Capabilities, FieldCapability};
pub use entity::{Metadata, Resource, Versioned};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use field::FieldValue;
pub use parser::{QueryParams, parse};
pub use query::{Direction, FilterExpr, Operator, Page, QueryDefaults, QuerySpec, SortExpr};
pub use repository::{Repository, Transaction};
pub use service::{EntityService, RequestContext};
pub use sql::{Placeholder, SqlQuery, compile};
