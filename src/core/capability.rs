//! Field capability declarations and query validation
//!
//! Each resource declares, once at startup, which of its fields may be
//! filtered (and with which operators) or sorted. The declaration is
//! immutable afterwards and shared by reference between requests.
//!
//! Validation bounds which column identifiers can ever reach the SQL
//! compiler. Field names are restricted to identifier-safe characters when
//! they are declared.

use crate::core::error::{Error, Result};
use crate::core::query::{Operator, QuerySpec};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

/// What a single field allows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCapability {
    pub filter: bool,
    /// Allowed operators; empty means any operator
    pub filter_ops: Vec<Operator>,
    pub sort: bool,
}

impl FieldCapability {
    /// Filterable with the given operators
    pub fn filterable(ops: &[Operator]) -> Self {
        Self {
            filter: true,
            filter_ops: ops.to_vec(),
            sort: false,
        }
    }

    /// Sortable only
    pub fn sortable() -> Self {
        Self {
            filter: false,
            filter_ops: Vec::new(),
            sort: true,
        }
    }

    /// Also allow sorting
    pub fn and_sortable(mut self) -> Self {
        self.sort = true;
        self
    }

    pub fn allows_operator(&self, op: Operator) -> bool {
        self.filter && (self.filter_ops.is_empty() || self.filter_ops.contains(&op))
    }
}

/// Checks that a name can be used verbatim as a SQL identifier
pub fn is_identifier(name: &str) -> bool {
    static IDENT_REGEX: OnceLock<Regex> = OnceLock::new();
    IDENT_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
        .is_match(name)
}

/// Immutable mapping from field name to [`FieldCapability`]
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    fields: IndexMap<String, FieldCapability>,
}

impl Capabilities {
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldCapability> {
        self.fields.get(field)
    }

    /// Field names in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a parsed query against these capabilities
    ///
    /// Pure and in-memory. Must succeed before a query is compiled.
    pub fn validate(&self, query: &QuerySpec) -> Result<()> {
        for filter in &query.filters {
            let cap = match self.fields.get(&filter.field) {
                Some(cap) if cap.filter => cap,
                _ => {
                    return Err(Error::query(format!(
                        "invalid filter field: {}",
                        filter.field
                    )));
                }
            };
            if !cap.allows_operator(filter.operator) {
                return Err(Error::query(format!(
                    "invalid filter operator: {}",
                    filter.operator
                )));
            }
        }

        for sort in &query.sorts {
            match self.fields.get(&sort.field) {
                Some(cap) if cap.sort => {}
                _ => {
                    return Err(Error::query(format!("invalid sort field: {}", sort.field)));
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`Capabilities`]
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    fields: IndexMap<String, FieldCapability>,
    invalid: Vec<String>,
}

impl CapabilitiesBuilder {
    pub fn field(mut self, name: &str, capability: FieldCapability) -> Self {
        if is_identifier(name) {
            self.fields.insert(name.to_string(), capability);
        } else {
            self.invalid.push(name.to_string());
        }
        self
    }

    pub fn build(self) -> Result<Capabilities> {
        if !self.invalid.is_empty() {
            return Err(Error::internal(
                "invalid capability declaration",
                format!("field names are not identifiers: {}", self.invalid.join(", ")),
            ));
        }
        Ok(Capabilities {
            fields: self.fields,
        })
    }
}
