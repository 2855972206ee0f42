//! Query specification and paged results
//!
//! A [`QuerySpec`] is the structured form of a list request: conjoined
//! filters, ordered sorts and optional pagination. It is produced by the
//! [`parser`](crate::core::parser), checked by the
//! [`capability`](crate::core::capability) validator and finally compiled
//! to SQL by [`sql`](crate::core::sql) or evaluated by an in-memory store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    /// Operators suitable for string fields
    pub const STRING: &'static [Operator] = &[Operator::Eq, Operator::Ne];

    /// Operators suitable for boolean fields
    pub const BOOL: &'static [Operator] = Self::STRING;

    /// Operators suitable for numeric fields
    pub const NUMBER: &'static [Operator] = &[
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
    ];

    /// All operators, two-character symbols first
    pub(crate) const LONGEST_FIRST: &'static [Operator] = &[
        Operator::Eq,
        Operator::Ne,
        Operator::Ge,
        Operator::Le,
        Operator::Gt,
        Operator::Lt,
    ];

    /// The query language symbol
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::LONGEST_FIRST
            .iter()
            .copied()
            .find(|op| op.as_str() == symbol)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One predicate: `<field><operator><value>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterExpr {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// One ordering term: `<field> <asc|desc>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortExpr {
    pub field: String,
    pub direction: Direction,
}

impl SortExpr {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Structured filter/sort/pagination request
///
/// `page` and `size` use `0` as the "unset" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub filters: Vec<FilterExpr>,
    pub sorts: Vec<SortExpr>,
    pub page: u64,
    pub size: u64,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        self.filters.push(FilterExpr::new(field, operator, value));
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sorts.push(SortExpr::new(field, direction));
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Fill unset page/size from `defaults`
    pub fn with_defaults(mut self, defaults: &QueryDefaults) -> Self {
        if self.page == 0 {
            self.page = defaults.page;
        }
        if self.size == 0 {
            self.size = defaults.size;
        }
        self
    }

    /// Row offset implied by page and size, `0` unless both are set
    pub fn offset(&self) -> u64 {
        if self.size == 0 || self.page == 0 {
            return 0;
        }
        (self.page - 1).saturating_mul(self.size)
    }
}

/// Page and size applied by the service layer when a request leaves them unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub page: u64,
    pub size: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self { page: 1, size: 100 }
    }
}

/// A bounded slice of query results
///
/// `size` is the number of results actually returned. `page` is `0` when
/// the result set is empty, otherwise the requested page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    /// Build a page from the rows a query produced
    pub fn from_results(results: Vec<T>, requested_page: u64) -> Self {
        let size = results.len() as u64;
        let page = if size > 0 { requested_page } else { 0 };
        Self {
            results,
            page,
            size,
        }
    }

    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 0,
            size: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
