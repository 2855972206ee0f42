//! Query language parser
//!
//! Turns raw, untrusted request parameters into a [`QuerySpec`].
//!
//! # Grammar
//!
//! - `filter=<field><op><value>` (repeatable), `op` one of `== != > < >= <=`
//! - `sort=<field> <asc|desc>` (repeatable)
//! - `page=<uint>` and `size=<uint>`, both strictly positive
//!
//! Any other parameter is ignored. The parser knows nothing about which
//! fields exist; that is the job of the capability validator.
//!
//! # Example
//!
//! ```rust,ignore
//! let params = QueryParams::from_query_string("filter=status%3D%3Dopen&sort=summary+asc&size=10")?;
//! let query = parse(&params)?;
//! assert_eq!(query.size, 10);
//! ```

use crate::core::error::{Error, Result};
use crate::core::query::{Direction, FilterExpr, Operator, QuerySpec, SortExpr};
use regex::Regex;
use std::sync::OnceLock;

pub const PARAM_FILTER: &str = "filter";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_SIZE: &str = "size";

/// Ordered multi-valued map of request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw URL query string (without the leading `?`)
    ///
    /// `+` is read as a space and both keys and values are percent-decoded.
    pub fn from_query_string(raw: &str) -> Result<Self> {
        let mut params = Self::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key)
                .ok_or_else(|| Error::query(format!("invalid query parameter: {}", pair)))?;
            let value = decode_component(value)
                .ok_or_else(|| Error::query(format!("invalid query parameter: {}", pair)))?;
            params.push(key, value);
        }
        Ok(params)
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// All values for `key`, in order of appearance
    pub fn get_all<'a, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.into_owned())
}

fn filter_regex() -> &'static Regex {
    static FILTER_REGEX: OnceLock<Regex> = OnceLock::new();
    FILTER_REGEX.get_or_init(|| {
        // alternation is leftmost-first, so two-character operators come first
        let ops = Operator::LONGEST_FIRST
            .iter()
            .map(|op| regex::escape(op.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?s)^([A-Za-z0-9_]+)({})(.+)$", ops)).unwrap()
    })
}

fn sort_regex() -> &'static Regex {
    static SORT_REGEX: OnceLock<Regex> = OnceLock::new();
    SORT_REGEX.get_or_init(|| Regex::new(r"^([A-Za-z0-9_]+) (asc|desc)$").unwrap())
}

/// Parse request parameters into a [`QuerySpec`]
pub fn parse(params: &QueryParams) -> Result<QuerySpec> {
    let filters = params
        .get_all(PARAM_FILTER)
        .map(parse_filter)
        .collect::<Result<Vec<_>>>()?;

    let sorts = params
        .get_all(PARAM_SORT)
        .map(parse_sort)
        .collect::<Result<Vec<_>>>()?;

    let page = parse_positive(PARAM_PAGE, params.get(PARAM_PAGE).unwrap_or(""))?;
    let size = parse_positive(PARAM_SIZE, params.get(PARAM_SIZE).unwrap_or(""))?;

    // the offset of the requested page must stay representable too
    if page > 1 && size > 0 {
        let in_range = (page - 1)
            .checked_mul(size)
            .is_some_and(|offset| offset <= MAX_PAGING_VALUE);
        if !in_range {
            return Err(Error::query(format!("invalid page: {}", page)));
        }
    }

    Ok(QuerySpec {
        filters,
        sorts,
        page,
        size,
    })
}

fn parse_filter(clause: &str) -> Result<FilterExpr> {
    let caps = filter_regex()
        .captures(clause)
        .ok_or_else(|| Error::query(format!("invalid filter: {}", clause)))?;

    let operator = Operator::from_symbol(&caps[2])
        .ok_or_else(|| Error::query(format!("invalid filter: {}", clause)))?;

    Ok(FilterExpr::new(&caps[1], operator, &caps[3]))
}

fn parse_sort(clause: &str) -> Result<SortExpr> {
    let caps = sort_regex()
        .captures(clause)
        .ok_or_else(|| Error::query(format!("invalid sort: {}", clause)))?;

    let direction = Direction::from_keyword(&caps[2])
        .ok_or_else(|| Error::query(format!("invalid sort: {}", clause)))?;

    Ok(SortExpr::new(&caps[1], direction))
}

/// Largest accepted page or size; storage engines bind these as signed 64-bit
pub const MAX_PAGING_VALUE: u64 = i64::MAX as u64;

/// Empty means unset (`0`); `0` itself is rejected since it is the sentinel
fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    if raw.is_empty() {
        return Ok(0);
    }

    let invalid = || Error::query(format!("invalid {}: {}", name, raw));
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match raw.parse::<u64>() {
        Ok(n) if (1..=MAX_PAGING_VALUE).contains(&n) => Ok(n),
        _ => Err(invalid()),
    }
}
