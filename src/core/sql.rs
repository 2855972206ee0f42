//! SQL compilation of validated queries
//!
//! Produces `SELECT <fields> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT n] [OFFSET n]`.
//! Filter values are always returned as positional arguments, never written
//! into the statement text.
//!
//! A query with `page` set but `size` unset compiles without `LIMIT` or
//! `OFFSET`. Callers wanting default pagination apply
//! [`QueryDefaults`](crate::core::query::QueryDefaults) before compiling.

use crate::core::capability::is_identifier;
use crate::core::error::{Error, Result};
use crate::core::query::{Direction, Operator, QuerySpec};
use std::fmt::Write;

/// Positional parameter style of the target dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `$1, $2, ...` (PostgreSQL)
    #[default]
    Dollar,
    /// `?, ?, ...` (MySQL, SQLite)
    Question,
}

impl Placeholder {
    fn write(&self, sql: &mut String, position: usize) {
        match self {
            Placeholder::Dollar => {
                let _ = write!(sql, "${}", position);
            }
            Placeholder::Question => sql.push('?'),
        }
    }
}

fn comparison(op: Operator) -> &'static str {
    match op {
        Operator::Eq => "=",
        Operator::Ne => "<>",
        Operator::Gt => ">",
        Operator::Lt => "<",
        Operator::Ge => ">=",
        Operator::Le => "<=",
    }
}

fn keyword(direction: Direction) -> &'static str {
    match direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    }
}

/// A query bound to a column list and table
#[derive(Debug, Clone)]
pub struct SqlQuery<'a> {
    pub fields: &'a [&'a str],
    pub table: &'a str,
    pub query: &'a QuerySpec,
    pub placeholder: Placeholder,
}

impl<'a> SqlQuery<'a> {
    pub fn new(fields: &'a [&'a str], table: &'a str, query: &'a QuerySpec) -> Self {
        Self {
            fields,
            table,
            query,
            placeholder: Placeholder::default(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Statement text and its positional arguments
    pub fn to_sql(&self) -> Result<(String, Vec<String>)> {
        self.check_identifiers()?;

        let mut sql = format!("SELECT {} FROM {}", self.fields.join(", "), self.table);
        let mut args = Vec::with_capacity(self.query.filters.len());

        for (i, filter) in self.query.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let _ = write!(sql, "{} {} ", filter.field, comparison(filter.operator));
            args.push(filter.value.clone());
            self.placeholder.write(&mut sql, args.len());
        }

        if !self.query.sorts.is_empty() {
            let terms = self
                .query
                .sorts
                .iter()
                .map(|s| format!("{} {}", s.field, keyword(s.direction)))
                .collect::<Vec<_>>();
            let _ = write!(sql, " ORDER BY {}", terms.join(", "));
        }

        if self.query.size > 0 {
            let _ = write!(sql, " LIMIT {}", self.query.size);
        }

        let offset = self.query.offset();
        if offset > 0 {
            let _ = write!(sql, " OFFSET {}", offset);
        }

        Ok((sql, args))
    }

    fn check_identifiers(&self) -> Result<()> {
        let referenced = self
            .query
            .filters
            .iter()
            .map(|f| f.field.as_str())
            .chain(self.query.sorts.iter().map(|s| s.field.as_str()));

        for name in std::iter::once(self.table)
            .chain(self.fields.iter().copied())
            .chain(referenced)
        {
            if !is_identifier(name) {
                debug_assert!(false, "non-identifier reached the SQL compiler: {}", name);
                return Err(Error::internal(
                    "compile query failed",
                    format!("not an identifier: {}", name),
                ));
            }
        }
        Ok(())
    }
}

/// Compile with PostgreSQL placeholders
pub fn compile(fields: &[&str], table: &str, query: &QuerySpec) -> Result<(String, Vec<String>)> {
    SqlQuery::new(fields, table, query).to_sql()
}
