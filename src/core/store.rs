//! Query evaluation for stores that hold entities in memory
//!
//! Mirrors what the compiled SQL does: filters are conjoined, sorts are
//! applied in declaration order, and `LIMIT`/`OFFSET` only apply when a
//! size is set.

use crate::core::entity::{Resource, Versioned};
use crate::core::field::FieldValue;
use crate::core::query::{Direction, FilterExpr, Operator, QuerySpec, SortExpr};
use std::cmp::Ordering;

/// Apply a whole query to a collection of entities
pub fn apply_query<T: Resource>(data: Vec<Versioned<T>>, query: &QuerySpec) -> Vec<Versioned<T>> {
    let filtered = apply_filters(data, &query.filters);
    let sorted = apply_sort(filtered, &query.sorts);
    apply_page(sorted, query)
}

/// Keep the entities matching every filter
pub fn apply_filters<T: Resource>(
    data: Vec<Versioned<T>>,
    filters: &[FilterExpr],
) -> Vec<Versioned<T>> {
    data.into_iter()
        .filter(|entity| filters.iter().all(|f| matches(entity, f)))
        .collect()
}

fn matches<T: Resource>(entity: &Versioned<T>, filter: &FilterExpr) -> bool {
    let Some(value) = entity.field_value(&filter.field) else {
        return false;
    };
    let Some(ordering) = value.compare_raw(&filter.value) else {
        return false;
    };

    match filter.operator {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Ne => ordering != Ordering::Equal,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
    }
}

/// Stable sort by each term in order
pub fn apply_sort<T: Resource>(
    mut data: Vec<Versioned<T>>,
    sorts: &[SortExpr],
) -> Vec<Versioned<T>> {
    if sorts.is_empty() {
        return data;
    }

    data.sort_by(|a, b| {
        sorts
            .iter()
            .map(|s| {
                let left = a.field_value(&s.field).unwrap_or(FieldValue::Null);
                let right = b.field_value(&s.field).unwrap_or(FieldValue::Null);
                let ord = left.sort_cmp(&right);
                match s.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    data
}

/// Skip and take according to page and size
pub fn apply_page<T>(data: Vec<T>, query: &QuerySpec) -> Vec<T> {
    if query.size == 0 {
        return data;
    }
    data.into_iter()
        .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(query.size).unwrap_or(usize::MAX))
        .collect()
}
