//! JSONB containment strategy.
//!
//! Equality tests, boolean flags and value lists are compiled to
//! `metadata @> $n` with a `{field: {value: v}}` document bound as the
//! parameter, which a GIN index on `metadata` can answer. Range and pattern
//! comparators have no containment form and fall back to the typed path read.

use serde_json::Value;

use crate::error::QueryResult;
use crate::types::{FieldType, LeafCondition};

use super::super::comparator::Comparator;
use super::super::param::SqlParam;
use super::super::state::CompilerState;
use super::{LeafStrategy, coerce, containment_payload, path, scalar_value};

/// Leaf strategy using JSONB containment where possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonbContainmentStrategy;

impl JsonbContainmentStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl LeafStrategy for JsonbContainmentStrategy {
    fn name(&self) -> &'static str {
        "jsonb"
    }

    fn compose_leaf(
        &self,
        leaf: &LeafCondition,
        comparator: Comparator,
        state: &mut CompilerState,
        prefix: &str,
    ) -> QueryResult<String> {
        let mut sql = if leaf.field_type == FieldType::Boolean && !leaf.is_list() {
            let flag = coerce(leaf, scalar_value(leaf)?)?;
            contains(leaf, "value", flag.to_json(), comparator.is_negated(), state, prefix)
        } else if leaf.is_list() && is_membership_like(comparator) {
            contains_any_of(leaf, comparator, state, prefix)?
        } else if matches!(comparator, Comparator::Eq | Comparator::Ne | Comparator::In) {
            let value = coerce(leaf, scalar_value(leaf)?)?;
            contains(leaf, "value", value.to_json(), comparator.is_negated(), state, prefix)
        } else {
            let name = state.bind(SqlParam::text(&leaf.field_name));
            path::accessor_comparison(leaf, comparator, &name, state, prefix)?
        };

        append_unit(&mut sql, leaf, state, prefix);
        Ok(sql)
    }

    fn compose_loop_leaf(
        &self,
        leaf: &LeafCondition,
        comparator: Comparator,
        state: &mut CompilerState,
        prefix: &str,
    ) -> QueryResult<String> {
        let mut sql = match comparator {
            Comparator::Eq | Comparator::Ne => {
                let values = coerce_all(leaf)?;
                contains(
                    leaf,
                    "values",
                    Value::Array(values.iter().map(SqlParam::to_json).collect()),
                    comparator == Comparator::Ne,
                    state,
                    prefix,
                )
            }
            // no negated form
            Comparator::ContainsAll => {
                let values = coerce_all(leaf)?;
                contains(
                    leaf,
                    "values",
                    Value::Array(values.iter().map(SqlParam::to_json).collect()),
                    false,
                    state,
                    prefix,
                )
            }
            Comparator::ContainsAny => {
                let items = coerce_all(leaf)?
                    .iter()
                    .map(|value| match value.to_json() {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                let name = state.bind(SqlParam::text(&leaf.field_name));
                let items = state.bind(SqlParam::TextArray(items));
                format!("({}metadata->{}->'values' ?| {})", prefix, name, items)
            }
            Comparator::Like | Comparator::NotLike => {
                let name = state.bind(SqlParam::text(&leaf.field_name));
                let mut tests = Vec::new();
                for value in leaf.values() {
                    let pattern = state.bind(coerce(leaf, value)?);
                    tests.push(format!(
                        "EXISTS (SELECT 1 FROM jsonb_array_elements_text({}metadata->{}->'values') WHERE value {} {})",
                        prefix, name, comparator, pattern
                    ));
                }
                or_group(tests)
            }
            _ => {
                let name = state.bind(SqlParam::text(&leaf.field_name));
                path::accessor_comparison(leaf, comparator, &name, state, prefix)?
            }
        };

        append_unit(&mut sql, leaf, state, prefix);
        Ok(sql)
    }
}

fn is_membership_like(comparator: Comparator) -> bool {
    matches!(
        comparator,
        Comparator::In | Comparator::NotIn | Comparator::Eq | Comparator::Ne
    )
}

/// Emits `[NOT ]prefix.metadata @> $n` for `{field: {key: value}}`.
fn contains(
    leaf: &LeafCondition,
    key: &str,
    value: Value,
    negated: bool,
    state: &mut CompilerState,
    prefix: &str,
) -> String {
    let payload = state.bind(SqlParam::Json(containment_payload(
        &leaf.field_name,
        key,
        value,
    )));
    format!(
        "{}{}metadata @> {}",
        if negated { "NOT " } else { "" },
        prefix,
        payload
    )
}

/// One containment test per list element, OR'd, with a single `NOT` over
/// the group for the negated comparators.
fn contains_any_of(
    leaf: &LeafCondition,
    comparator: Comparator,
    state: &mut CompilerState,
    prefix: &str,
) -> QueryResult<String> {
    let mut tests = Vec::new();
    for value in coerce_all(leaf)? {
        tests.push(contains(leaf, "value", value.to_json(), false, state, prefix));
    }

    if comparator.is_negated() {
        Ok(format!("NOT ({})", tests.join(" OR ")))
    } else {
        Ok(or_group(tests))
    }
}

fn coerce_all(leaf: &LeafCondition) -> QueryResult<Vec<SqlParam>> {
    leaf.values()
        .into_iter()
        .map(|value| coerce(leaf, value))
        .collect()
}

fn or_group(tests: Vec<String>) -> String {
    if tests.len() > 1 {
        format!("({})", tests.join(" OR "))
    } else {
        tests.join("")
    }
}

fn append_unit(sql: &mut String, leaf: &LeafCondition, state: &mut CompilerState, prefix: &str) {
    if let Some(unit) = leaf.unit() {
        let payload = state.bind(SqlParam::Json(containment_payload(
            &leaf.field_name,
            "unit",
            Value::String(unit.to_string()),
        )));
        sql.push_str(&format!(" AND {}metadata @> {}", prefix, payload));
    }
}
