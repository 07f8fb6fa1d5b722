//! Document-path strategy.
//!
//! Every test reads the attribute through the JSON path operators and casts
//! it to the declared type:
//!
//! ```text
//! (d.metadata->$2->>'value')::integer > $3
//! ```
//!
//! The attribute name is itself a bound parameter.

use crate::error::QueryResult;
use crate::types::LeafCondition;

use super::super::comparator::Comparator;
use super::super::param::SqlParam;
use super::super::state::CompilerState;
use super::{LeafStrategy, coerce, scalar_value};

/// Leaf strategy using typed `->`/`->>` path reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathStrategy;

impl JsonPathStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl LeafStrategy for JsonPathStrategy {
    fn name(&self) -> &'static str {
        "json"
    }

    fn compose_leaf(
        &self,
        leaf: &LeafCondition,
        comparator: Comparator,
        state: &mut CompilerState,
        prefix: &str,
    ) -> QueryResult<String> {
        let name = state.bind(SqlParam::text(&leaf.field_name));
        let mut sql = accessor_comparison(leaf, comparator, &name, state, prefix)?;

        if let Some(unit) = leaf.unit() {
            let unit_param = state.bind(SqlParam::text(unit));
            sql.push_str(&format!(
                " AND ({}metadata->{}->>'unit')::text LIKE {}",
                prefix, name, unit_param
            ));
        }

        Ok(sql)
    }

    /// Repeated attributes are read through the same path as scalar ones.
    fn compose_loop_leaf(
        &self,
        leaf: &LeafCondition,
        comparator: Comparator,
        state: &mut CompilerState,
        prefix: &str,
    ) -> QueryResult<String> {
        self.compose_leaf(leaf, comparator, state, prefix)
    }
}

/// Builds `(prefix.metadata->$name->>'value')::<type> <op> <value(s)>`.
///
/// `name` is the placeholder already bound to the attribute name. List
/// values under `IN`/`NOT IN` share one parenthesised placeholder list; any
/// other comparator repeats the accessor once per value, OR'd together.
pub(super) fn accessor_comparison(
    leaf: &LeafCondition,
    comparator: Comparator,
    name: &str,
    state: &mut CompilerState,
    prefix: &str,
) -> QueryResult<String> {
    let accessor = format!(
        "({}metadata->{}->>'value')::{}",
        prefix,
        name,
        leaf.field_type.as_sql_type()
    );

    if !leaf.is_list() {
        let value = state.bind(coerce(leaf, scalar_value(leaf)?)?);
        return Ok(if comparator.is_set_membership() {
            format!("{} {} ({})", accessor, comparator, value)
        } else {
            format!("{} {} {}", accessor, comparator, value)
        });
    }

    let mut placeholders = Vec::new();
    for value in leaf.values() {
        placeholders.push(state.bind(coerce(leaf, value)?));
    }

    if comparator.is_set_membership() {
        return Ok(format!(
            "{} {} ({})",
            accessor,
            comparator,
            placeholders.join(", ")
        ));
    }

    let tests: Vec<String> = placeholders
        .iter()
        .map(|p| format!("{} {} {}", accessor, comparator, p))
        .collect();
    Ok(if tests.len() > 1 {
        format!("({})", tests.join(" OR "))
    } else {
        tests.join("")
    })
}
