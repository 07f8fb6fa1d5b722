//! Leaf condition strategies.
//!
//! A strategy turns one [`LeafCondition`] into a SQL boolean fragment,
//! binding its values through the [`CompilerState`]. Two implementations
//! are provided:
//!
//! - [`JsonPathStrategy`] - typed document-path reads (`metadata->$n->>'value'`),
//!   portable to plain JSON columns
//! - [`JsonbContainmentStrategy`] - JSONB containment (`metadata @> $n`) where
//!   possible, which can use a GIN index
//!
//! Comparators are validated before a strategy is invoked: strategies only
//! ever see a whitelisted [`Comparator`].

mod containment;
mod path;

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};
use crate::types::{FieldType, LeafCondition};

use super::comparator::Comparator;
use super::param::SqlParam;
use super::state::CompilerState;

pub use containment::JsonbContainmentStrategy;
pub use path::JsonPathStrategy;

/// Capability interface for composing leaf conditions.
pub trait LeafStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Composes a test on a scalar or list attribute.
    ///
    /// `prefix` is the table prefix of the owning node (`d.` for the root,
    /// empty inside a CTE).
    fn compose_leaf(
        &self,
        leaf: &LeafCondition,
        comparator: Comparator,
        state: &mut CompilerState,
        prefix: &str,
    ) -> QueryResult<String>;

    /// Composes a test on a repeated (array-valued) attribute.
    fn compose_loop_leaf(
        &self,
        _leaf: &LeafCondition,
        _comparator: Comparator,
        _state: &mut CompilerState,
        _prefix: &str,
    ) -> QueryResult<String> {
        Err(QueryError::UnsupportedStrategy {
            strategy: self.name(),
            operation: "compose_loop_leaf",
        })
    }
}

/// Validates a leaf and dispatches it to the strategy.
pub fn compose_leaf_condition(
    strategy: &dyn LeafStrategy,
    leaf: &LeafCondition,
    state: &mut CompilerState,
    prefix: &str,
) -> QueryResult<String> {
    let comparator = Comparator::parse(&leaf.comparator)?;

    // Only an absent scalar boolean has an implicit value.
    let implicit_false = leaf.field_type == FieldType::Boolean
        && !leaf.has_value()
        && !leaf.is_list()
        && !leaf.is_in_loop;
    if leaf.values().is_empty() && !implicit_false {
        return Err(QueryError::unsupported(format!(
            "condition on '{}' has neither a value nor a list of values",
            leaf.field_name
        )));
    }

    let fragment = if leaf.is_in_loop {
        strategy.compose_loop_leaf(leaf, comparator, state, prefix)?
    } else {
        strategy.compose_leaf(leaf, comparator, state, prefix)?
    };

    tracing::trace!(
        strategy = strategy.name(),
        field = %leaf.field_name,
        comparator = %comparator,
        fragment = %fragment,
        "composed leaf condition"
    );
    Ok(fragment)
}

/// Coerces one value of a leaf to its declared type.
fn coerce(leaf: &LeafCondition, value: &Value) -> QueryResult<SqlParam> {
    SqlParam::coerce(
        &leaf.field_name,
        leaf.field_type,
        value,
        leaf.case_insensitive,
    )
}

static ABSENT_FLAG: Value = Value::Bool(false);

/// Returns the single value of a scalar leaf.
///
/// A boolean leaf without a value tests for `false`.
fn scalar_value(leaf: &LeafCondition) -> QueryResult<&Value> {
    if leaf.field_type == FieldType::Boolean && !leaf.has_value() {
        return Ok(&ABSENT_FLAG);
    }
    leaf.values().into_iter().next().ok_or_else(|| {
        QueryError::unsupported(format!("condition on '{}' has no value", leaf.field_name))
    })
}

/// Builds the `{field: {key: value}}` document used by containment tests.
fn containment_payload(field: &str, key: &str, value: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(key.to_string(), value);
    let mut outer = Map::new();
    outer.insert(field.to_string(), Value::Object(inner));
    Value::Object(outer)
}
