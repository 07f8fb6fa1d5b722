//! Entity subquery composition.
//!
//! [`compose_single`] walks one criteria node depth-first, left to right,
//! producing a [`ComposedSubquery`] whose children mirror the nested entities
//! of the node. Every placeholder is allocated during this walk, so the
//! parameter order is the traversal order.

use crate::error::{QueryError, QueryResult};
use crate::schema::{
    PERSONAL_DETAILS_ALIAS, PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_TABLE, ROOT_ALIAS,
};
use crate::types::{CriteriaElement, CriteriaNode, Model};

use super::param::SqlParam;
use super::specialized::{compose_personal_details, compose_specialized};
use super::state::CompilerState;
use super::strategy::{LeafStrategy, compose_leaf_condition};

/// What a composed subquery reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryKind {
    /// An entity table (`subject`, `sample`, `data`).
    Entity,
    /// The `personal_details` relation of a subject.
    PersonalDetails,
}

/// Intermediate result for one criteria node.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSubquery {
    /// Source kind.
    pub kind: SubqueryKind,
    /// Table read by the subquery.
    pub table: &'static str,
    /// `d` for the root, `nested_N` or `pd` otherwise.
    pub alias: String,
    /// `SELECT <columns> FROM <table>[ d]`.
    pub select: String,
    /// `WHERE ...`, empty for personal details.
    pub where_clause: String,
    /// Subqueries of nested entities and personal details, in criteria order.
    pub children: Vec<ComposedSubquery>,
}

impl ComposedSubquery {
    /// The personal details relation, joined to its subject for projection
    /// and for conditions on the root.
    pub fn personal_details() -> Self {
        Self {
            kind: SubqueryKind::PersonalDetails,
            table: PERSONAL_DETAILS_TABLE,
            alias: PERSONAL_DETAILS_ALIAS.to_string(),
            select: format!(
                "SELECT {} FROM {}",
                PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_TABLE
            ),
            where_clause: String::new(),
            children: Vec::new(),
        }
    }

    /// Returns true for the root subquery.
    pub fn is_root(&self) -> bool {
        self.alias == ROOT_ALIAS
    }
}

/// Composes the root node of a criteria tree.
pub fn compose_root(
    strategy: &dyn LeafStrategy,
    node: &CriteriaNode,
    state: &mut CompilerState,
    max_depth: usize,
) -> QueryResult<ComposedSubquery> {
    compose_single(strategy, node, state, None, 0, max_depth)
}

/// Composes one criteria node and, recursively, its nested entities.
///
/// `alias` is `None` for the root, whose columns are qualified with `d.`;
/// nested subqueries become CTEs and their columns are left unqualified.
pub fn compose_single(
    strategy: &dyn LeafStrategy,
    node: &CriteriaNode,
    state: &mut CompilerState,
    alias: Option<String>,
    depth: usize,
    max_depth: usize,
) -> QueryResult<ComposedSubquery> {
    if depth > max_depth {
        return Err(QueryError::MaxDepthExceeded {
            depth,
            max: max_depth,
        });
    }

    let is_root = alias.is_none();
    let alias = alias.unwrap_or_else(|| ROOT_ALIAS.to_string());
    let prefix = if is_root {
        format!("{}.", ROOT_ALIAS)
    } else {
        String::new()
    };

    let table = node.model.table();
    let mut select = format!("SELECT {} FROM {}", node.model.subquery_columns(), table);
    if is_root {
        select.push(' ');
        select.push_str(ROOT_ALIAS);
    }

    let type_param = state.bind(SqlParam::from(&node.data_type));
    let mut where_clause = format!("WHERE {}type = {}", prefix, type_param);

    let mut fragments = Vec::new();
    let mut children: Vec<ComposedSubquery> = Vec::new();

    for element in &node.content {
        match element {
            CriteriaElement::Nested(child) => {
                let child_alias = state.next_nested_alias();
                children.push(compose_single(
                    strategy,
                    child,
                    state,
                    Some(child_alias),
                    depth + 1,
                    max_depth,
                )?);
            }
            CriteriaElement::PersonalDetails(condition) => {
                if node.model != Model::Subject {
                    return Err(QueryError::unsupported(format!(
                        "personal details conditions apply to subjects, not to {}",
                        node.model
                    )));
                }
                let Some(fragment) = compose_personal_details(condition, state)? else {
                    continue;
                };
                if is_root {
                    fragments.push(fragment);
                    if !children
                        .iter()
                        .any(|c| c.kind == SubqueryKind::PersonalDetails)
                    {
                        children.push(ComposedSubquery::personal_details());
                    }
                } else {
                    // pd is only joined to the outer statement
                    fragments.push(format!(
                        "personal_info IN (SELECT {alias}.id FROM {table} {alias} WHERE {fragment})",
                        alias = PERSONAL_DETAILS_ALIAS,
                        table = PERSONAL_DETAILS_TABLE,
                        fragment = fragment
                    ));
                }
            }
            CriteriaElement::Specialized(condition) => {
                if let Some(fragment) = compose_specialized(condition, state, &prefix)? {
                    fragments.push(fragment);
                }
            }
            CriteriaElement::Leaf(leaf) => {
                fragments.push(compose_leaf_condition(strategy, leaf, state, &prefix)?);
            }
        }
    }

    if !fragments.is_empty() {
        let junction = format!(" {} ", node.junction);
        let grouped: Vec<String> = fragments.iter().map(|f| format!("({})", f)).collect();
        where_clause.push_str(&format!(" AND ({})", grouped.join(&junction)));
    }

    tracing::debug!(
        alias = %alias,
        table = table,
        conditions = fragments.len(),
        nested = children.len(),
        "composed entity subquery"
    );

    Ok(ComposedSubquery {
        kind: SubqueryKind::Entity,
        table,
        alias,
        select,
        where_clause,
        children,
    })
}
