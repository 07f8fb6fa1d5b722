//! Top-level compiler.

use serde_json::Value;
use tracing::instrument;

use crate::config::CompilerConfig;
use crate::error::QueryResult;
use crate::schema::ROOT_ALIAS;
use crate::types::CriteriaNode;

use super::cte::{assemble, flatten, side_joins};
use super::param::SqlParam;
use super::state::CompilerState;
use super::strategy::LeafStrategy;
use super::subquery::compose_root;

/// A compiled statement and its bound values.
///
/// `parameters[i]` is bound to placeholder `$(i+1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// SQL text, terminated by `;`.
    pub statement: String,
    /// Bound values in placeholder order.
    pub parameters: Vec<SqlParam>,
}

impl CompiledQuery {
    /// Returns the bound values as JSON, dates rendered as `YYYY-MM-DD`.
    pub fn parameter_values(&self) -> Vec<Value> {
        self.parameters.iter().map(SqlParam::to_json).collect()
    }
}

/// Compiles criteria trees into parameterized SQL.
///
/// The compiler holds no per-call state and can be shared across threads;
/// each [`compile`](Self::compile) call works on its own [`CompilerState`].
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use xtens_query::QueryCompiler;
///
/// let compiler = QueryCompiler::default();
/// let query = compiler
///     .compile_json(json!({
///         "model": "Data",
///         "dataType": 7,
///         "content": [
///             {"fieldName": "score", "fieldType": "integer", "comparator": ">", "fieldValue": 5}
///         ]
///     }))
///     .unwrap();
///
/// assert!(query.statement.contains("WHERE d.type = $1 AND ("));
/// assert_eq!(query.parameter_values(), vec![json!(7), json!("score"), json!(5)]);
/// ```
#[derive(Debug)]
pub struct QueryCompiler {
    strategy: Box<dyn LeafStrategy>,
    max_depth: usize,
}

impl QueryCompiler {
    /// Creates a compiler from a configuration.
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            strategy: config.strategy.build(),
            max_depth: config.max_depth,
        }
    }

    /// Creates a compiler using a custom leaf strategy.
    pub fn with_strategy(strategy: impl LeafStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
            max_depth: CompilerConfig::default().max_depth,
        }
    }

    /// Sets the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the name of the leaf strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Compiles a criteria tree.
    #[instrument(skip_all, fields(strategy = self.strategy.name(), model = %criteria.model))]
    pub fn compile(&self, criteria: &CriteriaNode) -> QueryResult<CompiledQuery> {
        let mut state = CompilerState::new();
        let root = compose_root(self.strategy.as_ref(), criteria, &mut state, self.max_depth)?;

        let side = side_joins(criteria);
        let ctes = assemble(side.ctes, flatten(&root));

        let mut columns = vec![format!("{}.id", ROOT_ALIAS)];
        columns.extend(criteria.model.projected_columns().iter().map(|c| c.to_string()));
        columns.extend(side.columns.iter().map(|c| c.to_string()));
        columns.push(format!("{}.metadata", ROOT_ALIAS));

        let select = format!(
            "SELECT DISTINCT {} FROM {} {}",
            columns.join(", "),
            root.table,
            ROOT_ALIAS
        );

        let statement = if ctes.is_empty() {
            format!("{} {};", select, root.where_clause)
        } else {
            let definitions: Vec<&str> = ctes.iter().map(|c| c.definition.as_str()).collect();
            let joins: Vec<&str> = ctes.iter().map(|c| c.join_clause.as_str()).collect();
            format!(
                "WITH {} {} {} {};",
                definitions.join(", "),
                select,
                joins.join(" "),
                root.where_clause
            )
        };

        tracing::debug!(
            ctes = ctes.len(),
            parameters = state.last_param_index(),
            "compiled criteria"
        );

        Ok(CompiledQuery {
            statement,
            parameters: state.into_parameters(),
        })
    }

    /// Parses and compiles a criteria document.
    pub fn compile_json(&self, criteria: Value) -> QueryResult<CompiledQuery> {
        let criteria = CriteriaNode::from_json(criteria)?;
        self.compile(&criteria)
    }
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self::new(&CompilerConfig::default())
    }
}
