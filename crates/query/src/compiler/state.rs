//! Parameter allocator and compiler state.

use crate::schema::NESTED_ALIAS_PREFIX;

use super::param::SqlParam;

/// Mutable state threaded through one compilation.
///
/// Placeholders are allocated and values recorded in a single step, so the
/// value bound to `$N` is always `parameters()[N - 1]`. A fresh state is
/// created for every compilation and discarded afterwards.
#[derive(Debug, Default)]
pub struct CompilerState {
    next_param_index: usize,
    cte_counter: usize,
    parameters: Vec<SqlParam>,
}

impl CompilerState {
    /// Creates an empty state. The first placeholder is `$1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value and returns its placeholder.
    pub fn bind(&mut self, param: SqlParam) -> String {
        self.next_param_index += 1;
        self.parameters.push(param);
        format!("${}", self.next_param_index)
    }

    /// Synthesizes the next nested-entity alias (`nested_1`, `nested_2`, ...).
    pub fn next_nested_alias(&mut self) -> String {
        self.cte_counter += 1;
        format!("{}{}", NESTED_ALIAS_PREFIX, self.cte_counter)
    }

    /// Returns the index of the last allocated placeholder.
    pub fn last_param_index(&self) -> usize {
        self.next_param_index
    }

    /// Returns the bound values in placeholder order.
    pub fn parameters(&self) -> &[SqlParam] {
        &self.parameters
    }

    /// Consumes the state, returning the bound values.
    pub fn into_parameters(self) -> Vec<SqlParam> {
        self.parameters
    }
}
