//! Criteria-to-SQL compilation.
//!
//! Compilation runs in three passes over one [`CompilerState`]:
//!
//! 1. [`subquery`] walks the criteria tree, composing leaf, specialized and
//!    personal details conditions and recursing into nested entities
//! 2. [`cte`] linearizes the resulting subquery tree into `WITH` entries and
//!    join clauses, adding the fixed side-joins
//! 3. [`builder`] assembles the outer `SELECT DISTINCT` statement
//!
//! Every operator that reaches SQL text has been validated by
//! [`comparator`], and every value is bound through the state.

pub mod builder;
pub mod comparator;
pub mod cte;
pub mod param;
pub mod specialized;
pub mod state;
pub mod strategy;
pub mod subquery;

pub use builder::{CompiledQuery, QueryCompiler};
pub use comparator::{ALLOWED_COMPARATORS, Comparator};
pub use cte::CteEntry;
pub use param::SqlParam;
pub use state::CompilerState;
pub use strategy::{JsonPathStrategy, JsonbContainmentStrategy, LeafStrategy};
pub use subquery::{ComposedSubquery, SubqueryKind};
