//! XTENS Metadata Query Compiler
//!
//! This crate translates a criteria tree describing filters over the
//! Subject → Sample → Data hierarchy into a single parameterized PostgreSQL
//! statement. Each entity stores free-form attributes in a JSON(B)
//! `metadata` document; nested entity criteria become common table
//! expressions joined to their parent through `parent_*` foreign keys.
//!
//! The compiler never executes SQL. It returns the statement text and the
//! ordered list of values to bind to `$1`, `$2`, ...
//!
//! # Features
//!
//! - **Two leaf strategies**: typed path reads (`json`) or JSONB containment (`jsonb`)
//! - **Comparator whitelist**: every operator is validated before it reaches SQL text
//! - **Typed parameters**: values are coerced to their declared field type
//! - **Reentrant**: a [`QueryCompiler`] can be shared across threads
//!
//! Optional features:
//! - `postgres` - bind compiled parameters with `tokio-postgres`
//!
//! # Architecture
//!
//! - [`types`] - criteria tree types
//! - [`schema`] - table and column catalogue
//! - [`compiler`] - strategies, subquery composition, CTE assembly
//! - [`config`] - compiler configuration
//! - [`error`] - error types
//!
//! # Quick Start
//!
//! ```
//! use xtens_query::{CriteriaNode, FieldType, Junction, LeafCondition, Model, QueryCompiler};
//!
//! let criteria = CriteriaNode::new(Model::Subject, 1)
//!     .with_junction(Junction::Or)
//!     .with_element(LeafCondition::new("diagnosis", FieldType::Text, "=", "NB"))
//!     .with_element(CriteriaNode::new(Model::Sample, 2).with_element(
//!         LeafCondition::new("volume", FieldType::Float, ">=", 1.5),
//!     ));
//!
//! let query = QueryCompiler::default().compile(&criteria).unwrap();
//! assert!(query.statement.starts_with("WITH nested_1 AS ("));
//! assert!(query.statement.contains("INNER JOIN nested_1 ON nested_1.parent_subject = d.id"));
//! assert_eq!(query.parameters.len(), 5);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod compiler;
pub mod config;
pub mod error;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use compiler::{
    ALLOWED_COMPARATORS, Comparator, CompiledQuery, JsonPathStrategy, JsonbContainmentStrategy,
    LeafStrategy, QueryCompiler, SqlParam,
};
pub use config::{CompilerConfig, StrategyKind};
pub use error::{QueryError, QueryResult};
pub use types::{
    CriteriaElement, CriteriaNode, DataTypeId, FieldType, Junction, LeafCondition, Model,
    PersonalDetailsCondition, SpecializedCondition,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
