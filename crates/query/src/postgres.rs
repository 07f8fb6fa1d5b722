//! Binding compiled queries to `tokio-postgres`.
//!
//! ```no_run
//! # async fn run(client: &tokio_postgres::Client) -> Result<(), Box<dyn std::error::Error>> {
//! use xtens_query::{CriteriaNode, Model, QueryCompiler};
//!
//! let query = QueryCompiler::default().compile(&CriteriaNode::new(Model::Data, 7))?;
//! let params = query.to_sql_params();
//! let rows = client.query(query.statement.as_str(), &query.param_refs(&params)).await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

use tokio_postgres::types::ToSql;

use crate::compiler::{CompiledQuery, SqlParam};

/// Boxed parameter accepted by `tokio-postgres`.
pub type BoxedParam = Box<dyn ToSql + Sync + Send>;

impl SqlParam {
    /// Boxes the value for `tokio-postgres`.
    pub fn to_sql_param(&self) -> BoxedParam {
        match self {
            SqlParam::Text(s) => Box::new(s.clone()),
            SqlParam::Integer(i) => Box::new(*i),
            SqlParam::Float(f) => Box::new(*f),
            SqlParam::Bool(b) => Box::new(*b),
            SqlParam::Date(d) => Box::new(*d),
            SqlParam::Json(v) => Box::new(v.clone()),
            SqlParam::TextArray(items) => Box::new(items.clone()),
            SqlParam::Null => Box::new(Option::<String>::None),
        }
    }
}

impl CompiledQuery {
    /// Converts the bound values, in placeholder order.
    pub fn to_sql_params(&self) -> Vec<BoxedParam> {
        self.parameters.iter().map(SqlParam::to_sql_param).collect()
    }

    /// Borrows boxed values in the form `Client::query` expects.
    pub fn param_refs<'a>(&self, params: &'a [BoxedParam]) -> Vec<&'a (dyn ToSql + Sync)> {
        params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}
