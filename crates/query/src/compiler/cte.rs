//! Common table expression assembly.
//!
//! The composed subquery tree is linearized depth-first into [`CteEntry`]
//! values, each pairing a `WITH` definition with the join that stitches it to
//! its parent. Fixed side-join CTEs (subject, personal details, biobank) are
//! derived from the root node and placed ahead of the criteria CTEs.

use std::collections::HashSet;

use crate::schema::{
    BIOBANK_ALIAS, BIOBANK_SIDE_COLUMNS, BIOBANK_TABLE, PERSONAL_DETAILS_ALIAS,
    PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_TABLE, ROOT_ALIAS, SUBJECT_ALIAS,
    SUBJECT_SIDE_COLUMNS, SUBJECT_TABLE,
};
use crate::types::{CriteriaNode, Model};

use super::subquery::{ComposedSubquery, SubqueryKind};

/// One named subquery of the `WITH` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteEntry {
    /// CTE name.
    pub alias: String,
    /// `alias AS (SELECT ...)`.
    pub definition: String,
    /// `[INNER|LEFT] JOIN alias ON ...`.
    pub join_clause: String,
}

impl CteEntry {
    fn new(alias: &str, body: &str, join_clause: String) -> Self {
        Self {
            alias: alias.to_string(),
            definition: format!("{} AS ({})", alias, body),
            join_clause,
        }
    }
}

/// Side-join CTEs and the columns they add to the outer projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideJoins {
    /// CTEs, in emission order.
    pub ctes: Vec<CteEntry>,
    /// Projected columns, in emission order.
    pub columns: Vec<&'static str>,
}

const PERSONAL_DETAILS_PROJECTION: [&str; 3] = ["pd.given_name", "pd.surname", "pd.birth_date"];

/// Derives the fixed side-joins requested by the root node.
pub fn side_joins(root: &CriteriaNode) -> SideJoins {
    let mut joins = SideJoins::default();

    if root.model != Model::Subject && root.wants_subject {
        joins.ctes.push(CteEntry::new(
            SUBJECT_ALIAS,
            &format!("SELECT {} FROM {}", SUBJECT_SIDE_COLUMNS, SUBJECT_TABLE),
            format!(
                "LEFT JOIN {s} ON {s}.id = {d}.parent_subject",
                s = SUBJECT_ALIAS,
                d = ROOT_ALIAS
            ),
        ));
        joins.columns.extend(["s.code", "s.sex"]);

        if root.wants_personal_info {
            joins.ctes.push(personal_details_entry(SUBJECT_ALIAS));
            joins.columns.extend(PERSONAL_DETAILS_PROJECTION);
        }
    }

    if root.model == Model::Subject && root.wants_personal_info {
        joins.ctes.push(personal_details_entry(ROOT_ALIAS));
        joins.columns.extend(PERSONAL_DETAILS_PROJECTION);
    }

    if root.model == Model::Sample {
        joins.ctes.push(CteEntry::new(
            BIOBANK_ALIAS,
            &format!("SELECT {} FROM {}", BIOBANK_SIDE_COLUMNS, BIOBANK_TABLE),
            format!(
                "LEFT JOIN {bb} ON {bb}.id = {d}.biobank",
                bb = BIOBANK_ALIAS,
                d = ROOT_ALIAS
            ),
        ));
        joins.columns.push("bb.acronym AS biobank_acronym");
    }

    joins
}

fn personal_details_entry(parent_alias: &str) -> CteEntry {
    CteEntry::new(
        PERSONAL_DETAILS_ALIAS,
        &format!(
            "SELECT {} FROM {}",
            PERSONAL_DETAILS_COLUMNS, PERSONAL_DETAILS_TABLE
        ),
        personal_details_join(parent_alias),
    )
}

fn personal_details_join(parent_alias: &str) -> String {
    format!(
        "LEFT JOIN {pd} ON {pd}.id = {parent}.personal_info",
        pd = PERSONAL_DETAILS_ALIAS,
        parent = parent_alias
    )
}

/// Linearizes a composed tree into CTEs, depth-first, left to right.
///
/// The root itself is not a CTE: only its descendants are emitted.
pub fn flatten(root: &ComposedSubquery) -> Vec<CteEntry> {
    let mut ctes = Vec::new();
    for child in &root.children {
        flatten_into(child, &root.alias, root.table, &mut ctes);
    }
    ctes
}

fn flatten_into(
    query: &ComposedSubquery,
    parent_alias: &str,
    parent_table: &str,
    ctes: &mut Vec<CteEntry>,
) {
    let body = if query.where_clause.is_empty() {
        query.select.clone()
    } else {
        format!("{} {}", query.select, query.where_clause)
    };

    match query.kind {
        SubqueryKind::PersonalDetails => {
            ctes.push(CteEntry::new(
                &query.alias,
                &body,
                personal_details_join(parent_alias),
            ));
        }
        SubqueryKind::Entity => {
            ctes.push(CteEntry::new(
                &query.alias,
                &body,
                format!(
                    "INNER JOIN {alias} ON {alias}.parent_{table} = {parent}.id",
                    alias = query.alias,
                    table = parent_table,
                    parent = parent_alias
                ),
            ));
            for child in &query.children {
                flatten_into(child, &query.alias, query.table, ctes);
            }
        }
    }
}

/// Concatenates side-join and criteria CTEs, keeping the first CTE of each
/// alias.
pub fn assemble(side: Vec<CteEntry>, tree: Vec<CteEntry>) -> Vec<CteEntry> {
    let mut seen = HashSet::new();
    let mut ctes = Vec::with_capacity(side.len() + tree.len());

    for entry in side.into_iter().chain(tree) {
        if !seen.insert(entry.alias.clone()) {
            tracing::warn!(alias = %entry.alias, "dropping duplicate CTE alias");
            continue;
        }
        tracing::debug!(alias = %entry.alias, join = %entry.join_clause, "emitting CTE");
        ctes.push(entry);
    }

    ctes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(
        alias: &str,
        table: &'static str,
        children: Vec<ComposedSubquery>,
    ) -> ComposedSubquery {
        ComposedSubquery {
            kind: SubqueryKind::Entity,
            table,
            alias: alias.to_string(),
            select: format!("SELECT id FROM {}", table),
            where_clause: "WHERE type = $1".to_string(),
            children,
        }
    }

    #[test]
    fn test_flatten_depth_first() {
        let root = entity(
            "d",
            "subject",
            vec![
                entity("nested_1", "sample", vec![entity("nested_2", "data", vec![])]),
                entity("nested_3", "data", vec![]),
            ],
        );

        let ctes = flatten(&root);
        let aliases: Vec<&str> = ctes.iter().map(|c| c.alias.as_str()).collect();
        assert_eq!(aliases, vec!["nested_1", "nested_2", "nested_3"]);
        assert_eq!(
            ctes[0].join_clause,
            "INNER JOIN nested_1 ON nested_1.parent_subject = d.id"
        );
        assert_eq!(
            ctes[1].join_clause,
            "INNER JOIN nested_2 ON nested_2.parent_sample = nested_1.id"
        );
        assert_eq!(
            ctes[2].join_clause,
            "INNER JOIN nested_3 ON nested_3.parent_subject = d.id"
        );
        assert_eq!(
            ctes[0].definition,
            "nested_1 AS (SELECT id FROM sample WHERE type = $1)"
        );
    }

    #[test]
    fn test_personal_details_left_join() {
        let root = entity("d", "subject", vec![ComposedSubquery::personal_details()]);

        let ctes = flatten(&root);
        assert_eq!(
            ctes[0].definition,
            "pd AS (SELECT id, given_name, surname, birth_date FROM personal_details)"
        );
        assert_eq!(ctes[0].join_clause, "LEFT JOIN pd ON pd.id = d.personal_info");
    }

    #[test]
    fn test_side_joins_for_data_with_subject_and_personal_info() {
        let root = CriteriaNode::new(Model::Data, 7)
            .with_subject()
            .with_personal_info();

        let joins = side_joins(&root);
        let aliases: Vec<&str> = joins.ctes.iter().map(|c| c.alias.as_str()).collect();
        assert_eq!(aliases, vec!["s", "pd"]);
        assert_eq!(joins.ctes[0].join_clause, "LEFT JOIN s ON s.id = d.parent_subject");
        assert_eq!(joins.ctes[1].join_clause, "LEFT JOIN pd ON pd.id = s.personal_info");
        assert_eq!(
            joins.columns,
            vec!["s.code", "s.sex", "pd.given_name", "pd.surname", "pd.birth_date"]
        );
    }

    #[test]
    fn test_personal_info_without_subject_is_ignored_for_data() {
        let root = CriteriaNode::new(Model::Data, 7).with_personal_info();
        assert_eq!(side_joins(&root), SideJoins::default());
    }

    #[test]
    fn test_side_joins_for_subject_and_sample() {
        let subject = CriteriaNode::new(Model::Subject, 1)
            .with_subject()
            .with_personal_info();
        let joins = side_joins(&subject);
        assert_eq!(joins.ctes.len(), 1);
        assert_eq!(joins.ctes[0].join_clause, "LEFT JOIN pd ON pd.id = d.personal_info");

        let sample = CriteriaNode::new(Model::Sample, 2);
        let joins = side_joins(&sample);
        assert_eq!(
            joins.ctes[0].definition,
            "bb AS (SELECT id, biobank_id, acronym, name FROM biobank)"
        );
        assert_eq!(joins.columns, vec!["bb.acronym AS biobank_acronym"]);
    }

    #[test]
    fn test_assemble_drops_duplicate_alias() {
        let side = vec![personal_details_entry("d")];
        let tree = vec![
            personal_details_entry("d"),
            CteEntry::new(
                "nested_1",
                "SELECT id FROM data",
                "INNER JOIN nested_1 ON nested_1.parent_subject = d.id".to_string(),
            ),
        ];

        let ctes = assemble(side, tree);
        let aliases: Vec<&str> = ctes.iter().map(|c| c.alias.as_str()).collect();
        assert_eq!(aliases, vec!["pd", "nested_1"]);
    }
}
