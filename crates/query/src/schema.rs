//! Table and column catalogue.
//!
//! The compiler targets a relational store with the following tables, each
//! carrying a JSONB `metadata` column and `parent_*` foreign keys:
//!
//! | Table | Used for |
//! |-------|----------|
//! | `subject` | [`Model::Subject`] |
//! | `sample` | [`Model::Sample`] |
//! | `data` | [`Model::Data`], [`Model::Generic`] |
//! | `personal_details` | personal details side-join and conditions |
//! | `biobank` | biobank side-join for samples |
//!
//! Everything here is an immutable process-wide constant.

use crate::types::Model;

/// Alias of the root table in the outer statement.
pub const ROOT_ALIAS: &str = "d";
/// Alias of the subject side-join.
pub const SUBJECT_ALIAS: &str = "s";
/// Alias of the personal details CTE.
pub const PERSONAL_DETAILS_ALIAS: &str = "pd";
/// Alias of the biobank side-join.
pub const BIOBANK_ALIAS: &str = "bb";
/// Prefix of synthesized nested-entity aliases (`nested_1`, `nested_2`, ...).
pub const NESTED_ALIAS_PREFIX: &str = "nested_";

/// Subject table.
pub const SUBJECT_TABLE: &str = "subject";
/// Sample table.
pub const SAMPLE_TABLE: &str = "sample";
/// Generic data table.
pub const DATA_TABLE: &str = "data";
/// Personal details table.
pub const PERSONAL_DETAILS_TABLE: &str = "personal_details";
/// Biobank table.
pub const BIOBANK_TABLE: &str = "biobank";

/// Columns read from `personal_details`.
pub const PERSONAL_DETAILS_COLUMNS: &str = "id, given_name, surname, birth_date";
/// Columns read from `subject` by the subject side-join.
pub const SUBJECT_SIDE_COLUMNS: &str = "id, code, sex, personal_info";
/// Columns read from `biobank` by the biobank side-join.
pub const BIOBANK_SIDE_COLUMNS: &str = "id, biobank_id, acronym, name";

/// How a fixed-column value is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Bound as supplied.
    Plain,
    /// Text upper-cased before binding.
    Uppercase,
    /// Calendar date.
    Date,
}

/// A fixed (non-metadata) column that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnProperty {
    /// Property name in the criteria document.
    pub property: &'static str,
    /// Column name in the table.
    pub column: &'static str,
    /// Binding rule.
    pub kind: ColumnKind,
}

impl ColumnProperty {
    const fn new(property: &'static str, column: &'static str, kind: ColumnKind) -> Self {
        Self {
            property,
            column,
            kind,
        }
    }
}

/// Fixed columns of `subject`.
pub const SUBJECT_PROPERTIES: &[ColumnProperty] = &[
    ColumnProperty::new("code", "code", ColumnKind::Plain),
    ColumnProperty::new("sex", "sex", ColumnKind::Plain),
];

/// Fixed columns of `sample`.
pub const SAMPLE_PROPERTIES: &[ColumnProperty] = &[
    ColumnProperty::new("biobank", "biobank", ColumnKind::Plain),
    ColumnProperty::new("biobankCode", "biobank_code", ColumnKind::Plain),
];

/// Fixed columns of `personal_details`.
pub const PERSONAL_DETAILS_PROPERTIES: &[ColumnProperty] = &[
    ColumnProperty::new("surname", "surname", ColumnKind::Uppercase),
    ColumnProperty::new("givenName", "given_name", ColumnKind::Uppercase),
    ColumnProperty::new("birthDate", "birth_date", ColumnKind::Date),
];

impl Model {
    /// Returns the table storing entities of this class.
    pub fn table(&self) -> &'static str {
        match self {
            Model::Subject => SUBJECT_TABLE,
            Model::Sample => SAMPLE_TABLE,
            Model::Data | Model::Generic => DATA_TABLE,
        }
    }

    /// Returns the columns projected by a nested subquery on this class.
    ///
    /// Includes the keys needed to join the subquery to its parent and
    /// children.
    pub fn subquery_columns(&self) -> &'static str {
        match self {
            Model::Subject => "id, code, sex, personal_info",
            Model::Sample => "id, biobank, biobank_code, parent_subject, parent_sample",
            Model::Data | Model::Generic => "id, parent_subject, parent_sample, parent_data",
        }
    }

    /// Returns the root-table columns projected by the outer statement.
    pub fn projected_columns(&self) -> &'static [&'static str] {
        match self {
            Model::Subject => &["d.code", "d.sex"],
            Model::Sample => &["d.biobank", "d.biobank_code"],
            Model::Data | Model::Generic => &[],
        }
    }

    /// Returns the fixed columns a specialized condition may test.
    pub fn specialized_properties(&self) -> &'static [ColumnProperty] {
        match self {
            Model::Subject => SUBJECT_PROPERTIES,
            Model::Sample => SAMPLE_PROPERTIES,
            Model::Data | Model::Generic => &[],
        }
    }
}
