//! Conditions on fixed entity columns.
//!
//! Specialized conditions test the typed columns of `subject` and `sample`
//! (`code`, `sex`, `biobank`, `biobank_code`) and personal details conditions
//! test `personal_details` (`surname`, `given_name`, `birth_date`), bypassing
//! the metadata document. Each property may carry a `<property>Comparator`
//! companion, which goes through the same whitelist as leaf comparators.

use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::schema::{ColumnKind, ColumnProperty, PERSONAL_DETAILS_PROPERTIES};
use crate::types::{FieldType, PersonalDetailsCondition, SpecializedCondition};

use super::comparator::{Comparator, validate_or};
use super::param::SqlParam;
use super::state::CompilerState;

/// Composes a specialized condition against `prefix` (`d.` or empty).
///
/// Returns `None` when none of the catalogued properties is set.
pub fn compose_specialized(
    condition: &SpecializedCondition,
    state: &mut CompilerState,
    prefix: &str,
) -> QueryResult<Option<String>> {
    let entity = condition.specialized_query;
    let catalogue = entity.specialized_properties();
    if catalogue.is_empty() {
        return Err(QueryError::unsupported(format!(
            "specialized condition on '{}' has no fixed columns",
            entity
        )));
    }

    let fragment = compose_properties(
        catalogue,
        |name| condition.property(name),
        |name| condition.comparator(name),
        state,
        prefix,
    )?;

    if fragment.is_none() {
        tracing::debug!(entity = %entity, "specialized condition has no properties set");
    }
    Ok(fragment)
}

/// Composes a personal details condition against the `pd` alias.
pub fn compose_personal_details(
    condition: &PersonalDetailsCondition,
    state: &mut CompilerState,
) -> QueryResult<Option<String>> {
    compose_properties(
        PERSONAL_DETAILS_PROPERTIES,
        |name| condition.property(name),
        |name| condition.comparator(name),
        state,
        "pd.",
    )
}

fn compose_properties<'a>(
    catalogue: &[ColumnProperty],
    value_of: impl Fn(&str) -> Option<&'a Value>,
    comparator_of: impl Fn(&str) -> Option<&'a str>,
    state: &mut CompilerState,
    prefix: &str,
) -> QueryResult<Option<String>> {
    let mut clauses = Vec::new();

    for property in catalogue {
        let Some(value) = value_of(property.property) else {
            continue;
        };
        let column = format!("{}{}", prefix, property.column);

        match value {
            Value::Array(items) => {
                let comparator = validate_or(comparator_of(property.property), Comparator::In)?;
                let mut placeholders = Vec::with_capacity(items.len());
                for item in items {
                    placeholders.push(state.bind(bind_value(property, item)?));
                }
                if comparator.is_set_membership() {
                    clauses.push(format!(
                        "{} {} ({})",
                        column,
                        comparator,
                        placeholders.join(", ")
                    ));
                } else {
                    let tests: Vec<String> = placeholders
                        .iter()
                        .map(|p| format!("{} {} {}", column, comparator, p))
                        .collect();
                    clauses.push(format!("({})", tests.join(" OR ")));
                }
            }
            scalar => {
                let comparator = validate_or(comparator_of(property.property), Comparator::Eq)?;
                let placeholder = state.bind(bind_value(property, scalar)?);
                if comparator.is_set_membership() {
                    clauses.push(format!("{} {} ({})", column, comparator, placeholder));
                } else {
                    clauses.push(format!("{} {} {}", column, comparator, placeholder));
                }
            }
        }
    }

    Ok((!clauses.is_empty()).then(|| clauses.join(" AND ")))
}

fn bind_value(property: &ColumnProperty, value: &Value) -> QueryResult<SqlParam> {
    match property.kind {
        ColumnKind::Plain => Ok(SqlParam::from_json(value)),
        ColumnKind::Uppercase => SqlParam::coerce(property.property, FieldType::Text, value, true),
        ColumnKind::Date => SqlParam::coerce(property.property, FieldType::Date, value, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Model;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_subject_code_and_sex_list() {
        let condition = SpecializedCondition::new(Model::Subject)
            .with_property("code", "PAT-001")
            .with_property("sex", json!(["M", "F"]));
        let mut state = CompilerState::new();
        state.bind(SqlParam::Integer(1));

        let sql = compose_specialized(&condition, &mut state, "d.")
            .unwrap()
            .unwrap();
        assert_eq!(sql, "d.code = $2 AND d.sex IN ($3, $4)");
        assert_eq!(
            state.into_parameters(),
            vec![
                SqlParam::Integer(1),
                SqlParam::text("PAT-001"),
                SqlParam::text("M"),
                SqlParam::text("F"),
            ]
        );
    }

    #[test]
    fn test_sample_properties_use_column_names() {
        let condition = SpecializedCondition::new(Model::Sample)
            .with_property("biobank", 3)
            .with_property("biobankCode", "BB-0042")
            .with_comparator("biobankCode", "LIKE");
        let mut state = CompilerState::new();

        let sql = compose_specialized(&condition, &mut state, "").unwrap().unwrap();
        assert_eq!(sql, "biobank = $1 AND biobank_code LIKE $2");
        assert_eq!(state.parameters()[0], SqlParam::Integer(3));
    }

    #[test]
    fn test_comparator_override_is_validated() {
        let condition = SpecializedCondition::new(Model::Subject)
            .with_property("sex", json!(["M"]))
            .with_comparator("sex", "IN (SELECT 1) OR 1 IN");
        let mut state = CompilerState::new();

        let err = compose_specialized(&condition, &mut state, "d.").unwrap_err();
        assert!(err.is_forbidden_operator());
    }

    #[test]
    fn test_blank_properties_yield_nothing() {
        let condition = SpecializedCondition::new(Model::Subject).with_property("code", "");
        let mut state = CompilerState::new();

        assert!(compose_specialized(&condition, &mut state, "d.").unwrap().is_none());
        assert!(state.parameters().is_empty());
    }

    #[test]
    fn test_properties_of_other_entities_are_ignored() {
        let condition = SpecializedCondition::new(Model::Sample).with_property("code", "PAT-001");
        let mut state = CompilerState::new();

        assert!(compose_specialized(&condition, &mut state, "d.").unwrap().is_none());
    }

    #[test]
    fn test_entity_without_fixed_columns_is_unsupported() {
        for entity in [Model::Data, Model::Generic] {
            let condition = SpecializedCondition::new(entity).with_property("code", "PAT-001");
            let mut state = CompilerState::new();

            let err = compose_specialized(&condition, &mut state, "d.").unwrap_err();
            assert!(matches!(err, QueryError::UnsupportedCondition { .. }));
            assert!(state.parameters().is_empty());
        }
    }

    #[test]
    fn test_personal_details_uppercased_and_dated() {
        let condition = PersonalDetailsCondition::new()
            .with_property("surname", "Rossi")
            .with_property("givenName", "Maria")
            .with_property("birthDate", "1980-05-17")
            .with_comparator("birthDate", ">=");
        let mut state = CompilerState::new();

        let sql = compose_personal_details(&condition, &mut state).unwrap().unwrap();
        assert_eq!(
            sql,
            "pd.surname = $1 AND pd.given_name = $2 AND pd.birth_date >= $3"
        );
        assert_eq!(
            state.into_parameters(),
            vec![
                SqlParam::text("ROSSI"),
                SqlParam::text("MARIA"),
                SqlParam::Date(NaiveDate::from_ymd_opt(1980, 5, 17).unwrap()),
            ]
        );
    }

    #[test]
    fn test_personal_details_bad_date() {
        let condition = PersonalDetailsCondition::new().with_property("birthDate", "17/05/1980");
        let mut state = CompilerState::new();

        let err = compose_personal_details(&condition, &mut state).unwrap_err();
        assert!(matches!(err, QueryError::InvalidFieldValue { .. }));
    }
}
