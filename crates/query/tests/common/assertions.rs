//! Assertion helpers for compiled statements.

use std::collections::BTreeSet;

use regex::Regex;

use xtens_query::{CompiledQuery, QueryError};

/// Returns every placeholder index in the statement, in textual order.
pub fn placeholders(statement: &str) -> Vec<usize> {
    let re = Regex::new(r"\$(\d+)").expect("valid placeholder pattern");
    re.captures_iter(statement)
        .map(|c| c[1].parse().expect("numeric placeholder"))
        .collect()
}

/// Asserts that the placeholders used in the statement are exactly
/// `$1..=$n`, where `n` is the number of bound parameters.
///
/// A placeholder may appear more than once (the path accessor reuses the
/// field-name placeholder for its unit test), but none may be missing or
/// out of range.
pub fn assert_aligned(query: &CompiledQuery) {
    let used: BTreeSet<usize> = placeholders(&query.statement).into_iter().collect();
    let expected: BTreeSet<usize> = (1..=query.parameters.len()).collect();
    assert_eq!(
        used, expected,
        "Placeholders {:?} do not match {} parameters in: {}",
        used,
        query.parameters.len(),
        query.statement
    );
}

/// Asserts that the statement is a single, terminated `SELECT DISTINCT`.
pub fn assert_well_formed(query: &CompiledQuery) {
    assert!(
        query.statement.ends_with(';'),
        "Statement not terminated: {}",
        query.statement
    );
    assert_eq!(
        query.statement.matches(';').count(),
        1,
        "Statement contains more than one terminator: {}",
        query.statement
    );
    assert!(
        query.statement.contains("SELECT DISTINCT d.id, "),
        "Missing outer projection: {}",
        query.statement
    );
    assert!(
        !query.statement.contains("  "),
        "Statement contains double spaces: {}",
        query.statement
    );
}

/// Asserts that a result is a forbidden-operator rejection.
pub fn assert_forbidden<T: std::fmt::Debug>(result: Result<T, QueryError>) {
    match result {
        Err(err) => assert!(
            err.is_forbidden_operator(),
            "Expected forbidden operator, got {:?}",
            err
        ),
        Ok(value) => panic!("Expected forbidden operator, got {:?}", value),
    }
}

/// Returns the CTE aliases declared in the `WITH` clause, in order.
pub fn cte_aliases(statement: &str) -> Vec<String> {
    let re = Regex::new(r"(?:WITH |, )(\w+) AS \(").expect("valid CTE pattern");
    re.captures_iter(statement)
        .map(|c| c[1].to_string())
        .collect()
}
