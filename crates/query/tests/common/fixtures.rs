//! Criteria fixtures.
//!
//! Documents are written in the JSON shape the request layer sends, so the
//! tests also exercise deserialization.

use serde_json::{Value, json};

use xtens_query::{CompilerConfig, CriteriaNode, QueryCompiler, StrategyKind};

/// Returns a compiler for the given strategy.
pub fn compiler(strategy: StrategyKind) -> QueryCompiler {
    QueryCompiler::new(&CompilerConfig {
        strategy,
        ..Default::default()
    })
}

/// Both strategies, path first.
pub fn all_strategies() -> [StrategyKind; 2] {
    [StrategyKind::Json, StrategyKind::Jsonb]
}

/// Parses a criteria document.
pub fn criteria(document: Value) -> CriteriaNode {
    CriteriaNode::from_json(document).expect("valid criteria fixture")
}

/// A Data root with a single integer leaf.
pub fn score_criteria() -> Value {
    json!({
        "model": "Data",
        "dataType": 7,
        "content": [
            {"fieldName": "score", "fieldType": "integer", "comparator": ">", "fieldValue": 5}
        ]
    })
}

/// A Data root with one leaf using the given comparator.
pub fn leaf_criteria(comparator: &str, value: Value) -> Value {
    json!({
        "model": "Data",
        "dataType": 7,
        "content": [
            {"fieldName": "diagnosis", "fieldType": "text", "comparator": comparator, "fieldValue": value}
        ]
    })
}

/// Subject → Sample → Data, with conditions at every level.
pub fn nested_criteria() -> Value {
    json!({
        "model": "Subject",
        "dataType": 1,
        "content": [
            {"specializedQuery": "Subject", "sex": ["F", "M"]},
            {
                "model": "Sample",
                "dataType": 2,
                "content": [
                    {"specializedQuery": "Sample", "biobankCode": "BB-01", "biobankCodeComparator": "LIKE"},
                    {
                        "model": "Data",
                        "dataType": 3,
                        "content": [
                            {"fieldName": "quality", "fieldType": "float", "comparator": ">=", "fieldValue": 7.5}
                        ]
                    }
                ]
            },
            {"fieldName": "consent", "fieldType": "boolean", "comparator": "=", "fieldValue": true}
        ]
    })
}

/// A Sample root requesting subject and personal details projections.
pub fn sample_with_projections() -> Value {
    json!({
        "model": "Sample",
        "dataType": 4,
        "wantsSubject": true,
        "wantsPersonalInfo": true,
        "content": [
            {"fieldName": "volume", "fieldType": "float", "comparator": "<", "fieldValue": 2, "fieldUnit": "ml"}
        ]
    })
}

/// A Subject root with personal details conditions and projection.
pub fn subject_with_personal_details() -> Value {
    json!({
        "model": "Subject",
        "dataType": 1,
        "wantsPersonalInfo": true,
        "junction": "OR",
        "content": [
            {"personalDetails": true, "surname": "Rossi", "birthDate": "1970-01-01", "birthDateComparator": ">"},
            {"fieldName": "diagnosis", "fieldType": "text", "comparator": "LIKE", "fieldValue": "neuro%", "caseInsensitive": true}
        ]
    })
}

/// A repeated-field leaf.
pub fn loop_criteria(comparator: &str, value: Value) -> Value {
    json!({
        "model": "Data",
        "dataType": 9,
        "content": [
            {"fieldName": "drugs", "fieldType": "text", "isInLoop": true, "comparator": comparator, "fieldValue": value}
        ]
    })
}
