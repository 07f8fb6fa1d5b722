//! Core types for describing metadata queries.

mod criteria;

pub use criteria::{
    CriteriaElement, CriteriaNode, DataTypeId, FieldType, Junction, LeafCondition, Model,
    PersonalDetailsCondition, SpecializedCondition,
};
