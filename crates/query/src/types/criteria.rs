//! Criteria tree types.
//!
//! A criteria tree describes filters over the Subject → Sample → Data
//! hierarchy. Each node targets one entity table and holds an ordered list
//! of child elements, which are one of four explicit variants:
//!
//! - [`LeafCondition`] - a test on one attribute of the `metadata` document
//! - [`SpecializedCondition`] - a test on fixed columns of the entity itself
//! - [`PersonalDetailsCondition`] - a test on the linked `personal_details` row
//! - a nested [`CriteriaNode`] - a filter on a related child entity
//!
//! The wire format distinguishes variants by which marker field is present
//! (`dataType`, `personalDetails`, `specializedQuery`, `fieldName`). That
//! discrimination happens once, at deserialization, in
//! [`CriteriaElement::try_from`].

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};

/// Entity class targeted by a criteria node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum Model {
    /// Subjects (patients, donors).
    Subject,
    /// Biological samples.
    Sample,
    /// Generic data records.
    #[default]
    Data,
    /// Any other data type class; stored in the `data` table.
    Generic,
}

impl Model {
    /// Parses a model name, mapping unknown names to [`Model::Generic`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "Subject" => Model::Subject,
            "Sample" => Model::Sample,
            "Data" => Model::Data,
            _ => Model::Generic,
        }
    }

    /// Returns the canonical model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Subject => "Subject",
            Model::Sample => "Sample",
            Model::Data => "Data",
            Model::Generic => "Generic",
        }
    }
}

impl From<String> for Model {
    fn from(name: String) -> Self {
        Model::from_name(&name)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective joining sibling conditions of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum Junction {
    /// All conditions must hold (default).
    #[default]
    And,
    /// At least one condition must hold.
    Or,
}

impl Junction {
    /// Returns the SQL keyword for this junction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Junction::And => "AND",
            Junction::Or => "OR",
        }
    }
}

impl From<String> for Junction {
    /// Anything other than `OR` falls back to `AND`.
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("OR") {
            Junction::Or
        } else {
            Junction::And
        }
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Declared type of a metadata attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldType {
    /// Free text.
    #[default]
    Text,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// True/false flag.
    Boolean,
}

impl FieldType {
    /// Returns the SQL type name used in casts.
    pub fn as_sql_type(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql_type())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "integer" => Ok(FieldType::Integer),
            "float" => Ok(FieldType::Float),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            _ => Err(format!("unknown field type: {}", s)),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifier of a data type, bound as the `type` filter of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum DataTypeId {
    /// Numeric primary key.
    Id(i64),
    /// Symbolic name.
    Name(String),
}

impl From<i64> for DataTypeId {
    fn from(id: i64) -> Self {
        DataTypeId::Id(id)
    }
}

impl From<i32> for DataTypeId {
    fn from(id: i32) -> Self {
        DataTypeId::Id(i64::from(id))
    }
}

impl From<&str> for DataTypeId {
    fn from(name: &str) -> Self {
        DataTypeId::Name(name.to_string())
    }
}

impl From<String> for DataTypeId {
    fn from(name: String) -> Self {
        DataTypeId::Name(name)
    }
}

impl fmt::Display for DataTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTypeId::Id(id) => write!(f, "{}", id),
            DataTypeId::Name(name) => f.write_str(name),
        }
    }
}

/// A node of the criteria tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaNode {
    /// Entity class, which selects the target table.
    #[serde(default)]
    pub model: Model,
    /// Data type the rows must belong to.
    pub data_type: DataTypeId,
    /// Connective for the conditions of this node.
    #[serde(default)]
    pub junction: Junction,
    /// Child elements, in evaluation order.
    #[serde(default)]
    pub content: Vec<CriteriaElement>,
    /// Project subject columns in the result (root only).
    #[serde(default)]
    pub wants_subject: bool,
    /// Project personal details in the result (root only).
    #[serde(default)]
    pub wants_personal_info: bool,
}

impl CriteriaNode {
    /// Creates a node with no conditions.
    pub fn new(model: Model, data_type: impl Into<DataTypeId>) -> Self {
        Self {
            model,
            data_type: data_type.into(),
            junction: Junction::And,
            content: Vec::new(),
            wants_subject: false,
            wants_personal_info: false,
        }
    }

    /// Parses a criteria document.
    ///
    /// Elements are discriminated here rather than inside serde so that an
    /// unrecognized element surfaces as [`QueryError::UnsupportedCondition`]
    /// instead of a generic deserialization error.
    pub fn from_json(mut value: Value) -> QueryResult<Self> {
        let content = match value.as_object_mut().and_then(|map| map.remove("content")) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(CriteriaElement::try_from)
                .collect::<QueryResult<Vec<_>>>()?,
            Some(other) => {
                return Err(QueryError::unsupported(format!(
                    "criteria content must be a list, got {}",
                    other
                )));
            }
        };

        let mut node: CriteriaNode = serde_json::from_value(value)?;
        node.content = content;
        Ok(node)
    }

    /// Sets the junction.
    pub fn with_junction(mut self, junction: Junction) -> Self {
        self.junction = junction;
        self
    }

    /// Appends a child element.
    pub fn with_element(mut self, element: impl Into<CriteriaElement>) -> Self {
        self.content.push(element.into());
        self
    }

    /// Requests the subject side-join.
    pub fn with_subject(mut self) -> Self {
        self.wants_subject = true;
        self
    }

    /// Requests the personal details side-join.
    pub fn with_personal_info(mut self) -> Self {
        self.wants_personal_info = true;
        self
    }

    /// Returns the depth of the deepest nested entity below this node.
    pub fn depth(&self) -> usize {
        self.content
            .iter()
            .filter_map(|element| match element {
                CriteriaElement::Nested(child) => Some(1 + child.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

/// One child element of a criteria node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum CriteriaElement {
    /// Test on a metadata attribute.
    Leaf(LeafCondition),
    /// Test on fixed entity columns.
    Specialized(SpecializedCondition),
    /// Test on the linked personal details.
    PersonalDetails(PersonalDetailsCondition),
    /// Filter on a related child entity.
    Nested(Box<CriteriaNode>),
}

impl CriteriaElement {
    /// Returns a short name for the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CriteriaElement::Leaf(_) => "leaf",
            CriteriaElement::Specialized(_) => "specialized",
            CriteriaElement::PersonalDetails(_) => "personal-details",
            CriteriaElement::Nested(_) => "nested",
        }
    }
}

impl TryFrom<Value> for CriteriaElement {
    type Error = QueryError;

    fn try_from(value: Value) -> QueryResult<Self> {
        let Value::Object(map) = &value else {
            return Err(QueryError::unsupported(format!(
                "criteria element must be an object, got {}",
                value
            )));
        };

        if is_present(map.get("dataType")) {
            Ok(CriteriaElement::Nested(Box::new(CriteriaNode::from_json(
                value,
            )?)))
        } else if map.get("personalDetails").is_some_and(is_truthy) {
            Ok(CriteriaElement::PersonalDetails(serde_json::from_value(
                value,
            )?))
        } else if is_present(map.get("specializedQuery")) {
            Ok(CriteriaElement::Specialized(serde_json::from_value(value)?))
        } else if map.contains_key("fieldName") {
            Ok(CriteriaElement::Leaf(serde_json::from_value(value)?))
        } else {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            Err(QueryError::unsupported(format!(
                "unrecognized condition marker in element with keys [{}]",
                keys.join(", ")
            )))
        }
    }
}

impl From<LeafCondition> for CriteriaElement {
    fn from(leaf: LeafCondition) -> Self {
        CriteriaElement::Leaf(leaf)
    }
}

impl From<SpecializedCondition> for CriteriaElement {
    fn from(condition: SpecializedCondition) -> Self {
        CriteriaElement::Specialized(condition)
    }
}

impl From<PersonalDetailsCondition> for CriteriaElement {
    fn from(condition: PersonalDetailsCondition) -> Self {
        CriteriaElement::PersonalDetails(condition)
    }
}

impl From<CriteriaNode> for CriteriaElement {
    fn from(node: CriteriaNode) -> Self {
        CriteriaElement::Nested(Box::new(node))
    }
}

/// A test on one attribute of the `metadata` document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafCondition {
    /// Attribute name inside the metadata document.
    pub field_name: String,
    /// Declared attribute type.
    #[serde(default)]
    pub field_type: FieldType,
    /// Comparator, checked against the whitelist before use.
    #[serde(default)]
    pub comparator: String,
    /// Scalar or list value.
    #[serde(default)]
    pub field_value: Value,
    /// Optional unit of measure.
    #[serde(default)]
    pub field_unit: Option<String>,
    /// The value is a list of alternatives.
    #[serde(default)]
    pub is_list: bool,
    /// The attribute is a repeated (array-valued) field.
    #[serde(default)]
    pub is_in_loop: bool,
    /// Text values are stored upper-cased.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl LeafCondition {
    /// Creates a scalar leaf condition.
    pub fn new(
        field_name: impl Into<String>,
        field_type: FieldType,
        comparator: impl Into<String>,
        field_value: impl Into<Value>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            field_type,
            comparator: comparator.into(),
            field_value: field_value.into(),
            field_unit: None,
            is_list: false,
            is_in_loop: false,
            case_insensitive: false,
        }
    }

    /// Sets the unit of measure.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.field_unit = Some(unit.into());
        self
    }

    /// Marks the value as a list of alternatives.
    pub fn as_list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Marks the attribute as a repeated field.
    pub fn in_loop(mut self) -> Self {
        self.is_in_loop = true;
        self
    }

    /// Marks text values as case-insensitive.
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Returns true if a value was supplied.
    pub fn has_value(&self) -> bool {
        !self.field_value.is_null()
    }

    /// Returns true if the value is treated as a list.
    pub fn is_list(&self) -> bool {
        self.is_list || self.field_value.is_array()
    }

    /// Returns the supplied values, flattening a list value.
    pub fn values(&self) -> Vec<&Value> {
        match &self.field_value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// Returns the unit, ignoring empty strings.
    pub fn unit(&self) -> Option<&str> {
        self.field_unit.as_deref().filter(|unit| !unit.is_empty())
    }
}

/// A test on fixed columns of a Subject or Sample.
///
/// Properties are carried by name (`code`, `sex`, `biobank`, `biobankCode`)
/// with an optional `<property>Comparator` companion key. Only the
/// properties catalogued for the entity class are read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecializedCondition {
    /// Entity class whose columns are tested.
    pub specialized_query: Model,
    /// Property values and comparators.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl SpecializedCondition {
    /// Creates an empty condition for an entity class.
    pub fn new(entity: Model) -> Self {
        Self {
            specialized_query: entity,
            properties: Map::new(),
        }
    }

    /// Sets a property value.
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Sets the comparator for a property.
    pub fn with_comparator(mut self, name: &str, comparator: &str) -> Self {
        self.properties
            .insert(comparator_key(name), Value::String(comparator.to_string()));
        self
    }

    /// Returns a property value if it is present and not blank.
    pub fn property(&self, name: &str) -> Option<&Value> {
        lookup_property(&self.properties, name)
    }

    /// Returns the comparator supplied for a property.
    pub fn comparator(&self, name: &str) -> Option<&str> {
        lookup_comparator(&self.properties, name)
    }
}

/// A test on the `personal_details` row linked to a subject.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetailsCondition {
    /// Marker field.
    pub personal_details: bool,
    /// Property values (`surname`, `givenName`, `birthDate`) and comparators.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl PersonalDetailsCondition {
    /// Creates an empty personal details condition.
    pub fn new() -> Self {
        Self {
            personal_details: true,
            properties: Map::new(),
        }
    }

    /// Sets a property value.
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Sets the comparator for a property.
    pub fn with_comparator(mut self, name: &str, comparator: &str) -> Self {
        self.properties
            .insert(comparator_key(name), Value::String(comparator.to_string()));
        self
    }

    /// Returns a property value if it is present and not blank.
    pub fn property(&self, name: &str) -> Option<&Value> {
        lookup_property(&self.properties, name)
    }

    /// Returns the comparator supplied for a property.
    pub fn comparator(&self, name: &str) -> Option<&str> {
        lookup_comparator(&self.properties, name)
    }
}

impl Default for PersonalDetailsCondition {
    fn default() -> Self {
        Self::new()
    }
}

fn comparator_key(property: &str) -> String {
    format!("{}Comparator", property)
}

fn lookup_property<'a>(properties: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    properties.get(name).filter(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    })
}

fn lookup_comparator<'a>(properties: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    properties
        .get(&comparator_key(name))
        .and_then(Value::as_str)
}

fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
