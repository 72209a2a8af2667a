use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference prefix of component schemas in a 3.0 document.
pub const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

/// Structural description of a value: primitive, object, array, or `anyOf` composition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaReference>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaReference>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaReference>,
}

impl Schema {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Schema {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type(SchemaType::String)
    }

    pub fn array(items: SchemaReference) -> Self {
        Schema {
            schema_type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn any_of(alternatives: Vec<SchemaReference>) -> Self {
        Schema {
            any_of: alternatives,
            ..Default::default()
        }
    }

    pub fn is_composition(&self) -> bool {
        !self.any_of.is_empty()
    }
}

/// Either an inline schema or a pointer to a registry-owned component schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaReference {
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Inline(Box<Schema>),
}

impl SchemaReference {
    pub fn component(name: &str) -> Self {
        SchemaReference::Reference {
            ref_path: format!("{COMPONENT_SCHEMA_PREFIX}{name}"),
        }
    }

    pub fn inline(schema: Schema) -> Self {
        SchemaReference::Inline(Box::new(schema))
    }

    /// Component name this reference points at, if it is a pointer.
    pub fn component_name(&self) -> Option<&str> {
        match self {
            SchemaReference::Reference { ref_path } => {
                ref_path.strip_prefix(COMPONENT_SCHEMA_PREFIX)
            }
            SchemaReference::Inline(_) => None,
        }
    }

    pub fn as_inline(&self) -> Option<&Schema> {
        match self {
            SchemaReference::Inline(schema) => Some(schema),
            SchemaReference::Reference { .. } => None,
        }
    }

    pub fn as_inline_mut(&mut self) -> Option<&mut Schema> {
        match self {
            SchemaReference::Inline(schema) => Some(schema),
            SchemaReference::Reference { .. } => None,
        }
    }

    /// The alternatives this schema accepts: its `anyOf` list, or itself.
    pub fn alternatives(&self) -> Vec<&SchemaReference> {
        match self.as_inline() {
            Some(schema) if schema.is_composition() => schema.any_of.iter().collect(),
            _ => vec![self],
        }
    }

    /// Adds `other` as an `anyOf` alternative without dropping anything already held.
    ///
    /// A single schema is first upgraded to a one-element `anyOf`. An
    /// alternative that is already present is not added twice.
    pub fn with_alternative(self, other: SchemaReference) -> SchemaReference {
        if self.alternatives().contains(&&other) {
            return self;
        }
        match self {
            SchemaReference::Inline(mut schema) if schema.is_composition() => {
                schema.any_of.push(other);
                SchemaReference::Inline(schema)
            }
            single => SchemaReference::inline(Schema::any_of(vec![single, other])),
        }
    }
}
