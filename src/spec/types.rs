use super::schema::{Schema, SchemaReference};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version string written into 3.0 documents.
pub const OPENAPI_VERSION: &str = "3.0.1";

fn is_false(value: &bool) -> bool {
    !*value
}

/// Sets `field` to `value` only when it is currently empty or blank.
///
/// Returns whether the field was written.
pub fn fill_if_empty(field: &mut Option<String>, value: &str) -> bool {
    let empty = field.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
    if empty && !value.trim().is_empty() {
        *field = Some(value.to_string());
        true
    } else {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "Path"),
            ParameterLocation::Query => write!(f, "Query"),
            ParameterLocation::Header => write!(f, "Header"),
            ParameterLocation::Cookie => write!(f, "Cookie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaReference>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Parameter {
            name: name.into(),
            location,
            description: None,
            required: false,
            schema: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaReference>,
}

impl MediaType {
    /// Attaches a schema, merging into `anyOf` when one is already present.
    pub fn add_schema(&mut self, schema: SchemaReference) {
        self.schema = Some(match self.schema.take() {
            None => schema,
            Some(existing) => existing.with_alternative(schema),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

impl RequestBody {
    pub fn new(media_type: &str, schema: SchemaReference, description: &str) -> Self {
        let mut body = RequestBody {
            required: true,
            ..Default::default()
        };
        fill_if_empty(&mut body.description, description);
        body.content.insert(
            media_type.to_string(),
            MediaType {
                schema: Some(schema),
            },
        );
        body
    }

    /// Merges another declared body shape into this one.
    ///
    /// Existing schemas are kept; the new one becomes an additional `anyOf`
    /// alternative. The description is only written while still empty.
    pub fn merge(&mut self, media_type: &str, schema: SchemaReference, description: &str) {
        fill_if_empty(&mut self.description, description);
        self.content
            .entry(media_type.to_string())
            .or_default()
            .add_schema(schema);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

impl Operation {
    pub fn parameter(&self, name: &str, location: ParameterLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    /// Adds a parameter unless one with the same name and location exists.
    pub fn add_parameter(&mut self, parameter: Parameter) -> bool {
        if self.parameter(&parameter.name, parameter.location).is_some() {
            return false;
        }
        self.parameters.push(parameter);
        true
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }
}

/// Operations of one path, keyed by lower-case HTTP verb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(flatten)]
    pub operations: BTreeMap<String, Operation>,
}

impl PathItem {
    pub fn get(&self, method: &Method) -> Option<&Operation> {
        self.operations.get(&method.as_str().to_ascii_lowercase())
    }

    pub fn insert(&mut self, method: &Method, operation: Operation) {
        self.operations
            .insert(method.as_str().to_ascii_lowercase(), operation);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// The OpenAPI-shaped document produced by one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

impl Default for OpenApiDocument {
    fn default() -> Self {
        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            paths: BTreeMap::new(),
            components: Components::default(),
        }
    }
}

impl OpenApiDocument {
    pub fn operation(&self, path: &str, method: &Method) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.get(method))
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|p| p.operations.len()).sum()
    }

    pub fn add_server(&mut self, url: &str) -> bool {
        if self.servers.iter().any(|s| s.url == url) {
            return false;
        }
        self.servers.push(Server {
            url: url.to_string(),
            description: None,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SchemaReference;

    #[test]
    fn test_parameters_unique_by_name_and_location() {
        let mut op = Operation::default();
        assert!(op.add_parameter(Parameter::new("id", ParameterLocation::Path)));
        assert!(!op.add_parameter(Parameter::new("id", ParameterLocation::Path)));
        assert!(op.add_parameter(Parameter::new("id", ParameterLocation::Query)));
        assert_eq!(op.parameters.len(), 2);
    }

    #[test]
    fn test_request_body_merge_keeps_first_description() {
        let mut body = RequestBody::new("application/json", SchemaReference::component("A"), "");
        assert!(body.description.is_none());
        body.merge("application/json", SchemaReference::component("B"), "second");
        assert_eq!(body.description.as_deref(), Some("second"));
        body.merge("application/json", SchemaReference::component("C"), "third");
        assert_eq!(body.description.as_deref(), Some("second"));

        let schema = body.content["application/json"].schema.as_ref().unwrap();
        let names: Vec<_> = schema
            .alternatives()
            .into_iter()
            .filter_map(SchemaReference::component_name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(body.required);
    }

    #[test]
    fn test_path_item_keys_are_lowercase_verbs() {
        let mut item = PathItem::default();
        item.insert(&Method::POST, Operation::default());
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("post").is_some());
        assert!(item.get(&Method::POST).is_some());
    }
}
