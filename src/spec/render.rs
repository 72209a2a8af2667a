use super::schema::{SchemaReference, COMPONENT_SCHEMA_PREFIX};
use super::types::{OpenApiDocument, Operation, ParameterLocation, OPENAPI_VERSION};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Specification version of the rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecVersion {
    /// Swagger 2.0
    OpenApi2_0,
    /// OpenAPI 3.0
    #[default]
    OpenApi3_0,
}

impl FromStr for SpecVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "2.0" | "v2" | "swagger" => Ok(SpecVersion::OpenApi2_0),
            "3" | "3.0" | "v3" | "openapi" => Ok(SpecVersion::OpenApi3_0),
            other => Err(format!("unknown spec version '{other}' (expected v2 or v3)")),
        }
    }
}

/// Text format of the rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format '{other}' (expected json or yaml)")),
        }
    }
}

/// Renders the document to a JSON value shaped for `version`.
pub fn render_value(document: &OpenApiDocument, version: SpecVersion) -> anyhow::Result<Value> {
    match version {
        SpecVersion::OpenApi3_0 => {
            let mut value = serde_json::to_value(document).context("document is not serializable")?;
            value["openapi"] = Value::String(OPENAPI_VERSION.to_string());
            Ok(value)
        }
        SpecVersion::OpenApi2_0 => render_swagger(document),
    }
}

/// Renders the document to text.
pub fn render(
    document: &OpenApiDocument,
    version: SpecVersion,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let value = render_value(document, version)?;
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&value)?,
        OutputFormat::Yaml => serde_yaml::to_string(&value)?,
    };
    Ok(text)
}

fn render_swagger(document: &OpenApiDocument) -> anyhow::Result<Value> {
    let mut root = Map::new();
    root.insert("swagger".into(), json!("2.0"));
    root.insert(
        "info".into(),
        serde_json::to_value(&document.info).context("info is not serializable")?,
    );

    if let Some(server) = document.servers.first() {
        if let Ok(parsed) = url::Url::parse(&server.url) {
            if let Some(host) = parsed.host_str() {
                let host = match parsed.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                root.insert("host".into(), json!(host));
            }
            let base_path = parsed.path().trim_end_matches('/');
            if !base_path.is_empty() {
                root.insert("basePath".into(), json!(base_path));
            }
            root.insert("schemes".into(), json!([parsed.scheme()]));
        }
    }

    let mut paths = Map::new();
    for (path, item) in &document.paths {
        let mut verbs = Map::new();
        for (verb, operation) in &item.operations {
            verbs.insert(verb.clone(), swagger_operation(operation)?);
        }
        paths.insert(path.clone(), Value::Object(verbs));
    }
    root.insert("paths".into(), Value::Object(paths));

    if !document.components.is_empty() {
        root.insert(
            "definitions".into(),
            serde_json::to_value(&document.components.schemas)
                .context("schemas are not serializable")?,
        );
    }

    let mut value = Value::Object(root);
    rewrite_refs(&mut value, COMPONENT_SCHEMA_PREFIX, DEFINITIONS_PREFIX);
    Ok(value)
}

fn swagger_operation(operation: &Operation) -> anyhow::Result<Value> {
    let mut out = Map::new();
    if !operation.tags.is_empty() {
        out.insert("tags".into(), json!(operation.tags));
    }
    if let Some(summary) = &operation.summary {
        out.insert("summary".into(), json!(summary));
    }
    if let Some(description) = &operation.description {
        out.insert("description".into(), json!(description));
    }
    if let Some(id) = &operation.operation_id {
        out.insert("operationId".into(), json!(id));
    }

    let mut parameters = Vec::new();
    for parameter in &operation.parameters {
        let mut p = Map::new();
        p.insert("name".into(), json!(parameter.name));
        p.insert("in".into(), json!(parameter.location.as_str()));
        if let Some(description) = &parameter.description {
            p.insert("description".into(), json!(description));
        }
        let required = parameter.required || parameter.location == ParameterLocation::Path;
        p.insert("required".into(), json!(required));
        // Non-body parameters carry their type inline in 2.0.
        match parameter.schema.as_ref().and_then(SchemaReference::as_inline) {
            Some(schema) => {
                let schema_value = serde_json::to_value(schema)?;
                if let Value::Object(fields) = schema_value {
                    for key in ["type", "format", "items", "enum"] {
                        if let Some(v) = fields.get(key) {
                            p.insert(key.into(), v.clone());
                        }
                    }
                }
                if !p.contains_key("type") {
                    p.insert("type".into(), json!("string"));
                }
            }
            None => {
                p.insert("type".into(), json!("string"));
            }
        }
        parameters.push(Value::Object(p));
    }

    if let Some(body) = &operation.request_body {
        if let Some((media_type, media)) = body.content.iter().next() {
            let mut p = Map::new();
            p.insert("name".into(), json!("body"));
            p.insert("in".into(), json!("body"));
            if let Some(description) = &body.description {
                p.insert("description".into(), json!(description));
            }
            p.insert("required".into(), json!(body.required));
            if let Some(schema) = &media.schema {
                p.insert("schema".into(), serde_json::to_value(schema)?);
            }
            parameters.push(Value::Object(p));
            out.insert("consumes".into(), json!([media_type]));
        }
    }
    if !parameters.is_empty() {
        out.insert("parameters".into(), Value::Array(parameters));
    }

    let mut produces: Vec<&str> = Vec::new();
    let mut responses = Map::new();
    for (code, response) in &operation.responses {
        let mut r = Map::new();
        r.insert("description".into(), json!(response.description));
        if let Some((media_type, media)) = response.content.iter().next() {
            if !produces.contains(&media_type.as_str()) {
                produces.push(media_type);
            }
            if let Some(schema) = &media.schema {
                r.insert("schema".into(), serde_json::to_value(schema)?);
            }
        }
        responses.insert(code.clone(), Value::Object(r));
    }
    if !produces.is_empty() {
        out.insert("produces".into(), json!(produces));
    }
    out.insert("responses".into(), Value::Object(responses));

    Ok(Value::Object(out))
}

/// Rewrites every `$ref` string that starts with `from` to start with `to`.
pub fn rewrite_refs(value: &mut Value, from: &str, to: &str) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(ref_path)) = obj.get_mut("$ref") {
                if let Some(name) = ref_path.strip_prefix(from) {
                    *ref_path = format!("{to}{name}");
                }
            }
            for v in obj.values_mut() {
                rewrite_refs(v, from, to);
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                rewrite_refs(v, from, to);
            }
        }
        _ => {}
    }
}
