use super::render::OutputFormat;
use super::types::OpenApiDocument;
use anyhow::Context;
use oas3::OpenApiV3Spec;
use std::path::Path;

fn parse_value(text: &str, format: OutputFormat) -> anyhow::Result<serde_json::Value> {
    let value = match format {
        OutputFormat::Json => serde_json::from_str(text).context("document is not valid JSON")?,
        OutputFormat::Yaml => serde_yaml::from_str(text).context("document is not valid YAML")?,
    };
    Ok(value)
}

/// Parses a rendered 3.0 document back into the in-memory model.
pub fn parse_document(text: &str, format: OutputFormat) -> anyhow::Result<OpenApiDocument> {
    let value = parse_value(text, format)?;
    if value.get("swagger").is_some() {
        anyhow::bail!("only OpenAPI 3.0 documents can be read back into the document model");
    }
    serde_json::from_value(value).context("document does not match the OpenAPI 3.0 model")
}

/// Reads rendered 3.0 text through `oas3`, as a consumer of the output would.
pub fn read_back(text: &str, format: OutputFormat) -> anyhow::Result<OpenApiV3Spec> {
    let value = parse_value(text, format)?;
    serde_json::from_value(value).context("document is not readable as OpenAPI 3")
}

/// Loads a previously written 3.0 document, choosing the format by extension.
pub fn load_document(path: &Path) -> anyhow::Result<OpenApiDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => OutputFormat::Yaml,
        _ => OutputFormat::Json,
    };
    parse_document(&content, format).with_context(|| format!("Failed to parse {}", path.display()))
}
