#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use annospec::spec::{read_back, render_value};
use annospec::{
    DocumentGenerator, OutputFormat, OverallGenerationResultSerializedDocument, SpecVersion,
};
use common::fixtures::{annotations, CONTRACTS};
use common::temp_files::Workspace;
use serde_json::Value;

fn serialized(version: SpecVersion, format: OutputFormat) -> OverallGenerationResultSerializedDocument {
    let workspace = Workspace::new();
    let contracts = workspace.write("contracts.yaml", CONTRACTS);
    DocumentGenerator::new()
        .generate_serialized_documents(&annotations(), &[contracts], None, version, format)
        .unwrap()
}

#[test]
fn test_v3_json_is_readable_by_oas3() {
    let result = serialized(SpecVersion::OpenApi3_0, OutputFormat::Json);
    let text = result.document.as_deref().unwrap();

    let spec = read_back(text, OutputFormat::Json).unwrap();
    assert_eq!(spec.openapi, "3.0.1");
    assert_eq!(spec.info.title, "Sample.Api");
    let paths = spec.paths.unwrap();
    assert!(paths.contains_key("/V1/samples/{id}"));
    assert!(paths.contains_key("/V1/samples"));
    assert!(spec.components.unwrap().schemas.contains_key("SampleObject"));
}

#[test]
fn test_v3_yaml_converts_back_into_the_model() {
    let workspace = Workspace::new();
    let contracts = workspace.write("contracts.yaml", CONTRACTS);
    let generator = DocumentGenerator::new();
    let direct = generator
        .generate_documents(&annotations(), std::slice::from_ref(&contracts), None)
        .unwrap();
    let serialized = generator
        .generate_serialized_documents(
            &annotations(),
            &[contracts],
            None,
            SpecVersion::OpenApi3_0,
            OutputFormat::Yaml,
        )
        .unwrap();

    let text = serialized.document.as_deref().unwrap();
    assert!(text.starts_with("openapi:") || text.contains("\nopenapi:"));
    assert_eq!(serialized.to_overall_generation_result().unwrap(), direct);
    assert_eq!(serialized.operation_results, direct.operation_results);
    assert!(!serialized.is_success());
}

#[test]
fn test_v2_output_uses_swagger_layout() {
    let result = serialized(SpecVersion::OpenApi2_0, OutputFormat::Json);
    let doc: Value = serde_json::from_str(result.document.as_deref().unwrap()).unwrap();

    assert_eq!(doc["swagger"], "2.0");
    assert_eq!(doc["host"], "localhost:9000");
    assert_eq!(doc["schemes"][0], "http");
    assert!(doc.get("components").is_none());
    assert!(doc["definitions"]["SampleObject"].is_object());

    let post = &doc["paths"]["/V1/samples"]["post"];
    assert_eq!(post["consumes"][0], "application/json");
    let body = post["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["in"] == "body")
        .unwrap();
    assert_eq!(body["required"], true);
    let alternatives = body["schema"]["anyOf"].as_array().unwrap();
    assert_eq!(alternatives[0]["$ref"], "#/definitions/SampleObject");

    let get = &doc["paths"]["/V1/samples/{id}"]["get"];
    let id = get["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "id")
        .unwrap();
    assert_eq!(id["in"], "path");
    assert_eq!(id["type"], "string");
    assert!(id.get("schema").is_none());
    assert_eq!(get["responses"]["200"]["schema"]["$ref"], "#/definitions/SampleObject");

    assert!(!result.document.as_deref().unwrap().contains("#/components/schemas/"));
}

#[test]
fn test_v2_result_cannot_be_read_back() {
    let result = serialized(SpecVersion::OpenApi2_0, OutputFormat::Yaml);
    let text = result.document.as_deref().unwrap();
    assert!(text.contains("swagger:"));
    assert!(text.contains("definitions:"));
    assert!(result.to_document_generation_result().is_err());
}

#[test]
fn test_render_value_sets_openapi_version() {
    let result = serialized(SpecVersion::OpenApi3_0, OutputFormat::Json);
    let back = result.to_overall_generation_result().unwrap();
    let value = render_value(back.document().unwrap(), SpecVersion::OpenApi3_0).unwrap();
    assert_eq!(value["openapi"], "3.0.1");
    assert_eq!(
        value["components"]["schemas"]["SampleObjectV2"]["properties"]["parent"]["anyOf"][0]["$ref"],
        "#/components/schemas/SampleObject"
    );
    assert_eq!(
        value["components"]["schemas"]["SampleObjectV2"]["properties"]["parent"]["nullable"],
        true
    );
}
