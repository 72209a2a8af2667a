#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use annospec::cli::{execute, Cli};
use annospec::spec::load_document;
use clap::Parser;
use common::fixtures::{ANNOTATIONS, CONFIG, CONTRACTS};
use common::temp_files::Workspace;
use std::ffi::OsString;
use std::process::Command;

fn exe() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_annospec-gen"));
    command.env("ANNOSPEC_LOG_LEVEL", "error");
    command
}

#[test]
fn test_cli_generate_writes_document_and_report() {
    let workspace = Workspace::new();
    let annotations = workspace.write("api.yaml", ANNOTATIONS);
    let contracts = workspace.write("contracts/contracts.yaml", CONTRACTS);
    let config = workspace.write("config.yaml", CONFIG);
    let output = workspace.path().join("openapi.yaml");
    let report = workspace.path().join("report.json");

    let status = exe()
        .args(["generate", "--annotations"])
        .arg(&annotations)
        .arg("--contract")
        .arg(contracts.parent().unwrap())
        .arg("--config")
        .arg(&config)
        .args(["--format", "yaml", "--output"])
        .arg(&output)
        .arg("--report")
        .arg(&report)
        .status()
        .unwrap();
    assert!(status.success());

    let document = load_document(&output).unwrap();
    assert_eq!(document.info.title, "Configured Sample API");
    assert!(document.paths.contains_key("/V1/samples"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["generation_status"], "failure");
    assert_eq!(report["spec_version"], "OpenApi3_0");
}

#[test]
fn test_cli_fail_on_error_exits_non_zero() {
    let workspace = Workspace::new();
    let annotations = workspace.write("api.yaml", ANNOTATIONS);
    let contracts = workspace.write("contracts.yaml", CONTRACTS);

    let output = exe()
        .args(["generate", "--fail-on-error", "--annotations"])
        .arg(&annotations)
        .arg("--contract")
        .arg(&contracts)
        .output()
        .unwrap();

    assert!(!output.status.success());
    // The document is still printed; failures go to stderr.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"openapi\""));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ApplyParamAsRequestBodyFilter"));
}

#[test]
fn test_cli_missing_contract_fails() {
    let workspace = Workspace::new();
    let annotations = workspace.write("api.yaml", ANNOTATIONS);
    let output = exe()
        .args(["generate", "--annotations"])
        .arg(&annotations)
        .args(["--contract", "/no/such/contracts.yaml"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("contract not found"));
}

#[test]
fn test_cli_inspect_lists_operations() {
    let workspace = Workspace::new();
    let annotations = workspace.write("api.yaml", ANNOTATIONS);
    let output = exe()
        .args(["inspect", "--annotations"])
        .arg(&annotations)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("GET /V1/samples/{id}  M:Sample.Api.SampleController.GetSample"));
    assert!(stdout.contains("schema  T:Contracts.SampleObject"));
}

#[test]
fn test_execute_v2_to_file() {
    let workspace = Workspace::new();
    let annotations = workspace.write("api.yaml", ANNOTATIONS);
    let contracts = workspace.write("contracts.yaml", CONTRACTS);
    let output = workspace.path().join("swagger.json");

    let args: Vec<OsString> = vec![
        "annospec-gen".into(),
        "generate".into(),
        "--annotations".into(),
        annotations.into_os_string(),
        "--contract".into(),
        contracts.into_os_string(),
        "--spec-version".into(),
        "v2".into(),
        "--output".into(),
        output.clone().into_os_string(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();
    execute(&cli).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["swagger"], "2.0");
    assert!(load_document(&output).is_err());
}

#[test]
fn test_settings_file_next_to_annotations_is_used() {
    let workspace = Workspace::new();
    let annotations = workspace.write("api.yaml", ANNOTATIONS);
    let contracts = workspace.write("contracts.yaml", CONTRACTS);
    workspace.write(
        "annospec.toml",
        r#"
default_media_type = "application/vnd.sample+json"

[info]
version = "9.9.9"
"#,
    );

    let result = annospec::cli::generate(
        &annotations,
        &[contracts],
        None,
        None,
        annospec::SpecVersion::OpenApi3_0,
        annospec::OutputFormat::Json,
    )
    .unwrap();
    let back = result.to_overall_generation_result().unwrap();
    let document = back.document().unwrap();
    assert_eq!(document.info.version, "9.9.9");
    let post = document.operation("/V1/samples", &http::Method::POST).unwrap();
    assert!(post
        .request_body
        .as_ref()
        .unwrap()
        .content
        .contains_key("application/vnd.sample+json"));
}
