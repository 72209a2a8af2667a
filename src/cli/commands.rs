use crate::annotation::{known, load_annotations, AnnotationElement};
use crate::assembler::{operation_elements, type_elements, OperationSite};
use crate::config::{load_generation_config, resolve_settings};
use crate::generator::DocumentGenerator;
use crate::result::OverallGenerationResultSerializedDocument;
use crate::spec::{OutputFormat, SpecVersion};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Command-line interface for annospec
///
/// Generates OpenAPI documents from annotation trees and type contracts.
#[derive(Parser)]
#[command(name = "annospec-gen")]
#[command(about = "annospec OpenAPI document generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands for annospec
#[derive(Subcommand)]
pub enum Commands {
    /// Generate an OpenAPI document
    ///
    /// Runs every annotated operation and type through the filter pipeline.
    /// Elements that fail are reported and left out of the document; the
    /// rest of the document is still written.
    Generate {
        /// Path to the annotation tree (YAML or JSON)
        #[arg(short, long)]
        annotations: PathBuf,

        /// Type contract file or directory (repeatable)
        #[arg(short, long = "contract")]
        contracts: Vec<PathBuf>,

        /// Path to a `configuration` annotation tree (document info, common operation annotations)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to generator settings (annospec.toml)
        /// If not provided, will auto-detect alongside the annotation tree
        #[arg(long)]
        settings: Option<PathBuf>,

        /// OpenAPI version of the written document
        #[arg(long, value_enum, default_value_t = SpecVersionArg::V3)]
        spec_version: SpecVersionArg,

        /// Output format of the written document
        #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the full generation result (statuses, failures, document) as JSON
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit with error code if any element failed
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,
    },
    /// List the operations and types an annotation tree describes
    Inspect {
        /// Path to the annotation tree (YAML or JSON)
        #[arg(short, long)]
        annotations: PathBuf,
    },
}

/// OpenAPI version accepted by `--spec-version`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpecVersionArg {
    /// Swagger 2.0
    V2,
    /// OpenAPI 3.0
    V3,
}

impl From<SpecVersionArg> for SpecVersion {
    fn from(arg: SpecVersionArg) -> Self {
        match arg {
            SpecVersionArg::V2 => SpecVersion::OpenApi2_0,
            SpecVersionArg::V3 => SpecVersion::OpenApi3_0,
        }
    }
}

/// Output format accepted by `--format`
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if:
/// - The annotation tree, settings or configuration cannot be loaded
/// - A contract location does not exist
/// - The document cannot be written
/// - `--fail-on-error` was given and any element failed
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    execute(&cli)?;
    Ok(())
}

/// Runs an already parsed command.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Generate {
            annotations,
            contracts,
            config,
            settings,
            spec_version,
            format,
            output,
            report,
            fail_on_error,
        } => {
            let result = generate(
                annotations,
                contracts,
                config.as_deref(),
                settings.as_deref(),
                (*spec_version).into(),
                (*format).into(),
            )?;

            let failures = print_failures(&result);
            if let Some(report) = report {
                let text = serde_json::to_string_pretty(&result)?;
                std::fs::write(report, text)
                    .with_context(|| format!("Failed to write report: {}", report.display()))?;
            }
            match (&result.document, output) {
                (Some(document), Some(path)) => {
                    std::fs::write(path, document)
                        .with_context(|| format!("Failed to write document: {}", path.display()))?;
                    println!("✅ Wrote {}", path.display());
                }
                (Some(document), None) => println!("{document}"),
                (None, _) => anyhow::bail!("generation faulted; no document was produced"),
            }

            if *fail_on_error && failures > 0 {
                anyhow::bail!("generation finished with {failures} failed element(s)");
            }
            Ok(())
        }
        Commands::Inspect { annotations } => {
            let tree = load_annotations(annotations)?;
            for line in inspect_operations(&tree) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Loads inputs and runs one generation request.
pub fn generate(
    annotations: &Path,
    contracts: &[PathBuf],
    config: Option<&Path>,
    settings: Option<&Path>,
    version: SpecVersion,
    format: OutputFormat,
) -> anyhow::Result<OverallGenerationResultSerializedDocument> {
    let tree = load_annotations(annotations)?;
    let settings = resolve_settings(settings, annotations)?;
    let config = config.map(load_generation_config).transpose()?;

    let generator = DocumentGenerator::new().with_settings(settings);
    let result = generator.generate_serialized_documents(
        &tree,
        contracts,
        config.as_ref(),
        version,
        format,
    )?;
    Ok(result)
}

fn print_failures(result: &OverallGenerationResultSerializedDocument) -> usize {
    let records: Vec<_> = result
        .operation_results
        .iter()
        .filter_map(|r| r.failure.as_ref())
        .chain(result.document_failures.iter())
        .collect();
    for record in &records {
        eprintln!("❌ {record}");
    }
    if !records.is_empty() {
        eprintln!("{} element(s) failed", records.len());
    }
    records.len()
}

/// One line per operation (`GET /path  member`) followed by one per type member.
pub fn inspect_operations(tree: &AnnotationElement) -> Vec<String> {
    let member_name = |e: &AnnotationElement| {
        e.attribute(known::NAME)
            .unwrap_or("<unnamed>")
            .to_string()
    };

    let mut lines: Vec<String> = operation_elements(tree)
        .into_iter()
        .map(|element| match OperationSite::from_element(element) {
            Ok(site) => format!("{}  {}", site.identity, member_name(element)),
            Err(err) => format!("<invalid: {err}>  {}", member_name(element)),
        })
        .collect();
    lines.extend(
        type_elements(tree)
            .into_iter()
            .map(|element| format!("schema  {}", member_name(element))),
    );
    lines
}
