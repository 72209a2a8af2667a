//! # Generator Module
//!
//! Public entry points for turning an annotation tree plus type contracts
//! into an OpenAPI document.
//!
//! ```text
//! caller → DocumentGenerator → IsolationBoundary (opens scope)
//!        → InternalGenerator → DocumentAssembler → PipelineRunner → filters
//!                                                 → SchemaReferenceRegistry
//!        ← OverallGenerationResult (transported out of the scope as JSON)
//! ```
//!
//! ```no_run
//! use annospec::{load_annotations, DocumentGenerator, OutputFormat, SpecVersion};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> anyhow::Result<()> {
//! let annotations = load_annotations(Path::new("api.yaml"))?;
//! let generator = DocumentGenerator::new();
//! let result = generator.generate_serialized_documents(
//!     &annotations,
//!     &[PathBuf::from("contracts/")],
//!     None,
//!     SpecVersion::OpenApi3_0,
//!     OutputFormat::Yaml,
//! )?;
//! if let Some(text) = &result.document {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::annotation::AnnotationElement;
use crate::assembler::DocumentAssembler;
use crate::config::{GenerationConfig, GeneratorSettings};
use crate::error::GenerationError;
use crate::filters::{FilterContext, FilterTable};
use crate::pipeline::PipelineRunner;
use crate::resolver::{ContractLoader, FileContractLoader};
use crate::result::{OverallGenerationResult, OverallGenerationResultSerializedDocument};
use crate::scope::{GenerationScope, IsolationBoundary};
use crate::spec::{OutputFormat, SpecVersion};
use std::path::PathBuf;
use tracing::info;

/// Runs inside a [`GenerationScope`]: wires the scope's resolver and registry
/// into a filter context and assembles the document.
pub struct InternalGenerator<'g> {
    settings: &'g GeneratorSettings,
    filters: &'g FilterTable,
    config: &'g GenerationConfig,
}

impl<'g> InternalGenerator<'g> {
    pub fn new(
        settings: &'g GeneratorSettings,
        filters: &'g FilterTable,
        config: &'g GenerationConfig,
    ) -> Self {
        InternalGenerator {
            settings,
            filters,
            config,
        }
    }

    pub fn generate(
        &self,
        annotation: &AnnotationElement,
        scope: &mut GenerationScope,
    ) -> Result<OverallGenerationResult, GenerationError> {
        let (resolver, registry) = scope.parts();
        let mut ctx = FilterContext {
            resolver,
            registry,
            settings: self.settings,
            config: self.config,
            parameter_filters: &self.filters.parameter,
        };
        DocumentAssembler::new(PipelineRunner::new(self.filters)).assemble(annotation, &mut ctx)
    }
}

/// Generates documents, one isolated scope per call.
///
/// A generator can be shared between threads; concurrent calls get
/// independent scopes.
pub struct DocumentGenerator<L: ContractLoader = FileContractLoader> {
    boundary: IsolationBoundary<L>,
    settings: GeneratorSettings,
    filters: FilterTable,
}

impl Default for DocumentGenerator<FileContractLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentGenerator<FileContractLoader> {
    /// Generator reading contract files from disk with default settings.
    pub fn new() -> Self {
        Self::with_loader(FileContractLoader)
    }
}

impl<L: ContractLoader> DocumentGenerator<L> {
    pub fn with_loader(loader: L) -> Self {
        DocumentGenerator {
            boundary: IsolationBoundary::new(loader),
            settings: GeneratorSettings::default(),
            filters: FilterTable::default(),
        }
    }

    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the filter table, e.g. to drop or reorder filters.
    pub fn with_filters(mut self, filters: FilterTable) -> Self {
        self.filters = filters;
        self
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn boundary(&self) -> &IsolationBoundary<L> {
        &self.boundary
    }

    /// Generates the document model for `annotation`.
    ///
    /// Returns `Err` only when a contract location does not exist. Element
    /// failures and scope faults are reported inside the result.
    pub fn generate_documents(
        &self,
        annotation: &AnnotationElement,
        contracts: &[PathBuf],
        config: Option<&GenerationConfig>,
    ) -> Result<OverallGenerationResult, GenerationError> {
        let default_config = GenerationConfig::default();
        let config = config.unwrap_or(&default_config);
        let internal = InternalGenerator::new(&self.settings, &self.filters, config);

        let result = self
            .boundary
            .run(contracts, |scope| internal.generate(annotation, scope))?;
        info!(
            success = result.is_success(),
            elements = result.operation_results.len(),
            "generation finished"
        );
        Ok(result)
    }

    /// Like [`generate_documents`](Self::generate_documents), with the document
    /// rendered for `version` in `format`.
    pub fn generate_serialized_documents(
        &self,
        annotation: &AnnotationElement,
        contracts: &[PathBuf],
        config: Option<&GenerationConfig>,
        version: SpecVersion,
        format: OutputFormat,
    ) -> Result<OverallGenerationResultSerializedDocument, GenerationError> {
        let result = self.generate_documents(annotation, contracts, config)?;
        result
            .to_serialized(version, format)
            .or_else(|err| {
                let fault = GenerationError::ScopeFault {
                    message: format!("document could not be rendered: {err:#}"),
                };
                OverallGenerationResult::fault(&fault).to_serialized(version, format)
            })
            .map_err(|err| GenerationError::ScopeFault {
                message: format!("{err:#}"),
            })
    }
}
