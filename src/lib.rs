//! # annospec
//!
//! **annospec** turns API annotation trees (structured documentation comments
//! attached to controller methods and contract types) plus type-contract
//! metadata into an [OpenAPI 3.0](https://spec.openapis.org/oas/v3.0.1)
//! document, optionally rendered as Swagger 2.0.
//!
//! ## Architecture
//!
//! - **[`annotation`]** - The annotation tree model and its YAML/JSON loader
//! - **[`resolver`]** - Cross-reference tokens to type metadata ([`resolver::TypeResolver`])
//! - **[`registry`]** - One named component schema per distinct type
//! - **[`filters`]** - Small units that each populate one part of the document
//! - **[`pipeline`]** - Runs ordered filter lists per element, transactionally
//! - **[`assembler`]** - Merges element results into one document
//! - **[`scope`]** - Request-scoped isolation and guaranteed teardown
//! - **[`generator`]** - Public entry points
//! - **[`spec`]** - The OpenAPI document model, rendering and read-back
//! - **[`config`]** - Generator settings and the `configuration` annotation tree
//! - **[`cli`]** / **[`logging`]** - The `annospec-gen` binary
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Gen as DocumentGenerator
//!     participant Scope as IsolationBoundary
//!     participant Asm as DocumentAssembler
//!     participant Pipe as PipelineRunner
//!     participant Reg as SchemaReferenceRegistry
//!
//!     Caller->>Gen: generate_documents(tree, contracts, config)
//!     Gen->>Scope: run(contracts)
//!     Scope->>Scope: check contract locations exist
//!     Scope->>Scope: load contracts into a fresh resolver
//!     Scope->>Asm: assemble(tree)
//!     loop every operation element
//!         Asm->>Pipe: run_operation(element)
//!         Pipe->>Reg: find_or_add_reference(type)
//!         Reg-->>Pipe: $ref or inline schema
//!         Pipe-->>Asm: committed, or failure recorded
//!     end
//!     Asm->>Pipe: run_schema / run_document
//!     Asm-->>Scope: OverallGenerationResult
//!     Scope->>Scope: serialize, tear down scope
//!     Scope-->>Gen: result (deserialized outside the scope)
//!     Gen-->>Caller: OverallGenerationResult
//! ```
//!
//! ## Partial Failure
//!
//! A failing element (unresolvable type, malformed annotation) is recorded in
//! its [`OperationGenerationResult`] and left out of the document; every other
//! element still contributes. Only a missing contract location is returned as
//! `Err`. Panics and fatal errors inside a scope become a failed
//! [`OverallGenerationResult`] with no document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use annospec::{load_annotations, DocumentGenerator};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> anyhow::Result<()> {
//! let tree = load_annotations(Path::new("api.yaml"))?;
//! let result = DocumentGenerator::new().generate_documents(
//!     &tree,
//!     &[PathBuf::from("contracts.yaml")],
//!     None,
//! )?;
//! for failure in result.failures() {
//!     eprintln!("{failure}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Or from the command line:
//!
//! ```bash
//! cargo run --bin annospec-gen -- generate --annotations api.yaml --contract contracts.yaml
//! ```

pub mod annotation;
pub mod assembler;
pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod generator;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod scope;
pub mod spec;

pub use annotation::{load_annotations, parse_annotations, AnnotationElement};
pub use config::{GenerationConfig, GeneratorSettings};
pub use error::{ErrorKind, GenerationError};
pub use generator::DocumentGenerator;
pub use registry::SchemaReferenceRegistry;
pub use resolver::{ContractLoader, ContractTypeResolver, FileContractLoader, TypeResolver};
pub use result::{
    DocumentGenerationResult, FailureRecord, GenerationStatus, OperationGenerationResult,
    OverallGenerationResult, OverallGenerationResultSerializedDocument,
};
pub use scope::IsolationBoundary;
pub use spec::{OpenApiDocument, OutputFormat, SpecVersion};
