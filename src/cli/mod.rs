//! # CLI Module
//!
//! Command-line front end for the generator (`annospec-gen`).
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate an OpenAPI document from an annotation tree and type contracts:
//!
//! ```bash
//! annospec-gen generate --annotations api.yaml --contract contracts/ --format yaml
//! ```
//!
//! Options:
//! - `--annotations <FILE>` - Annotation tree, YAML or JSON (required)
//! - `--contract <PATH>` - Contract file or directory, repeatable
//! - `--config <FILE>` - `configuration` tree with document info and common operation annotations
//! - `--settings <FILE>` - Generator settings (default: `annospec.toml` next to the annotations)
//! - `--spec-version <v2|v3>` - Output version (default: v3)
//! - `--format <json|yaml>` - Output format (default: json)
//! - `--output <FILE>` - Write the document to a file instead of stdout
//! - `--report <FILE>` - Write the full generation result as JSON
//! - `--fail-on-error` - Exit non-zero when any element failed
//!
//! A missing contract location aborts before anything is generated. Failures
//! of individual elements are printed to stderr and do not stop the run.
//!
//! ### `inspect`
//!
//! List the operations and type members an annotation tree describes:
//!
//! ```bash
//! annospec-gen inspect --annotations api.yaml
//! ```
//!
//! ## Environment
//!
//! - `ANNOSPEC_MEDIA_TYPE` - overrides the default request body media type
//! - `ANNOSPEC_DOC_VERSION` - overrides the fallback document version
//! - `ANNOSPEC_LOG_*` - logging, see [`crate::logging`]

mod commands;


pub use commands::{
    execute, generate, inspect_operations, run_cli, Cli, Commands, FormatArg, SpecVersionArg,
};
