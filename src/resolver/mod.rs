//! # Type Resolver Module
//!
//! Turns cross-reference tokens into canonical type metadata. The generation
//! core only depends on the [`TypeResolver`] capability; how metadata is found
//! is the resolver's business. [`ContractTypeResolver`] is the file-backed
//! implementation used by the CLI and the default isolation boundary.

mod contract;
mod types;

pub use contract::*;
pub use types::*;

use crate::error::GenerationError;
use std::path::PathBuf;

/// Resolves reference tokens to type metadata.
pub trait TypeResolver {
    /// Resolves a parsed identity.
    fn resolve_identity(&self, identity: &TypeIdentity) -> Result<ResolvedType, GenerationError>;

    fn resolve(&self, reference: &TypeReference) -> Result<ResolvedType, GenerationError> {
        self.resolve_identity(&reference.identity()?)
    }

    /// Unifies several listed references into one type.
    ///
    /// A single token resolves directly. With several, the first names a
    /// generic definition and the rest fill its parameters in order.
    fn resolve_all(&self, references: &[TypeReference]) -> Result<ResolvedType, GenerationError> {
        match references {
            [] => Err(GenerationError::resolution("", "no type reference listed")),
            [single] => self.resolve(single),
            [definition, args @ ..] => {
                let outer = definition.identity()?;
                if outer.is_generic() {
                    let listed: Vec<_> = references.iter().map(TypeReference::as_str).collect();
                    return Err(GenerationError::resolution(
                        listed.join(", "),
                        "several types listed but the first is not an open generic definition",
                    ));
                }
                let args = args
                    .iter()
                    .map(TypeReference::identity)
                    .collect::<Result<Vec<_>, _>>()?;
                self.resolve_identity(&TypeIdentity::with_args(outer.name(), args))
            }
        }
    }

    /// Releases any loaded metadata. Called once at scope teardown.
    fn unload(&mut self) {}

    /// Number of type definitions currently loaded.
    fn loaded_type_count(&self) -> usize {
        0
    }
}

/// Loads type-contract locations into a resolver for one generation scope.
pub trait ContractLoader: Send + Sync {
    fn load(&self, paths: &[PathBuf]) -> anyhow::Result<Box<dyn TypeResolver>>;
}

/// Loads YAML/JSON contract files (or directories of them) from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContractLoader;

impl ContractLoader for FileContractLoader {
    fn load(&self, paths: &[PathBuf]) -> anyhow::Result<Box<dyn TypeResolver>> {
        Ok(Box::new(ContractTypeResolver::from_paths(paths)?))
    }
}
