//! # Scope Module
//!
//! Request-scoped isolation for document generation.
//!
//! A [`GenerationScope`] owns everything one request loads or builds: the
//! type resolver with its loaded contract metadata and the reference
//! registries. Dropping the scope unloads the resolver, so teardown happens on
//! every exit path, including unwinding out of a panicking filter.
//!
//! An [`IsolationBoundary`] opens one scope per request:
//!
//! 1. every contract location must exist, otherwise the request fails with
//!    [`GenerationError::ContractNotFound`] before a scope is opened
//! 2. contracts are loaded into a fresh resolver owned by the new scope
//! 3. the request body runs inside the scope under `catch_unwind`
//! 4. the result is serialized to JSON while the scope is still alive and
//!    deserialized outside it, so nothing scope-owned escapes
//! 5. any fault becomes a top-level failed [`OverallGenerationResult`]

use crate::error::GenerationError;
use crate::registry::{ReferenceRegistryManager, SchemaReferenceRegistry};
use crate::resolver::{ContractLoader, FileContractLoader, TypeResolver};
use crate::result::OverallGenerationResult;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info_span, warn};

/// Owner of one request's resolver and registries.
pub struct GenerationScope {
    id: u64,
    resolver: Box<dyn TypeResolver>,
    registries: ReferenceRegistryManager,
    closed: Arc<AtomicUsize>,
}

impl GenerationScope {
    fn open(id: u64, resolver: Box<dyn TypeResolver>, closed: Arc<AtomicUsize>) -> Self {
        debug!(scope_id = id, types = resolver.loaded_type_count(), "generation scope opened");
        GenerationScope {
            id,
            resolver,
            registries: ReferenceRegistryManager::new(),
            closed,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    pub fn registries(&self) -> &ReferenceRegistryManager {
        &self.registries
    }

    /// Resolver and schema registry, borrowed together for a filter context.
    pub fn parts(&mut self) -> (&dyn TypeResolver, &mut SchemaReferenceRegistry) {
        (self.resolver.as_ref(), self.registries.schema_registry_mut())
    }
}

impl Drop for GenerationScope {
    fn drop(&mut self) {
        self.resolver.unload();
        self.closed.fetch_add(1, Ordering::SeqCst);
        debug!(
            scope_id = self.id,
            schemas = self.registries.schema_registry().len(),
            "generation scope closed"
        );
    }
}

/// Runs requests in disposable [`GenerationScope`]s and accounts for them.
///
/// Independent requests may run concurrently on one boundary; scopes share
/// nothing but the counters.
pub struct IsolationBoundary<L: ContractLoader = FileContractLoader> {
    loader: L,
    next_id: AtomicU64,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl Default for IsolationBoundary<FileContractLoader> {
    fn default() -> Self {
        Self::new(FileContractLoader)
    }
}

impl<L: ContractLoader> IsolationBoundary<L> {
    pub fn new(loader: L) -> Self {
        IsolationBoundary {
            loader,
            next_id: AtomicU64::new(1),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened_scopes(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed_scopes(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Scopes opened and not yet torn down.
    pub fn active_scopes(&self) -> usize {
        self.opened_scopes().saturating_sub(self.closed_scopes())
    }

    /// Fails on the first contract location that does not exist.
    pub fn check_contracts(contracts: &[PathBuf]) -> Result<(), GenerationError> {
        match contracts.iter().find(|path| !path.exists()) {
            Some(missing) => Err(GenerationError::ContractNotFound {
                path: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Runs `body` in a fresh scope over `contracts`.
    ///
    /// Only the contract precondition is returned as `Err`. Every other
    /// failure, including a panic inside `body`, comes back as a failed result.
    pub fn run<F>(
        &self,
        contracts: &[PathBuf],
        body: F,
    ) -> Result<OverallGenerationResult, GenerationError>
    where
        F: FnOnce(&mut GenerationScope) -> Result<OverallGenerationResult, GenerationError>,
    {
        Self::check_contracts(contracts)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<String, GenerationError> {
            let span = info_span!("generation", scope_id = id);
            let _enter = span.enter();

            let resolver = self.loader.load(contracts).map_err(|err| GenerationError::ScopeFault {
                message: format!("failed to load contracts: {err:#}"),
            })?;
            self.opened.fetch_add(1, Ordering::SeqCst);
            let mut scope = GenerationScope::open(id, resolver, Arc::clone(&self.closed));

            let result = body(&mut scope)?;
            serde_json::to_string(&result).map_err(|err| GenerationError::ScopeFault {
                message: format!("result could not be serialized: {err}"),
            })
        }));

        let transport = match outcome {
            Ok(Ok(transport)) => transport,
            Ok(Err(err)) => {
                warn!(scope_id = id, error = %err, "generation request failed");
                return Ok(OverallGenerationResult::fault(&err));
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(scope_id = id, panic_message = %message, "generation scope panicked");
                return Ok(OverallGenerationResult::fault(&GenerationError::ScopeFault {
                    message,
                }));
            }
        };

        Ok(serde_json::from_str(&transport).unwrap_or_else(|err| {
            OverallGenerationResult::fault(&GenerationError::ScopeFault {
                message: format!("result could not be read back: {err}"),
            })
        }))
    }
}
