//! # Pipeline Module
//!
//! Applies ordered filter lists to annotation elements.
//!
//! Filters of one element run sequentially in declared order, each seeing the
//! mutations of the ones before it. They work on a copy of the target that is
//! committed only when every filter succeeded, so a failing element leaves the
//! document exactly as it found it.
//!
//! A failure is recorded against the element and the runner moves on; the
//! caller continues with the next element. Fatal errors
//! ([`GenerationError::is_fatal`]) are returned instead of recorded.

use crate::annotation::AnnotationElement;
use crate::assembler::OperationSite;
use crate::error::GenerationError;
use crate::filters::{FilterContext, FilterTable, NamedFilter};
use crate::result::FailureRecord;
use crate::spec::{OpenApiDocument, Operation};
use tracing::warn;

/// Outcome of running one element through a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementOutcome {
    Succeeded,
    Failed(FailureRecord),
}

impl ElementOutcome {
    pub fn failure(self) -> Option<FailureRecord> {
        match self {
            ElementOutcome::Succeeded => None,
            ElementOutcome::Failed(record) => Some(record),
        }
    }
}

/// Runs `filters` over a working copy of `target`, committing it on success.
pub fn run_filters<F, T>(
    filters: &[F],
    target: &mut T,
    element: &AnnotationElement,
    mut apply: impl FnMut(&F, &mut T) -> Result<(), GenerationError>,
) -> Result<ElementOutcome, GenerationError>
where
    F: NamedFilter,
    T: Clone,
{
    let mut working = target.clone();
    for filter in filters {
        match apply(filter, &mut working) {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(
                    filter = filter.name(),
                    location = %element.diagnostic_location(),
                    error = %err,
                    "filter failed; element skipped"
                );
                return Ok(ElementOutcome::Failed(FailureRecord::new(
                    &err,
                    Some(filter.name()),
                    Some(element),
                )));
            }
        }
    }
    *target = working;
    Ok(ElementOutcome::Succeeded)
}

/// Applies a [`FilterTable`] to operation, type and document elements.
#[derive(Debug, Clone, Copy)]
pub struct PipelineRunner<'t> {
    table: &'t FilterTable,
}

impl<'t> PipelineRunner<'t> {
    pub fn new(table: &'t FilterTable) -> Self {
        PipelineRunner { table }
    }

    pub fn table(&self) -> &'t FilterTable {
        self.table
    }

    /// Preprocesses a copy of `element`, then runs the operation filters on `operation`.
    ///
    /// `operation` may already hold what an earlier annotation produced for the
    /// same path and verb; the filters merge into it.
    pub fn run_operation(
        &self,
        element: &AnnotationElement,
        operation: &mut Operation,
        site: &OperationSite,
        ctx: &mut FilterContext<'_>,
    ) -> Result<ElementOutcome, GenerationError> {
        let mut normalized = element.clone();
        let outcome = run_filters(&self.table.preprocessing, &mut normalized, element, |f, e| {
            f.apply(e, Some(&site.url))
        })?;
        if let ElementOutcome::Failed(_) = outcome {
            return Ok(outcome);
        }

        run_filters(&self.table.operation, operation, element, |f, op| {
            f.apply(op, &normalized, site, ctx)
        })
    }

    pub fn run_schema(
        &self,
        element: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<ElementOutcome, GenerationError> {
        for filter in &self.table.schema {
            match filter.apply(element, ctx) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(filter = filter.name(), error = %err, "schema filter failed");
                    return Ok(ElementOutcome::Failed(FailureRecord::new(
                        &err,
                        Some(filter.name()),
                        Some(element),
                    )));
                }
            }
        }
        Ok(ElementOutcome::Succeeded)
    }

    pub fn run_document(
        &self,
        document: &mut OpenApiDocument,
        root: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<ElementOutcome, GenerationError> {
        run_filters(&self.table.document, document, root, |f, doc| f.apply(doc, root, ctx))
    }
}
