//! # Filters Module
//!
//! A filter inspects one annotation element and mutates one part of the
//! document model. Filters are grouped by the kind of node they mutate:
//!
//! | Kind | Target | Source element |
//! |------|--------|----------------|
//! | [`PreprocessingFilter`] | working copy of an operation element | itself |
//! | [`OperationFilter`] | [`Operation`](crate::spec::Operation) | operation element or common config annotations |
//! | [`ParameterFilter`] | [`Parameter`](crate::spec::Parameter) | one `param` element |
//! | [`SchemaFilter`] | registry-owned component schemas | `T:`/`P:` member element |
//! | [`DocumentFilter`] | [`OpenApiDocument`](crate::spec::OpenApiDocument) | annotation root |
//!
//! Each kind is a closed enum dispatched by `match`; the order filters run in
//! is the order of the lists in [`FilterTable`].
//!
//! Every filter follows the same mutation rule: a populated field is never
//! overwritten. Filters fill empty fields and add missing entries, and schema
//! slots that already hold a value gain an `anyOf` alternative instead of
//! being replaced. This is what makes it safe to run the same filters again
//! when a later annotation describes an operation that already exists.

mod document;
mod operation;
mod parameter;
mod preprocess;
mod schema;

pub use document::DocumentFilter;
pub use operation::OperationFilter;
pub use parameter::ParameterFilter;
pub use preprocess::PreprocessingFilter;
pub use schema::SchemaFilter;

use crate::annotation::AnnotationElement;
use crate::config::{GenerationConfig, GeneratorSettings};
use crate::error::GenerationError;
use crate::registry::SchemaReferenceRegistry;
use crate::resolver::{TypeReference, TypeResolver};
use crate::spec::SchemaReference;

/// Everything a filter may consult besides its target and source element.
pub struct FilterContext<'a> {
    pub resolver: &'a dyn TypeResolver,
    pub registry: &'a mut SchemaReferenceRegistry,
    pub settings: &'a GeneratorSettings,
    pub config: &'a GenerationConfig,
    /// Run by the param operation filters on every parameter they touch.
    pub parameter_filters: &'a [ParameterFilter],
}

impl FilterContext<'_> {
    /// Resolves crefs listed by an annotation into a schema reference.
    pub fn schema_for_crefs(&mut self, crefs: &[&str]) -> Result<SchemaReference, GenerationError> {
        let references: Vec<TypeReference> = crefs.iter().map(|c| TypeReference::new(*c)).collect();
        self.registry
            .find_or_add_for_references(&references, self.resolver)
    }
}

/// Filters that can be named in failure records.
pub trait NamedFilter {
    fn name(&self) -> &'static str;
}

/// Crefs an element declares: nested `see` crefs, else its own `cref` attribute.
pub(crate) fn declared_crefs(element: &AnnotationElement) -> Vec<&str> {
    let nested = element.see_crefs();
    if !nested.is_empty() {
        return nested;
    }
    element
        .attribute(crate::annotation::known::CREF)
        .filter(|c| !c.trim().is_empty())
        .into_iter()
        .collect()
}

/// The description text of an element, blank lines removed.
pub(crate) fn description_of(element: &AnnotationElement) -> String {
    element
        .trailing_text()
        .map(crate::annotation::remove_blank_lines)
        .unwrap_or_default()
}

/// Ordered filter lists per document-model kind, built once per generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTable {
    pub preprocessing: Vec<PreprocessingFilter>,
    pub operation: Vec<OperationFilter>,
    pub parameter: Vec<ParameterFilter>,
    pub schema: Vec<SchemaFilter>,
    pub document: Vec<DocumentFilter>,
}

impl Default for FilterTable {
    fn default() -> Self {
        FilterTable {
            preprocessing: vec![
                PreprocessingFilter::ConvertAlternativeParamTags,
                PreprocessingFilter::PopulateInAttribute,
            ],
            operation: vec![
                OperationFilter::ApplyOperationId,
                OperationFilter::ApplySummary,
                OperationFilter::ApplyRemarksAsDescription,
                OperationFilter::ApplyGroupAsTag,
                OperationFilter::ApplyParamAsPath,
                OperationFilter::ApplyParamAsQuery,
                OperationFilter::ApplyParamAsHeader,
                OperationFilter::ApplyParamAsRequestBody,
                OperationFilter::ApplyResponseAsResponse,
            ],
            parameter: vec![
                ParameterFilter::ApplyParamDescription,
                ParameterFilter::ApplyParamRequired,
                ParameterFilter::ApplyParamSchema,
            ],
            schema: vec![
                SchemaFilter::ApplyTypeSummaryAsDescription,
                SchemaFilter::ApplyPropertySummaryAsDescription,
            ],
            document: vec![
                DocumentFilter::ApplyConfigInfo,
                DocumentFilter::ApplyAssemblyNameAsInfo,
                DocumentFilter::ApplyUrlAsServer,
            ],
        }
    }
}
