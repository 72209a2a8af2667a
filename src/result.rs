//! Generation results.
//!
//! One [`OperationGenerationResult`] is produced per annotated operation or
//! type element, plus one [`DocumentGenerationResult`] for the assembled
//! document. All result types are serde-serializable so they can cross the
//! isolation boundary as transport text.

use crate::annotation::{known, AnnotationElement};
use crate::error::{ErrorKind, GenerationError};
use crate::spec::{parse_document, render, OpenApiDocument, OutputFormat, SpecVersion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Success,
    Failure,
}

impl GenerationStatus {
    fn from_success(success: bool) -> Self {
        if success {
            GenerationStatus::Success
        } else {
            GenerationStatus::Failure
        }
    }
}

/// What went wrong for one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: ErrorKind,
    /// Filter that raised the error, when a filter did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl FailureRecord {
    pub fn new(
        error: &GenerationError,
        filter: Option<&str>,
        element: Option<&AnnotationElement>,
    ) -> Self {
        FailureRecord {
            kind: error.kind(),
            filter: filter.map(str::to_string),
            message: error.to_string(),
            location: element.map(AnnotationElement::diagnostic_location),
        }
    }
}

impl std::fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(filter) = &self.filter {
            write!(f, " in {filter}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " (at {location})")?;
        }
        Ok(())
    }
}

/// Outcome for one operation or type element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationGenerationResult {
    /// `name` attribute of the member element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_method: Option<String>,
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
}

impl OperationGenerationResult {
    pub fn for_element(element: &AnnotationElement) -> Self {
        OperationGenerationResult {
            member: element.attribute(known::NAME).map(str::to_string),
            path: None,
            operation_method: None,
            status: GenerationStatus::Success,
            failure: None,
        }
    }

    pub fn with_operation(mut self, path: &str, method: &http::Method) -> Self {
        self.path = Some(path.to_string());
        self.operation_method = Some(method.as_str().to_string());
        self
    }

    pub fn fail(&mut self, failure: FailureRecord) {
        self.status = GenerationStatus::Failure;
        self.failure = Some(failure);
    }

    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Success
    }
}

/// Outcome for the assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentGenerationResult {
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
    /// Absent only when the whole request faulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<OpenApiDocument>,
}

impl DocumentGenerationResult {
    pub fn new(document: OpenApiDocument, failures: Vec<FailureRecord>) -> Self {
        DocumentGenerationResult {
            status: GenerationStatus::from_success(failures.is_empty()),
            failures,
            document: Some(document),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Success
    }
}

/// Everything one generation request produced.
///
/// Returned even when some elements failed; callers decide how to treat
/// partial failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallGenerationResult {
    pub generation_status: GenerationStatus,
    pub operation_results: Vec<OperationGenerationResult>,
    pub document_result: DocumentGenerationResult,
}

impl OverallGenerationResult {
    pub fn new(
        operation_results: Vec<OperationGenerationResult>,
        document_result: DocumentGenerationResult,
    ) -> Self {
        let success = document_result.is_success()
            && operation_results.iter().all(OperationGenerationResult::is_success);
        OverallGenerationResult {
            generation_status: GenerationStatus::from_success(success),
            operation_results,
            document_result,
        }
    }

    /// Top-level failure for a request that could not run to completion.
    pub fn fault(error: &GenerationError) -> Self {
        OverallGenerationResult {
            generation_status: GenerationStatus::Failure,
            operation_results: Vec::new(),
            document_result: DocumentGenerationResult {
                status: GenerationStatus::Failure,
                failures: vec![FailureRecord::new(error, None, None)],
                document: None,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.generation_status == GenerationStatus::Success
    }

    pub fn document(&self) -> Option<&OpenApiDocument> {
        self.document_result.document.as_ref()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.operation_results
            .iter()
            .filter_map(|r| r.failure.as_ref())
            .chain(self.document_result.failures.iter())
    }

    /// Renders the document, keeping the per-element outcomes alongside it.
    pub fn to_serialized(
        &self,
        version: SpecVersion,
        format: OutputFormat,
    ) -> anyhow::Result<OverallGenerationResultSerializedDocument> {
        let document = match self.document() {
            Some(doc) => Some(render(doc, version, format)?),
            None => None,
        };
        Ok(OverallGenerationResultSerializedDocument {
            generation_status: self.generation_status,
            operation_results: self.operation_results.clone(),
            document_status: self.document_result.status,
            document_failures: self.document_result.failures.clone(),
            document,
            spec_version: version,
            format,
        })
    }
}

/// [`OverallGenerationResult`] with the document already rendered to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallGenerationResultSerializedDocument {
    pub generation_status: GenerationStatus,
    pub operation_results: Vec<OperationGenerationResult>,
    pub document_status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_failures: Vec<FailureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub spec_version: SpecVersion,
    pub format: OutputFormat,
}

impl OverallGenerationResultSerializedDocument {
    pub fn is_success(&self) -> bool {
        self.generation_status == GenerationStatus::Success
    }

    /// Parses the rendered document back into the model. 3.0 documents only.
    pub fn to_document_generation_result(&self) -> anyhow::Result<DocumentGenerationResult> {
        if self.spec_version != SpecVersion::OpenApi3_0 {
            anyhow::bail!("only OpenAPI 3.0 output can be converted back into a document result");
        }
        let document = match &self.document {
            Some(text) => Some(parse_document(text, self.format)?),
            None => None,
        };
        Ok(DocumentGenerationResult {
            status: self.document_status,
            failures: self.document_failures.clone(),
            document,
        })
    }

    pub fn to_overall_generation_result(&self) -> anyhow::Result<OverallGenerationResult> {
        Ok(OverallGenerationResult {
            generation_status: self.generation_status,
            operation_results: self.operation_results.clone(),
            document_result: self.to_document_generation_result()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_op() -> OperationGenerationResult {
        let mut r = OperationGenerationResult::for_element(&AnnotationElement::new("member"));
        r.fail(FailureRecord::new(
            &GenerationError::filter("ApplySummaryFilter", "bad"),
            Some("ApplySummaryFilter"),
            None,
        ));
        r
    }

    #[test]
    fn test_overall_success_requires_every_element() {
        let ok = OperationGenerationResult::for_element(&AnnotationElement::new("member"));
        let doc = DocumentGenerationResult::new(OpenApiDocument::default(), vec![]);
        assert!(OverallGenerationResult::new(vec![ok.clone()], doc.clone()).is_success());

        let partial = OverallGenerationResult::new(vec![ok, failed_op()], doc);
        assert!(!partial.is_success());
        assert!(partial.document().is_some());
        assert_eq!(partial.failures().count(), 1);
    }

    #[test]
    fn test_fault_has_no_document() {
        let fault = OverallGenerationResult::fault(&GenerationError::ScopeFault {
            message: "boom".into(),
        });
        assert!(!fault.is_success());
        assert!(fault.document().is_none());
        let record = fault.failures().next().unwrap();
        assert_eq!(record.kind, ErrorKind::ScopeFault);
    }

    #[test]
    fn test_serialized_result_converts_back_for_v3_only() {
        let doc = DocumentGenerationResult::new(OpenApiDocument::default(), vec![]);
        let overall = OverallGenerationResult::new(vec![failed_op()], doc);

        let v3 = overall
            .to_serialized(SpecVersion::OpenApi3_0, OutputFormat::Json)
            .unwrap();
        assert_eq!(v3.to_overall_generation_result().unwrap(), overall);

        let v2 = overall
            .to_serialized(SpecVersion::OpenApi2_0, OutputFormat::Json)
            .unwrap();
        assert!(v2.document.as_deref().unwrap().contains("\"swagger\""));
        assert!(v2.to_document_generation_result().is_err());
    }

    #[test]
    fn test_failure_record_display() {
        let record = FailureRecord {
            kind: ErrorKind::Resolution,
            filter: Some("ApplyParamSchemaFilter".into()),
            message: "missing".into(),
            location: Some("Api.xml:3:1".into()),
        };
        assert_eq!(
            record.to_string(),
            "ResolutionError in ApplyParamSchemaFilter: missing (at Api.xml:3:1)"
        );
    }
}
