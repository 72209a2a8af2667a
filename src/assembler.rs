//! # Assembler Module
//!
//! Builds one document from every operation and type element of an
//! annotation tree.
//!
//! Operations are keyed by [`OperationIdentity`] (path + verb). When a later
//! element describes an identity that already exists, the same operation
//! filters run again over the existing fragment, so the later element only
//! fills what is still empty and adds what is missing.
//!
//! After all operations, type and property elements document the component
//! schemas the operations pulled into the registry, then document filters
//! fill info and servers.

use crate::annotation::{known, AnnotationElement};
use crate::error::GenerationError;
use crate::filters::FilterContext;
use crate::pipeline::PipelineRunner;
use crate::result::{
    DocumentGenerationResult, FailureRecord, OperationGenerationResult, OverallGenerationResult,
};
use crate::spec::{Components, OpenApiDocument};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::{debug, info};
use url::Url;

const RELATIVE_BASE: &str = "http://relative.invalid";

/// `{name}` template segments of a path
static PATH_TEMPLATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("path template regex should be valid"));

const VERBS: [Method; 8] = [
    Method::GET,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
    Method::PATCH,
    Method::TRACE,
];

/// A parsed operation url such as `http://localhost:9000/V1/samples/{id}?flag={flag}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationUrl {
    /// `scheme://host[:port]`, absent for relative urls
    pub server: Option<String>,
    /// Decoded path with `{param}` templates intact
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl OperationUrl {
    pub fn parse(raw: &str) -> Result<Self, GenerationError> {
        let raw = raw.trim();
        let invalid = |e: url::ParseError| GenerationError::annotation(format!("invalid url '{raw}': {e}"));
        let (parsed, absolute) = match Url::parse(raw) {
            Ok(url) => (url, true),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(RELATIVE_BASE).map_err(invalid)?;
                (base.join(raw).map_err(invalid)?, false)
            }
            Err(e) => return Err(invalid(e)),
        };
        if parsed.cannot_be_a_base() {
            return Err(GenerationError::annotation(format!("url '{raw}' has no path")));
        }

        let server = if absolute {
            parsed.host_str().map(|host| match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            })
        } else {
            None
        };

        let decoded = urlencoding::decode(parsed.path())
            .map_err(|e| GenerationError::annotation(format!("url '{raw}' path is not UTF-8: {e}")))?;
        let mut path = decoded.into_owned();
        if path.len() > 1 && path.ends_with('/') {
            path.pop();
        }

        let query = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(OperationUrl {
            server,
            path,
            query,
        })
    }

    /// Names of `{param}` templates in the path, in order.
    pub fn path_parameters(&self) -> Vec<&str> {
        PATH_TEMPLATE_REGEX
            .captures_iter(&self.path)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Whether the query names `name` as a key or as a `{name}` value template.
    pub fn mentions_query_parameter(&self, name: &str) -> bool {
        let template = format!("{{{name}}}");
        self.query.iter().any(|(k, v)| k == name || *v == template)
    }
}

/// Path + verb: the key operations are deduplicated by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationIdentity {
    pub path: String,
    pub method: Method,
}

impl OperationIdentity {
    /// `GET /V1/samples/{id}` becomes `getV1SamplesById`.
    pub fn derived_operation_id(&self) -> String {
        let mut id = self.method.as_str().to_ascii_lowercase();
        for segment in self.path.split('/').filter(|s| !s.is_empty()) {
            let (prefix, word) = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) => ("By", param),
                None => ("", segment),
            };
            id.push_str(prefix);
            let mut capitalize = true;
            for c in word.chars() {
                if !c.is_ascii_alphanumeric() {
                    capitalize = true;
                    continue;
                }
                if capitalize {
                    id.push(c.to_ascii_uppercase());
                    capitalize = false;
                } else {
                    id.push(c);
                }
            }
        }
        id
    }
}

impl fmt::Display for OperationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Where an operation element lives: its identity and full parsed url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSite {
    pub identity: OperationIdentity,
    pub url: OperationUrl,
    /// Set while the common `<operations>` annotations are applied.
    pub common: bool,
}

impl OperationSite {
    pub fn from_element(element: &AnnotationElement) -> Result<Self, GenerationError> {
        let raw_url = element
            .child_text(known::URL)
            .ok_or_else(|| GenerationError::annotation("operation has no url"))?;
        let raw_verb = element
            .child_text(known::VERB)
            .ok_or_else(|| GenerationError::annotation("operation has no verb"))?;
        let method = VERBS
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(&raw_verb))
            .cloned()
            .ok_or_else(|| {
                GenerationError::annotation(format!("'{raw_verb}' is not an HTTP verb"))
            })?;
        let url = OperationUrl::parse(&raw_url)?;
        Ok(OperationSite {
            identity: OperationIdentity {
                path: url.path.clone(),
                method,
            },
            url,
            common: false,
        })
    }

    /// The same site, seen by the common config annotations.
    pub fn for_common_annotations(&self) -> Self {
        OperationSite {
            common: true,
            ..self.clone()
        }
    }
}

/// `member` elements that describe an operation (have both `url` and `verb`).
pub fn operation_elements(root: &AnnotationElement) -> Vec<&AnnotationElement> {
    root.descendants_named(known::MEMBER)
        .into_iter()
        .filter(|m| m.first_element(known::URL).is_some() && m.first_element(known::VERB).is_some())
        .collect()
}

/// `member` elements documenting a type (`T:`) or property (`P:`).
pub fn type_elements(root: &AnnotationElement) -> Vec<&AnnotationElement> {
    root.descendants_named(known::MEMBER)
        .into_iter()
        .filter(|m| {
            m.attribute(known::NAME)
                .map(|n| {
                    n.starts_with(known::TYPE_MEMBER_PREFIX)
                        || n.starts_with(known::PROPERTY_MEMBER_PREFIX)
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Merges per-element pipeline results into one [`OverallGenerationResult`].
#[derive(Debug, Clone, Copy)]
pub struct DocumentAssembler<'t> {
    runner: PipelineRunner<'t>,
}

impl<'t> DocumentAssembler<'t> {
    pub fn new(runner: PipelineRunner<'t>) -> Self {
        DocumentAssembler { runner }
    }

    /// Only fatal errors are returned as `Err`; everything else is recorded.
    pub fn assemble(
        &self,
        root: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<OverallGenerationResult, GenerationError> {
        let mut document = OpenApiDocument::default();
        let mut results = Vec::new();

        for element in operation_elements(root) {
            let mut result = OperationGenerationResult::for_element(element);
            match OperationSite::from_element(element) {
                Ok(site) => {
                    result = result.with_operation(&site.identity.path, &site.identity.method);
                    if let Some(failure) = self.assemble_operation(&mut document, element, &site, ctx)? {
                        result.fail(failure);
                    }
                }
                Err(err) => result.fail(FailureRecord::new(&err, None, Some(element))),
            }
            results.push(result);
        }

        for element in type_elements(root) {
            let mut result = OperationGenerationResult::for_element(element);
            if let Some(failure) = self.runner.run_schema(element, ctx)?.failure() {
                result.fail(failure);
            }
            results.push(result);
        }

        let mut document_failures = Vec::new();
        if let Some(failure) = self.runner.run_document(&mut document, root, ctx)?.failure() {
            document_failures.push(failure);
        }
        document.components = Components {
            schemas: ctx.registry.component_schemas(),
        };

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            elements = results.len(),
            failed,
            operations = document.operation_count(),
            schemas = document.components.schemas.len(),
            "document assembled"
        );
        Ok(OverallGenerationResult::new(
            results,
            DocumentGenerationResult::new(document, document_failures),
        ))
    }

    /// Runs one operation element, then the common config annotations, into the document.
    fn assemble_operation(
        &self,
        document: &mut OpenApiDocument,
        element: &AnnotationElement,
        site: &OperationSite,
        ctx: &mut FilterContext<'_>,
    ) -> Result<Option<FailureRecord>, GenerationError> {
        let existing = document
            .operation(&site.identity.path, &site.identity.method)
            .cloned();
        let merging = existing.is_some();
        let mut operation = existing.unwrap_or_default();

        if let Some(failure) = self.runner.run_operation(element, &mut operation, site, ctx)?.failure() {
            return Ok(Some(failure));
        }
        let config = ctx.config;
        if let Some(common) = config.common_operation_annotations() {
            let common_site = site.for_common_annotations();
            if let Some(failure) = self
                .runner
                .run_operation(common, &mut operation, &common_site, ctx)?
                .failure()
            {
                return Ok(Some(failure));
            }
        }

        debug!(operation = %site.identity, merged = merging, "operation assembled");
        document
            .paths
            .entry(site.identity.path.clone())
            .or_default()
            .insert(&site.identity.method, operation);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_url() {
        let url = OperationUrl::parse("http://localhost:9000/V1/samples/{id}?queryBool={queryBool}").unwrap();
        assert_eq!(url.server.as_deref(), Some("http://localhost:9000"));
        assert_eq!(url.path, "/V1/samples/{id}");
        assert_eq!(url.path_parameters(), vec!["id"]);
        assert!(url.mentions_query_parameter("queryBool"));
        assert!(!url.mentions_query_parameter("id"));
    }

    #[test]
    fn test_parse_relative_url_has_no_server() {
        let url = OperationUrl::parse("/V2/items/{itemId}/parts/{partId}/").unwrap();
        assert_eq!(url.server, None);
        assert_eq!(url.path, "/V2/items/{itemId}/parts/{partId}");
        assert_eq!(url.path_parameters(), vec!["itemId", "partId"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(OperationUrl::parse("http://").is_err());
        assert!(OperationUrl::parse("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_derived_operation_id() {
        let identity = OperationIdentity {
            path: "/V1/samples/{id}".into(),
            method: Method::GET,
        };
        assert_eq!(identity.derived_operation_id(), "getV1SamplesById");

        let identity = OperationIdentity {
            path: "/api/order-items".into(),
            method: Method::POST,
        };
        assert_eq!(identity.derived_operation_id(), "postApiOrderItems");
    }

    #[test]
    fn test_site_requires_known_verb() {
        let element = AnnotationElement::new(known::MEMBER)
            .with_child(AnnotationElement::new(known::URL).with_text("/x"))
            .with_child(AnnotationElement::new(known::VERB).with_text("FETCH"));
        let err = OperationSite::from_element(&element).unwrap_err();
        assert!(matches!(err, GenerationError::Annotation { .. }));

        let element = AnnotationElement::new(known::MEMBER)
            .with_child(AnnotationElement::new(known::URL).with_text("/x"))
            .with_child(AnnotationElement::new(known::VERB).with_text("patch"));
        let site = OperationSite::from_element(&element).unwrap();
        assert_eq!(site.identity.method, Method::PATCH);
    }
}
