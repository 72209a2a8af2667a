use super::NamedFilter;
use crate::annotation::{known, AnnotationElement};
use crate::assembler::OperationUrl;
use crate::error::GenerationError;

/// Normalizes a working copy of an operation element before operation filters run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreprocessingFilter {
    /// `pathParam`, `queryParam`, `header` and `requestType` become `param` with `in` set.
    ConvertAlternativeParamTags,
    /// A `param` without `in` gets `path` or `query` from where the url mentions it.
    PopulateInAttribute,
}

impl NamedFilter for PreprocessingFilter {
    fn name(&self) -> &'static str {
        match self {
            PreprocessingFilter::ConvertAlternativeParamTags => "ConvertAlternativeParamTagsFilter",
            PreprocessingFilter::PopulateInAttribute => "PopulateInAttributeFilter",
        }
    }
}

impl PreprocessingFilter {
    pub fn apply(
        &self,
        element: &mut AnnotationElement,
        url: Option<&OperationUrl>,
    ) -> Result<(), GenerationError> {
        match self {
            PreprocessingFilter::ConvertAlternativeParamTags => {
                for child in element.elements_mut() {
                    let location = match child.tag() {
                        known::PATH_PARAM => known::PATH,
                        known::QUERY_PARAM => known::QUERY,
                        known::HEADER => known::HEADER,
                        known::REQUEST_TYPE => known::BODY,
                        _ => continue,
                    };
                    if location == known::BODY && child.attribute(known::NAME).is_none() {
                        child.set_attribute(known::NAME, known::BODY);
                    }
                    child.set_tag(known::PARAM);
                    child.set_attribute(known::IN, location);
                }
                Ok(())
            }
            PreprocessingFilter::PopulateInAttribute => {
                let Some(url) = url else {
                    return Ok(());
                };
                for child in element.elements_mut() {
                    if child.tag() != known::PARAM || child.attribute(known::IN).is_some() {
                        continue;
                    }
                    let Some(name) = child.attribute(known::NAME).map(str::to_string) else {
                        continue;
                    };
                    if url.path_parameters().contains(&name.as_str()) {
                        child.set_attribute(known::IN, known::PATH);
                    } else if url.mentions_query_parameter(&name) {
                        child.set_attribute(known::IN, known::QUERY);
                    }
                }
                Ok(())
            }
        }
    }
}
