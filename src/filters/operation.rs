use super::{declared_crefs, description_of, FilterContext, NamedFilter};
use crate::annotation::{known, remove_blank_lines, AnnotationElement};
use crate::assembler::OperationSite;
use crate::error::GenerationError;
use crate::spec::{fill_if_empty, Operation, Parameter, ParameterLocation, RequestBody};

/// Fills an [`Operation`] from an operation element or from common config annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationFilter {
    ApplyOperationId,
    ApplySummary,
    ApplyRemarksAsDescription,
    ApplyGroupAsTag,
    ApplyParamAsPath,
    ApplyParamAsQuery,
    ApplyParamAsHeader,
    ApplyParamAsRequestBody,
    ApplyResponseAsResponse,
}

impl NamedFilter for OperationFilter {
    fn name(&self) -> &'static str {
        match self {
            OperationFilter::ApplyOperationId => "ApplyOperationIdFilter",
            OperationFilter::ApplySummary => "ApplySummaryFilter",
            OperationFilter::ApplyRemarksAsDescription => "ApplyRemarksAsDescriptionFilter",
            OperationFilter::ApplyGroupAsTag => "ApplyGroupAsTagFilter",
            OperationFilter::ApplyParamAsPath => "ApplyParamAsPathFilter",
            OperationFilter::ApplyParamAsQuery => "ApplyParamAsQueryFilter",
            OperationFilter::ApplyParamAsHeader => "ApplyParamAsHeaderFilter",
            OperationFilter::ApplyParamAsRequestBody => "ApplyParamAsRequestBodyFilter",
            OperationFilter::ApplyResponseAsResponse => "ApplyResponseAsResponseFilter",
        }
    }
}

impl OperationFilter {
    pub fn apply(
        &self,
        operation: &mut Operation,
        element: &AnnotationElement,
        site: &OperationSite,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        match self {
            OperationFilter::ApplyOperationId => {
                if ctx.settings.generate_operation_ids {
                    fill_if_empty(&mut operation.operation_id, &site.identity.derived_operation_id());
                }
                Ok(())
            }
            OperationFilter::ApplySummary => {
                if let Some(summary) = element.child_text(known::SUMMARY) {
                    fill_if_empty(&mut operation.summary, &remove_blank_lines(&summary));
                }
                Ok(())
            }
            OperationFilter::ApplyRemarksAsDescription => {
                if let Some(remarks) = element.child_text(known::REMARKS) {
                    fill_if_empty(&mut operation.description, &remove_blank_lines(&remarks));
                }
                Ok(())
            }
            OperationFilter::ApplyGroupAsTag => {
                for group in element.elements_named(known::GROUP) {
                    operation.add_tag(&group.text());
                }
                Ok(())
            }
            OperationFilter::ApplyParamAsPath => {
                self.apply_params(ParameterLocation::Path, operation, element, site, ctx)
            }
            OperationFilter::ApplyParamAsQuery => {
                self.apply_params(ParameterLocation::Query, operation, element, site, ctx)
            }
            OperationFilter::ApplyParamAsHeader => {
                self.apply_params(ParameterLocation::Header, operation, element, site, ctx)
            }
            OperationFilter::ApplyParamAsRequestBody => self.apply_body(operation, element, ctx),
            OperationFilter::ApplyResponseAsResponse => self.apply_responses(operation, element, ctx),
        }
    }

    fn apply_params(
        &self,
        location: ParameterLocation,
        operation: &mut Operation,
        element: &AnnotationElement,
        site: &OperationSite,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        let filters = ctx.parameter_filters;
        for param in element.elements_named(known::PARAM) {
            if param.attribute(known::IN).and_then(ParameterLocation::parse) != Some(location) {
                continue;
            }
            let name = param
                .attribute(known::NAME)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    GenerationError::filter(
                        self.name(),
                        format!("{} parameter has no name", location.as_str()),
                    )
                })?;
            if location == ParameterLocation::Path
                && !site.url.path_parameters().contains(&name)
            {
                // Common path params only apply to urls that template them.
                if site.common {
                    continue;
                }
                return Err(GenerationError::filter(
                    self.name(),
                    format!(
                        "path parameter '{}' does not appear in {}",
                        name, site.identity.path
                    ),
                ));
            }

            let mut parameter = operation
                .parameter(name, location)
                .cloned()
                .unwrap_or_else(|| Parameter::new(name, location));
            for filter in filters {
                filter.apply(&mut parameter, param, ctx)?;
            }
            match operation
                .parameters
                .iter_mut()
                .find(|p| p.name == name && p.location == location)
            {
                Some(existing) => *existing = parameter,
                None => operation.parameters.push(parameter),
            }
        }
        Ok(())
    }

    /// `param in="body"` children become the request body.
    ///
    /// The first body sets schema, description and `required`. Later ones add
    /// their schema as an `anyOf` alternative and only fill a blank description.
    fn apply_body(
        &self,
        operation: &mut Operation,
        element: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        let bodies = element.elements_named(known::PARAM).filter(|p| {
            p.attribute(known::IN)
                .map(|v| v.trim().eq_ignore_ascii_case(known::BODY))
                .unwrap_or(false)
        });
        for param in bodies {
            let description = description_of(param);
            let crefs = declared_crefs(param);
            if crefs.is_empty() {
                return Err(GenerationError::filter(
                    self.name(),
                    "body parameter does not reference a type",
                ));
            }
            let schema = ctx.schema_for_crefs(&crefs)?;
            let media_type = ctx.settings.default_media_type.as_str();
            match operation.request_body.as_mut() {
                None => {
                    operation.request_body = Some(RequestBody::new(media_type, schema, &description))
                }
                Some(body) => body.merge(media_type, schema, &description),
            }
        }
        Ok(())
    }

    fn apply_responses(
        &self,
        operation: &mut Operation,
        element: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        for response in element.elements_named(known::RESPONSE) {
            let code = response
                .attribute(known::CODE)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| GenerationError::filter(self.name(), "response has no code"))?;
            if !is_status_code(code) {
                return Err(GenerationError::filter(
                    self.name(),
                    format!("'{code}' is not an HTTP status code"),
                ));
            }

            let crefs = declared_crefs(response);
            let schema = if crefs.is_empty() {
                None
            } else {
                Some(ctx.schema_for_crefs(&crefs)?)
            };

            let entry = operation.responses.entry(code.to_string()).or_default();
            if entry.description.trim().is_empty() {
                entry.description = description_of(response);
            }
            if let Some(schema) = schema {
                entry
                    .content
                    .entry(ctx.settings.default_media_type.clone())
                    .or_default()
                    .add_schema(schema);
            }
        }
        Ok(())
    }
}

fn is_status_code(code: &str) -> bool {
    code == "default"
        || (code.len() == 3
            && code
                .parse::<u16>()
                .map(|c| (100..600).contains(&c))
                .unwrap_or(false))
}
