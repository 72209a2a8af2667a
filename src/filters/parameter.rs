use super::{declared_crefs, description_of, FilterContext, NamedFilter};
use crate::annotation::{known, AnnotationElement};
use crate::error::GenerationError;
use crate::spec::{fill_if_empty, Parameter, ParameterLocation, Schema, SchemaReference};

/// Fills one parameter from its `param` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterFilter {
    ApplyParamDescription,
    /// Path parameters are always required; others when `required="true"`.
    ApplyParamRequired,
    /// Schema from the `cref` attribute or nested `see` crefs, else an inline string.
    ApplyParamSchema,
}

impl NamedFilter for ParameterFilter {
    fn name(&self) -> &'static str {
        match self {
            ParameterFilter::ApplyParamDescription => "ApplyParamDescriptionFilter",
            ParameterFilter::ApplyParamRequired => "ApplyParamRequiredFilter",
            ParameterFilter::ApplyParamSchema => "ApplyParamSchemaFilter",
        }
    }
}

impl ParameterFilter {
    pub fn apply(
        &self,
        parameter: &mut Parameter,
        element: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        match self {
            ParameterFilter::ApplyParamDescription => {
                fill_if_empty(&mut parameter.description, &description_of(element));
                Ok(())
            }
            ParameterFilter::ApplyParamRequired => {
                let declared = element
                    .attribute(known::REQUIRED)
                    .map(|v| v.trim().eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                if parameter.location == ParameterLocation::Path || declared {
                    parameter.required = true;
                }
                Ok(())
            }
            ParameterFilter::ApplyParamSchema => {
                if parameter.schema.is_some() {
                    return Ok(());
                }
                let crefs = declared_crefs(element);
                let schema = if crefs.is_empty() {
                    SchemaReference::inline(Schema::string())
                } else {
                    ctx.schema_for_crefs(&crefs)?
                };
                parameter.schema = Some(schema);
                Ok(())
            }
        }
    }
}
