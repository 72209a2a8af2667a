use super::{FilterContext, NamedFilter};
use crate::annotation::{known, remove_blank_lines, AnnotationElement};
use crate::error::GenerationError;
use crate::spec::fill_if_empty;

/// Documents registry-owned component schemas from `T:` and `P:` member elements.
///
/// Only schemas some operation already pulled into the registry are touched;
/// documenting a type no operation uses is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFilter {
    ApplyTypeSummaryAsDescription,
    /// Inline property schemas only; a `$ref` property is documented by its own type.
    ApplyPropertySummaryAsDescription,
}

impl NamedFilter for SchemaFilter {
    fn name(&self) -> &'static str {
        match self {
            SchemaFilter::ApplyTypeSummaryAsDescription => "ApplyTypeSummaryAsDescriptionFilter",
            SchemaFilter::ApplyPropertySummaryAsDescription => {
                "ApplyPropertySummaryAsDescriptionFilter"
            }
        }
    }
}

impl SchemaFilter {
    pub fn apply(
        &self,
        element: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        let Some(member) = element.attribute(known::NAME) else {
            return Ok(());
        };
        let Some(summary) = element.child_text(known::SUMMARY) else {
            return Ok(());
        };
        let summary = remove_blank_lines(&summary);

        match self {
            SchemaFilter::ApplyTypeSummaryAsDescription => {
                let Some(type_name) = member.strip_prefix(known::TYPE_MEMBER_PREFIX) else {
                    return Ok(());
                };
                for schema in ctx.registry.schemas_for_type_mut(type_name.trim()) {
                    fill_if_empty(&mut schema.description, &summary);
                }
                Ok(())
            }
            SchemaFilter::ApplyPropertySummaryAsDescription => {
                let Some(qualified) = member.strip_prefix(known::PROPERTY_MEMBER_PREFIX) else {
                    return Ok(());
                };
                let (type_name, property) = qualified.trim().rsplit_once('.').ok_or_else(|| {
                    GenerationError::filter(
                        self.name(),
                        format!("property member '{member}' is not qualified by its type"),
                    )
                })?;
                for schema in ctx.registry.schemas_for_type_mut(type_name) {
                    let inline = schema
                        .properties
                        .iter_mut()
                        .find(|(name, _)| name.eq_ignore_ascii_case(property))
                        .and_then(|(_, value)| value.as_inline_mut());
                    if let Some(inline) = inline {
                        fill_if_empty(&mut inline.description, &summary);
                    }
                }
                Ok(())
            }
        }
    }
}
