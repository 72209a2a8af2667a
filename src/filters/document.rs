use super::{FilterContext, NamedFilter};
use crate::annotation::{known, AnnotationElement};
use crate::assembler::{operation_elements, OperationSite};
use crate::error::GenerationError;
use crate::spec::OpenApiDocument;

/// Fills document-level fields once every operation has been assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Title and version from the `<configuration>` tree.
    ApplyConfigInfo,
    /// Title from `assembly/name`, then the settings fallbacks.
    ApplyAssemblyNameAsInfo,
    /// Distinct `scheme://host[:port]` of assembled operation urls, in encounter order.
    ApplyUrlAsServer,
}

impl NamedFilter for DocumentFilter {
    fn name(&self) -> &'static str {
        match self {
            DocumentFilter::ApplyConfigInfo => "ApplyConfigInfoFilter",
            DocumentFilter::ApplyAssemblyNameAsInfo => "ApplyAssemblyNameAsInfoFilter",
            DocumentFilter::ApplyUrlAsServer => "ApplyUrlAsServerFilter",
        }
    }
}

fn fill(field: &mut String, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        if field.trim().is_empty() {
            *field = value.to_string();
        }
    }
}

impl DocumentFilter {
    pub fn apply(
        &self,
        document: &mut OpenApiDocument,
        root: &AnnotationElement,
        ctx: &mut FilterContext<'_>,
    ) -> Result<(), GenerationError> {
        match self {
            DocumentFilter::ApplyConfigInfo => {
                fill(&mut document.info.title, ctx.config.title.as_deref());
                fill(&mut document.info.version, ctx.config.version.as_deref());
                Ok(())
            }
            DocumentFilter::ApplyAssemblyNameAsInfo => {
                let assembly = root
                    .descendants_named(known::ASSEMBLY)
                    .into_iter()
                    .find_map(|a| a.child_text(known::NAME));
                fill(&mut document.info.title, assembly.as_deref());
                fill(&mut document.info.title, ctx.settings.info.title.as_deref());
                fill(&mut document.info.version, Some(&ctx.settings.info.version));
                Ok(())
            }
            DocumentFilter::ApplyUrlAsServer => {
                // Only operations that made it into `paths` contribute a server.
                for site in operation_elements(root)
                    .into_iter()
                    .filter_map(|element| OperationSite::from_element(element).ok())
                {
                    if document
                        .operation(&site.identity.path, &site.identity.method)
                        .is_none()
                    {
                        continue;
                    }
                    if let Some(server) = &site.url.server {
                        document.add_server(server);
                    }
                }
                Ok(())
            }
        }
    }
}
