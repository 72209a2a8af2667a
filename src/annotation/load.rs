use super::types::{AnnotationElement, SourceLocation};
use anyhow::Context;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}

/// Parses an annotation tree from YAML or JSON text.
pub fn parse_annotations(content: &str, yaml: bool) -> anyhow::Result<AnnotationElement> {
    let root: AnnotationElement = if yaml {
        serde_yaml::from_str(content).context("annotation tree is not valid YAML")?
    } else {
        serde_json::from_str(content).context("annotation tree is not valid JSON")?
    };
    Ok(root)
}

/// Loads an annotation tree from a `.yaml`/`.yml`/`.json` file.
///
/// Locations that carry a line but no source name are attributed to the file.
pub fn load_annotations(path: &Path) -> anyhow::Result<AnnotationElement> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotations: {}", path.display()))?;
    let mut root = parse_annotations(&content, is_yaml(path))
        .with_context(|| format!("Failed to parse annotations: {}", path.display()))?;

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    attribute_locations(&mut root, source.as_deref());
    Ok(root)
}

fn attribute_locations(element: &mut AnnotationElement, source: Option<&str>) {
    if let Some(loc) = element.location() {
        if loc.source.is_none() {
            let loc = SourceLocation::new(source.map(str::to_string), loc.line, loc.column);
            element.set_location(loc);
        }
    }
    for child in element.elements_mut() {
        attribute_locations(child, source);
    }
}
