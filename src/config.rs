//! Generator configuration
//!
//! Two sources feed a generation request:
//!
//! - [`GeneratorSettings`]: tool settings from an `annospec.toml` file that sits
//!   alongside the annotation file (or is passed explicitly), with environment
//!   overrides on top.
//! - [`GenerationConfig`]: the optional `<configuration>` annotation tree that
//!   supplies document info and annotations common to every operation.

use crate::annotation::{known, load_annotations, AnnotationElement};
use crate::error::GenerationError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// File name looked up beside the annotation file.
pub const SETTINGS_FILE_NAME: &str = "annospec.toml";

fn default_media_type() -> String {
    "application/json".to_string()
}

fn default_doc_version() -> String {
    "1.0.0".to_string()
}

fn default_true() -> bool {
    true
}

/// Fallback document info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSettings {
    /// Used when neither the configuration tree nor the assembly name gives a title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_doc_version")]
    pub version: String,
}

impl Default for InfoSettings {
    fn default() -> Self {
        InfoSettings {
            title: None,
            version: default_doc_version(),
        }
    }
}

/// Settings loaded from `annospec.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Media type for request bodies and responses
    #[serde(default = "default_media_type")]
    pub default_media_type: String,
    #[serde(default)]
    pub info: InfoSettings,
    /// Derive `operationId` from verb and path when none is set
    #[serde(default = "default_true")]
    pub generate_operation_ids: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        GeneratorSettings {
            default_media_type: default_media_type(),
            info: InfoSettings::default(),
            generate_operation_ids: true,
        }
    }
}

impl GeneratorSettings {
    /// Applies `ANNOSPEC_MEDIA_TYPE` and `ANNOSPEC_DOC_VERSION` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(media_type) = lookup("ANNOSPEC_MEDIA_TYPE").filter(|v| !v.trim().is_empty()) {
            self.default_media_type = media_type.trim().to_string();
        }
        if let Some(version) = lookup("ANNOSPEC_DOC_VERSION").filter(|v| !v.trim().is_empty()) {
            self.info.version = version.trim().to_string();
        }
        self
    }
}

/// Load settings from a TOML file.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// fails to parse.
pub fn load_settings(settings_path: &Path) -> anyhow::Result<Option<GeneratorSettings>> {
    if !settings_path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(settings_path).with_context(|| {
        format!(
            "Failed to read generator settings: {}",
            settings_path.display()
        )
    })?;

    let settings: GeneratorSettings = toml::from_str(&contents).with_context(|| {
        format!(
            "Failed to parse generator settings: {}",
            settings_path.display()
        )
    })?;

    Ok(Some(settings))
}

/// Looks for `annospec.toml` in the same directory as the annotation file.
pub fn auto_detect_settings_path(annotation_path: &Path) -> Option<PathBuf> {
    let settings_path = annotation_path.parent()?.join(SETTINGS_FILE_NAME);
    if settings_path.exists() {
        Some(settings_path)
    } else {
        None
    }
}

/// Resolve settings path
///
/// Priority:
/// 1. Explicitly provided path (via CLI)
/// 2. Auto-detected alongside the annotation file
/// 3. None (defaults)
pub fn resolve_settings_path(explicit_path: Option<&Path>, annotation_path: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    auto_detect_settings_path(annotation_path)
}

/// Resolves, loads and env-overrides the settings for one run.
pub fn resolve_settings(
    explicit_path: Option<&Path>,
    annotation_path: &Path,
) -> anyhow::Result<GeneratorSettings> {
    let settings = match resolve_settings_path(explicit_path, annotation_path) {
        Some(path) => load_settings(&path)?.unwrap_or_default(),
        None => GeneratorSettings::default(),
    };
    Ok(settings.with_env_overrides())
}

/// The `<configuration>` annotation tree.
///
/// ```yaml
/// tag: configuration
/// children:
///   - tag: document
///     children:
///       - { tag: info, attributes: { title: Sample API, version: "2.1" } }
///   - tag: operations
///     children:
///       - { tag: param, attributes: { name: X-Trace, in: header }, children: ["Trace id"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationConfig {
    pub title: Option<String>,
    pub version: Option<String>,
    /// Annotations applied to every operation after its own.
    pub operations: Option<AnnotationElement>,
}

impl GenerationConfig {
    pub fn from_element(root: &AnnotationElement) -> Result<Self, GenerationError> {
        if root.tag() != known::CONFIGURATION {
            return Err(GenerationError::annotation(format!(
                "configuration root must be <{}>, found <{}>",
                known::CONFIGURATION,
                root.tag()
            )));
        }
        let info = root
            .first_element(known::DOCUMENT)
            .and_then(|doc| doc.first_element(known::INFO));
        let attr = |name: &str| {
            info.and_then(|i| i.attribute(name))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Ok(GenerationConfig {
            title: attr(known::TITLE),
            version: attr(known::VERSION),
            operations: root.first_element(known::OPERATIONS).cloned(),
        })
    }

    /// Common operation annotations, if any are declared.
    pub fn common_operation_annotations(&self) -> Option<&AnnotationElement> {
        self.operations
            .as_ref()
            .filter(|ops| ops.elements().next().is_some())
    }
}

pub fn load_generation_config(path: &Path) -> anyhow::Result<GenerationConfig> {
    let root = load_annotations(path)?;
    GenerationConfig::from_element(&root)
        .with_context(|| format!("Invalid generation config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::parse_annotations;
    use tempfile::tempdir;

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings: GeneratorSettings = toml::from_str("[info]\ntitle = \"Fallback\"\n").unwrap();
        assert_eq!(settings.default_media_type, "application/json");
        assert_eq!(settings.info.title.as_deref(), Some("Fallback"));
        assert_eq!(settings.info.version, "1.0.0");
        assert!(settings.generate_operation_ids);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let settings = GeneratorSettings::default().with_overrides_from(|key| match key {
            "ANNOSPEC_MEDIA_TYPE" => Some("application/xml".into()),
            "ANNOSPEC_DOC_VERSION" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(settings.default_media_type, "application/xml");
        assert_eq!(settings.info.version, "1.0.0");
    }

    #[test]
    fn test_settings_path_resolution_order() {
        let dir = tempdir().unwrap();
        let annotations = dir.path().join("api.yaml");
        assert_eq!(resolve_settings_path(None, &annotations), None);

        let beside = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&beside, "generate_operation_ids = false\n").unwrap();
        assert_eq!(resolve_settings_path(None, &annotations), Some(beside.clone()));

        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "").unwrap();
        assert_eq!(
            resolve_settings_path(Some(&explicit), &annotations),
            Some(explicit.clone())
        );
        assert_eq!(
            resolve_settings_path(Some(&dir.path().join("missing.toml")), &annotations),
            Some(beside.clone())
        );

        let loaded = load_settings(&beside).unwrap().unwrap();
        assert!(!loaded.generate_operation_ids);
    }

    #[test]
    fn test_invalid_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "generate_operation_ids = \"maybe\"").unwrap();
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn test_generation_config_from_tree() {
        let root = parse_annotations(
            r#"
tag: configuration
children:
  - tag: document
    children:
      - { tag: info, attributes: { title: Sample API, version: "2.1" } }
  - tag: operations
    children:
      - { tag: param, attributes: { name: X-Trace, in: header }, children: ["Trace id"] }
"#,
            true,
        )
        .unwrap();
        let config = GenerationConfig::from_element(&root).unwrap();
        assert_eq!(config.title.as_deref(), Some("Sample API"));
        assert_eq!(config.version.as_deref(), Some("2.1"));
        assert!(config.common_operation_annotations().is_some());

        let wrong = AnnotationElement::new("doc");
        assert!(GenerationConfig::from_element(&wrong).is_err());
    }
}
