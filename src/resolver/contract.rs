use super::types::{
    MemberShape, PrimitiveKind, ResolvedType, TypeIdentity, TypeShape, ARRAY_TYPE_NAME,
};
use super::TypeResolver;
use crate::error::GenerationError;
use anyhow::Context;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
enum Builtin {
    Primitive(PrimitiveKind, Option<&'static str>),
    Nullable,
    Sequence,
    Dictionary,
}

impl Builtin {
    fn arity(self) -> usize {
        match self {
            Builtin::Primitive(..) => 0,
            Builtin::Nullable | Builtin::Sequence => 1,
            Builtin::Dictionary => 2,
        }
    }
}

static BUILTINS: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    use Builtin::*;
    use PrimitiveKind as P;
    HashMap::from([
        ("System.String", Primitive(P::String, None)),
        ("System.Char", Primitive(P::String, None)),
        ("System.Guid", Primitive(P::String, Some("uuid"))),
        ("System.Uri", Primitive(P::String, Some("uri"))),
        ("System.DateTime", Primitive(P::String, Some("date-time"))),
        ("System.DateTimeOffset", Primitive(P::String, Some("date-time"))),
        ("System.TimeSpan", Primitive(P::String, Some("duration"))),
        ("System.Boolean", Primitive(P::Boolean, None)),
        ("System.Byte", Primitive(P::Integer, Some("int32"))),
        ("System.SByte", Primitive(P::Integer, Some("int32"))),
        ("System.Int16", Primitive(P::Integer, Some("int32"))),
        ("System.UInt16", Primitive(P::Integer, Some("int32"))),
        ("System.Int32", Primitive(P::Integer, Some("int32"))),
        ("System.UInt32", Primitive(P::Integer, Some("int64"))),
        ("System.Int64", Primitive(P::Integer, Some("int64"))),
        ("System.UInt64", Primitive(P::Integer, Some("int64"))),
        ("System.Single", Primitive(P::Number, Some("float"))),
        ("System.Double", Primitive(P::Number, Some("double"))),
        ("System.Decimal", Primitive(P::Number, Some("double"))),
        ("System.Object", Primitive(P::Any, None)),
        ("System.Nullable", Nullable),
        (ARRAY_TYPE_NAME, Sequence),
        ("System.Collections.Generic.List", Sequence),
        ("System.Collections.Generic.IList", Sequence),
        ("System.Collections.Generic.IEnumerable", Sequence),
        ("System.Collections.Generic.ICollection", Sequence),
        ("System.Collections.Generic.IReadOnlyList", Sequence),
        ("System.Collections.Generic.IReadOnlyCollection", Sequence),
        ("System.Collections.Generic.Dictionary", Dictionary),
        ("System.Collections.Generic.IDictionary", Dictionary),
        ("System.Collections.Generic.IReadOnlyDictionary", Dictionary),
    ])
});

/// Shape family of a contract-defined type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    #[default]
    Object,
    Enum,
    Array,
    Dictionary,
    Primitive,
}

/// A member of an object contract.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// One type definition in a contract file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractType {
    pub name: String,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub kind: ContractKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<ContractMember>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub primitive: Option<PrimitiveKind>,
    #[serde(default)]
    pub format: Option<String>,
}

/// Top-level shape of a contract file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractFile {
    #[serde(default)]
    pub types: Vec<ContractType>,
}

impl ContractFile {
    pub fn parse(content: &str, yaml: bool) -> anyhow::Result<Self> {
        let file = if yaml {
            serde_yaml::from_str(content).context("contract is not valid YAML")?
        } else {
            serde_json::from_str(content).context("contract is not valid JSON")?
        };
        Ok(file)
    }
}

fn is_contract_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml" || ext == "json")
        .unwrap_or(false)
}

/// Resolver backed by contract files loaded for one generation scope.
///
/// Built-in primitive and collection types are always available; contract
/// types cannot replace them. Resolved types are cached per resolver.
#[derive(Debug, Default)]
pub struct ContractTypeResolver {
    contracts: HashMap<String, ContractType>,
    sources: Vec<PathBuf>,
    cache: RefCell<HashMap<TypeIdentity, ResolvedType>>,
}

impl ContractTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every contract file, descending one level into directories.
    pub fn from_paths(paths: &[PathBuf]) -> anyhow::Result<Self> {
        let mut resolver = Self::new();
        for path in paths {
            if path.is_dir() {
                let mut files: Vec<PathBuf> = std::fs::read_dir(path)
                    .with_context(|| format!("Failed to list contracts in {}", path.display()))?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_contract_file(p))
                    .collect();
                files.sort();
                for file in files {
                    resolver.load_file(&file)?;
                }
            } else {
                resolver.load_file(path)?;
            }
        }
        Ok(resolver)
    }

    pub fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract: {}", path.display()))?;
        let yaml = path
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false);
        let file = ContractFile::parse(&content, yaml)
            .with_context(|| format!("Failed to parse contract: {}", path.display()))?;
        self.add_contracts(file, &path.display().to_string());
        self.sources.push(path.to_path_buf());
        Ok(())
    }

    /// Registers contract types. The first definition of a name wins.
    pub fn add_contracts(&mut self, file: ContractFile, origin: &str) {
        for contract in file.types {
            if BUILTINS.contains_key(contract.name.as_str()) {
                warn!(name = %contract.name, origin, "contract type collides with a built-in type; ignored");
                continue;
            }
            if self.contracts.contains_key(&contract.name) {
                warn!(name = %contract.name, origin, "duplicate contract type; keeping first definition");
                continue;
            }
            debug!(name = %contract.name, origin, "loaded contract type");
            self.contracts.insert(contract.name.clone(), contract);
        }
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    fn builtin(name: &str) -> Option<Builtin> {
        BUILTINS.get(name).copied().or_else(|| {
            if name.contains('.') {
                None
            } else {
                BUILTINS.get(format!("System.{name}").as_str()).copied()
            }
        })
    }

    fn build(&self, identity: &TypeIdentity) -> Result<ResolvedType, GenerationError> {
        let reference = identity.to_string();

        if let Some(builtin) = Self::builtin(identity.name()) {
            check_arity(&reference, builtin.arity(), identity.generic_args().len())?;
            let args = identity.generic_args();
            let shape = match builtin {
                Builtin::Primitive(kind, format) => TypeShape::Primitive {
                    kind,
                    format: format.map(str::to_string),
                },
                Builtin::Nullable => TypeShape::Nullable {
                    inner: args[0].clone(),
                },
                Builtin::Sequence => TypeShape::Array {
                    element: args[0].clone(),
                },
                Builtin::Dictionary => TypeShape::Dictionary {
                    value: args[1].clone(),
                },
            };
            return Ok(ResolvedType::new(identity.clone(), shape));
        }

        let contract = self.contracts.get(identity.name()).ok_or_else(|| {
            GenerationError::resolution(&reference, "type is not defined in any loaded contract")
        })?;
        check_arity(
            &reference,
            contract.generic_params.len(),
            identity.generic_args().len(),
        )?;

        let bindings: Vec<(String, TypeIdentity)> = contract
            .generic_params
            .iter()
            .cloned()
            .zip(identity.generic_args().iter().cloned())
            .collect();
        let bound = |token: &str| -> Result<TypeIdentity, GenerationError> {
            Ok(TypeIdentity::parse(token)?.substitute(&bindings))
        };

        let shape = match contract.kind {
            ContractKind::Object => TypeShape::Object {
                members: contract
                    .members
                    .iter()
                    .map(|m| -> Result<MemberShape, GenerationError> {
                        Ok(MemberShape {
                            name: m.name.clone(),
                            ty: bound(&m.ty)?,
                            required: m.required,
                            nullable: m.nullable,
                            description: m.description.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, GenerationError>>()?,
            },
            ContractKind::Enum => TypeShape::Enum {
                values: contract.values.clone(),
            },
            ContractKind::Array => TypeShape::Array {
                element: bound(contract.element.as_deref().ok_or_else(|| {
                    GenerationError::resolution(&reference, "array contract has no element type")
                })?)?,
            },
            ContractKind::Dictionary => TypeShape::Dictionary {
                value: bound(contract.value.as_deref().ok_or_else(|| {
                    GenerationError::resolution(&reference, "dictionary contract has no value type")
                })?)?,
            },
            ContractKind::Primitive => TypeShape::Primitive {
                kind: contract.primitive.unwrap_or(PrimitiveKind::String),
                format: contract.format.clone(),
            },
        };

        let mut resolved = ResolvedType::new(identity.clone(), shape);
        resolved.description = contract.description.clone();
        Ok(resolved)
    }
}

fn check_arity(reference: &str, expected: usize, actual: usize) -> Result<(), GenerationError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GenerationError::resolution(
            reference,
            format!("expects {expected} generic argument(s), got {actual}"),
        ))
    }
}

impl TypeResolver for ContractTypeResolver {
    fn resolve_identity(&self, identity: &TypeIdentity) -> Result<ResolvedType, GenerationError> {
        if let Some(hit) = self.cache.borrow().get(identity) {
            return Ok(hit.clone());
        }
        let resolved = self.build(identity)?;
        self.cache
            .borrow_mut()
            .insert(identity.clone(), resolved.clone());
        Ok(resolved)
    }

    fn unload(&mut self) {
        debug!(
            types = self.contracts.len(),
            sources = self.sources.len(),
            "unloading contract metadata"
        );
        self.contracts.clear();
        self.sources.clear();
        self.cache.borrow_mut().clear();
    }

    fn loaded_type_count(&self) -> usize {
        self.contracts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::TypeReference;

    const CONTRACTS: &str = r#"
types:
  - name: Contracts.Page
    generic_params: [T]
    description: One page of results
    members:
      - { name: items, type: "System.Collections.Generic.List{T}" }
      - { name: next, type: "System.String", nullable: true }
  - name: Contracts.Sample
    members:
      - { name: id, type: "System.Int32", required: true }
  - name: Contracts.Color
    kind: enum
    values: [Red, Green]
"#;

    fn resolver() -> ContractTypeResolver {
        let mut r = ContractTypeResolver::new();
        r.add_contracts(ContractFile::parse(CONTRACTS, true).unwrap(), "inline");
        r
    }

    #[test]
    fn test_generic_members_are_substituted() {
        let r = resolver();
        let page = r
            .resolve(&TypeReference::new("T:Contracts.Page{Contracts.Sample}"))
            .unwrap();
        let TypeShape::Object { members } = &page.shape else {
            panic!("expected object shape");
        };
        assert_eq!(
            members[0].ty.to_string(),
            "System.Collections.Generic.List{Contracts.Sample}"
        );
        assert_eq!(page.description.as_deref(), Some("One page of results"));
    }

    #[test]
    fn test_builtins_resolve_with_and_without_namespace() {
        let r = resolver();
        let full = r.resolve(&TypeReference::new("T:System.Int64")).unwrap();
        let short = r.resolve(&TypeReference::new("Int64")).unwrap();
        assert_eq!(full.shape, short.shape);
        assert!(matches!(
            full.shape,
            TypeShape::Primitive {
                kind: PrimitiveKind::Integer,
                ..
            }
        ));
    }

    #[test]
    fn test_arity_mismatch_is_resolution_error() {
        let r = resolver();
        let err = r.resolve(&TypeReference::new("T:Contracts.Page")).unwrap_err();
        assert!(matches!(err, GenerationError::Resolution { .. }));
    }

    #[test]
    fn test_resolve_all_fills_generic_definition() {
        let r = resolver();
        let refs = vec![
            TypeReference::new("T:Contracts.Page`1"),
            TypeReference::new("T:Contracts.Sample"),
        ];
        let page = r.resolve_all(&refs).unwrap();
        assert_eq!(page.identity.to_string(), "Contracts.Page{Contracts.Sample}");

        let ambiguous = vec![
            TypeReference::new("T:Contracts.Sample"),
            TypeReference::new("T:Contracts.Color"),
        ];
        assert!(r.resolve_all(&ambiguous).is_err());
    }

    #[test]
    fn test_unload_clears_metadata() {
        let mut r = resolver();
        assert_eq!(r.loaded_type_count(), 3);
        r.resolve(&TypeReference::new("Contracts.Sample")).unwrap();
        r.unload();
        assert_eq!(r.loaded_type_count(), 0);
        assert!(r.resolve(&TypeReference::new("Contracts.Sample")).is_err());
    }
}
