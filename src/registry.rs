//! # Registry Module
//!
//! Deduplicating store of component schemas for one generation request.
//!
//! Object and enum types get a named entry under `#/components/schemas/` and
//! every later request for the same [`TypeIdentity`] returns the same pointer.
//! Primitive, array, dictionary and nullable shapes are built inline, with any
//! registrable element or member types still going through the registry.
//!
//! Self-referential and mutually-referential types are handled with an
//! in-construction placeholder: while a type's schema is being built, a
//! request for that type returns the pointer the entry will be stored under.
//! An inline shape that reaches itself (an array contract whose element is
//! the contract itself) is promoted to a component so the cycle ends at a
//! pointer. Nesting deeper than [`MAX_NESTING`] is a resolution error.
//!
//! The registry is append-only. The only removal is the rollback of entries
//! added by a construction that failed part way.

use crate::error::GenerationError;
use crate::resolver::{PrimitiveKind, ResolvedType, TypeIdentity, TypeReference, TypeResolver, TypeShape};
use crate::spec::{Components, Schema, SchemaReference, SchemaType};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Deepest chain of types built inside one another.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone)]
enum Entry {
    InConstruction,
    Built(Schema),
}

/// Maps resolved types to reusable component schemas.
#[derive(Debug, Default)]
pub struct SchemaReferenceRegistry {
    names: HashMap<TypeIdentity, String>,
    owners: HashMap<String, TypeIdentity>,
    entries: BTreeMap<String, Entry>,
    /// Registration order, used to roll back a failed construction.
    journal: Vec<TypeIdentity>,
    /// Identities whose schema is being built, outermost first.
    building: Vec<TypeIdentity>,
}

impl SchemaReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reference already issued for `identity`, if any.
    pub fn reference_for(&self, identity: &TypeIdentity) -> Option<SchemaReference> {
        self.names.get(identity).map(|name| SchemaReference::component(name))
    }

    /// Completed component schema stored under `name`.
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        match self.entries.get(name) {
            Some(Entry::Built(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Completed schemas of every registered instantiation of `type_name`.
    ///
    /// `Contracts.Page` matches `Contracts.Page{Contracts.Sample}` as well.
    pub fn schemas_for_type_mut(&mut self, type_name: &str) -> Vec<&mut Schema> {
        let wanted: Vec<&String> = self
            .names
            .iter()
            .filter(|(identity, _)| identity.name() == type_name)
            .map(|(_, name)| name)
            .collect();
        self.entries
            .iter_mut()
            .filter(|(name, _)| wanted.contains(name))
            .filter_map(|(_, entry)| match entry {
                Entry::Built(schema) => Some(schema),
                Entry::InConstruction => None,
            })
            .collect()
    }

    /// Resolves listed crefs to one type and returns its schema reference.
    pub fn find_or_add_for_references(
        &mut self,
        references: &[TypeReference],
        resolver: &dyn TypeResolver,
    ) -> Result<SchemaReference, GenerationError> {
        let resolved = resolver.resolve_all(references)?;
        self.find_or_add_reference(&resolved, resolver)
    }

    /// Returns the schema reference for `ty`, building and registering it on first use.
    pub fn find_or_add_reference(
        &mut self,
        ty: &ResolvedType,
        resolver: &dyn TypeResolver,
    ) -> Result<SchemaReference, GenerationError> {
        if let Some(existing) = self.reference_for(&ty.identity) {
            return Ok(existing);
        }
        if self.building.len() >= MAX_NESTING {
            return Err(GenerationError::resolution(
                ty.identity.to_string(),
                format!("type nesting exceeds {MAX_NESTING} levels"),
            ));
        }

        let mark = self.journal.len();
        if ty.is_registrable() {
            self.reserve(&ty.identity)?;
        } else if self.building.contains(&ty.identity) {
            let name = self.reserve(&ty.identity)?;
            debug!(name = %name, identity = %ty.identity, "recursive inline type promoted to component");
            return Ok(SchemaReference::component(&name));
        }

        self.building.push(ty.identity.clone());
        let built = self.build_schema(ty, resolver);
        self.building.pop();

        match built {
            Ok(schema) => match self.names.get(&ty.identity).cloned() {
                Some(name) => {
                    debug!(name = %name, identity = %ty.identity, "registered component schema");
                    self.entries.insert(name.clone(), Entry::Built(schema));
                    Ok(SchemaReference::component(&name))
                }
                None => Ok(SchemaReference::inline(schema)),
            },
            Err(err) => {
                self.rollback(mark);
                Err(err)
            }
        }
    }

    /// Claims a component name for `identity` and marks it in construction.
    fn reserve(&mut self, identity: &TypeIdentity) -> Result<String, GenerationError> {
        let name = self.assign_name(identity)?;
        self.names.insert(identity.clone(), name.clone());
        self.owners.insert(name.clone(), identity.clone());
        self.entries.insert(name.clone(), Entry::InConstruction);
        self.journal.push(identity.clone());
        Ok(name)
    }

    fn rollback(&mut self, mark: usize) {
        for identity in self.journal.drain(mark..) {
            if let Some(name) = self.names.remove(&identity) {
                self.owners.remove(&name);
                self.entries.remove(&name);
            }
        }
    }

    /// Picks a component name for a new identity.
    ///
    /// The short display name is preferred; when another type already holds
    /// it, the full sanitized identity is used instead, then the short name
    /// with the first free numeric suffix (`Sample_2`, `Sample_3`, ...).
    fn assign_name(&self, identity: &TypeIdentity) -> Result<String, GenerationError> {
        let short = sanitize(&identity.display_name());
        let Some(holder) = self.owners.get(&short) else {
            return Ok(short);
        };

        let full = sanitize(&identity.to_string());
        let chosen = if !self.owners.contains_key(&full) {
            Some(full)
        } else {
            // One of these is always free: there are more candidates than owners.
            (2..=self.owners.len() + 2)
                .map(|n| format!("{short}_{n}"))
                .find(|candidate| !self.owners.contains_key(candidate))
        };
        let Some(name) = chosen else {
            return Err(GenerationError::RegistryConflict {
                name: short,
                existing: holder.to_string(),
                requested: identity.to_string(),
            });
        };

        info!(
            name = %short,
            existing = %holder,
            requested = %identity,
            disambiguated = %name,
            "component name collision"
        );
        Ok(name)
    }

    fn reference_for_identity(
        &mut self,
        identity: &TypeIdentity,
        resolver: &dyn TypeResolver,
    ) -> Result<SchemaReference, GenerationError> {
        if let Some(existing) = self.reference_for(identity) {
            return Ok(existing);
        }
        let resolved = resolver.resolve_identity(identity)?;
        self.find_or_add_reference(&resolved, resolver)
    }

    fn build_schema(
        &mut self,
        ty: &ResolvedType,
        resolver: &dyn TypeResolver,
    ) -> Result<Schema, GenerationError> {
        let mut schema = match &ty.shape {
            TypeShape::Primitive { kind, format } => {
                let mut schema = match kind {
                    PrimitiveKind::String => Schema::of_type(SchemaType::String),
                    PrimitiveKind::Integer => Schema::of_type(SchemaType::Integer),
                    PrimitiveKind::Number => Schema::of_type(SchemaType::Number),
                    PrimitiveKind::Boolean => Schema::of_type(SchemaType::Boolean),
                    PrimitiveKind::Any => Schema::default(),
                };
                schema.format = format.clone();
                schema
            }
            TypeShape::Object { members } => {
                let mut schema = Schema::of_type(SchemaType::Object);
                for member in members {
                    let mut property = self.reference_for_identity(&member.ty, resolver)?;
                    if member.nullable {
                        property = nullable(property);
                    }
                    if let Some(inline) = property.as_inline_mut() {
                        if inline.description.is_none() {
                            inline.description = member.description.clone();
                        }
                    }
                    if member.required {
                        schema.required.push(member.name.clone());
                    }
                    schema.properties.insert(member.name.clone(), property);
                }
                schema
            }
            TypeShape::Enum { values } => Schema {
                enum_values: values.clone(),
                ..Schema::string()
            },
            TypeShape::Array { element } => {
                Schema::array(self.reference_for_identity(element, resolver)?)
            }
            TypeShape::Dictionary { value } => Schema {
                additional_properties: Some(Box::new(self.reference_for_identity(value, resolver)?)),
                ..Schema::of_type(SchemaType::Object)
            },
            TypeShape::Nullable { inner } => match nullable(self.reference_for_identity(inner, resolver)?) {
                SchemaReference::Inline(schema) => *schema,
                pointer => Schema::any_of(vec![pointer]),
            },
        };
        if schema.description.is_none() {
            schema.description = ty.description.clone();
        }
        Ok(schema)
    }

    /// Completed component schemas by name.
    pub fn component_schemas(&self) -> BTreeMap<String, Schema> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                Entry::Built(schema) => Some((name.clone(), schema.clone())),
                Entry::InConstruction => None,
            })
            .collect()
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.entries
            .into_iter()
            .filter_map(|(name, entry)| match entry {
                Entry::Built(schema) => Some((name, schema)),
                Entry::InConstruction => None,
            })
            .collect()
    }
}

/// Marks a schema nullable. A 3.0 `$ref` cannot carry siblings, so a pointer
/// is wrapped in a nullable one-element `anyOf`.
fn nullable(reference: SchemaReference) -> SchemaReference {
    match reference {
        SchemaReference::Inline(mut schema) => {
            schema.nullable = true;
            SchemaReference::Inline(schema)
        }
        pointer => SchemaReference::inline(Schema {
            nullable: true,
            ..Schema::any_of(vec![pointer])
        }),
    }
}

/// Component names are limited to `[A-Za-z0-9._-]`.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Owns the registries of one generation request.
#[derive(Debug, Default)]
pub struct ReferenceRegistryManager {
    schemas: SchemaReferenceRegistry,
}

impl ReferenceRegistryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_registry(&self) -> &SchemaReferenceRegistry {
        &self.schemas
    }

    pub fn schema_registry_mut(&mut self) -> &mut SchemaReferenceRegistry {
        &mut self.schemas
    }

    /// Components section holding every completed schema.
    pub fn components(&self) -> Components {
        Components {
            schemas: self.schemas.component_schemas(),
        }
    }

    pub fn into_components(self) -> Components {
        Components {
            schemas: self.schemas.into_schemas(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ContractFile, ContractTypeResolver};
    use proptest::prelude::*;

    const CONTRACTS: &str = r#"
types:
  - name: Contracts.Node
    description: Tree node
    members:
      - { name: value, type: "System.String", required: true }
      - { name: children, type: "System.Collections.Generic.List{Contracts.Node}" }
      - { name: parent, type: "Contracts.Node" }
  - name: Contracts.Ping
    members:
      - { name: pong, type: "Contracts.Pong" }
  - name: Contracts.Pong
    members:
      - { name: ping, type: "Contracts.Ping" }
  - name: Contracts.Sample
    members:
      - { name: id, type: "System.Int32" }
  - name: Contracts.V2.Sample
    members:
      - { name: id, type: "System.String" }
  - name: Contracts.Broken
    members:
      - { name: ok, type: "Contracts.Sample" }
      - { name: missing, type: "Contracts.Missing" }
  - name: Contracts.Color
    kind: enum
    values: [Red, Green]
  - name: Contracts.Tree
    kind: array
    element: Contracts.Tree
  - name: Contracts.Index
    kind: dictionary
    value: Contracts.Index
  - name: Contracts.Grow
    generic_params: [T]
    members:
      - { name: next, type: "Contracts.Grow{System.Collections.Generic.List{T}}" }
  - name: Models.Sample
    members:
      - { name: code, type: "System.String" }
  - name: Sample
    members:
      - { name: flag, type: "System.Boolean" }
"#;

    fn resolver() -> ContractTypeResolver {
        let mut r = ContractTypeResolver::new();
        r.add_contracts(ContractFile::parse(CONTRACTS, true).unwrap(), "inline");
        r
    }

    fn resolve(r: &ContractTypeResolver, token: &str) -> ResolvedType {
        r.resolve(&TypeReference::new(token)).unwrap()
    }

    #[test]
    fn test_same_type_returns_same_reference() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let ty = resolve(&r, "T:Contracts.Sample");
        let first = registry.find_or_add_reference(&ty, &r).unwrap();
        let second = registry.find_or_add_reference(&ty, &r).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.component_name(), Some("Sample"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_colliding_display_names_are_disambiguated() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let a = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Sample"), &r)
            .unwrap();
        let b = registry
            .find_or_add_reference(&resolve(&r, "Contracts.V2.Sample"), &r)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(b.component_name(), Some("Contracts.V2.Sample"));

        let schemas = registry.into_schemas();
        assert_eq!(
            schemas["Sample"].properties["id"].as_inline().unwrap().schema_type,
            Some(SchemaType::Integer)
        );
        assert_eq!(
            schemas["Contracts.V2.Sample"].properties["id"]
                .as_inline()
                .unwrap()
                .schema_type,
            Some(SchemaType::String)
        );
    }

    #[test]
    fn test_self_referencing_type_points_at_itself() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let node = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Node"), &r)
            .unwrap();
        assert_eq!(node.component_name(), Some("Node"));

        let schema = registry.schema("Node").unwrap();
        assert_eq!(schema.properties["parent"], node);
        let children = schema.properties["children"].as_inline().unwrap();
        assert_eq!(children.items.as_deref(), Some(&node));
        assert_eq!(schema.required, vec!["value".to_string()]);
        assert_eq!(schema.description.as_deref(), Some("Tree node"));
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let ping = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Ping"), &r)
            .unwrap();
        let pong = registry.reference_for(&TypeIdentity::new("Contracts.Pong")).unwrap();
        assert_eq!(registry.schema("Pong").unwrap().properties["ping"], ping);
        assert_eq!(registry.schema("Ping").unwrap().properties["pong"], pong);
    }

    #[test]
    fn test_unqualified_name_after_qualified_gets_numbered() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let qualified = registry
            .find_or_add_reference(&resolve(&r, "Models.Sample"), &r)
            .unwrap();
        let bare = registry
            .find_or_add_reference(&resolve(&r, "Sample"), &r)
            .unwrap();
        assert_eq!(qualified.component_name(), Some("Sample"));
        assert_eq!(bare.component_name(), Some("Sample_2"));
        assert!(registry.schema("Sample_2").unwrap().properties.contains_key("flag"));

        let third = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Sample"), &r)
            .unwrap();
        assert_eq!(third.component_name(), Some("Contracts.Sample"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_self_referential_array_contract_becomes_component() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let tree = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Tree"), &r)
            .unwrap();
        assert_eq!(tree.component_name(), Some("Tree"));

        let schema = registry.schema("Tree").unwrap();
        assert_eq!(schema.schema_type, Some(SchemaType::Array));
        assert_eq!(schema.items.as_deref(), Some(&tree));

        let again = registry
            .find_or_add_reference(&resolve(&r, "System.Collections.Generic.List{Contracts.Tree}"), &r)
            .unwrap();
        assert_eq!(again.as_inline().unwrap().items.as_deref(), Some(&tree));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_self_referential_dictionary_contract_becomes_component() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let index = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Index"), &r)
            .unwrap();
        assert_eq!(index.component_name(), Some("Index"));

        let schema = registry.schema("Index").unwrap();
        assert_eq!(schema.schema_type, Some(SchemaType::Object));
        assert_eq!(schema.additional_properties.as_deref(), Some(&index));
    }

    #[test]
    fn test_unbounded_generic_expansion_is_resolution_error() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let err = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Grow{System.String}"), &r)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Resolution { .. }));
        assert!(!err.is_fatal());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_construction_rolls_back() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let err = registry
            .find_or_add_reference(&resolve(&r, "Contracts.Broken"), &r)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Resolution { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_inline_shapes_are_not_registered() {
        let r = resolver();
        let mut registry = SchemaReferenceRegistry::new();
        let list = registry
            .find_or_add_reference(&resolve(&r, "System.Collections.Generic.List{System.Int64}"), &r)
            .unwrap();
        let schema = list.as_inline().unwrap();
        assert_eq!(schema.schema_type, Some(SchemaType::Array));
        assert!(registry.is_empty());

        let nullable_enum = registry
            .find_or_add_reference(&resolve(&r, "System.Nullable{Contracts.Color}"), &r)
            .unwrap();
        let schema = nullable_enum.as_inline().unwrap();
        assert!(schema.nullable);
        assert_eq!(schema.any_of, vec![SchemaReference::component("Color")]);
    }

    #[test]
    fn test_schemas_for_type_matches_generic_instantiations() {
        let mut r = resolver();
        r.add_contracts(
            ContractFile::parse(
                "types:\n  - name: Contracts.Page\n    generic_params: [T]\n    members:\n      - { name: items, type: \"T[]\" }\n",
                true,
            )
            .unwrap(),
            "page",
        );
        let mut registry = SchemaReferenceRegistry::new();
        registry
            .find_or_add_reference(&resolve(&r, "Contracts.Page{Contracts.Sample}"), &r)
            .unwrap();
        registry
            .find_or_add_reference(&resolve(&r, "Contracts.Page{Contracts.Color}"), &r)
            .unwrap();
        assert_eq!(registry.schemas_for_type_mut("Contracts.Page").len(), 2);
        assert!(registry.schema("Page_Sample").is_some());
    }

    #[test]
    fn test_sanitize_component_names() {
        assert_eq!(sanitize("Contracts.Page{Contracts.Sample}"), "Contracts.Page_Contracts.Sample");
        assert_eq!(sanitize("A{B,C}"), "A_B_C");
    }

    proptest! {
        #[test]
        fn prop_registry_is_idempotent_and_injective(
            names in prop::collection::btree_set((prop::option::of("[A-C]"), "[A-C]"), 1..10),
            qualified_first in any::<bool>()
        ) {
            let mut names: Vec<String> = names
                .iter()
                .map(|(ns, name)| match ns {
                    Some(ns) => format!("Ns{ns}.{name}"),
                    None => name.clone(),
                })
                .collect();
            if qualified_first {
                names.reverse();
            }
            let mut yaml = String::from("types:\n");
            for name in &names {
                yaml.push_str(&format!(
                    "  - name: {name}\n    members:\n      - {{ name: tag, type: \"System.String\" }}\n"
                ));
            }
            let mut r = ContractTypeResolver::new();
            r.add_contracts(ContractFile::parse(&yaml, true).unwrap(), "generated");

            let mut registry = SchemaReferenceRegistry::new();
            let mut issued = Vec::new();
            for name in &names {
                let ty = r.resolve(&TypeReference::new(name.as_str())).unwrap();
                let first = registry.find_or_add_reference(&ty, &r).unwrap();
                let second = registry.find_or_add_reference(&ty, &r).unwrap();
                prop_assert_eq!(&first, &second);
                prop_assert!(!issued.contains(&first));
                issued.push(first);
            }
            prop_assert_eq!(registry.len(), names.len());
        }
    }
}
