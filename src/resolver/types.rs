use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name used for `Name[]` array shorthand.
pub const ARRAY_TYPE_NAME: &str = "System.Array";

/// A cross-reference token exactly as written in an annotation.
///
/// Tokens are resolved on demand and never stored resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeReference(String);

impl TypeReference {
    pub fn new(token: impl Into<String>) -> Self {
        TypeReference(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn identity(&self) -> Result<TypeIdentity, GenerationError> {
        TypeIdentity::parse(&self.0)
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeReference {
    fn from(token: &str) -> Self {
        TypeReference::new(token)
    }
}

/// Canonical identity of a type: fully qualified name plus generic arguments.
///
/// Two resolved types are the same type iff their identities are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIdentity {
    name: String,
    generic_args: Vec<TypeIdentity>,
}

impl TypeIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        TypeIdentity {
            name: name.into(),
            generic_args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, generic_args: Vec<TypeIdentity>) -> Self {
        TypeIdentity {
            name: name.into(),
            generic_args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generic_args(&self) -> &[TypeIdentity] {
        &self.generic_args
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_args.is_empty()
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Short name used to derive registry reference names (`Page_Sample`).
    pub fn display_name(&self) -> String {
        let mut out = self.simple_name().to_string();
        for arg in &self.generic_args {
            out.push('_');
            out.push_str(&arg.display_name());
        }
        out
    }

    /// Parses a cref token such as `T:Contracts.Page{Contracts.Sample}` or `Contracts.Sample[]`.
    pub fn parse(token: &str) -> Result<Self, GenerationError> {
        let trimmed = strip_member_prefix(token.trim());
        if trimmed.is_empty() {
            return Err(GenerationError::resolution(token, "empty type reference"));
        }
        let mut parser = TokenParser {
            token,
            chars: trimmed.chars().collect(),
            pos: 0,
        };
        let identity = parser.identity()?;
        if parser.pos != parser.chars.len() {
            return Err(GenerationError::resolution(
                token,
                format!("unexpected '{}' at offset {}", parser.chars[parser.pos], parser.pos),
            ));
        }
        Ok(identity)
    }

    /// Replaces generic parameter names with concrete arguments.
    pub fn substitute(&self, bindings: &[(String, TypeIdentity)]) -> TypeIdentity {
        if self.generic_args.is_empty() {
            if let Some((_, bound)) = bindings.iter().find(|(param, _)| *param == self.name) {
                return bound.clone();
            }
        }
        TypeIdentity {
            name: self.name.clone(),
            generic_args: self
                .generic_args
                .iter()
                .map(|arg| arg.substitute(bindings))
                .collect(),
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generic_args.is_empty() {
            f.write_str("{")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

fn strip_member_prefix(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() > 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        &token[2..]
    } else {
        token
    }
}

struct TokenParser<'a> {
    token: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl TokenParser<'_> {
    fn identity(&mut self) -> Result<TypeIdentity, GenerationError> {
        let start = self.pos;
        while self.pos < self.chars.len() && !matches!(self.chars[self.pos], '{' | '}' | ',' | '[') {
            self.pos += 1;
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let name = strip_arity(raw.trim());
        if name.is_empty() {
            return Err(GenerationError::resolution(self.token, "missing type name"));
        }

        let mut generic_args = Vec::new();
        if self.peek() == Some('{') {
            self.pos += 1;
            loop {
                generic_args.push(self.identity()?);
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('}') => {
                        self.pos += 1;
                        break;
                    }
                    _ => {
                        return Err(GenerationError::resolution(
                            self.token,
                            "unterminated generic argument list",
                        ))
                    }
                }
            }
        }

        let mut identity = TypeIdentity::with_args(name, generic_args);
        while self.peek() == Some('[') {
            if self.chars.get(self.pos + 1) != Some(&']') {
                return Err(GenerationError::resolution(self.token, "malformed array suffix"));
            }
            self.pos += 2;
            identity = TypeIdentity::with_args(ARRAY_TYPE_NAME, vec![identity]);
        }
        Ok(identity)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
}

/// `List`1` names a generic definition; the arity marker is not part of the identity.
fn strip_arity(name: &str) -> String {
    match name.find('`') {
        Some(idx) if name[idx + 1..].chars().all(|c| c.is_ascii_digit()) => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

/// Primitive schema kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Untyped value (`System.Object`).
    Any,
}

/// One member of an object-shaped type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberShape {
    pub name: String,
    pub ty: TypeIdentity,
    pub required: bool,
    pub nullable: bool,
    pub description: Option<String>,
}

/// Structural description of a resolved type.
///
/// Member and element types are identities, resolved again on demand, so
/// self-referential types have finite shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Primitive {
        kind: PrimitiveKind,
        format: Option<String>,
    },
    Object {
        members: Vec<MemberShape>,
    },
    Enum {
        values: Vec<String>,
    },
    Array {
        element: TypeIdentity,
    },
    Dictionary {
        value: TypeIdentity,
    },
    Nullable {
        inner: TypeIdentity,
    },
}

/// Canonical type metadata returned by a [`TypeResolver`](super::TypeResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub identity: TypeIdentity,
    pub shape: TypeShape,
    pub description: Option<String>,
}

impl ResolvedType {
    pub fn new(identity: TypeIdentity, shape: TypeShape) -> Self {
        ResolvedType {
            identity,
            shape,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this type gets its own entry in the reference registry.
    pub fn is_registrable(&self) -> bool {
        matches!(self.shape, TypeShape::Object { .. } | TypeShape::Enum { .. })
    }
}
