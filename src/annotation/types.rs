use super::known;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Where an annotation element came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl SourceLocation {
    pub fn new(source: Option<String>, line: u32, column: u32) -> Self {
        SourceLocation {
            source,
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}:{}", source, self.line, self.column),
            None => write!(f, "line {}, column {}", self.line, self.column),
        }
    }
}

/// Attributes of an element, kept in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the value of an existing attribute or appends a new one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Scalar attribute values as they appear in YAML/JSON trees.
#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Float(f64),
}

impl From<AttributeValue> for String {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Text(s) => s,
            AttributeValue::Flag(b) => b.to_string(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Float(f) => f.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedAttributes;

        impl<'de> Visitor<'de> for OrderedAttributes {
            type Value = Attributes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, AttributeValue>()? {
                    if entries.iter().any(|(k, _): &(String, String)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate attribute '{key}'")));
                    }
                    entries.push((key, String::from(value)));
                }
                Ok(Attributes(entries))
            }
        }

        deserializer.deserialize_map(OrderedAttributes)
    }
}

/// A child of an annotation element: either a nested element or raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationNode {
    Text(String),
    Element(AnnotationElement),
}

impl AnnotationNode {
    pub fn as_element(&self) -> Option<&AnnotationElement> {
        match self {
            AnnotationNode::Element(e) => Some(e),
            AnnotationNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnnotationNode::Text(t) => Some(t),
            AnnotationNode::Element(_) => None,
        }
    }
}

/// One node of the annotation tree produced by the documentation parser.
///
/// Trees handed to the generator are only ever read. Filters that need a
/// normalized shape (see the preprocessing filters) work on a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationElement {
    tag: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<AnnotationNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<SourceLocation>,
}

impl AnnotationElement {
    pub fn new(tag: impl Into<String>) -> Self {
        AnnotationElement {
            tag: tag.into(),
            attributes: Attributes::default(),
            children: Vec::new(),
            location: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.set(name, value);
        self
    }

    pub fn with_child(mut self, child: AnnotationElement) -> Self {
        self.children.push(AnnotationNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(AnnotationNode::Text(text.into()));
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.set(name, value);
    }

    pub fn children(&self) -> &[AnnotationNode] {
        &self.children
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub(crate) fn set_location(&mut self, location: SourceLocation) {
        self.location = Some(location);
    }

    /// Direct child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &AnnotationElement> {
        self.children.iter().filter_map(AnnotationNode::as_element)
    }

    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut AnnotationElement> {
        self.children.iter_mut().filter_map(|node| match node {
            AnnotationNode::Element(e) => Some(e),
            AnnotationNode::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a AnnotationElement> + 'a {
        self.elements().filter(move |e| e.tag == tag)
    }

    pub fn first_element(&self, tag: &str) -> Option<&AnnotationElement> {
        self.elements().find(|e| e.tag == tag)
    }

    /// All descendant elements, depth first, in document order.
    pub fn descendants(&self) -> Vec<&AnnotationElement> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    pub fn descendants_named(&self, tag: &str) -> Vec<&AnnotationElement> {
        self.descendants()
            .into_iter()
            .filter(|e| e.tag == tag)
            .collect()
    }

    /// All descendant nodes (elements and text), depth first, in document order.
    pub fn descendant_nodes(&self) -> Vec<&AnnotationNode> {
        let mut out = Vec::new();
        collect_descendant_nodes(self, &mut out);
        out
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        self.descendant_nodes()
            .into_iter()
            .filter_map(AnnotationNode::as_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Trimmed text content of the first child element with this tag.
    pub fn child_text(&self, tag: &str) -> Option<String> {
        self.first_element(tag)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// The text of the last descendant node, if that node is text.
    ///
    /// Description text in annotations trails any `see` references, so this is
    /// what filters use as a description.
    pub fn trailing_text(&self) -> Option<&str> {
        self.descendant_nodes().last().and_then(|n| n.as_text())
    }

    /// `cref` values of every nested `see` element, in document order.
    pub fn see_crefs(&self) -> Vec<&str> {
        self.descendants_named(known::SEE)
            .into_iter()
            .filter_map(|see| see.attribute(known::CREF))
            .collect()
    }

    /// Short human-readable identification used when no location is present.
    pub fn describe(&self) -> String {
        match self.attribute(known::NAME) {
            Some(name) => format!("<{} name=\"{}\">", self.tag, name),
            None => format!("<{}>", self.tag),
        }
    }

    /// Location string for failure records.
    pub fn diagnostic_location(&self) -> String {
        match &self.location {
            Some(loc) => format!("{} {}", loc, self.describe()),
            None => self.describe(),
        }
    }
}

fn collect_descendants<'a>(element: &'a AnnotationElement, out: &mut Vec<&'a AnnotationElement>) {
    for child in element.elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn collect_descendant_nodes<'a>(element: &'a AnnotationElement, out: &mut Vec<&'a AnnotationNode>) {
    for node in &element.children {
        out.push(node);
        if let AnnotationNode::Element(child) = node {
            collect_descendant_nodes(child, out);
        }
    }
}

/// Drops whitespace-only lines and trims the rest.
pub fn remove_blank_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
