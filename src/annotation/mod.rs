//! # Annotation Module
//!
//! The annotation tree is the generator's input: an XML-shaped document of
//! elements, ordered attributes, text, and `see` cross-references, produced by
//! an external documentation parser and accepted here in its serialized
//! (YAML/JSON) form.
//!
//! ```yaml
//! tag: member
//! attributes: { name: "M:Api.SampleController.Post" }
//! children:
//!   - { tag: url, children: ["http://localhost:9000/V1/samples"] }
//!   - { tag: verb, children: ["POST"] }
//!   - tag: param
//!     attributes: { name: sample, in: body }
//!     children:
//!       - { tag: see, attributes: { cref: "T:Contracts.SampleObject" } }
//!       - "The sample to create"
//! ```

pub mod known;
mod load;
mod types;

#[cfg(test)]
mod tests;

pub use load::*;
pub use types::*;
