//! # Spec Module
//!
//! OpenAPI-shaped document model filled in by the filter pipeline, plus
//! rendering to 2.0/3.0 JSON or YAML and reading rendered 3.0 text back.
//!
//! The model is always built in 3.0 shape; Swagger 2.0 is a rendering of it.

mod load;
mod render;
mod schema;
mod types;

pub use load::*;
pub use render::*;
pub use schema::*;
pub use types::*;
