//! Capability seams: the page driver, the model provider and the stores.
//!
//! Browser automation and the language-model provider are external
//! collaborators; the pipeline only ever sees them through these traits.

pub mod driver;
pub mod model;
pub mod store;
