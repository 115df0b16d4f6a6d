//! Config rendering: environment placeholders, template functions and deep merge.

pub mod error;
pub mod functions;
pub mod merge;
pub mod renderer;
pub mod substitution;

pub use renderer::{ConfigRenderer, to_yaml};

#[cfg(test)]
pub use error::RenderError;
