// Library exports for chartbind

pub mod config;
pub mod csv_reader;
pub mod data;
pub mod host;
pub mod preprocessor;
pub mod runtime;
pub mod spec;

// Template evaluation and helpers
pub mod helpers;
pub mod template;

// Specification tree passes
pub mod bind;
pub mod mapping;
pub mod walk;

pub use config::RenderOptions;
pub use runtime::{ChartSession, RenderedChart};
