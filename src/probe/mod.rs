//! Source media probing

pub mod inspector;

pub use inspector::SourceInspector;
