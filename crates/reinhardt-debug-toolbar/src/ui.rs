//! Toolbar markup and static assets

pub mod assets;
pub mod templates;

pub use templates::ToolbarTemplates;
