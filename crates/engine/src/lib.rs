//! `tabex-engine`: export templating engine.
//!
//! Pure engine crate: receives a loaded result set and a template selection,
//! computes derived views and sheet grids. Encoding to bytes lives in
//! `tabex-io`. No filesystem access.

pub mod aggregate;
pub mod artifact;
pub mod catalog;
pub mod classify;
pub mod error;
pub mod filename;
pub mod grid;
pub mod options;
pub mod stats;
pub mod value;

pub use artifact::Artifact;
pub use catalog::{find_template_by_id, group_by_format, list_templates, Category, ExportFormat, TemplateDefinition};
pub use error::ExportError;
pub use options::{ExportConfig, OptionDescriptor, OptionValue, Overrides, TemplateSelection};
pub use value::{ResultSet, Row, Value};
