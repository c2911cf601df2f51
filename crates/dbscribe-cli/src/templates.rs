//! Template selection for the export commands.

use dbscribe_core::{Config, Renderer, SchemaError, TemplateError};

use crate::cli::Export;

/// Default template for `table`.
pub const TABLE: &str = include_str!("../templates/table.jinja");
/// Default template for `schema`.
pub const SCHEMA: &str = include_str!("../templates/schema.jinja");
/// Default template for `replace`.
pub const REPLACE: &str = include_str!("../templates/replace.jinja");

/// The embedded template for `export`. `custom` has none.
pub fn default_source(export: Export) -> Option<&'static str> {
    match export {
        Export::Custom => None,
        Export::Replace => Some(REPLACE),
        Export::Schema => Some(SCHEMA),
        Export::Table => Some(TABLE),
    }
}

/// The configured template file for `export`, if any.
fn configured_file(export: Export, config: &Config) -> Option<&str> {
    let path = match export {
        Export::Custom => &config.template_file_custom,
        Export::Replace => &config.template_file_replace,
        Export::Schema => &config.template_file_schema,
        Export::Table => &config.template_file_table,
    };
    let path = path.trim();
    (!path.is_empty()).then_some(path)
}

/// Build the renderer for `export`: the configured file when set,
/// otherwise the embedded default.
pub fn renderer_for(export: Export, config: &Config) -> Result<Renderer, SchemaError> {
    if let Some(path) = configured_file(export, config) {
        return Renderer::from_file(export.name(), path);
    }
    default_source(export)
        .map(|source| Renderer::new(export.name(), source))
        .ok_or_else(|| {
            TemplateError::MissingTemplate(format!(
                "the {} command requires template_file_{}",
                export.name(),
                export.name()
            ))
            .into()
        })
}
