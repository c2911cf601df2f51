//! Template rendering of an extracted [`Catalog`].
//!
//! ```text
//! Catalog → [Renderer] → text
//! ```
//!
//! Templates are MiniJinja sources injected at construction time. The
//! catalog is the whole context: `tables` and `all_table_columns` are the
//! top-level variables.
//!
//! # Helpers
//!
//! Registered as both functions and filters:
//!
//! - `add(x, y)` - integer addition
//! - `is_not_empty(s)` - true when `s` has non-whitespace content
//! - `mark(quote, ident)` - quote every dot-separated part of `ident`
//! - `pascal(s)`, `camel(s)`, `underline(s)` - identifier case conversion
//!
//! # Example
//!
//! ```
//! use dbscribe_core::{Catalog, Renderer, Table};
//!
//! let catalog = Catalog {
//!     tables: vec![Table::new("app", "users")],
//!     all_table_columns: vec![],
//! };
//! let renderer = Renderer::new("names", "{% for t in tables %}{{ t.name | pascal }}{% endfor %}");
//! assert_eq!(renderer.render(&catalog).unwrap(), "Users");
//! ```

mod error;

pub use error::TemplateError;

use minijinja::{Environment, UndefinedBehavior};
use std::path::Path;

use crate::aggregate::Catalog;
use crate::error::SchemaError;
use crate::naming;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Recursion limit for template rendering.
const RECURSION_LIMIT: usize = 100;

/// A named template ready to render catalogs.
#[derive(Debug, Clone)]
pub struct Renderer {
    name: String,
    source: String,
}

impl Renderer {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Read the template source from `path`.
    pub fn from_file(name: impl Into<String>, path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(name, source))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render `catalog` with this template.
    pub fn render(&self, catalog: &Catalog) -> Result<String, TemplateError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_recursion_limit(RECURSION_LIMIT);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        register_helpers(&mut env);

        env.add_template(&self.name, &self.source)?;
        let template = env.get_template(&self.name)?;
        let rendered = template.render(catalog)?;

        #[cfg(feature = "tracing")]
        debug!(
            template = %self.name,
            tables = catalog.tables.len(),
            bytes = rendered.len(),
            "rendered template"
        );

        Ok(rendered)
    }
}

fn register_helpers(env: &mut Environment<'_>) {
    env.add_function("add", add);
    env.add_function("is_not_empty", is_not_empty);
    env.add_function("mark", mark);
    env.add_function("pascal", pascal);
    env.add_function("camel", camel);
    env.add_function("underline", underline);

    env.add_filter("add", add);
    env.add_filter("is_not_empty", is_not_empty);
    env.add_filter("mark", mark);
    env.add_filter("pascal", pascal);
    env.add_filter("camel", camel);
    env.add_filter("underline", underline);
}

fn add(x: i64, y: i64) -> i64 {
    x + y
}

fn is_not_empty(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `mark("`", "app.users")` → `` `app`.`users` ``. A `"` quote is written
/// as `\"` so the result can sit inside a string literal.
fn mark(quote: &str, ident: &str) -> String {
    let quote = match quote.trim() {
        "\"" => "\\\"",
        other => other,
    };
    let separator = format!("{quote}.{quote}");
    format!("{quote}{}{quote}", ident.split('.').collect::<Vec<_>>().join(&separator))
}

fn pascal(value: &str) -> String {
    naming::pascal(value)
}

fn camel(value: &str) -> String {
    naming::camel(value)
}

fn underline(value: &str) -> String {
    naming::underline(value)
}
