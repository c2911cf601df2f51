//! Subcommand dispatch.

use anyhow::{Context, Result};
use dbscribe_core::{Catalog, Config, Connection, SchemaError};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

use crate::cli::{Args, Command, Export, ExportArgs};
use crate::templates;

/// Extraction or rendering failed.
pub const EXIT_FAILURE: u8 = 1;
/// The configuration is missing or invalid.
pub const EXIT_CONFIG_ERROR: u8 = 66;

/// Run the parsed command line.
pub fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::Config { json_schema } => print_config(*json_schema),
        command => match command.export() {
            Some((export, export_args)) => run_export(export, export_args),
            None => Ok(()),
        },
    }
}

/// Exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let is_config = err.chain().any(|cause| {
        cause
            .downcast_ref::<SchemaError>()
            .is_some_and(SchemaError::is_config)
    });
    if is_config {
        EXIT_CONFIG_ERROR
    } else {
        EXIT_FAILURE
    }
}

fn print_config(json_schema: bool) -> Result<()> {
    let content = if json_schema {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON Schema")?
    } else {
        Config::example().to_yaml()?
    };
    write_output(None, &content)
}

fn run_export(export: Export, args: &ExportArgs) -> Result<()> {
    let path = args.config_path(export);
    let mut config = Config::load(&path)?;

    let tables = args.tables();
    if !tables.is_empty() {
        config.only_table = tables;
    }

    // Template problems are reported before touching the database.
    let renderer = templates::renderer_for(export, &config)?;

    info!(command = export.name(), config = %path.display(), "exporting");

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let catalog = runtime.block_on(extract(&config))?;

    let rendered = renderer
        .render(&catalog)
        .map_err(SchemaError::from)
        .with_context(|| format!("Failed to render the {} template", export.name()))?;

    write_output(args.output.as_deref(), &rendered)
}

async fn extract(config: &Config) -> Result<Catalog, SchemaError> {
    let connection = Connection::open(&config.database).await?;
    let catalog = connection.extract(config).await;
    connection.close().await;
    catalog
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        if !content.is_empty() && !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}
