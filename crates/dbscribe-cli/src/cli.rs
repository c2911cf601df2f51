//! CLI argument parsing using clap.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// dbscribe - render database table structures through templates
#[derive(Parser, Debug)]
#[command(name = "dbscribe")]
#[command(
    about = "Parse database table structures from MySQL, PostgreSQL or SQLite and render them through templates",
    long_about = None
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print an example configuration
    Config {
        /// Print the JSON Schema of the configuration file instead
        #[arg(long)]
        json_schema: bool,
    },
    /// Render the template named by `template_file_custom`
    Custom(ExportArgs),
    /// Map database identifiers to their quoted form
    Replace(ExportArgs),
    /// Identifier constants for every table, so code never hard-codes names
    Schema(ExportArgs),
    /// Rust structs and DDL constants for every table
    Table(ExportArgs),
}

impl Command {
    /// The export this command runs, if it is one.
    pub fn export(&self) -> Option<(Export, &ExportArgs)> {
        match self {
            Command::Config { .. } => None,
            Command::Custom(args) => Some((Export::Custom, args)),
            Command::Replace(args) => Some((Export::Replace, args)),
            Command::Schema(args) => Some((Export::Schema, args)),
            Command::Table(args) => Some((Export::Table, args)),
        }
    }
}

/// Options shared by every export command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Configuration file [default: dbscribe-<command>.yaml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only these tables, comma separated (e.g. users,orders)
    #[arg(short, long, value_name = "TABLES")]
    pub table: Option<String>,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// The template-driven commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
    Custom,
    Replace,
    Schema,
    Table,
}

impl Export {
    pub fn name(self) -> &'static str {
        match self {
            Export::Custom => "custom",
            Export::Replace => "replace",
            Export::Schema => "schema",
            Export::Table => "table",
        }
    }

    /// `dbscribe-<command>.yaml`
    pub fn default_config_file(self) -> PathBuf {
        PathBuf::from(format!("dbscribe-{}.yaml", self.name()))
    }

    /// `DBSCRIBE_<COMMAND>_CONFIG`
    pub fn config_env_var(self) -> String {
        format!("DBSCRIBE_{}_CONFIG", self.name().to_uppercase())
    }
}

impl ExportArgs {
    /// Resolve the configuration file from the process environment.
    pub fn config_path(&self, export: Export) -> PathBuf {
        resolve_config_path(export, self.config.as_deref(), |key| std::env::var(key).ok())
    }

    /// The `--table` allow-list.
    pub fn tables(&self) -> Vec<String> {
        self.table.as_deref().map(parse_table_list).unwrap_or_default()
    }
}

/// Pick the configuration file for `export`.
///
/// The explicit path (or `dbscribe-<command>.yaml`) wins when it exists.
/// Otherwise `DBSCRIBE_<COMMAND>_CONFIG` is used if it names an existing
/// file. When neither exists the first candidate is returned so the load
/// error names it.
pub fn resolve_config_path(
    export: Export,
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| export.default_config_file());
    if path.exists() {
        return path;
    }
    env(&export.config_env_var())
        .map(PathBuf::from)
        .filter(|candidate| candidate.is_file())
        .unwrap_or(path)
}

/// Split a comma-separated table list, trimming entries and dropping
/// empties and repeats.
pub fn parse_table_list(value: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if !tables.iter().any(|seen| seen == name) {
            tables.push(name.to_string());
        }
    }
    tables
}
