//! Rigging CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use std::io::Write;

use clap::{Parser, Subcommand};

/// Rigging - compile app definitions into Docker and Kubernetes resources
#[derive(Parser, Debug)]
#[command(name = "rigging")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render an app definition into resources
    Render(commands::render::RenderArgs),
    /// Print the JSON Schema of an app definition kind
    Schema(commands::schema::SchemaArgs),
    /// Print the connection URL of an app definition
    ConnectionUrl(commands::connection_url::ConnectionUrlArgs),
}

impl Cli {
    /// Run the CLI command, writing results to stdout
    pub fn run(self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_with(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Run the CLI command, writing results to `out`
    pub fn run_with(self, out: &mut impl Write) -> Result<()> {
        match self.command {
            Commands::Render(args) => commands::render::run(args, out),
            Commands::Schema(args) => commands::schema::run(args, out),
            Commands::ConnectionUrl(args) => commands::connection_url::run(args, out),
        }
    }
}
