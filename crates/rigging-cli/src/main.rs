//! Rigging CLI
//!
//! Renders app definitions into Docker resource groups or Kubernetes manifests.

use clap::Parser;
use rigging_common::telemetry::{init_logging, LogConfig};

use rigging_cli::{Cli, Result};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogConfig {
        json: cli.json_logs,
        ..Default::default()
    })?;
    cli.run()
}
