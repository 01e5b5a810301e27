//! Connection URL command

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use rigging_apps::ConnectionContext;

use super::load_definition;
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct ConnectionUrlArgs {
    /// App definition file
    pub file: PathBuf,

    /// Where the client runs: local, docker or k8s
    #[arg(long, default_value = "local")]
    pub context: ConnectionContext,
}

pub fn run(args: ConnectionUrlArgs, out: &mut impl Write) -> Result<()> {
    let definition = load_definition(&args.file)?;
    let kind = definition.kind();
    let app = definition.into_app()?;
    let url = app
        .connection_url(args.context)
        .ok_or_else(|| Error::NoConnectionUrl {
            kind: kind.to_string(),
        })?;
    writeln!(out, "{}", url)?;
    Ok(())
}
