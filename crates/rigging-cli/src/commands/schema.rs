//! Schema command

use std::io::Write;

use clap::{Args, ValueEnum};
use rigging_apps::{AppDefinition, RedisOptions, SupersetSchedulerOptions};
use schemars::schema_for;

use crate::Result;

/// App definition kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DefinitionKind {
    /// `kind: redis`
    Redis,
    /// `kind: superset-scheduler`
    SupersetScheduler,
    /// Any app definition
    All,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Definition kind to describe
    #[arg(value_enum)]
    pub kind: DefinitionKind,
}

pub fn run(args: SchemaArgs, out: &mut impl Write) -> Result<()> {
    let schema = match args.kind {
        DefinitionKind::Redis => schema_for!(RedisOptions),
        DefinitionKind::SupersetScheduler => schema_for!(SupersetSchedulerOptions),
        DefinitionKind::All => schema_for!(AppDefinition),
    };
    serde_json::to_writer_pretty(&mut *out, &schema)?;
    writeln!(out)?;
    Ok(())
}
