//! `db-proxy` command group.
//!
//!   privx-cli db-proxy config

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared;
use crate::api::{Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
pub struct DbProxyArgs {
    #[command(subcommand)]
    pub command: DbProxyCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbProxyCommand {
    /// Show the DB proxy configuration
    Config,
}

pub async fn execute_db_proxy<C: Connector, W: Write>(
    args: DbProxyArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        DbProxyCommand::Config => shared::print(api, out, Request::get(Service::DbProxy, "/conf")).await,
    }
}
