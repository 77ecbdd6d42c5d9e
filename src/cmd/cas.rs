/*!
`extender` and `web-proxy` command groups: CA certificates and revocation
lists served by the authorizer for each client type.

  privx-cli extender [--group-id ACCESS-GROUP-ID]
  privx-cli extender show --id ID
  privx-cli extender revocation-list --id ID --name FILE
*/

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::kind::ClientType;
use super::shared;
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct CaArgs {
    #[command(subcommand)]
    pub command: Option<CaCommand>,

    /// Access group ID filter
    #[arg(long, default_value = "")]
    pub group_id: String,
}

#[derive(Subcommand, Debug)]
pub enum CaCommand {
    /// Get CA certificate
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Download the certificate revocation list
    RevocationList {
        #[arg(long, required = true)]
        id: String,
        /// Output file name
        #[arg(long, required = true)]
        name: String,
    },
}

pub async fn execute_cas<C: Connector, W: Write>(
    kind: ClientType,
    args: CaArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        None => list_cas(api, out, kind, &args.group_id).await,
        Some(CaCommand::Show { id }) => show_ca(api, out, kind, &id).await,
        Some(CaCommand::RevocationList { id, name }) => {
            download_crl(api, kind, &id, Path::new(&name)).await
        }
    }
}

pub async fn list_cas<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    kind: ClientType,
    group_id: &str,
) -> Result<()> {
    let req = Request::get(Service::Authorizer, format!("/{}/cas", kind.route().segment))
        .query("access_group_id", group_id);
    shared::print(api, out, req).await
}

pub async fn show_ca<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    kind: ClientType,
    id: &str,
) -> Result<()> {
    let req = Request::get(
        Service::Authorizer,
        format!("/{}/cas/{id}", kind.route().segment),
    );
    shared::print(api, out, req).await
}

pub async fn download_crl<C: Connector>(
    api: &C,
    kind: ClientType,
    id: &str,
    path: &Path,
) -> Result<()> {
    let req = Request::get(
        Service::Authorizer,
        format!("/{}/cas/{id}/crl", kind.route().segment),
    );
    api::download(api, req, path)
        .await
        .with_context(|| format!("failed to download revocation list to {}", path.display()))
}
