/*!
`idp-clients` command group (auth): identity provider clients.

  privx-cli idp-clients
  privx-cli idp-clients create JSON-FILE
  privx-cli idp-clients show --id ID
  privx-cli idp-clients update --id ID JSON-FILE
  privx-cli idp-clients delete --id ID[,ID...]
  privx-cli idp-clients regenerate --id ID
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared::{self, Collection};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

const IDP_CLIENTS: Collection = Collection::new(Service::Auth, "/idp/clients");

#[derive(Args, Debug)]
pub struct IdpClientsArgs {
    #[command(subcommand)]
    pub command: Option<IdpClientCommand>,
}

#[derive(Subcommand, Debug)]
pub enum IdpClientCommand {
    /// Create an IdP client, prints its ID
    Create { file: PathBuf },
    /// Get an IdP client
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update an IdP client
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete IdP clients
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Regenerate the client configuration
    Regenerate {
        #[arg(long, required = true)]
        id: String,
    },
}

pub async fn execute_idp_clients<C: Connector, W: Write>(
    args: IdpClientsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        return shared::print_items(api, out, IDP_CLIENTS.list()).await;
    };

    match command {
        IdpClientCommand::Create { file } => IDP_CLIENTS.create(api, out, &file).await,
        IdpClientCommand::Show { id } => IDP_CLIENTS.show_one(api, out, &id).await,
        IdpClientCommand::Update { id, file } => IDP_CLIENTS.update(api, &id, &file).await,
        IdpClientCommand::Delete { id } => IDP_CLIENTS.delete(api, out, &id).await,
        IdpClientCommand::Regenerate { id } => {
            let req = Request::post(Service::Auth, format!("/idp/clients/{id}/regenerate"));
            shared::print(api, out, req).await
        }
    }
}
