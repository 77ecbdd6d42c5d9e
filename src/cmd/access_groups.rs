/*!
`access-groups` command group (authorizer).

  privx-cli access-groups [--offset N --limit N --sortkey K --sortdir D]
  privx-cli access-groups create JSON-FILE
  privx-cli access-groups search [paging flags] [JSON-FILE]
  privx-cli access-groups show --id ID
  privx-cli access-groups update --id ID JSON-FILE
  privx-cli access-groups delete --id ID[,ID...]
  privx-cli access-groups renew-ca --id ID
  privx-cli access-groups revoke-ca --id ID --ca-id CA-ID
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared::{self, PageArgs, Paged, SortArgs, read_body, read_optional_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AccessGroupsArgs {
    #[command(subcommand)]
    pub command: Option<AccessGroupCommand>,

    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub sort: SortArgs,
}

#[derive(Subcommand, Debug)]
pub enum AccessGroupCommand {
    /// Create an access group, prints its ID
    Create { file: PathBuf },
    /// Search access groups
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SortArgs,
        file: Option<PathBuf>,
    },
    /// Get access group by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update an access group
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete access groups
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Create a new CA key for an access group, prints its ID
    RenewCa {
        #[arg(long, required = true)]
        id: String,
    },
    /// Revoke a CA key of an access group
    RevokeCa {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        ca_id: String,
    },
}

pub async fn execute_access_groups<C: Connector, W: Write>(
    args: AccessGroupsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(Service::Authorizer, "/accessgroups")
            .page(&args.page)
            .sort(&args.sort);
        return shared::print_items(api, out, req).await;
    };

    match command {
        AccessGroupCommand::Create { file } => {
            let req = Request::post(Service::Authorizer, "/accessgroups").json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        AccessGroupCommand::Search { page, sort, file } => {
            let req = Request::post(Service::Authorizer, "/accessgroups/search")
                .page(&page)
                .sort(&sort)
                .json(read_optional_body(file.as_ref())?);
            shared::print_items(api, out, req).await
        }
        AccessGroupCommand::Show { id } => {
            let req = Request::get(Service::Authorizer, format!("/accessgroups/{id}"));
            shared::print(api, out, req).await
        }
        AccessGroupCommand::Update { id, file } => {
            let req = Request::put(Service::Authorizer, format!("/accessgroups/{id}"))
                .json(read_body(&file)?);
            shared::send(api, req).await
        }
        AccessGroupCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::Authorizer, format!("/accessgroups/{id}"))
            })
            .await
        }
        AccessGroupCommand::RenewCa { id } => {
            let req = Request::post(Service::Authorizer, format!("/accessgroups/{id}/cas"));
            shared::print_id(api, out, req).await
        }
        AccessGroupCommand::RevokeCa { id, ca_id } => {
            let req = Request::delete(Service::Authorizer, format!("/accessgroups/{id}/cas/{ca_id}"));
            shared::send(api, req).await
        }
    }
}
