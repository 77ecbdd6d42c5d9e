/*!
`hosts` command group (host-store).

  privx-cli hosts [--offset N --limit N --sortkey K --sortdir D --filter F]
  privx-cli hosts search [JSON-FILE]
  privx-cli hosts create JSON-FILE
  privx-cli hosts show --id ID[,ID...]
  privx-cli hosts update --id ID JSON-FILE
  privx-cli hosts delete --id ID[,ID...]
  privx-cli hosts resolve JSON-FILE
  privx-cli hosts deployable --id ID[,ID...] --status true|false
  privx-cli hosts disabled --id ID[,ID...] --status true|false
  privx-cli hosts settings
  privx-cli hosts deploy NAME
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use super::shared::{self, PageArgs, Paged, SortArgs, read_body, read_optional_body};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct HostsArgs {
    #[command(subcommand)]
    pub command: Option<HostCommand>,

    #[command(flatten)]
    pub list: HostQueryArgs,
}

#[derive(Args, Debug, Default)]
pub struct HostQueryArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    /// Filter hosts, possible values: accessible or configured
    #[arg(long, default_value = "")]
    pub filter: String,
}

#[derive(Subcommand, Debug)]
pub enum HostCommand {
    /// Search hosts
    Search {
        #[command(flatten)]
        query: HostQueryArgs,
        /// Search body
        file: Option<PathBuf>,
    },
    /// Create new host, prints its ID
    Create { file: PathBuf },
    /// Get hosts by ID
    Show {
        /// Host ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
    /// Update host
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete hosts
    Delete {
        /// Host ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
    /// Resolve service and address to a host
    Resolve { file: PathBuf },
    /// Enable or disable host deployability
    Deployable(HostStatusArgs),
    /// Enable or disable hosts
    Disabled(HostStatusArgs),
    /// Default service options
    Settings,
    /// Print the deployment config for trusted client NAME, creating the
    /// client when it does not exist
    Deploy { name: String },
}

#[derive(Args, Debug)]
pub struct HostStatusArgs {
    /// Host ID(s), separated by commas
    #[arg(long, required = true)]
    pub id: String,

    /// New status
    #[arg(
        long,
        required = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub status: bool,
}

fn host_query(req: Request, q: &HostQueryArgs) -> Request {
    req.page(&q.page).sort(&q.sort).query("filter", &q.filter)
}

pub async fn execute_hosts<C: Connector, W: Write>(
    args: HostsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = host_query(Request::get(Service::HostStore, "/hosts"), &args.list);
        return shared::print_items(api, out, req).await;
    };

    match command {
        HostCommand::Search { query, file } => {
            let body = read_optional_body(file.as_ref())?;
            let req = host_query(Request::post(Service::HostStore, "/hosts/search"), &query);
            shared::print_items(api, out, req.json(body)).await
        }
        HostCommand::Create { file } => {
            let body = read_body(&file)?;
            let req = Request::post(Service::HostStore, "/hosts").json(body);
            shared::print_id(api, out, req).await
        }
        HostCommand::Show { id } => {
            shared::show_each(api, out, &id, |id| {
                Request::get(Service::HostStore, format!("/hosts/{id}"))
            })
            .await
        }
        HostCommand::Update { id, file } => {
            let body = read_body(&file)?;
            let req = Request::put(Service::HostStore, format!("/hosts/{id}")).json(body);
            shared::send(api, req).await
        }
        HostCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::HostStore, format!("/hosts/{id}"))
            })
            .await
        }
        HostCommand::Resolve { file } => {
            let body = read_body(&file)?;
            let req = Request::post(Service::HostStore, "/hosts/resolve").json(body);
            shared::print(api, out, req).await
        }
        HostCommand::Deployable(s) => {
            shared::for_each_id(api, out, &s.id, |id| {
                Request::put(Service::HostStore, format!("/hosts/deployable/{id}"))
                    .json(json!({ "deployable": s.status }))
            })
            .await
        }
        HostCommand::Disabled(s) => {
            shared::for_each_id(api, out, &s.id, |id| {
                Request::put(Service::HostStore, format!("/hosts/disabled/{id}"))
                    .json(json!({ "disabled": s.status }))
            })
            .await
        }
        HostCommand::Settings => {
            let req = Request::get(Service::HostStore, "/settings/default_service_options");
            shared::print(api, out, req).await
        }
        HostCommand::Deploy { name } => deploy(api, out, &name).await,
    }
}

async fn deploy<C: Connector, W: Write>(api: &C, out: &mut Output<W>, name: &str) -> Result<()> {
    let clients =
        api::call_items(api, Request::get(Service::LocalUserStore, "/trusted-clients")).await?;
    let existing = find_client_id(&clients, name);

    let client_id = match existing {
        Some(id) => id,
        None => {
            tracing::info!(name, "creating host provisioning trusted client");
            let created = api::call(
                api,
                Request::post(Service::LocalUserStore, "/trusted-clients").json(json!({
                    "type": "HOST_PROVISIONING",
                    "name": name,
                })),
            )
            .await?;
            shared::str_field(&created, "id").to_string()
        }
    };
    if client_id.is_empty() {
        bail!("trusted client {name} has no id");
    }

    let script = api
        .send(Request::get(Service::Authorizer, format!("/deploy/{client_id}")))
        .await?;
    out.raw(&script)
}

fn find_client_id(clients: &Value, name: &str) -> Option<String> {
    clients
        .as_array()?
        .iter()
        .find(|c| shared::str_field(c, "name") == name)
        .map(|c| shared::str_field(c, "id").to_string())
}

/* --------------------------------- Tests ---------------------------------- */
