/*!
Monitor service groups: `components`, `instance` and `audit-events`.

  privx-cli components [show --name HOST]
  privx-cli instance status|terminate
  privx-cli audit-events [paging + sort flags] [--fuzzy-count]
  privx-cli audit-events search [paging + sort flags] [--fuzzy-count] [JSON-FILE]
  privx-cli audit-events codes
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared::{self, PageArgs, Paged, SortArgs, read_optional_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

const SERVICE: Service = Service::MonitorService;

/* ---- components ---- */

#[derive(Args, Debug)]
pub struct ComponentsArgs {
    #[command(subcommand)]
    pub command: Option<ComponentCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ComponentCommand {
    /// Get the component status of one host
    Show {
        /// Host name
        #[arg(long, required = true)]
        name: String,
    },
}

pub async fn execute_components<C: Connector, W: Write>(
    args: ComponentsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let req = match args.command {
        None => Request::get(SERVICE, "/components"),
        Some(ComponentCommand::Show { name }) => Request::get(SERVICE, format!("/components/{name}")),
    };
    shared::print(api, out, req).await
}

/* ---- instance ---- */

#[derive(Args, Debug)]
pub struct InstanceArgs {
    #[command(subcommand)]
    pub command: InstanceCommand,
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommand {
    /// Show the PrivX instance status
    Status,
    /// Terminate every PrivX instance
    Terminate,
}

pub async fn execute_instance<C: Connector, W: Write>(
    args: InstanceArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        InstanceCommand::Status => shared::print(api, out, Request::get(SERVICE, "/instance/status")).await,
        InstanceCommand::Terminate => {
            shared::send(api, Request::post(SERVICE, "/instance/terminate")).await
        }
    }
}

/* ---- audit-events ---- */

#[derive(Args, Debug, Clone, Default)]
pub struct EventQueryArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    /// Return a fuzzy total count instead of an exact one
    #[arg(long)]
    pub fuzzy_count: bool,
}

impl EventQueryArgs {
    fn apply(&self, req: Request) -> Request {
        req.page(&self.page)
            .sort(&self.sort)
            .query("fuzzycount", self.fuzzy_count)
    }
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AuditEventsArgs {
    #[command(subcommand)]
    pub command: Option<AuditEventCommand>,

    #[command(flatten)]
    pub query: EventQueryArgs,
}

#[derive(Subcommand, Debug)]
pub enum AuditEventCommand {
    /// Search audit events
    Search {
        #[command(flatten)]
        query: EventQueryArgs,
        file: Option<PathBuf>,
    },
    /// List the audit event codes
    Codes,
}

pub async fn execute_audit_events<C: Connector, W: Write>(
    args: AuditEventsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        None => {
            let req = args.query.apply(Request::get(SERVICE, "/auditevents"));
            shared::print_items(api, out, req).await
        }
        Some(AuditEventCommand::Search { query, file }) => {
            let req = query
                .apply(Request::post(SERVICE, "/auditevents/search"))
                .json(read_optional_body(file.as_ref())?);
            shared::print_items(api, out, req).await
        }
        Some(AuditEventCommand::Codes) => {
            shared::print(api, out, Request::get(SERVICE, "/auditevents/codes")).await
        }
    }
}
