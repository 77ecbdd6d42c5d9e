/*!
Workflow engine groups: `workflows` and the access `requests` queue.

  privx-cli workflows [--offset N --limit N]
  privx-cli workflows create JSON-FILE
  privx-cli workflows show|delete --id ID[,ID...]
  privx-cli workflows update --id ID JSON-FILE
  privx-cli workflows settings
  privx-cli workflows update-settings JSON-FILE
  privx-cli workflows test-smtp JSON-FILE

  privx-cli requests [--offset N --limit N --filter F]
  privx-cli requests create JSON-FILE
  privx-cli requests show|delete --id ID[,ID...]
  privx-cli requests decision --id ID JSON-FILE
  privx-cli requests search [--sortkey K --sortdir D --filter F paging flags] [JSON-FILE]
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared::{self, Collection, PageArgs, Paged, SortArgs, read_body, read_optional_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

const WORKFLOWS: Collection = Collection::new(Service::WorkflowEngine, "/workflows");
const REQUESTS: Collection = Collection::new(Service::WorkflowEngine, "/requests");

/* ---- workflows ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct WorkflowsArgs {
    #[command(subcommand)]
    pub command: Option<WorkflowCommand>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// Create a workflow, prints its ID
    Create { file: PathBuf },
    /// Get workflows by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update a workflow
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete workflows
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Show the workflow engine settings
    Settings,
    /// Update the workflow engine settings
    UpdateSettings { file: PathBuf },
    /// Send a test email with the given SMTP settings
    #[command(alias = "testsmtp")]
    TestSmtp { file: PathBuf },
}

pub async fn execute_workflows<C: Connector, W: Write>(
    args: WorkflowsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        return shared::print_items(api, out, WORKFLOWS.list().page(&args.page)).await;
    };

    match command {
        WorkflowCommand::Create { file } => WORKFLOWS.create(api, out, &file).await,
        WorkflowCommand::Show { id } => WORKFLOWS.show(api, out, &id).await,
        WorkflowCommand::Update { id, file } => WORKFLOWS.update(api, &id, &file).await,
        WorkflowCommand::Delete { id } => WORKFLOWS.delete(api, out, &id).await,
        WorkflowCommand::Settings => {
            shared::print(api, out, Request::get(Service::WorkflowEngine, "/settings")).await
        }
        WorkflowCommand::UpdateSettings { file } => {
            let req = Request::put(Service::WorkflowEngine, "/settings").json(read_body(&file)?);
            shared::send(api, req).await
        }
        WorkflowCommand::TestSmtp { file } => {
            let req = Request::post(Service::WorkflowEngine, "/testsmtp").json(read_body(&file)?);
            shared::print(api, out, req).await
        }
    }
}

/* ---- requests ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct RequestsArgs {
    #[command(subcommand)]
    pub command: Option<RequestCommand>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Request queue filter (requests, active_requests, approvals, ...)
    #[arg(long, default_value = "")]
    pub filter: String,
}

#[derive(Subcommand, Debug)]
pub enum RequestCommand {
    /// Create an access request, prints its ID
    Create { file: PathBuf },
    /// Get requests by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Delete requests
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Approve or deny a request step
    #[command(alias = "decision-request")]
    Decision {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Search access requests
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SortArgs,
        #[arg(long, default_value = "")]
        filter: String,
        file: Option<PathBuf>,
    },
}

pub async fn execute_requests<C: Connector, W: Write>(
    args: RequestsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = REQUESTS.list().page(&args.page).query("filter", &args.filter);
        return shared::print_items(api, out, req).await;
    };

    match command {
        RequestCommand::Create { file } => REQUESTS.create(api, out, &file).await,
        RequestCommand::Show { id } => REQUESTS.show(api, out, &id).await,
        RequestCommand::Delete { id } => REQUESTS.delete(api, out, &id).await,
        RequestCommand::Decision { id, file } => {
            let req = Request::put(Service::WorkflowEngine, format!("/requests/{id}/decision"))
                .json(read_body(&file)?);
            shared::send(api, req).await
        }
        RequestCommand::Search {
            page,
            sort,
            filter,
            file,
        } => {
            let req = Request::post(Service::WorkflowEngine, "/requests/search")
                .page(&page)
                .sort(&sort)
                .query("filter", filter.to_uppercase())
                .json(read_optional_body(file.as_ref())?);
            shared::print_items(api, out, req).await
        }
    }
}
