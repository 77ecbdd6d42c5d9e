/*!
`connections` command group (connection-manager), including the `ueba`
anomaly detection subgroup (also reachable as the top-level `ueba`).

  privx-cli connections [paging + sort flags] [--fuzzy-count]
  privx-cli connections search [paging + sort flags] [JSON-FILE]
  privx-cli connections show --id ID[,ID...]
  privx-cli connections download-file --id ID --channel-id CH --file-id F --name OUT
  privx-cli connections download-log --id ID --channel-id CH --name OUT [--format json|hex] [--filter F]
  privx-cli connections access-roles --id ID
  privx-cli connections grant-access-role --id ID --role-id ROLE
  privx-cli connections revoke-access-role --role-id ROLE [--id ID | --force]
  privx-cli connections terminate --id ID | --target-host HOST | --user UID

  privx-cli connections ueba config [set JSON-FILE] | set-config JSON-FILE
  privx-cli connections ueba anomaly-settings [create JSON-FILE] | set-anomaly-settings JSON-FILE
  privx-cli connections ueba start-analysis --dataset-id ID | stop-analysis
  privx-cli connections ueba setup-script --name OUT
  privx-cli connections ueba datasets [--logs --bin-count N] [create|show|update|delete|train|connection-count]
*/

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args, Subcommand};

use super::shared::{self, PageArgs, Paged, SortArgs, read_body, read_optional_body};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

const SERVICE: Service = Service::ConnectionManager;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct ConnectionsArgs {
    #[command(subcommand)]
    pub command: Option<ConnectionCommand>,

    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    /// Return a fuzzy total count instead of an exact one
    #[arg(long)]
    pub fuzzy_count: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConnectionCommand {
    /// Search connections
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SortArgs,
        #[arg(long)]
        fuzzy_count: bool,
        file: Option<PathBuf>,
    },
    /// Get connections by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Download a file transferred during a connection
    DownloadFile {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        channel_id: String,
        #[arg(long, required = true)]
        file_id: String,
        /// Output file name
        #[arg(long, required = true)]
        name: String,
    },
    /// Download the trail log of a connection channel
    DownloadLog {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        channel_id: String,
        #[arg(long, required = true)]
        name: String,
        /// Trail log format, json or hex
        #[arg(long, default_value = "")]
        format: String,
        /// Trail log event filter
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// List the roles with access to a connection's recordings
    AccessRoles {
        #[arg(long, required = true)]
        id: String,
    },
    /// Grant a role access to a connection's recordings
    GrantAccessRole {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        role_id: String,
    },
    /// Revoke a role's access from one or every connection
    RevokeAccessRole {
        #[arg(long, required = true)]
        role_id: String,
        /// Connection ID; without it the role loses access to every connection
        #[arg(long)]
        id: Option<String>,
        /// Confirm revoking from every connection
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Terminate connections by ID, target host or user
    Terminate(TerminateArgs),
    /// User and entity behaviour analytics
    Ueba(UebaArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["id", "target_host", "user"])))]
pub struct TerminateArgs {
    /// Connection ID
    #[arg(long)]
    pub id: Option<String>,

    /// Target host ID
    #[arg(long)]
    pub target_host: Option<String>,

    /// User ID
    #[arg(long)]
    pub user: Option<String>,
}

impl TerminateArgs {
    fn path(&self) -> Option<String> {
        match (&self.id, &self.target_host, &self.user) {
            (Some(id), None, None) => Some(format!("/terminate/connection/{id}")),
            (None, Some(host), None) => Some(format!("/terminate/host/{host}")),
            (None, None, Some(user)) => Some(format!("/terminate/user/{user}")),
            _ => None,
        }
    }
}

pub async fn execute_connections<C: Connector, W: Write>(
    args: ConnectionsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(SERVICE, "/connections")
            .page(&args.page)
            .sort(&args.sort)
            .query("fuzzycount", args.fuzzy_count);
        return shared::print_items(api, out, req).await;
    };

    match command {
        ConnectionCommand::Search {
            page,
            sort,
            fuzzy_count,
            file,
        } => {
            let req = Request::post(SERVICE, "/connections/search")
                .page(&page)
                .sort(&sort)
                .query("fuzzycount", fuzzy_count)
                .json(read_optional_body(file.as_ref())?);
            shared::print_items(api, out, req).await
        }
        ConnectionCommand::Show { id } => {
            shared::show_each(api, out, &id, |id| {
                Request::get(SERVICE, format!("/connections/{id}"))
            })
            .await
        }
        ConnectionCommand::DownloadFile {
            id,
            channel_id,
            file_id,
            name,
        } => {
            let base = format!("/connections/{id}/channel/{channel_id}/file/{file_id}");
            download_with_session(api, &base, |r| r, Path::new(&name)).await
        }
        ConnectionCommand::DownloadLog {
            id,
            channel_id,
            name,
            format,
            filter,
        } => {
            let base = format!("/connections/{id}/channel/{channel_id}/log");
            let shape = |r: Request| r.query("format", &format).query("filter", &filter);
            download_with_session(api, &base, shape, Path::new(&name)).await
        }
        ConnectionCommand::AccessRoles { id } => {
            let req = Request::get(SERVICE, format!("/connections/{id}/access_roles"));
            shared::print_items(api, out, req).await
        }
        ConnectionCommand::GrantAccessRole { id, role_id } => {
            let req = Request::post(SERVICE, format!("/connections/{id}/access_roles/{role_id}"));
            shared::send(api, req).await
        }
        ConnectionCommand::RevokeAccessRole { role_id, id, force } => {
            let path = match id {
                Some(id) => format!("/connections/{id}/access_roles/{role_id}"),
                None if force => format!("/connections/access_roles/{role_id}"),
                None => bail!(
                    "this action will revoke data access rights from this role to all connections. \
                     Use --force to revoke data access to all connections or use --id to revoke \
                     data access to a specific connection"
                ),
            };
            shared::send(api, Request::delete(SERVICE, path)).await
        }
        ConnectionCommand::Terminate(target) => {
            let Some(path) = target.path() else {
                bail!("specify exactly one of --id, --target-host or --user");
            };
            shared::send(api, Request::post(SERVICE, path)).await
        }
        ConnectionCommand::Ueba(args) => execute_ueba(args, api, out).await,
    }
}

/// Request a download session under `base`, then fetch `base/{session}`.
async fn download_with_session<C, F>(api: &C, base: &str, shape: F, path: &Path) -> Result<()>
where
    C: Connector,
    F: Fn(Request) -> Request,
{
    let handle = api::call(api, Request::post(SERVICE, base)).await?;
    let session = api::session_id(&handle)?;
    let req = shape(Request::get(SERVICE, format!("{base}/{session}")));
    api::download(api, req, path)
        .await
        .with_context(|| format!("failed to download to {}", path.display()))
}

/* ---- ueba ---- */

#[derive(Args, Debug)]
pub struct UebaArgs {
    #[command(subcommand)]
    pub command: UebaCommand,
}

#[derive(Subcommand, Debug)]
pub enum UebaCommand {
    /// Show the UEBA configuration
    Config {
        #[command(subcommand)]
        command: Option<UebaConfigCommand>,
    },
    /// Replace the UEBA configuration
    SetConfig { file: PathBuf },
    /// Show the anomaly settings
    AnomalySettings {
        #[command(subcommand)]
        command: Option<AnomalySettingsCommand>,
    },
    /// Replace the anomaly settings
    SetAnomalySettings { file: PathBuf },
    /// Start anomaly analysis with a dataset
    StartAnalysis {
        #[arg(long, alias = "id", required = true)]
        dataset_id: String,
    },
    /// Stop anomaly analysis
    StopAnalysis,
    /// Download the UEBA setup script
    #[command(alias = "download-script")]
    SetupScript {
        /// Output file name
        #[arg(long, required = true)]
        name: String,
    },
    /// List and manage training datasets
    Datasets(DatasetsArgs),
    /// Show the UEBA status
    Status,
    /// Show the UEBA internal status
    InternalStatus,
}

#[derive(Subcommand, Debug)]
pub enum UebaConfigCommand {
    /// Replace the UEBA configuration
    Set { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum AnomalySettingsCommand {
    /// Replace the anomaly settings
    Create { file: PathBuf },
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct DatasetsArgs {
    #[command(subcommand)]
    pub command: Option<DatasetCommand>,

    #[command(flatten)]
    pub history: HistoryArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct HistoryArgs {
    /// Include pandas and tensorflow log prints
    #[arg(long)]
    pub logs: bool,

    /// How many bins of training history to return
    #[arg(long, default_value_t = 50)]
    pub bin_count: u32,
}

impl HistoryArgs {
    fn apply(&self, req: Request) -> Request {
        req.query("logs", self.logs).query("bin_count", self.bin_count)
    }
}

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Create a dataset, prints its ID
    Create { file: PathBuf },
    /// Get a dataset
    Show {
        #[arg(long, required = true)]
        id: String,
        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Update a dataset
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete a dataset
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Train a dataset
    Train {
        #[arg(long, required = true)]
        id: String,
        /// Make the dataset active once trained
        #[arg(long)]
        set_active: bool,
    },
    /// Count connections matching a time range (all connections without a file)
    ConnectionCount { file: Option<PathBuf> },
}

pub async fn execute_ueba<C: Connector, W: Write>(
    args: UebaArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        UebaCommand::Config { command: None } => {
            shared::print(api, out, Request::get(SERVICE, "/ueba/configure")).await
        }
        UebaCommand::SetConfig { file }
        | UebaCommand::Config {
            command: Some(UebaConfigCommand::Set { file }),
        } => {
            let req = Request::put(SERVICE, "/ueba/configure").json(read_body(&file)?);
            shared::send(api, req).await
        }
        UebaCommand::AnomalySettings { command: None } => {
            shared::print(api, out, Request::get(SERVICE, "/ueba/anomaly-settings")).await
        }
        UebaCommand::SetAnomalySettings { file }
        | UebaCommand::AnomalySettings {
            command: Some(AnomalySettingsCommand::Create { file }),
        } => {
            let req = Request::post(SERVICE, "/ueba/anomaly-settings").json(read_body(&file)?);
            shared::send(api, req).await
        }
        UebaCommand::StartAnalysis { dataset_id } => {
            let req = Request::post(SERVICE, format!("/ueba/start-analyzing/{dataset_id}"));
            shared::send(api, req).await
        }
        UebaCommand::StopAnalysis => {
            shared::send(api, Request::post(SERVICE, "/ueba/stop-analyzing")).await
        }
        UebaCommand::SetupScript { name } => {
            let handle = api::call(api, Request::post(SERVICE, "/ueba/setup-script")).await?;
            let id = shared::str_field(&handle, "id");
            if id.is_empty() {
                bail!("setup script handle is missing id");
            }
            let path = Path::new(&name);
            let req = Request::get(SERVICE, format!("/ueba/setup-script/{id}"));
            api::download(api, req, path)
                .await
                .with_context(|| format!("failed to download to {}", path.display()))
        }
        UebaCommand::Datasets(datasets) => execute_datasets(datasets, api, out).await,
        UebaCommand::Status => shared::print(api, out, Request::get(SERVICE, "/ueba/status")).await,
        UebaCommand::InternalStatus => {
            shared::print(api, out, Request::get(SERVICE, "/ueba/internal-status")).await
        }
    }
}

async fn execute_datasets<C: Connector, W: Write>(
    args: DatasetsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = args.history.apply(Request::get(SERVICE, "/ueba/datasets"));
        return shared::print_items(api, out, req).await;
    };

    match command {
        DatasetCommand::Create { file } => {
            let req = Request::post(SERVICE, "/ueba/datasets").json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        DatasetCommand::Show { id, history } => {
            let req = history.apply(Request::get(SERVICE, format!("/ueba/datasets/{id}")));
            shared::print(api, out, req).await
        }
        DatasetCommand::Update { id, file } => {
            let req = Request::put(SERVICE, format!("/ueba/datasets/{id}")).json(read_body(&file)?);
            shared::send(api, req).await
        }
        DatasetCommand::Delete { id } => {
            shared::send(api, Request::delete(SERVICE, format!("/ueba/datasets/{id}"))).await
        }
        DatasetCommand::Train { id, set_active } => {
            let req = Request::post(SERVICE, format!("/ueba/train/{id}"))
                .query("set_active_after_training", set_active);
            shared::print(api, out, req).await
        }
        DatasetCommand::ConnectionCount { file } => {
            let req = Request::post(SERVICE, "/ueba/query-connection-count")
                .json(read_optional_body(file.as_ref())?);
            shared::print(api, out, req).await
        }
    }
}
