/*!
`network-targets` (alias `nam`): network access manager targets.

  privx-cli network-targets [--offset N --limit N --sortkey id --sortdir ASC --name N --id ID]
  privx-cli network-targets status
  privx-cli network-targets create JSON-FILE
  privx-cli network-targets search [--keywords K --filter F sort + paging flags] [JSON-FILE]
  privx-cli network-targets show --id ID
  privx-cli network-targets update --id ID JSON-FILE
  privx-cli network-targets delete --id ID
  privx-cli network-targets disable --id ID [--disable false]
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Subcommand};
use serde_json::{Value, json};

use super::shared::{self, Collection, PageArgs, Paged, read_optional_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

const TARGETS: Collection = Collection::new(Service::NetworkAccessManager, "/nwtargets");

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct NetworkTargetsArgs {
    #[command(subcommand)]
    pub command: Option<NetworkTargetCommand>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Sort by id, name, comment, ...
    #[arg(long, default_value = "id")]
    pub sortkey: String,

    /// Sort direction, ASC or DESC
    #[arg(long, default_value = "ASC")]
    pub sortdir: String,

    /// Only targets with this name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Only the target with this ID
    #[arg(long, default_value = "")]
    pub id: String,
}

#[derive(Subcommand, Debug)]
pub enum NetworkTargetCommand {
    /// Show the network access manager status
    Status,
    /// Create a network target, prints its ID
    Create { file: PathBuf },
    /// Search network targets
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value = "")]
        sortkey: String,
        #[arg(long, default_value = "ASC")]
        sortdir: String,
        #[arg(long, default_value = "")]
        filter: String,
        /// Search keywords
        #[arg(long, default_value = "")]
        keywords: String,
        file: Option<PathBuf>,
    },
    /// Get a network target
    #[command(alias = "get")]
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update a network target
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete a network target
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Enable or disable a network target
    Disable {
        #[arg(long, required = true)]
        id: String,
        /// true disables the target, false enables it
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        disable: bool,
    },
}

pub async fn execute_network_targets<C: Connector, W: Write>(
    args: NetworkTargetsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = TARGETS
            .list()
            .page(&args.page)
            .query("sortkey", &args.sortkey)
            .query("sortdir", args.sortdir.to_uppercase())
            .query("name", &args.name)
            .query("id", &args.id);
        return shared::print_items(api, out, req).await;
    };

    match command {
        NetworkTargetCommand::Status => {
            shared::print(api, out, Request::get(Service::NetworkAccessManager, "/status")).await
        }
        NetworkTargetCommand::Create { file } => TARGETS.create(api, out, &file).await,
        NetworkTargetCommand::Search {
            page,
            sortkey,
            sortdir,
            filter,
            keywords,
            file,
        } => {
            let mut body = read_optional_body(file.as_ref())?;
            if let (Value::Object(map), false) = (&mut body, keywords.is_empty()) {
                map.insert("keywords".into(), json!(keywords));
            }
            let req = Request::post(Service::NetworkAccessManager, "/nwtargets/search")
                .page(&page)
                .query("sortkey", &sortkey)
                .query("sortdir", sortdir.to_uppercase())
                .query("filter", &filter)
                .json(body);
            shared::print_items(api, out, req).await
        }
        NetworkTargetCommand::Show { id } => TARGETS.show_one(api, out, &id).await,
        NetworkTargetCommand::Update { id, file } => TARGETS.update(api, &id, &file).await,
        NetworkTargetCommand::Delete { id } => {
            shared::send(api, Request::delete(Service::NetworkAccessManager, TARGETS.item(&id)))
                .await
        }
        NetworkTargetCommand::Disable { id, disable } => {
            let req = Request::post(
                Service::NetworkAccessManager,
                format!("/nwtargets/{id}/disable"),
            )
            .json(json!({ "disabled": disable }));
            shared::send(api, req).await
        }
    }
}
