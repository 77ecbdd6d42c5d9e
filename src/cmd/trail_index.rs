/*!
`trail-index` (alias `index`): connection trail indexing.

  privx-cli trail-index status --id CONN[,CONN...]
  privx-cli trail-index start --id CONN[,CONN...]
  privx-cli trail-index search [--offset N --limit N --sortdir D] JSON-FILE

Status and start send every ID in a single request.
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use super::shared::{self, PageArgs, Paged, read_body, split_ids};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
pub struct TrailIndexArgs {
    #[command(subcommand)]
    pub command: TrailIndexCommand,
}

#[derive(Subcommand, Debug)]
pub enum TrailIndexCommand {
    /// Get the indexing status of connections
    Status {
        /// Connection ID(s), separated by commas
        #[arg(long, alias = "conn-id", required = true)]
        id: String,
    },
    /// Start indexing connections
    Start {
        #[arg(long, alias = "conn-id", required = true)]
        id: String,
    },
    /// Search indexed trail content
    Search {
        #[command(flatten)]
        page: PageArgs,
        /// Sort direction, ASC or DESC
        #[arg(long, default_value = "")]
        sortdir: String,
        file: PathBuf,
    },
}

pub async fn execute_trail_index<C: Connector, W: Write>(
    args: TrailIndexArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        TrailIndexCommand::Status { id } => {
            let req = Request::post(Service::TrailIndex, "/index/status").json(json!(split_ids(&id)));
            shared::print(api, out, req).await
        }
        TrailIndexCommand::Start { id } => {
            let req = Request::post(Service::TrailIndex, "/index/start").json(json!(split_ids(&id)));
            shared::print(api, out, req).await
        }
        TrailIndexCommand::Search {
            page,
            sortdir,
            file,
        } => {
            let req = Request::post(Service::TrailIndex, "/search")
                .page(&page)
                .query("sortdir", sortdir.to_uppercase())
                .json(read_body(&file)?);
            shared::print_items(api, out, req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::run;
    use serde_json::json;

    #[tokio::test]
    async fn status_is_one_request_for_all_ids() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["index", "status", "--id", "c1,c2,c3"]).await;
        res.unwrap();
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].full_path(), "/trail-index/api/v1/index/status");
        assert_eq!(calls[0].body, Some(json!(["c1", "c2", "c3"])));
    }

    #[tokio::test]
    async fn start_accepts_conn_id_alias() {
        let api = StubConnector::new();
        run(&api, &["trail-index", "start", "--conn-id", "c1"])
            .await
            .0
            .unwrap();
        assert_eq!(api.calls()[0].body, Some(json!(["c1"])));
    }
}
