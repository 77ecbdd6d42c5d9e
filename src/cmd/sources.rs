/*!
Directory-backed role-store resources: `sources`, `aws-roles` and the log
`collectors`.

  privx-cli sources
  privx-cli sources create JSON-FILE
  privx-cli sources show|delete --id ID[,ID...]
  privx-cli sources update --id ID JSON-FILE
  privx-cli sources refresh --id ID[,ID...]

  privx-cli aws-roles [--refresh]
  privx-cli aws-roles show|delete --id ID[,ID...]
  privx-cli aws-roles update --id ID JSON-FILE
  privx-cli aws-roles linked-roles --id ID

  privx-cli collectors
  privx-cli collectors create JSON-FILE
  privx-cli collectors show|delete --id ID
  privx-cli collectors update --id ID JSON-FILE
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use super::shared::{self, Collection, split_ids};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

const SOURCES: Collection = Collection::new(Service::RoleStore, "/sources");
const AWS_ROLES: Collection = Collection::new(Service::RoleStore, "/awsroles");
const COLLECTORS: Collection = Collection::new(Service::RoleStore, "/logconf/collectors");

/// Verbs shared by the three groups.
#[derive(Subcommand, Debug)]
pub enum CrudCommand {
    /// Create a new item, prints its ID
    Create { file: PathBuf },
    /// Get items by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update an item
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete items
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
}

async fn crud<C: Connector, W: Write>(
    coll: &Collection,
    command: CrudCommand,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match command {
        CrudCommand::Create { file } => coll.create(api, out, &file).await,
        CrudCommand::Show { id } => coll.show(api, out, &id).await,
        CrudCommand::Update { id, file } => coll.update(api, &id, &file).await,
        CrudCommand::Delete { id } => coll.delete(api, out, &id).await,
    }
}

/* ---- sources ---- */

#[derive(Args, Debug)]
pub struct SourcesArgs {
    #[command(subcommand)]
    pub command: Option<SourceCommand>,
}

#[derive(Subcommand, Debug)]
pub enum SourceCommand {
    #[command(flatten)]
    Crud(CrudCommand),
    /// Refresh sources
    Refresh {
        /// Source ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
}

pub async fn execute_sources<C: Connector, W: Write>(
    args: SourcesArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        None => shared::print_items(api, out, SOURCES.list()).await,
        Some(SourceCommand::Crud(c)) => crud(&SOURCES, c, api, out).await,
        Some(SourceCommand::Refresh { id }) => {
            let req = Request::post(Service::RoleStore, "/sources/refresh").json(json!(split_ids(&id)));
            shared::send(api, req).await
        }
    }
}

/* ---- aws-roles ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AwsRolesArgs {
    #[command(subcommand)]
    pub command: Option<AwsRoleCommand>,

    /// Refresh the AWS roles from AWS directories before fetching
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Subcommand, Debug)]
pub enum AwsRoleCommand {
    /// Get AWS roles by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update the PrivX roles linked to an AWS role
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete AWS roles
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// List PrivX roles linked to an AWS role
    LinkedRoles {
        #[arg(long, required = true)]
        id: String,
    },
}

pub async fn execute_aws_roles<C: Connector, W: Write>(
    args: AwsRolesArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = AWS_ROLES.list().query("refresh", args.refresh);
        return shared::print_items(api, out, req).await;
    };

    match command {
        AwsRoleCommand::Show { id } => AWS_ROLES.show(api, out, &id).await,
        AwsRoleCommand::Delete { id } => AWS_ROLES.delete(api, out, &id).await,
        AwsRoleCommand::Update { id, file } => {
            let req = Request::put(Service::RoleStore, format!("/awsroles/{id}/roles"))
                .json(shared::read_body(&file)?);
            shared::send(api, req).await
        }
        AwsRoleCommand::LinkedRoles { id } => {
            let req = Request::get(Service::RoleStore, format!("/awsroles/{id}/roles"));
            shared::print_items(api, out, req).await
        }
    }
}

/* ---- collectors ---- */

#[derive(Args, Debug)]
pub struct CollectorsArgs {
    #[command(subcommand)]
    pub command: Option<CrudCommand>,
}

pub async fn execute_collectors<C: Connector, W: Write>(
    args: CollectorsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        None => shared::print_items(api, out, COLLECTORS.list()).await,
        Some(CrudCommand::Show { id }) => COLLECTORS.show_one(api, out, &id).await,
        Some(c) => crud(&COLLECTORS, c, api, out).await,
    }
}

#[cfg(test)]
mod tests {
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{run, write_file};
    use serde_json::json;

    #[tokio::test]
    async fn refresh_sends_all_ids_in_one_request() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["sources", "refresh", "--id", "s1,s2"]).await;
        res.unwrap();
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body, Some(json!(["s1", "s2"])));
    }

    #[tokio::test]
    async fn source_delete_stops_at_failure() {
        let api = StubConnector::new().fail(
            Method::Delete,
            "/role-store/api/v1/sources/s2",
            409,
            "in use",
        );
        let (res, out) = run(&api, &["sources", "delete", "--id", "s1,s2,s3"]).await;
        assert!(res.is_err());
        assert_eq!(out, "s1\n");
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn aws_roles_refresh_flag() {
        let api = StubConnector::new();
        run(&api, &["aws-roles", "--refresh"]).await.0.unwrap();
        run(&api, &["aws-roles"]).await.0.unwrap();
        let calls = api.calls();
        assert_eq!(calls[0].query, vec![("refresh".to_string(), "true".to_string())]);
        assert_eq!(calls[1].query, vec![("refresh".to_string(), "false".to_string())]);
    }

    #[tokio::test]
    async fn collector_update_forwards_body() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, "c.json", r#"{"name":"syslog","enabled":true}"#);
        let api = StubConnector::new();
        let (res, _) = run(
            &api,
            &["collectors", "update", "--id", "c1", file.to_str().unwrap()],
        )
        .await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/role-store/api/v1/logconf/collectors/c1");
        assert_eq!(call.body, Some(json!({"name": "syslog", "enabled": true})));
    }
}
