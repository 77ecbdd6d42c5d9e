/*!
`local-users` and `api-clients` command groups (local-user-store).

  privx-cli local-users [--offset N --limit N --name NAME --user-id ID]
  privx-cli local-users show|delete --id ID[,ID...]
  privx-cli local-users create JSON-FILE
  privx-cli local-users update --id ID JSON-FILE
  privx-cli local-users update-password --id ID --password PASSWORD
  privx-cli local-users tags [--offset N --limit N --sortdir D --query Q]

  privx-cli api-clients
  privx-cli api-clients create --name NAME [--roles ID,ID]
  privx-cli api-clients show|delete --id ID[,ID...]
  privx-cli api-clients update --id ID JSON-FILE
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use super::kind::TagType;
use super::shared::{self, PageArgs, Paged, read_body, split_ids};
use super::tags::{TagQueryArgs, list_tags};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

/* ---- local-users ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct LocalUsersArgs {
    #[command(subcommand)]
    pub command: Option<LocalUserCommand>,

    #[command(flatten)]
    pub page: PageArgs,

    /// Username of the user
    #[arg(long, default_value = "")]
    pub name: String,

    /// ID of the user
    #[arg(long, default_value = "")]
    pub user_id: String,
}

#[derive(Subcommand, Debug)]
pub enum LocalUserCommand {
    /// Get local users by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Create a local user, prints its ID
    Create { file: PathBuf },
    /// Update a local user
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete local users
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Set a new password for a local user
    UpdatePassword {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        password: String,
    },
    /// List local user tags
    Tags(TagQueryArgs),
}

pub async fn execute_local_users<C: Connector, W: Write>(
    args: LocalUsersArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(Service::LocalUserStore, "/users")
            .page(&args.page)
            .query("id", &args.user_id)
            .query("username", &args.name);
        return shared::print_items(api, out, req).await;
    };

    match command {
        LocalUserCommand::Show { id } => {
            shared::show_each(api, out, &id, |id| {
                Request::get(Service::LocalUserStore, format!("/users/{id}"))
            })
            .await
        }
        LocalUserCommand::Create { file } => {
            let req = Request::post(Service::LocalUserStore, "/users").json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        LocalUserCommand::Update { id, file } => {
            let req = Request::put(Service::LocalUserStore, format!("/users/{id}"))
                .json(read_body(&file)?);
            shared::send(api, req).await
        }
        LocalUserCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::LocalUserStore, format!("/users/{id}"))
            })
            .await
        }
        LocalUserCommand::UpdatePassword { id, password } => {
            let req = Request::put(Service::LocalUserStore, format!("/users/{id}/password"))
                .json(json!({ "password": password }));
            shared::send(api, req).await
        }
        LocalUserCommand::Tags(filter) => list_tags(api, out, TagType::User, &filter).await,
    }
}

/* ---- api-clients ---- */

#[derive(Args, Debug)]
pub struct ApiClientsArgs {
    #[command(subcommand)]
    pub command: Option<ApiClientCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ApiClientCommand {
    /// Create an API client, prints its ID
    Create {
        /// API client name
        #[arg(long, required = true)]
        name: String,
        /// Role IDs granted to the client, separated by commas
        #[arg(long, default_value = "")]
        roles: String,
    },
    /// Get API clients by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update an API client
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete API clients
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
}

pub async fn execute_api_clients<C: Connector, W: Write>(
    args: ApiClientsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(Service::LocalUserStore, "/api-clients");
        return shared::print_items(api, out, req).await;
    };

    match command {
        ApiClientCommand::Create { name, roles } => {
            let roles: Vec<_> = split_ids(&roles)
                .into_iter()
                .map(|id| json!({ "id": id }))
                .collect();
            let req = Request::post(Service::LocalUserStore, "/api-clients")
                .json(json!({ "name": name, "roles": roles }));
            shared::print_id(api, out, req).await
        }
        ApiClientCommand::Show { id } => {
            shared::show_each(api, out, &id, |id| {
                Request::get(Service::LocalUserStore, format!("/api-clients/{id}"))
            })
            .await
        }
        ApiClientCommand::Update { id, file } => {
            let req = Request::put(Service::LocalUserStore, format!("/api-clients/{id}"))
                .json(read_body(&file)?);
            shared::send(api, req).await
        }
        ApiClientCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::LocalUserStore, format!("/api-clients/{id}"))
            })
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{parse_err, run};

    #[tokio::test]
    async fn list_filters_by_name_and_id() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["local-users", "--name", "alice", "--limit", "5"]).await;
        res.unwrap();
        let q = &api.calls()[0].query;
        assert!(q.contains(&("username".to_string(), "alice".to_string())));
        assert!(q.contains(&("limit".to_string(), "5".to_string())));
        assert!(!q.iter().any(|(k, _)| k == "id"));
    }

    #[tokio::test]
    async fn update_password_body() {
        let api = StubConnector::new();
        let (res, _) = run(
            &api,
            &["local-users", "update-password", "--id", "u1", "--password", "s3cret"],
        )
        .await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/local-user-store/api/v1/users/u1/password");
        assert_eq!(call.body, Some(json!({"password": "s3cret"})));
    }

    #[test]
    fn update_password_requires_password() {
        parse_err(&["local-users", "update-password", "--id", "u1"]);
    }

    #[tokio::test]
    async fn api_client_create_wraps_role_ids() {
        let api = StubConnector::new().reply(
            Method::Post,
            "/local-user-store/api/v1/api-clients",
            json!({"id": "ac1"}),
        );
        let (res, out) = run(
            &api,
            &["api-clients", "create", "--name", "ci", "--roles", "r1,r2"],
        )
        .await;
        res.unwrap();
        assert_eq!(out, r#""ac1""#);
        assert_eq!(
            api.calls()[0].body,
            Some(json!({"name": "ci", "roles": [{"id": "r1"}, {"id": "r2"}]}))
        );
    }

    #[test]
    fn api_client_create_requires_name() {
        parse_err(&["api-clients", "create", "--roles", "r1"]);
    }

    #[tokio::test]
    async fn tags_list_user_store_tags() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["local-users", "tags", "--query", "ops"]).await;
        res.unwrap();
        assert_eq!(api.call_lines(), vec!["GET /local-user-store/api/v1/users/tags"]);
    }
}
