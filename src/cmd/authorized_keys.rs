/*!
`authorized-keys` command group (role-store).

  privx-cli authorized-keys [--offset N --limit N --sortkey K --sortdir D]
  privx-cli authorized-keys show --user-id UID [--id KEY]
  privx-cli authorized-keys create --user-id UID JSON-FILE
  privx-cli authorized-keys update --user-id UID --id KEY JSON-FILE
  privx-cli authorized-keys delete --user-id UID --id KEY[,KEY...]
  privx-cli authorized-keys resolve JSON-FILE
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared::{self, PageArgs, Paged, SortArgs, read_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AuthorizedKeysArgs {
    #[command(subcommand)]
    pub command: Option<AuthorizedKeyCommand>,

    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub sort: SortArgs,
}

#[derive(Subcommand, Debug)]
pub enum AuthorizedKeyCommand {
    /// Get a user's authorized keys
    Show {
        #[arg(long, required = true)]
        user_id: String,
        /// Single key ID
        #[arg(long, default_value = "")]
        id: String,
    },
    /// Register an authorized key for a user, prints its ID
    Create {
        #[arg(long, required = true)]
        user_id: String,
        file: PathBuf,
    },
    /// Update an authorized key
    Update {
        #[arg(long, required = true)]
        user_id: String,
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete authorized keys of a user
    Delete {
        #[arg(long, required = true)]
        user_id: String,
        #[arg(long, required = true)]
        id: String,
    },
    /// Resolve an authorized key to its owner
    Resolve { file: PathBuf },
}

pub async fn execute_authorized_keys<C: Connector, W: Write>(
    args: AuthorizedKeysArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(Service::RoleStore, "/authorizedkeys")
            .page(&args.page)
            .sort(&args.sort);
        return shared::print_items(api, out, req).await;
    };

    match command {
        AuthorizedKeyCommand::Show { user_id, id } => {
            let path = if id.is_empty() {
                format!("/users/{user_id}/authorizedkeys")
            } else {
                format!("/users/{user_id}/authorizedkeys/{id}")
            };
            shared::print(api, out, Request::get(Service::RoleStore, path)).await
        }
        AuthorizedKeyCommand::Create { user_id, file } => {
            let req = Request::post(Service::RoleStore, format!("/users/{user_id}/authorizedkeys"))
                .json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        AuthorizedKeyCommand::Update { user_id, id, file } => {
            let req = Request::put(
                Service::RoleStore,
                format!("/users/{user_id}/authorizedkeys/{id}"),
            )
            .json(read_body(&file)?);
            shared::send(api, req).await
        }
        AuthorizedKeyCommand::Delete { user_id, id } => {
            shared::for_each_id(api, out, &id, |key| {
                Request::delete(
                    Service::RoleStore,
                    format!("/users/{user_id}/authorizedkeys/{key}"),
                )
            })
            .await
        }
        AuthorizedKeyCommand::Resolve { file } => {
            let req = Request::post(Service::RoleStore, "/authorizedkeys/resolve")
                .json(read_body(&file)?);
            shared::print(api, out, req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::run;

    #[tokio::test]
    async fn delete_scopes_keys_to_user() {
        let api = StubConnector::new();
        let (res, out) = run(
            &api,
            &["authorized-keys", "delete", "--user-id", "u1", "--id", "k1,k2"],
        )
        .await;
        res.unwrap();
        assert_eq!(out, "k1\nk2\n");
        assert_eq!(
            api.call_lines(),
            vec![
                "DELETE /role-store/api/v1/users/u1/authorizedkeys/k1",
                "DELETE /role-store/api/v1/users/u1/authorizedkeys/k2"
            ]
        );
    }
}
