/*!
`users` command group (role-store users).

  privx-cli users [--keywords K] [--source S]
  privx-cli users info UID [UID...]
  privx-cli users roles --id UID [--grant ROLE-ID]... [--revoke ROLE-ID]...
*/

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use super::shared::{self, str_field};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: Option<UserCommand>,

    /// Comma or space separated search keywords
    #[arg(long, default_value = "")]
    pub keywords: String,

    /// Restrict the search to a user source
    #[arg(long, default_value = "")]
    pub source: String,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Describe users by ID
    #[command(alias = "show")]
    Info {
        #[arg(required = true, value_name = "UID")]
        ids: Vec<String>,
    },
    /// List, grant and revoke user roles
    Roles {
        /// User ID
        #[arg(long, alias = "uid", required = true)]
        id: String,
        /// Role ID to grant (repeatable)
        #[arg(long, value_name = "ROLE-ID")]
        grant: Vec<String>,
        /// Role ID to revoke (repeatable)
        #[arg(long, value_name = "ROLE-ID")]
        revoke: Vec<String>,
    },
}

pub async fn execute_users<C: Connector, W: Write>(
    args: UsersArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::post(Service::RoleStore, "/users/search")
            .json(json!({ "keywords": args.keywords, "source": args.source }));
        return shared::print_items(api, out, req).await;
    };

    match command {
        UserCommand::Info { ids } => {
            let mut users = Vec::with_capacity(ids.len());
            for uid in &ids {
                users.push(api::call(api, Request::get(Service::RoleStore, format!("/users/{uid}"))).await?);
            }
            out.json(&users)
        }
        UserCommand::Roles { id, grant, revoke } => {
            for role in &grant {
                update_roles(api, &id, |roles| {
                    if !roles.iter().any(|r| str_field(r, "id") == role.as_str()) {
                        roles.push(json!({ "id": role, "explicit": true }));
                    }
                })
                .await?;
            }
            for role in &revoke {
                update_roles(api, &id, |roles| roles.retain(|r| str_field(r, "id") != role.as_str()))
                    .await?;
            }
            let roles = user_roles(api, &id).await?;
            out.json(&roles)
        }
    }
}

async fn user_roles<C: Connector>(api: &C, uid: &str) -> Result<Vec<Value>> {
    let req = Request::get(Service::RoleStore, format!("/users/{uid}/roles"));
    Ok(match api::call_items(api, req).await? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// Read the user's roles, apply `edit` and write the list back.
async fn update_roles<C, F>(api: &C, uid: &str, edit: F) -> Result<()>
where
    C: Connector,
    F: FnOnce(&mut Vec<Value>),
{
    let mut roles = user_roles(api, uid).await?;
    edit(&mut roles);
    let req = Request::put(Service::RoleStore, format!("/users/{uid}/roles")).json(Value::Array(roles));
    shared::send(api, req).await
}
