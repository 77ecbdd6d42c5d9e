/*!
`principals` (authorizer) and `principal-keys` (role-store) command groups.

  privx-cli principals
  privx-cli principals show --id GROUP [--key-id KEY] [--filter all]
  privx-cli principals create --id GROUP
  privx-cli principals delete --id GROUP[,GROUP...] [--key-id KEY]
  privx-cli principals import --id GROUP JSON-FILE
  privx-cli principals sign --id GROUP --key-id KEY JSON-FILE

  privx-cli principal-keys --role-id ROLE[,ROLE...]
  privx-cli principal-keys generate --role-id ROLE
  privx-cli principal-keys import --role-id ROLE JSON-FILE
  privx-cli principal-keys show --role-id ROLE --id KEY
  privx-cli principal-keys delete --role-id ROLE --id KEY[,KEY...]
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use super::shared::{self, read_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

/* ---- principals ---- */

#[derive(Args, Debug)]
pub struct PrincipalsArgs {
    #[command(subcommand)]
    pub command: Option<PrincipalCommand>,
}

#[derive(Subcommand, Debug)]
pub enum PrincipalCommand {
    /// Get the principal key(s) of a group
    Show {
        /// Principal group ID
        #[arg(long, required = true)]
        id: String,
        /// Request a specific principal key
        #[arg(long, default_value = "")]
        key_id: String,
        /// With "all", every key of the group is returned
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Create a principal key pair for a group
    Create {
        #[arg(long, required = true)]
        id: String,
    },
    /// Delete principal keys
    Delete {
        /// Principal group ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
        #[arg(long, default_value = "")]
        key_id: String,
    },
    /// Import a principal key pair for a group
    Import {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Sign data with a principal key
    Sign {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        key_id: String,
        file: PathBuf,
    },
}

fn principal_path(group: &str, key: &str) -> String {
    if key.is_empty() {
        format!("/principals/{group}")
    } else {
        format!("/principals/{group}/{key}")
    }
}

pub async fn execute_principals<C: Connector, W: Write>(
    args: PrincipalsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        return shared::print_items(api, out, Request::get(Service::Authorizer, "/principals"))
            .await;
    };

    match command {
        PrincipalCommand::Show { id, key_id, filter } => {
            let req = Request::get(Service::Authorizer, principal_path(&id, &key_id))
                .query("filter", &filter);
            shared::print(api, out, req).await
        }
        PrincipalCommand::Create { id } => {
            let req = Request::post(Service::Authorizer, format!("/principals/{id}/create"));
            shared::print(api, out, req).await
        }
        PrincipalCommand::Delete { id, key_id } => {
            shared::for_each_id(api, out, &id, |group| {
                Request::delete(Service::Authorizer, principal_path(group, &key_id))
            })
            .await
        }
        PrincipalCommand::Import { id, file } => {
            let req = Request::post(Service::Authorizer, format!("/principals/{id}/import"))
                .json(read_body(&file)?);
            shared::print(api, out, req).await
        }
        PrincipalCommand::Sign { id, key_id, file } => {
            let req = Request::post(Service::Authorizer, format!("/principals/{id}/{key_id}/sign"))
                .json(read_body(&file)?);
            shared::print(api, out, req).await
        }
    }
}

/* ---- principal-keys ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct PrincipalKeysArgs {
    #[command(subcommand)]
    pub command: Option<PrincipalKeyCommand>,

    /// Role ID(s), separated by commas
    #[arg(long)]
    pub role_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PrincipalKeyCommand {
    /// Generate a new principal key for a role
    Generate {
        #[arg(long, required = true)]
        role_id: String,
    },
    /// Import a principal key for a role
    Import {
        #[arg(long, required = true)]
        role_id: String,
        file: PathBuf,
    },
    /// Get a principal key of a role
    Show {
        #[arg(long, required = true)]
        role_id: String,
        /// Key ID
        #[arg(long, required = true)]
        id: String,
    },
    /// Delete principal keys of a role
    Delete {
        #[arg(long, required = true)]
        role_id: String,
        /// Key ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
}

pub async fn execute_principal_keys<C: Connector, W: Write>(
    args: PrincipalKeysArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let Some(roles) = args.role_id else {
            bail!("required flag \"role-id\" not set");
        };
        return shared::show_each(api, out, &roles, |role| {
            Request::get(Service::RoleStore, format!("/roles/{role}/principalkeys"))
        })
        .await;
    };

    match command {
        PrincipalKeyCommand::Generate { role_id } => {
            let req = Request::post(
                Service::RoleStore,
                format!("/roles/{role_id}/principalkeys/generate"),
            );
            shared::print(api, out, req).await
        }
        PrincipalKeyCommand::Import { role_id, file } => {
            let req = Request::post(
                Service::RoleStore,
                format!("/roles/{role_id}/principalkeys/import"),
            )
            .json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        PrincipalKeyCommand::Show { role_id, id } => {
            let req = Request::get(
                Service::RoleStore,
                format!("/roles/{role_id}/principalkeys/{id}"),
            );
            shared::print(api, out, req).await
        }
        PrincipalKeyCommand::Delete { role_id, id } => {
            shared::for_each_id(api, out, &id, |key| {
                Request::delete(
                    Service::RoleStore,
                    format!("/roles/{role_id}/principalkeys/{key}"),
                )
            })
            .await
        }
    }
}
