/*!
`roles` command group (role-store), including identity providers.

  privx-cli roles
  privx-cli roles create JSON-FILE
  privx-cli roles show --id ID[,ID...]
  privx-cli roles update --id ID JSON-FILE
  privx-cli roles delete --id ID[,ID...]
  privx-cli roles members --id ID[,ID...]
  privx-cli roles resolve --name NAME[,NAME...]
  privx-cli roles aws-token --id ID [--mfa CODE] [--ttl MINUTES]
  privx-cli roles identity-providers [--offset N --limit N]
  privx-cli roles identity-providers search [--keywords K ...]
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{Value, json};

use super::shared::{self, PageArgs, Paged, read_body, split_ids};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: Option<RoleCommand>,
}

#[derive(Subcommand, Debug)]
pub enum RoleCommand {
    /// Create new role, prints its ID
    Create { file: PathBuf },
    /// Get roles by ID
    Show {
        /// Role ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
    /// Update role
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete roles
    Delete {
        /// Role ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
    /// List members of one or more roles
    Members {
        /// Role ID(s), separated by commas
        #[arg(long, required = true)]
        id: String,
    },
    /// Resolve role names to IDs
    Resolve {
        /// Role name(s), separated by commas
        #[arg(long, required = true)]
        name: String,
    },
    /// Get an AWS token for a role
    AwsToken {
        #[arg(long, required = true)]
        id: String,
        /// Multi-factor authentication code
        #[arg(long, default_value = "")]
        mfa: String,
        /// Max time validity for the token
        #[arg(long, default_value_t = 50)]
        ttl: u32,
    },
    /// List and manage identity providers
    #[command(alias = "idendity")]
    IdentityProviders(IdentityProvidersArgs),
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct IdentityProvidersArgs {
    #[command(subcommand)]
    pub command: Option<IdentityProviderCommand>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Subcommand, Debug)]
pub enum IdentityProviderCommand {
    /// Create identity provider, prints its ID
    Create { file: PathBuf },
    /// Get identity providers by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update identity provider
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete identity providers
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// Search identity providers
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value = "")]
        sortkey: String,
        #[arg(long, default_value = "ASC")]
        sortdir: String,
        /// Comma or space separated search keywords
        #[arg(long, default_value = "")]
        keywords: String,
    },
}

pub async fn execute_roles<C: Connector, W: Write>(
    args: RolesArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        return shared::print_items(api, out, Request::get(Service::RoleStore, "/roles")).await;
    };

    match command {
        RoleCommand::Create { file } => {
            let req = Request::post(Service::RoleStore, "/roles").json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        RoleCommand::Show { id } => {
            shared::show_each(api, out, &id, |id| {
                Request::get(Service::RoleStore, format!("/roles/{id}"))
            })
            .await
        }
        RoleCommand::Update { id, file } => {
            let req = Request::put(Service::RoleStore, format!("/roles/{id}")).json(read_body(&file)?);
            shared::send(api, req).await
        }
        RoleCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::RoleStore, format!("/roles/{id}"))
            })
            .await
        }
        RoleCommand::Members { id } => {
            let mut members = Vec::new();
            for role in split_ids(&id) {
                let req = Request::get(Service::RoleStore, format!("/roles/{role}/members"));
                match api::call_items(api, req).await? {
                    Value::Array(items) => members.extend(items),
                    Value::Null => {}
                    other => members.push(other),
                }
            }
            out.json(&members)
        }
        RoleCommand::Resolve { name } => {
            let req = Request::post(Service::RoleStore, "/roles/resolve").json(json!(split_ids(&name)));
            shared::print_items(api, out, req).await
        }
        RoleCommand::AwsToken { id, mfa, ttl } => {
            let req = Request::get(Service::RoleStore, format!("/roles/{id}/awstoken"))
                .query("tokencode", &mfa)
                .query("ttl", ttl);
            shared::print(api, out, req).await
        }
        RoleCommand::IdentityProviders(idp) => identity_providers(idp, api, out).await,
    }
}

async fn identity_providers<C: Connector, W: Write>(
    args: IdentityProvidersArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    const BASE: &str = "/identity-providers";

    let Some(command) = args.command else {
        let req = Request::get(Service::RoleStore, BASE).page(&args.page);
        return shared::print_items(api, out, req).await;
    };

    match command {
        IdentityProviderCommand::Create { file } => {
            let req = Request::post(Service::RoleStore, BASE).json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        IdentityProviderCommand::Show { id } => {
            shared::show_each(api, out, &id, |id| {
                Request::get(Service::RoleStore, format!("{BASE}/{id}"))
            })
            .await
        }
        IdentityProviderCommand::Update { id, file } => {
            let req = Request::put(Service::RoleStore, format!("{BASE}/{id}")).json(read_body(&file)?);
            shared::send(api, req).await
        }
        IdentityProviderCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::RoleStore, format!("{BASE}/{id}"))
            })
            .await
        }
        IdentityProviderCommand::Search {
            page,
            sortkey,
            sortdir,
            keywords,
        } => {
            let req = Request::post(Service::RoleStore, format!("{BASE}/search"))
                .page(&page)
                .query("sortkey", &sortkey)
                .query("sortdir", sortdir.to_uppercase())
                .json(json!({ "keywords": keywords }));
            shared::print_items(api, out, req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::run;

    #[tokio::test]
    async fn members_are_concatenated_across_roles() {
        let api = StubConnector::new()
            .reply(
                Method::Get,
                "/role-store/api/v1/roles/r1/members",
                json!({"count": 1, "items": [{"id": "u1"}]}),
            )
            .reply(
                Method::Get,
                "/role-store/api/v1/roles/r2/members",
                json!({"count": 2, "items": [{"id": "u2"}, {"id": "u3"}]}),
            );
        let (res, out) = run(&api, &["roles", "members", "--id", "r1,r2"]).await;
        res.unwrap();
        assert_eq!(out, r#"[{"id":"u1"},{"id":"u2"},{"id":"u3"}]"#);
    }

    #[tokio::test]
    async fn resolve_sends_name_list() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["roles", "resolve", "--name", "admins,ops"]).await;
        res.unwrap();
        assert_eq!(api.calls()[0].body, Some(json!(["admins", "ops"])));
    }

    #[tokio::test]
    async fn aws_token_query() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["roles", "aws-token", "--id", "r1", "--mfa", "123456"]).await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/role-store/api/v1/roles/r1/awstoken");
        assert_eq!(
            call.query,
            vec![
                ("tokencode".to_string(), "123456".to_string()),
                ("ttl".to_string(), "50".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn identity_provider_search_defaults_to_ascending() {
        let api = StubConnector::new();
        let (res, _) = run(
            &api,
            &["roles", "identity-providers", "search", "--keywords", "okta"],
        )
        .await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/role-store/api/v1/identity-providers/search");
        assert!(call.query.contains(&("sortdir".to_string(), "ASC".to_string())));
        assert_eq!(call.body, Some(json!({"keywords": "okta"})));
    }

    #[tokio::test]
    async fn bare_group_lists_roles() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["roles"]).await;
        res.unwrap();
        assert_eq!(api.call_lines(), vec!["GET /role-store/api/v1/roles"]);
    }
}
