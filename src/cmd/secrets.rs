/*!
Vault command groups: `secrets` and the per-owner `user-secrets`.

  privx-cli secrets [--offset N --limit N]
  privx-cli secrets show|delete|metadata --name NAME[,NAME...]
  privx-cli secrets create --name NAME [--allow-read-to ROLE]... [--allow-write-to ROLE]... JSON-FILE
  privx-cli secrets update --name NAME [--allow-read-to ROLE]... [--allow-write-to ROLE]... JSON-FILE
  privx-cli secrets search [--keywords K --filter F --owner-id U... paging flags]
  privx-cli secrets schemas

  privx-cli user-secrets --owner-id UID [--offset N --limit N]
  privx-cli user-secrets show --owner-id UID --name NAME[,NAME...] [--ignore-error]
  privx-cli user-secrets create|update --owner-id UID --name NAME [--read-role ROLE]... JSON-FILE
  privx-cli user-secrets metadata|delete --owner-id UID --name NAME[,NAME...]

Secret payloads are sent as the `data` field next to the read/write role
references.
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use serde_json::{Map, Value, json};

use super::shared::{self, PageArgs, Paged, read_body, split_ids};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

const FILTERS: &[&str] = &["personal", "shared", "readable", "writable", ""];
const SORT_DIRS: &[&str] = &["ASC", "DESC"];
const SORT_KEYS: &[&str] = &["name", "updated", "created", ""];

/// Most names `user-secrets show` accepts in one call.
const MAX_BATCH: usize = 100;

/* ---- role references ---- */

fn role_refs(ids: &[String]) -> Value {
    Value::Array(ids.iter().map(|id| json!({ "id": id })).collect())
}

/// IDs of an existing secret's `read_roles` / `write_roles` array.
fn existing_roles(secret: &Value, key: &str) -> Vec<String> {
    secret
        .get(key)
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .map(|r| shared::str_field(r, "id").to_string())
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Roles from the command line win; otherwise the existing set is kept.
fn merge_roles(given: Vec<String>, secret: &Value, key: &str) -> Vec<String> {
    if given.is_empty() {
        existing_roles(secret, key)
    } else {
        given
    }
}

fn secret_body(name: Option<&str>, read: &[String], write: &[String], data: Value) -> Value {
    let mut body = Map::new();
    if let Some(name) = name {
        body.insert("name".into(), json!(name));
    }
    body.insert("read_roles".into(), role_refs(read));
    body.insert("write_roles".into(), role_refs(write));
    body.insert("data".into(), data);
    Value::Object(body)
}

/* ---- search validation ---- */

fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let quoted: Vec<String> = allowed.iter().map(|a| format!("{a:?}")).collect();
    bail!("{field} field must be one of these values [{}]", quoted.join(" "))
}

/* ---- secrets ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: Option<SecretCommand>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct RoleFlags {
    /// Role ID allowed to read the secret (repeatable)
    #[arg(long = "allow-read-to")]
    pub read: Vec<String>,

    /// Role ID allowed to write the secret (repeatable)
    #[arg(long = "allow-write-to")]
    pub write: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum SecretCommand {
    /// Get secrets by name
    Show {
        /// Secret name(s), separated by commas
        #[arg(long, required = true)]
        name: String,
    },
    /// Create a new secret
    Create {
        #[arg(long, required = true)]
        name: String,
        #[command(flatten)]
        roles: RoleFlags,
        file: PathBuf,
    },
    /// Update an existing secret
    Update {
        #[arg(long, required = true)]
        name: String,
        #[command(flatten)]
        roles: RoleFlags,
        file: PathBuf,
    },
    /// Delete secrets
    Delete {
        #[arg(long, required = true)]
        name: String,
    },
    /// Get secret metadata
    Metadata {
        #[arg(long, required = true)]
        name: String,
    },
    /// Search for secrets
    Search {
        #[command(flatten)]
        page: PageArgs,
        /// Sort by name, updated or created
        #[arg(long, default_value = "")]
        sortkey: String,
        /// Sort direction, ASC or DESC
        #[arg(long, default_value = "ASC")]
        sortdir: String,
        /// Comma or space separated words matched against secret names
        #[arg(long, default_value = "")]
        keywords: String,
        /// personal, shared, readable or writable
        #[arg(long, default_value = "")]
        filter: String,
        /// Owner user ID (repeatable)
        #[arg(long = "owner-id")]
        owner_ids: Vec<String>,
    },
    /// Show the secret schemas
    Schemas,
}

fn secret_path(name: &str) -> String {
    format!("/secrets/{name}")
}

pub async fn execute_secrets<C: Connector, W: Write>(
    args: SecretsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(Service::Vault, "/secrets").page(&args.page);
        return shared::print_items(api, out, req).await;
    };

    match command {
        SecretCommand::Show { name } => {
            shared::show_each(api, out, &name, |n| Request::get(Service::Vault, secret_path(n)))
                .await
        }
        SecretCommand::Metadata { name } => {
            shared::show_each(api, out, &name, |n| {
                Request::get(Service::Vault, format!("/metadata/secrets/{n}"))
            })
            .await
        }
        SecretCommand::Delete { name } => {
            shared::for_each_id(api, out, &name, |n| {
                Request::delete(Service::Vault, secret_path(n))
            })
            .await
        }
        SecretCommand::Create { name, roles, file } => {
            let data = read_body(&file)?;
            let body = secret_body(Some(&name), &roles.read, &roles.write, data.clone());
            shared::send(api, Request::post(Service::Vault, "/secrets").json(body)).await?;
            out.json(&data)
        }
        SecretCommand::Update { name, roles, file } => {
            let data = read_body(&file)?;
            let current = api::call(api, Request::get(Service::Vault, secret_path(&name))).await?;
            let read = merge_roles(roles.read, &current, "read_roles");
            let write = merge_roles(roles.write, &current, "write_roles");
            let body = secret_body(None, &read, &write, data.clone());
            shared::send(api, Request::put(Service::Vault, secret_path(&name)).json(body)).await?;
            out.json(&data)
        }
        SecretCommand::Search {
            page,
            sortkey,
            sortdir,
            keywords,
            filter,
            owner_ids,
        } => {
            let filter = filter.to_lowercase();
            let sortdir = sortdir.to_uppercase();
            let sortkey = sortkey.to_lowercase();
            one_of("filter", &filter, FILTERS)?;
            one_of("sortdir", &sortdir, SORT_DIRS)?;
            one_of("sortkey", &sortkey, SORT_KEYS)?;

            let mut body = Map::new();
            if !keywords.is_empty() {
                body.insert("keywords".into(), json!(keywords));
            }
            if !filter.is_empty() {
                body.insert("filter".into(), json!(filter));
            }
            if !owner_ids.is_empty() {
                body.insert("owner_id".into(), json!(owner_ids));
            }

            let req = Request::post(Service::Vault, "/search/secrets")
                .page(&page)
                .query("sortkey", sortkey)
                .query("sortdir", sortdir)
                .json(Value::Object(body));
            shared::print_items(api, out, req).await
        }
        SecretCommand::Schemas => shared::print(api, out, Request::get(Service::Vault, "/schemas")).await,
    }
}

/* ---- user-secrets ---- */

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct UserSecretsArgs {
    #[command(subcommand)]
    pub command: Option<UserSecretCommand>,

    /// User ID of the secrets' owner
    #[arg(long)]
    pub owner_id: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct UserRoleFlags {
    /// Role ID allowed to read the secret (repeatable)
    #[arg(long = "read-role", alias = "allow-read-to")]
    pub read: Vec<String>,

    /// Role ID allowed to write the secret (repeatable)
    #[arg(long = "write-role", alias = "allow-write-to")]
    pub write: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum UserSecretCommand {
    /// Get user secrets by name
    Show {
        #[arg(long, required = true)]
        owner_id: String,
        /// Secret name(s), separated by commas
        #[arg(long, required = true)]
        name: String,
        /// Skip names that fail to fetch as long as one succeeds
        #[arg(long)]
        ignore_error: bool,
    },
    /// Create a new user secret
    Create {
        #[arg(long, required = true)]
        owner_id: String,
        #[arg(long, required = true)]
        name: String,
        #[command(flatten)]
        roles: UserRoleFlags,
        file: PathBuf,
    },
    /// Update a user secret
    Update {
        #[arg(long, required = true)]
        owner_id: String,
        #[arg(long, required = true)]
        name: String,
        #[command(flatten)]
        roles: UserRoleFlags,
        file: PathBuf,
    },
    /// Get user secret metadata
    Metadata {
        #[arg(long, required = true)]
        owner_id: String,
        #[arg(long, required = true)]
        name: String,
    },
    /// Delete user secrets
    Delete {
        #[arg(long, required = true)]
        owner_id: String,
        #[arg(long, required = true)]
        name: String,
    },
}

fn user_secret_path(owner: &str, name: &str) -> String {
    format!("/users/{owner}/secrets/{name}")
}

pub async fn execute_user_secrets<C: Connector, W: Write>(
    args: UserSecretsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let Some(owner) = args.owner_id else {
            bail!("required flag \"owner-id\" not set");
        };
        let req = Request::get(Service::Vault, format!("/users/{owner}/secrets")).page(&args.page);
        return shared::print_items(api, out, req).await;
    };

    match command {
        UserSecretCommand::Show {
            owner_id,
            name,
            ignore_error,
        } => show_user_secrets(api, out, &owner_id, &name, ignore_error).await,
        UserSecretCommand::Create {
            owner_id,
            name,
            roles,
            file,
        } => {
            let body = secret_body(Some(&name), &roles.read, &roles.write, read_body(&file)?);
            let req = Request::post(Service::Vault, format!("/users/{owner_id}/secrets")).json(body);
            shared::send(api, req).await
        }
        UserSecretCommand::Update {
            owner_id,
            name,
            roles,
            file,
        } => {
            let data = read_body(&file)?;
            let path = user_secret_path(&owner_id, &name);
            let current = api::call(api, Request::get(Service::Vault, path.clone())).await?;
            let read = merge_roles(roles.read, &current, "read_roles");
            let write = merge_roles(roles.write, &current, "write_roles");
            let body = secret_body(None, &read, &write, data.clone());
            shared::send(api, Request::put(Service::Vault, path).json(body)).await?;
            out.json(&data)
        }
        UserSecretCommand::Metadata { owner_id, name } => {
            shared::show_each(api, out, &name, |n| {
                Request::get(
                    Service::Vault,
                    format!("/users/{owner_id}/metadata/secrets/{n}"),
                )
            })
            .await
        }
        UserSecretCommand::Delete { owner_id, name } => {
            shared::for_each_id(api, out, &name, |n| {
                Request::delete(Service::Vault, user_secret_path(&owner_id, n))
            })
            .await
        }
    }
}

/// Fetch each named secret. With `ignore_error`, failures are skipped and
/// only reported when nothing could be fetched at all.
async fn show_user_secrets<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    owner: &str,
    names: &str,
    ignore_error: bool,
) -> Result<()> {
    let names = split_ids(names);
    if names.len() > MAX_BATCH {
        bail!("you exceed the limit {MAX_BATCH} of secrets");
    }

    let mut found = Vec::new();
    let mut last_err = None;
    for name in &names {
        let req = Request::get(Service::Vault, user_secret_path(owner, name));
        match api::call(api, req).await {
            Ok(secret) => found.push(secret),
            Err(e) if ignore_error => {
                tracing::warn!(secret = %name, error = %e, "skipping secret");
                last_err = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    match (found.is_empty(), last_err) {
        (true, Some(e)) => Err(e.into()),
        _ => out.json(&found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{run, write_file};

    #[test]
    fn validation_messages_list_allowed_values() {
        let err = one_of("filter", "everything", FILTERS).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"filter field must be one of these values ["personal" "shared" "readable" "writable" ""]"#
        );
        assert!(one_of("sortdir", "DESC", SORT_DIRS).is_ok());
    }

    #[test]
    fn merge_keeps_existing_roles_when_none_given() {
        let current = json!({"read_roles": [{"id": "r1"}, {"id": "r2"}], "write_roles": []});
        assert_eq!(merge_roles(vec![], &current, "read_roles"), vec!["r1", "r2"]);
        assert_eq!(
            merge_roles(vec!["r9".into()], &current, "read_roles"),
            vec!["r9"]
        );
        assert!(merge_roles(vec![], &current, "write_roles").is_empty());
    }

    #[tokio::test]
    async fn delete_prints_names_until_failure() {
        let api = StubConnector::new().fail(Method::Delete, "/vault/api/v1/secrets/s2", 404, "nope");
        let (res, out) = run(&api, &["secrets", "delete", "--name", "s1,s2"]).await;
        assert!(res.is_err());
        assert_eq!(out, "s1\n");
    }

    #[tokio::test]
    async fn create_sends_roles_and_data() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, "s.json", r#"{"password":"hunter2"}"#);
        let api = StubConnector::new();
        let (res, out) = run(
            &api,
            &[
                "secrets",
                "create",
                "--name",
                "db",
                "--allow-read-to",
                "r1",
                "--allow-read-to",
                "r2",
                "--allow-write-to",
                "w1",
                file.to_str().unwrap(),
            ],
        )
        .await;
        res.unwrap();
        assert_eq!(out, r#"{"password":"hunter2"}"#);
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/vault/api/v1/secrets");
        assert_eq!(
            call.body,
            Some(json!({
                "name": "db",
                "read_roles": [{"id": "r1"}, {"id": "r2"}],
                "write_roles": [{"id": "w1"}],
                "data": {"password": "hunter2"}
            }))
        );
    }

    #[tokio::test]
    async fn update_without_role_flags_keeps_existing_roles() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, "s.json", r#"{"v":2}"#);
        let api = StubConnector::new().reply(
            Method::Get,
            "/vault/api/v1/secrets/db",
            json!({"name": "db", "read_roles": [{"id": "r1"}], "write_roles": [{"id": "w1"}]}),
        );
        let (res, _) = run(
            &api,
            &["secrets", "update", "--name", "db", file.to_str().unwrap()],
        )
        .await;
        res.unwrap();
        let put = &api.calls()[1];
        assert_eq!(
            put.body,
            Some(json!({
                "read_roles": [{"id": "r1"}],
                "write_roles": [{"id": "w1"}],
                "data": {"v": 2}
            }))
        );
    }

    #[tokio::test]
    async fn search_rejects_bad_filter_before_request() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["secrets", "search", "--filter", "mine"]).await;
        assert!(res.unwrap_err().to_string().starts_with("filter field"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn search_normalises_query_and_body() {
        let api = StubConnector::new();
        let (res, _) = run(
            &api,
            &[
                "secrets", "search", "--sortkey", "Name", "--sortdir", "desc", "--filter",
                "Personal", "--keywords", "db", "--owner-id", "u1",
            ],
        )
        .await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/vault/api/v1/search/secrets");
        assert!(call.query.contains(&("sortkey".to_string(), "name".to_string())));
        assert!(call.query.contains(&("sortdir".to_string(), "DESC".to_string())));
        assert_eq!(
            call.body,
            Some(json!({"keywords": "db", "filter": "personal", "owner_id": ["u1"]}))
        );
    }

    #[tokio::test]
    async fn user_secrets_list_needs_owner() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["user-secrets"]).await;
        assert!(res.unwrap_err().to_string().contains("owner-id"));
    }

    #[tokio::test]
    async fn user_secret_show_ignore_error() {
        let api = StubConnector::new()
            .reply(Method::Get, "/vault/api/v1/users/u1/secrets/a", json!({"name": "a"}))
            .fail(Method::Get, "/vault/api/v1/users/u1/secrets/b", 404, "missing");

        let (res, out) = run(
            &api,
            &["user-secrets", "show", "--owner-id", "u1", "--name", "a,b", "--ignore-error"],
        )
        .await;
        res.unwrap();
        assert_eq!(out, r#"[{"name":"a"}]"#);

        let (res, _) = run(
            &api,
            &["user-secrets", "show", "--owner-id", "u1", "--name", "b", "--ignore-error"],
        )
        .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn user_secret_delete_skips_empty_names() {
        let api = StubConnector::new();
        let (res, out) = run(
            &api,
            &["user-secrets", "delete", "--owner-id", "u1", "--name", "a,,b"],
        )
        .await;
        res.unwrap();
        assert_eq!(out, "a\nb\n");
        assert_eq!(
            api.call_lines(),
            vec![
                "DELETE /vault/api/v1/users/u1/secrets/a",
                "DELETE /vault/api/v1/users/u1/secrets/b"
            ]
        );
    }
}
