/*!
`trusted-clients` command group.

Trusted client records live in the local-user-store; their CA certificates,
revocation lists and config downloads are served by the authorizer and
depend on the client type.

  privx-cli trusted-clients [list] [--type extender|webproxy|carrier]
  privx-cli trusted-clients create JSON-FILE
  privx-cli trusted-clients show --id ID
  privx-cli trusted-clients update --id ID JSON-FILE
  privx-cli trusted-clients delete --id ID[,ID...]
  privx-cli trusted-clients list-ca --type extender|webproxy [--group-id ID]
  privx-cli trusted-clients show-ca --type extender|webproxy --id ID
  privx-cli trusted-clients show-crl --type extender|webproxy --id ID --name FILE
  privx-cli trusted-clients pre-config --type extender|webproxy|carrier --id ID --name FILE
*/

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;

use super::cas;
use super::kind::ClientType;
use super::preconfig::download_preconfig;
use super::shared::{self, read_body, str_field};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct TrustedClientsArgs {
    #[command(subcommand)]
    pub command: Option<TrustedClientCommand>,

    /// Only list clients of this type: extender, webproxy or carrier
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TrustedClientCommand {
    /// List trusted clients
    List {
        /// Only list clients of this type: extender, webproxy or carrier
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
    },
    /// Create a trusted client, prints its ID
    Create { file: PathBuf },
    /// Get trusted client by ID
    Show {
        #[arg(long, required = true)]
        id: String,
    },
    /// Update a trusted client
    Update {
        #[arg(long, required = true)]
        id: String,
        file: PathBuf,
    },
    /// Delete trusted clients
    Delete {
        #[arg(long, required = true)]
        id: String,
    },
    /// List CA certificates for extender or web proxy
    ListCa {
        #[arg(long = "type", required = true, value_name = "TYPE")]
        kind: String,
        /// Access group ID filter
        #[arg(long, default_value = "")]
        group_id: String,
    },
    /// Get CA certificate for extender or web proxy
    ShowCa {
        #[arg(long = "type", required = true, value_name = "TYPE")]
        kind: String,
        #[arg(long, required = true)]
        id: String,
    },
    /// Download the revocation list for extender or web proxy
    ShowCrl {
        #[arg(long = "type", required = true, value_name = "TYPE")]
        kind: String,
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        name: String,
    },
    /// Download a pre-configured config file
    PreConfig {
        #[arg(long = "type", required = true, value_name = "TYPE")]
        kind: String,
        /// Trusted client ID
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        name: String,
    },
}

pub async fn execute_trusted_clients<C: Connector, W: Write>(
    args: TrustedClientsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        return list(api, out, args.kind.as_deref()).await;
    };

    match command {
        TrustedClientCommand::List { kind } => list(api, out, kind.as_deref()).await,
        TrustedClientCommand::Create { file } => {
            let req = Request::post(Service::LocalUserStore, "/trusted-clients")
                .json(read_body(&file)?);
            shared::print_id(api, out, req).await
        }
        TrustedClientCommand::Show { id } => {
            let req = Request::get(Service::LocalUserStore, format!("/trusted-clients/{id}"));
            shared::print(api, out, req).await
        }
        TrustedClientCommand::Update { id, file } => {
            let req = Request::put(Service::LocalUserStore, format!("/trusted-clients/{id}"))
                .json(read_body(&file)?);
            shared::send(api, req).await
        }
        TrustedClientCommand::Delete { id } => {
            shared::for_each_id(api, out, &id, |id| {
                Request::delete(Service::LocalUserStore, format!("/trusted-clients/{id}"))
            })
            .await
        }
        TrustedClientCommand::ListCa { kind, group_id } => {
            let kind = ClientType::parse_with_ca(&kind)?;
            cas::list_cas(api, out, kind, &group_id).await
        }
        TrustedClientCommand::ShowCa { kind, id } => {
            let kind = ClientType::parse_with_ca(&kind)?;
            cas::show_ca(api, out, kind, &id).await
        }
        TrustedClientCommand::ShowCrl { kind, id, name } => {
            let kind = ClientType::parse_with_ca(&kind)?;
            cas::download_crl(api, kind, &id, Path::new(&name)).await
        }
        TrustedClientCommand::PreConfig { kind, id, name } => {
            let kind = ClientType::parse(&kind)?;
            download_preconfig(api, kind, &id, Path::new(&name)).await
        }
    }
}

async fn list<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    kind: Option<&str>,
) -> Result<()> {
    let wanted = kind.map(ClientType::parse_client).transpose()?;
    let clients =
        api::call_items(api, Request::get(Service::LocalUserStore, "/trusted-clients")).await?;

    let Some(kind) = wanted else {
        return out.json(&clients);
    };
    let wanted_type = kind.route().trusted_client_type;
    let filtered: Vec<&Value> = clients
        .as_array()
        .map(|all| {
            all.iter()
                .filter(|c| str_field(c, "type") == wanted_type)
                .collect()
        })
        .unwrap_or_default();
    out.json(&filtered)
}

#[cfg(test)]
mod tests {
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::run;
    use serde_json::json;

    fn with_clients() -> StubConnector {
        StubConnector::new().reply(
            Method::Get,
            "/local-user-store/api/v1/trusted-clients",
            json!({"count": 3, "items": [
                {"id": "1", "type": "EXTENDER"},
                {"id": "2", "type": "ICAP"},
                {"id": "3", "type": "CARRIER"}
            ]}),
        )
    }

    #[tokio::test]
    async fn list_filters_by_client_type() {
        let api = with_clients();
        let (res, out) = run(&api, &["trusted-clients", "--type", "webproxy"]).await;
        res.unwrap();
        assert_eq!(out, r#"[{"id":"2","type":"ICAP"}]"#);

        let (res, out) = run(&api, &["trusted-clients"]).await;
        res.unwrap();
        assert!(out.contains("EXTENDER") && out.contains("CARRIER"));
    }

    #[tokio::test]
    async fn list_verb_accepts_the_type_filter() {
        let api = with_clients();
        let (res, out) = run(&api, &["trusted-clients", "list", "--type", "extender"]).await;
        res.unwrap();
        assert_eq!(out, r#"[{"id":"1","type":"EXTENDER"}]"#);
    }

    #[tokio::test]
    async fn list_rejects_unknown_type_before_request() {
        let api = with_clients();
        let (res, _) = run(&api, &["trusted-clients", "--type", "proxy"]).await;
        assert!(res.unwrap_err().to_string().contains("client type does not exist: proxy"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn carrier_has_no_ca_list() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["trusted-clients", "list-ca", "--type", "carrier"]).await;
        assert!(res.is_err());
        assert!(api.calls().is_empty());

        let (res, _) = run(&api, &["trusted-clients", "list-ca", "--type", "webproxy"]).await;
        res.unwrap();
        assert_eq!(api.call_lines(), vec!["GET /authorizer/api/v1/icap/cas"]);
    }

    #[tokio::test]
    async fn pre_config_shares_the_download_flow() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("carrier.toml");
        let api = StubConnector::new()
            .reply(
                Method::Post,
                "/authorizer/api/v1/carrier/conf/c9",
                json!({"session_id": "s"}),
            )
            .reply_bytes(Method::Get, "/authorizer/api/v1/carrier/conf/c9/s", b"conf");
        let (res, _) = run(
            &api,
            &[
                "trusted-clients",
                "pre-config",
                "--type",
                "carrier",
                "--id",
                "c9",
                "--name",
                target.to_str().unwrap(),
            ],
        )
        .await;
        res.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"conf".to_vec());
    }
}
