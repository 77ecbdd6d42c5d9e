/*!
`authorizer` command group: CA certificates, deployment scripts, trust
anchors and issued certificates.

  privx-cli authorizer [--access-group-id ID]
  privx-cli authorizer show --id CA-ID --name FILE
  privx-cli authorizer show-crl --id CA-ID --name FILE
  privx-cli authorizer target-host-credentials JSON-FILE
  privx-cli authorizer deployment-script --trusted-client-id ID --name FILE
  privx-cli authorizer principal-cmd-script --name FILE
  privx-cli authorizer ssl-trust-anchor | extender-trust-anchor
  privx-cli authorizer search [--offset ...] [JSON-FILE]
  privx-cli authorizer cert-list
  privx-cli authorizer get-cert --id ID
*/

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::shared::{self, PageArgs, Paged, SortArgs, read_body, read_optional_body};
use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AuthorizerArgs {
    #[command(subcommand)]
    pub command: Option<AuthorizerCommand>,

    /// Access group ID filter
    #[arg(long, default_value = "")]
    pub access_group_id: String,
}

#[derive(Subcommand, Debug)]
pub enum AuthorizerCommand {
    /// Download CA certificate
    Show {
        /// CA ID
        #[arg(long, required = true)]
        id: String,
        /// Output file name
        #[arg(long, required = true)]
        name: String,
    },
    /// Download CA certificate revocation list
    ShowCrl {
        #[arg(long, required = true)]
        id: String,
        #[arg(long, required = true)]
        name: String,
    },
    /// Get target host credentials for an authorization request
    TargetHostCredentials { file: PathBuf },
    /// Download the deployment script of a trusted client
    DeploymentScript {
        #[arg(long, required = true)]
        trusted_client_id: String,
        #[arg(long, required = true)]
        name: String,
    },
    /// Download the principals command script
    PrincipalCmdScript {
        #[arg(long, required = true)]
        name: String,
    },
    /// Get the SSL trust anchor
    SslTrustAnchor,
    /// Get the extender trust anchor
    ExtenderTrustAnchor,
    /// Search issued certificates
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SortArgs,
        file: Option<PathBuf>,
    },
    /// List all issued certificates
    CertList,
    /// Get issued certificate by ID
    GetCert {
        #[arg(long, required = true)]
        id: String,
    },
}

pub async fn execute_authorizer<C: Connector, W: Write>(
    args: AuthorizerArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        let req = Request::get(Service::Authorizer, "/cas")
            .query("access_group_id", &args.access_group_id);
        return shared::print(api, out, req).await;
    };

    match command {
        AuthorizerCommand::Show { id, name } => {
            let req = Request::get(Service::Authorizer, format!("/cas/{id}/certificate"));
            save(api, req, &name).await
        }
        AuthorizerCommand::ShowCrl { id, name } => {
            let req = Request::get(Service::Authorizer, format!("/cas/{id}/crl"));
            save(api, req, &name).await
        }
        AuthorizerCommand::TargetHostCredentials { file } => {
            let req = Request::post(Service::Authorizer, "/ca/authorize").json(read_body(&file)?);
            shared::print(api, out, req).await
        }
        AuthorizerCommand::DeploymentScript {
            trusted_client_id,
            name,
        } => {
            let base = format!("/deploy/{trusted_client_id}");
            let handle = api::call(api, Request::post(Service::Authorizer, base.as_str())).await?;
            let session = api::session_id(&handle)?;
            save(api, Request::get(Service::Authorizer, format!("{base}/{session}")), &name).await
        }
        AuthorizerCommand::PrincipalCmdScript { name } => {
            let req = Request::get(Service::Authorizer, "/deploy/principals_command.sh");
            save(api, req, &name).await
        }
        AuthorizerCommand::SslTrustAnchor => {
            shared::print(api, out, Request::get(Service::Authorizer, "/ssl-trust-anchor")).await
        }
        AuthorizerCommand::ExtenderTrustAnchor => {
            let req = Request::get(Service::Authorizer, "/extender-trust-anchor");
            shared::print(api, out, req).await
        }
        AuthorizerCommand::Search { page, sort, file } => {
            let req = Request::post(Service::Authorizer, "/cert/search")
                .page(&page)
                .sort(&sort)
                .json(read_optional_body(file.as_ref())?);
            shared::print_items(api, out, req).await
        }
        AuthorizerCommand::CertList => {
            shared::print_items(api, out, Request::get(Service::Authorizer, "/cert")).await
        }
        AuthorizerCommand::GetCert { id } => {
            shared::print(api, out, Request::get(Service::Authorizer, format!("/cert/{id}"))).await
        }
    }
}

async fn save<C: Connector>(api: &C, req: Request, name: &str) -> Result<()> {
    let path = Path::new(name);
    api::download(api, req, path)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::run;
    use serde_json::json;

    #[tokio::test]
    async fn deployment_script_uses_session_handle() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deploy.sh");
        let api = StubConnector::new()
            .reply(
                Method::Post,
                "/authorizer/api/v1/deploy/tc1",
                json!({"session_id": "abc"}),
            )
            .reply_bytes(Method::Get, "/authorizer/api/v1/deploy/tc1/abc", b"#!/bin/bash\n");
        let (res, _) = run(
            &api,
            &[
                "authorizer",
                "deployment-script",
                "--trusted-client-id",
                "tc1",
                "--name",
                target.to_str().unwrap(),
            ],
        )
        .await;
        res.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "#!/bin/bash\n");
    }

    #[tokio::test]
    async fn failed_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ca.pem");
        let api = StubConnector::new().fail(
            Method::Get,
            "/authorizer/api/v1/cas/ca1/certificate",
            404,
            "no such ca",
        );
        let (res, _) = run(
            &api,
            &["authorizer", "show", "--id", "ca1", "--name", target.to_str().unwrap()],
        )
        .await;
        assert!(res.is_err());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn cert_search_without_body_sends_empty_object() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["authorizer", "search", "--sortdir", "asc"]).await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.body, Some(json!({})));
        assert!(call.query.contains(&("sortdir".to_string(), "ASC".to_string())));
    }
}
