/*!
`pre-configurations` command: download a pre-configured config file for an
extender, web proxy or carrier.

  privx-cli pre-configurations --id TRUSTED-CLIENT-ID --type extender|webproxy|carrier --name FILE

The download is a two step exchange with the authorizer: request a session
handle, then fetch the file under that session.
*/

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use super::kind::ClientType;
use crate::api::{self, Connector, Request, Service};

#[derive(Args, Debug)]
pub struct PreConfigArgs {
    /// Trusted client ID
    #[arg(long, required = true)]
    pub id: String,

    /// Client type: extender, webproxy or carrier
    #[arg(long = "type", required = true, value_name = "TYPE")]
    pub kind: String,

    /// Output file name
    #[arg(long, required = true)]
    pub name: String,
}

pub async fn execute_preconfig<C: Connector>(args: PreConfigArgs, api: &C) -> Result<()> {
    let kind = ClientType::parse(&args.kind)?;
    download_preconfig(api, kind, &args.id, Path::new(&args.name)).await
}

/// Fetch the config file of `trusted_client` and store it at `path`.
pub async fn download_preconfig<C: Connector>(
    api: &C,
    kind: ClientType,
    trusted_client: &str,
    path: &Path,
) -> Result<()> {
    let base = format!("/{}/conf/{trusted_client}", kind.route().segment);
    let handle = api::call(api, Request::post(Service::Authorizer, base.as_str())).await?;
    let session = api::session_id(&handle)?;

    api::download(api, Request::get(Service::Authorizer, format!("{base}/{session}")), path)
        .await
        .with_context(|| format!("failed to download {kind} config to {}", path.display()))
}
