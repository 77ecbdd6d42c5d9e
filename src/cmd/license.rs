/*!
License manager groups: `license` and `mobile-gateway` (alias `mobilegw`).

  privx-cli license [show]
  privx-cli license set --key KEY
  privx-cli license refresh
  privx-cli license statistics [--opt-in false]
  privx-cli license deactivate

  privx-cli mobile-gateway register|unregister|status
  privx-cli mobile-gateway devices --user-id UID
  privx-cli mobile-gateway unpair --user-id UID --device-id DEV
*/

use std::io::Write;

use anyhow::Result;
use clap::{ArgAction, Args, Subcommand};
use serde_json::json;

use super::shared;
use crate::api::{Connector, Request, Service};
use crate::output::Output;

const SERVICE: Service = Service::LicenseManager;

/* ---- license ---- */

#[derive(Args, Debug)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: Option<LicenseCommand>,
}

#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Show the license
    Show,
    /// Install a license key
    Set {
        #[arg(long, required = true)]
        key: String,
    },
    /// Refresh the license from the license server
    Refresh,
    /// Opt in to or out of license statistics
    #[command(alias = "stats")]
    Statistics {
        #[arg(long, alias = "optin", default_value_t = true, action = ArgAction::Set)]
        opt_in: bool,
    },
    /// Deactivate the license
    Deactivate,
}

pub async fn execute_license<C: Connector, W: Write>(
    args: LicenseArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command.unwrap_or(LicenseCommand::Show) {
        LicenseCommand::Show => shared::print(api, out, Request::get(SERVICE, "/license")).await,
        LicenseCommand::Set { key } => {
            shared::send(api, Request::post(SERVICE, "/license").json(json!(key))).await
        }
        LicenseCommand::Refresh => {
            shared::print(api, out, Request::post(SERVICE, "/license/refresh")).await
        }
        LicenseCommand::Statistics { opt_in } => {
            let req = Request::post(SERVICE, "/license/optin").json(json!({ "opt_in": opt_in }));
            shared::send(api, req).await
        }
        LicenseCommand::Deactivate => {
            shared::send(api, Request::post(SERVICE, "/license/deactivate")).await
        }
    }
}

/* ---- mobile-gateway ---- */

#[derive(Args, Debug)]
pub struct MobileGatewayArgs {
    #[command(subcommand)]
    pub command: MobileGatewayCommand,
}

#[derive(Subcommand, Debug)]
pub enum MobileGatewayCommand {
    /// Register PrivX to the mobile gateway
    Register,
    /// Unregister PrivX from the mobile gateway
    Unregister,
    /// Show the mobile gateway registration status
    #[command(alias = "regstat")]
    Status,
    /// List the paired devices of a user
    #[command(alias = "paired-devices")]
    Devices {
        #[arg(long, required = true)]
        user_id: String,
    },
    /// Unpair a user's device
    #[command(alias = "unpair-device")]
    Unpair {
        #[arg(long, required = true)]
        user_id: String,
        #[arg(long, required = true)]
        device_id: String,
    },
}

pub async fn execute_mobile_gateway<C: Connector, W: Write>(
    args: MobileGatewayArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        MobileGatewayCommand::Register => {
            shared::send(api, Request::post(SERVICE, "/license/mobilegw/register")).await?;
            out.raw(b"registration success")
        }
        MobileGatewayCommand::Unregister => {
            shared::send(api, Request::post(SERVICE, "/license/mobilegw/unregister")).await
        }
        MobileGatewayCommand::Status => {
            let req = Request::get(SERVICE, "/license/mobilegw/registration");
            shared::print(api, out, req).await
        }
        MobileGatewayCommand::Devices { user_id } => {
            let req = Request::get(Service::Auth, format!("/users/{user_id}/devices"));
            shared::print_items(api, out, req).await
        }
        MobileGatewayCommand::Unpair { user_id, device_id } => {
            let req = Request::delete(Service::Auth, format!("/users/{user_id}/devices/{device_id}"));
            shared::send(api, req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::Method;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::run;
    use serde_json::json;

    #[tokio::test]
    async fn bare_license_shows() {
        let api = StubConnector::new().reply(
            Method::Get,
            "/license-manager/api/v1/license",
            json!({"status": "valid"}),
        );
        let (res, out) = run(&api, &["license"]).await;
        res.unwrap();
        assert_eq!(out, r#"{"status":"valid"}"#);
    }

    #[tokio::test]
    async fn statistics_opt_in_defaults_to_true() {
        let api = StubConnector::new();
        run(&api, &["license", "statistics"]).await.0.unwrap();
        run(&api, &["license", "stats", "--opt-in", "false"]).await.0.unwrap();
        let calls = api.calls();
        assert_eq!(calls[0].body, Some(json!({"opt_in": true})));
        assert_eq!(calls[1].body, Some(json!({"opt_in": false})));
    }

    #[tokio::test]
    async fn register_reports_success() {
        let api = StubConnector::new();
        let (res, out) = run(&api, &["mobilegw", "register"]).await;
        res.unwrap();
        assert_eq!(out, "registration success");
    }

    #[tokio::test]
    async fn register_failure_prints_nothing() {
        let api = StubConnector::new().fail(
            Method::Post,
            "/license-manager/api/v1/license/mobilegw/register",
            503,
            "gateway unreachable",
        );
        let (res, out) = run(&api, &["mobile-gateway", "register"]).await;
        assert!(res.is_err());
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn unpair_device() {
        let api = StubConnector::new();
        run(
            &api,
            &["mobile-gateway", "unpair", "--user-id", "u1", "--device-id", "d1"],
        )
        .await
        .0
        .unwrap();
        assert_eq!(
            api.call_lines(),
            vec!["DELETE /auth/api/v1/users/u1/devices/d1"]
        );
    }
}
