/*!
`settings` command group: scoped settings and their schemas.

  privx-cli settings show [--scope GLOBAL] [--section S | --merge M]
  privx-cli settings update [--scope GLOBAL] [--section S] JSON-FILE
  privx-cli settings schemas [--scope GLOBAL]
  privx-cli settings schema --scope SCOPE --section S

Scopes are sent uppercased, sections lowercased.
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::shared::{self, read_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Get the settings of a scope, or of one section
    Show {
        #[arg(long, default_value = "GLOBAL")]
        scope: String,
        #[arg(long, default_value = "")]
        section: String,
        /// Merge service specific settings with shared ones (scope only)
        #[arg(long, conflicts_with = "section")]
        merge: Option<String>,
    },
    /// Update the settings of a scope, or of one section
    Update {
        #[arg(long, default_value = "GLOBAL")]
        scope: String,
        #[arg(long, default_value = "")]
        section: String,
        file: PathBuf,
    },
    /// Get the settings schemas of a scope
    #[command(alias = "list-schema")]
    Schemas {
        #[arg(long, default_value = "GLOBAL")]
        scope: String,
    },
    /// Get the schema of a scope section
    #[command(alias = "show-schema")]
    Schema {
        #[arg(long, required = true)]
        scope: String,
        #[arg(long, required = true)]
        section: String,
    },
}

fn settings_path(scope: &str, section: &str) -> String {
    let scope = scope.to_uppercase();
    if section.is_empty() {
        format!("/scope/{scope}")
    } else {
        format!("/scope/{scope}/{}", section.to_lowercase())
    }
}

pub async fn execute_settings<C: Connector, W: Write>(
    args: SettingsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match args.command {
        SettingsCommand::Show {
            scope,
            section,
            merge,
        } => {
            let req = Request::get(Service::Settings, settings_path(&scope, &section))
                .query_opt("merge", merge);
            shared::print(api, out, req).await
        }
        SettingsCommand::Update {
            scope,
            section,
            file,
        } => {
            let req = Request::put(Service::Settings, settings_path(&scope, &section))
                .json(read_body(&file)?);
            shared::send(api, req).await
        }
        SettingsCommand::Schemas { scope } => {
            let req = Request::get(Service::Settings, format!("/schema/{}", scope.to_uppercase()));
            shared::print(api, out, req).await
        }
        SettingsCommand::Schema { scope, section } => {
            let req = Request::get(
                Service::Settings,
                format!("/schema/{}/{}", scope.to_uppercase(), section.to_lowercase()),
            );
            shared::print(api, out, req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{parse_err, run};

    #[tokio::test]
    async fn show_normalises_scope_and_section() {
        let api = StubConnector::new();
        run(&api, &["settings", "show", "--scope", "vault", "--section", "General"])
            .await
            .0
            .unwrap();
        run(&api, &["settings", "show", "--merge", "true"]).await.0.unwrap();
        assert_eq!(
            api.call_lines(),
            vec![
                "GET /settings/api/v1/scope/VAULT/general",
                "GET /settings/api/v1/scope/GLOBAL"
            ]
        );
        assert_eq!(
            api.calls()[1].query,
            vec![("merge".to_string(), "true".to_string())]
        );
    }

    #[test]
    fn merge_is_rejected_with_section() {
        parse_err(&["settings", "show", "--section", "x", "--merge", "true"]);
    }

    #[test]
    fn schema_requires_section() {
        parse_err(&["settings", "schema", "--scope", "GLOBAL"]);
    }
}
