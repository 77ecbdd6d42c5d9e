use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod api;
mod cmd;
mod config;
mod error;
mod output;
mod utils;

use api::{Connector, HttpConnector};
use cmd::*;
use config::{FileConfig, Overrides};
use output::Output;

/// privx-cli - command line client for the PrivX REST API
///
/// Every resource group lists its items when invoked without a verb:
///   privx-cli hosts --offset 0 --limit 20 --sortdir desc
///   privx-cli hosts show --id <HOST-ID>,<HOST-ID>
///   privx-cli secrets create --name db --allow-read-to <ROLE-ID> secret.json
///
/// Configure the client with flags, environment or a config file
/// (flags win over environment, environment over the file):
///   --url      PRIVX_API_BASE_URL     [api] base_url
///   --access   PRIVX_API_ACCESS_KEY   [auth] api_client_id
///   --secret   PRIVX_API_SECRET_KEY   [auth] api_client_secret
///              PRIVX_API_OAUTH_CLIENT_ID / PRIVX_API_OAUTH_CLIENT_SECRET
///
/// The config file defaults to ~/privx-sdk.toml.
///
/// A token from `privx-cli login` can be reused without the access key:
///   export SESSION=$(privx-cli login)
///   privx-cli -s $SESSION hosts
#[derive(Parser, Debug)]
#[command(
    name = "privx-cli",
    version,
    about = "PrivX command line client",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// PrivX absolute URL (e.g. https://your-instance.privx.io)
    #[arg(long, global = true, env = "PRIVX_API_BASE_URL", value_name = "URL")]
    url: Option<String>,

    /// Either access key of api client or username
    #[arg(short, long, global = true, env = "PRIVX_API_ACCESS_KEY")]
    access: Option<String>,

    /// Either secret key of api client, password or an issued access token
    #[arg(
        short,
        long,
        global = true,
        env = "PRIVX_API_SECRET_KEY",
        hide_env_values = true
    )]
    secret: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List and manage hosts
    Hosts(HostsArgs),
    /// List and manage roles
    Roles(RolesArgs),
    /// Search users and manage their roles
    Users(UsersArgs),
    /// List and manage local users
    LocalUsers(LocalUsersArgs),
    /// List and manage API clients
    ApiClients(ApiClientsArgs),
    /// List and manage trusted clients (extenders, web proxies, carriers)
    TrustedClients(TrustedClientsArgs),
    /// Download a pre-configured config file for extender, web proxy or carrier
    PreConfigurations(PreConfigArgs),
    /// Certificates, deployment scripts and trust anchors
    Authorizer(AuthorizerArgs),
    /// List and manage access groups
    AccessGroups(AccessGroupsArgs),
    /// Extender CA certificates and revocation lists
    Extender(CaArgs),
    /// Web proxy CA certificates and revocation lists
    WebProxy(CaArgs),
    /// List and manage principals
    Principals(PrincipalsArgs),
    /// Manage role principal keys
    PrincipalKeys(PrincipalKeysArgs),
    /// List and manage authorized keys
    AuthorizedKeys(AuthorizedKeysArgs),
    /// List and manage AWS roles
    AwsRoles(AwsRolesArgs),
    /// List and manage identity sources
    Sources(SourcesArgs),
    /// List and manage log collectors
    Collectors(CollectorsArgs),
    /// List and manage vault secrets
    Secrets(SecretsArgs),
    /// Manage personal secrets of a user
    UserSecrets(UserSecretsArgs),
    /// List and manage connections
    Connections(ConnectionsArgs),
    /// UEBA anomaly detection (also under `connections ueba`)
    Ueba(UebaArgs),
    /// List and manage workflows
    Workflows(WorkflowsArgs),
    /// List and manage access requests
    Requests(RequestsArgs),
    /// Show and update settings
    Settings(SettingsArgs),
    /// List and terminate sessions
    Sessions(SessionsArgs),
    /// List user or host tags
    Tags(TagsArgs),
    /// Trail index status and search
    #[command(alias = "index")]
    TrailIndex(TrailIndexArgs),
    /// List and manage network targets
    #[command(alias = "nam")]
    NetworkTargets(NetworkTargetsArgs),
    /// Show and manage the license
    License(LicenseArgs),
    /// Mobile gateway registration and paired devices
    #[command(alias = "mobilegw")]
    MobileGateway(MobileGatewayArgs),
    /// Manage identity provider clients
    IdpClients(IdpClientsArgs),
    /// List PrivX components
    Components(ComponentsArgs),
    /// Instance status and shutdown
    Instance(InstanceArgs),
    /// List and search audit events
    #[command(alias = "auditevents")]
    AuditEvents(AuditEventsArgs),
    /// Database proxy configuration
    DbProxy(DbProxyArgs),
    /// Print an access token for subsequent calls
    Login,
}

/// Route a parsed command to its handler.
pub async fn dispatch<C: Connector, W: Write>(
    command: Commands,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    match command {
        Commands::Hosts(args) => cmd::execute_hosts(args, api, out).await,
        Commands::Roles(args) => cmd::execute_roles(args, api, out).await,
        Commands::Users(args) => cmd::execute_users(args, api, out).await,
        Commands::LocalUsers(args) => cmd::execute_local_users(args, api, out).await,
        Commands::ApiClients(args) => cmd::execute_api_clients(args, api, out).await,
        Commands::TrustedClients(args) => cmd::execute_trusted_clients(args, api, out).await,
        Commands::PreConfigurations(args) => cmd::execute_preconfig(args, api).await,
        Commands::Authorizer(args) => cmd::execute_authorizer(args, api, out).await,
        Commands::AccessGroups(args) => cmd::execute_access_groups(args, api, out).await,
        Commands::Extender(args) => {
            cmd::execute_cas(ClientType::Extender, args, api, out).await
        }
        Commands::WebProxy(args) => {
            cmd::execute_cas(ClientType::Webproxy, args, api, out).await
        }
        Commands::Principals(args) => cmd::execute_principals(args, api, out).await,
        Commands::PrincipalKeys(args) => cmd::execute_principal_keys(args, api, out).await,
        Commands::AuthorizedKeys(args) => cmd::execute_authorized_keys(args, api, out).await,
        Commands::AwsRoles(args) => cmd::execute_aws_roles(args, api, out).await,
        Commands::Sources(args) => cmd::execute_sources(args, api, out).await,
        Commands::Collectors(args) => cmd::execute_collectors(args, api, out).await,
        Commands::Secrets(args) => cmd::execute_secrets(args, api, out).await,
        Commands::UserSecrets(args) => cmd::execute_user_secrets(args, api, out).await,
        Commands::Connections(args) => cmd::execute_connections(args, api, out).await,
        Commands::Ueba(args) => cmd::execute_ueba(args, api, out).await,
        Commands::Workflows(args) => cmd::execute_workflows(args, api, out).await,
        Commands::Requests(args) => cmd::execute_requests(args, api, out).await,
        Commands::Settings(args) => cmd::execute_settings(args, api, out).await,
        Commands::Sessions(args) => cmd::execute_sessions(args, api, out).await,
        Commands::Tags(args) => cmd::execute_tags(args, api, out).await,
        Commands::TrailIndex(args) => cmd::execute_trail_index(args, api, out).await,
        Commands::NetworkTargets(args) => cmd::execute_network_targets(args, api, out).await,
        Commands::License(args) => cmd::execute_license(args, api, out).await,
        Commands::MobileGateway(args) => cmd::execute_mobile_gateway(args, api, out).await,
        Commands::IdpClients(args) => cmd::execute_idp_clients(args, api, out).await,
        Commands::Components(args) => cmd::execute_components(args, api, out).await,
        Commands::Instance(args) => cmd::execute_instance(args, api, out).await,
        Commands::AuditEvents(args) => cmd::execute_audit_events(args, api, out).await,
        Commands::DbProxy(args) => cmd::execute_db_proxy(args, api, out).await,
        Commands::Login => {
            let token = api
                .access_token()
                .await?
                .context("connector has no access token")?;
            out.raw(token.as_bytes())
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        url: cli.url,
        access: cli.access,
        secret: cli.secret,
    };
    let file = FileConfig::load(cli.config.as_deref())?;
    let settings = config::resolve(&overrides, |k| std::env::var(k).ok(), file)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    rt.block_on(async {
        let api = HttpConnector::new(settings)?;
        let stdout = std::io::stdout();
        let mut out = Output::new(stdout.lock());
        dispatch(cli.command, &api, &mut out).await
    })
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    if let Err(e) = run(cli) {
        eprintln!("{}", error::capitalize_first(&format!("{e:#}")));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{parse, parse_err, run};

    #[test]
    fn global_flags_parse_anywhere() {
        let cli = parse(&[
            "hosts",
            "--url",
            "https://privx.example.com",
            "-a",
            "me",
            "-s",
            "pw",
            "-vv",
        ]);
        assert_eq!(cli.url.as_deref(), Some("https://privx.example.com"));
        assert_eq!(cli.access.as_deref(), Some("me"));
        assert_eq!(cli.secret.as_deref(), Some("pw"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn url_flag_is_not_the_access_key() {
        let cli = parse(&["--url", "https://a.example.com", "login"]);
        assert_eq!(cli.url.as_deref(), Some("https://a.example.com"));
        assert_ne!(cli.access.as_deref(), Some("https://a.example.com"));
    }

    #[test]
    fn missing_subcommand_is_a_usage_error() {
        let err = parse_err(&[]);
        assert!(err.use_stderr());
    }

    #[test]
    fn command_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[tokio::test]
    async fn type_check_runs_before_authentication() {
        let settings = config::Settings {
            base_url: url::Url::parse("http://127.0.0.1:9").unwrap(),
            credentials: config::Credentials::Password {
                access: "x".into(),
                secret: "y".into(),
            },
            oauth_client_id: "privx-external".into(),
            oauth_client_secret: String::new(),
        };
        let api = HttpConnector::new(settings).unwrap();
        let cli = parse(&[
            "pre-configurations",
            "--id",
            "t",
            "--type",
            "bogus",
            "--name",
            "out.conf",
        ]);
        let mut out = Output::new(Vec::new());
        let err = dispatch(cli.command, &api, &mut out).await.unwrap_err();
        assert!(err.to_string().starts_with("ca type does not exist: bogus"));
    }

    #[tokio::test]
    async fn login_prints_raw_token() {
        let api = StubConnector::new().with_token("tok-1");
        let (res, out) = run(&api, &["login"]).await;
        res.unwrap();
        assert_eq!(out, "tok-1");
        assert!(api.calls().is_empty());
    }
}
