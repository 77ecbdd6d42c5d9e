/*!
`sessions` command group (auth session storage).

  privx-cli sessions [list] --user-id UID | --source-id SID [paging flags] [--sortkey K --sortdir D]
  privx-cli sessions search [paging + sort flags] JSON-FILE
  privx-cli sessions terminate --id SESSION
  privx-cli sessions terminate-user --user-id UID
*/

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use super::shared::{self, PageArgs, Paged, read_body};
use crate::api::{Connector, Request, Service};
use crate::output::Output;

#[derive(Args, Debug, Clone)]
pub struct SessionSortArgs {
    /// Sort by a specific object property
    #[arg(long, default_value = "expires")]
    pub sortkey: String,

    /// Sort direction, ASC or DESC
    #[arg(long, default_value = "ASC")]
    pub sortdir: String,
}

impl SessionSortArgs {
    fn apply(&self, req: Request) -> Request {
        req.query("sortkey", &self.sortkey)
            .query("sortdir", self.sortdir.to_uppercase())
    }
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: Option<SessionCommand>,

    #[command(flatten)]
    pub list: SessionListArgs,
}

#[derive(Args, Debug)]
pub struct SessionListArgs {
    /// List the sessions of a user
    #[arg(long, conflicts_with = "source_id")]
    pub user_id: Option<String>,

    /// List the sessions of a source
    #[arg(long)]
    pub source_id: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub sort: SessionSortArgs,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// List the sessions of a user or a source
    #[command(alias = "show")]
    List(SessionListArgs),
    /// Search sessions
    Search {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        sort: SessionSortArgs,
        file: PathBuf,
    },
    /// Terminate a session
    Terminate {
        /// Session ID
        #[arg(long, required = true)]
        id: String,
    },
    /// Terminate every session of a user
    #[command(alias = "terminate-all")]
    TerminateUser {
        #[arg(long, required = true)]
        user_id: String,
    },
}

const STORAGE: &str = "/sessionstorage";

pub async fn execute_sessions<C: Connector, W: Write>(
    args: SessionsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let Some(command) = args.command else {
        return list(api, out, &args.list).await;
    };

    match command {
        SessionCommand::List(list_args) => list(api, out, &list_args).await,
        SessionCommand::Search { page, sort, file } => {
            let req = Request::post(Service::Auth, format!("{STORAGE}/sessions/search")).page(&page);
            let req = sort.apply(req).json(read_body(&file)?);
            shared::print_items(api, out, req).await
        }
        SessionCommand::Terminate { id } => {
            let req = Request::post(Service::Auth, format!("{STORAGE}/sessions/{id}/terminate"));
            shared::send(api, req).await
        }
        SessionCommand::TerminateUser { user_id } => {
            let req = Request::post(
                Service::Auth,
                format!("{STORAGE}/users/{user_id}/sessions/terminate"),
            );
            shared::send(api, req).await
        }
    }
}

async fn list<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    args: &SessionListArgs,
) -> Result<()> {
    let path = match (&args.user_id, &args.source_id) {
        (Some(user), _) => format!("{STORAGE}/users/{user}/sessions"),
        (None, Some(source)) => format!("{STORAGE}/sources/{source}/sessions"),
        (None, None) => bail!("one of --user-id or --source-id is required"),
    };
    let req = args.sort.apply(Request::get(Service::Auth, path).page(&args.page));
    shared::print_items(api, out, req).await
}

#[cfg(test)]
mod tests {
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{parse_err, run};

    #[tokio::test]
    async fn list_by_user_uses_session_defaults() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["sessions", "--user-id", "u1"]).await;
        res.unwrap();
        let call = &api.calls()[0];
        assert_eq!(call.full_path(), "/auth/api/v1/sessionstorage/users/u1/sessions");
        assert_eq!(
            call.query,
            vec![
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("sortkey".to_string(), "expires".to_string()),
                ("sortdir".to_string(), "ASC".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn list_by_source() {
        let api = StubConnector::new();
        run(&api, &["sessions", "--source-id", "s1"]).await.0.unwrap();
        assert_eq!(
            api.call_lines(),
            vec!["GET /auth/api/v1/sessionstorage/sources/s1/sessions"]
        );
    }

    #[tokio::test]
    async fn list_and_show_verbs_match_the_bare_group() {
        let api = StubConnector::new();
        run(&api, &["sessions", "show", "--user-id", "u1"]).await.0.unwrap();
        run(&api, &["sessions", "list", "--source-id", "s1", "--limit", "5"])
            .await
            .0
            .unwrap();
        assert_eq!(
            api.call_lines(),
            vec![
                "GET /auth/api/v1/sessionstorage/users/u1/sessions",
                "GET /auth/api/v1/sessionstorage/sources/s1/sessions"
            ]
        );
        assert!(api.calls()[1].query.contains(&("limit".to_string(), "5".to_string())));
    }

    #[tokio::test]
    async fn list_needs_an_owner() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["sessions"]).await;
        assert!(res.is_err());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn user_and_source_conflict() {
        parse_err(&["sessions", "--user-id", "u1", "--source-id", "s1"]);
    }

    #[tokio::test]
    async fn terminate_user_sessions() {
        let api = StubConnector::new();
        run(&api, &["sessions", "terminate-user", "--user-id", "u1"])
            .await
            .0
            .unwrap();
        assert_eq!(
            api.call_lines(),
            vec!["POST /auth/api/v1/sessionstorage/users/u1/sessions/terminate"]
        );
    }
}
