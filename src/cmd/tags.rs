/*!
`tags` command: list user or host tags.

  privx-cli tags --type user|host [--offset N --limit N --sortdir D --query Q]
*/

use std::io::Write;

use anyhow::Result;
use clap::Args;

use super::kind::TagType;
use super::shared::{self, PageArgs, Paged};
use crate::api::{Connector, Request};
use crate::output::Output;

#[derive(Args, Debug, Clone, Default)]
pub struct TagQueryArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Sort direction, ASC or DESC
    #[arg(long, default_value = "")]
    pub sortdir: String,

    /// Only tags matching this string
    #[arg(long, default_value = "")]
    pub query: String,
}

#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Tag type: user or host
    #[arg(long = "type", required = true, value_name = "TYPE")]
    pub kind: String,

    #[command(flatten)]
    pub filter: TagQueryArgs,
}

pub async fn execute_tags<C: Connector, W: Write>(
    args: TagsArgs,
    api: &C,
    out: &mut Output<W>,
) -> Result<()> {
    let kind = TagType::parse(&args.kind)?;
    list_tags(api, out, kind, &args.filter).await
}

/// List the tags of `kind`; shared with `local-users tags`.
pub async fn list_tags<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    kind: TagType,
    filter: &TagQueryArgs,
) -> Result<()> {
    let route = kind.route();
    let req = Request::get(route.service, route.path)
        .page(&filter.page)
        .query("sortdir", filter.sortdir.to_uppercase())
        .query("query", &filter.query);
    shared::print_items(api, out, req).await
}

#[cfg(test)]
mod tests {
    use crate::api::stub::StubConnector;
    use crate::cmd::shared::testing::{parse_err, run};
    use rstest::rstest;

    #[rstest]
    #[case("user", "GET /local-user-store/api/v1/users/tags")]
    #[case("HOST", "GET /host-store/api/v1/hosts/tags")]
    #[tokio::test]
    async fn type_selects_store(#[case] kind: &str, #[case] line: &str) {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["tags", "--type", kind, "--sortdir", "asc", "--query", "prod"]).await;
        res.unwrap();
        assert_eq!(api.call_lines(), vec![line]);
        assert_eq!(
            api.calls()[0].query,
            vec![
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("sortdir".to_string(), "ASC".to_string()),
                ("query".to_string(), "prod".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn unknown_type_fails_before_request() {
        let api = StubConnector::new();
        let (res, _) = run(&api, &["tags", "--type", "role"]).await;
        assert!(
            res.unwrap_err()
                .to_string()
                .starts_with("tag type does not exist: role")
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn type_is_required() {
        parse_err(&["tags"]);
    }
}
