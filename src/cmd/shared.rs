/*!
shared.rs - helpers used by every resource command.

Focus:
  - PageArgs / SortArgs: common paging + sorting flags and their query params
  - split_ids: comma separated ID lists
  - read_body / read_optional_body: JSON (or YAML) request bodies from files
  - show_each / delete_each / put_each: sequential per-ID loops that stop on
    the first error
*/

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::api::{self, Connector, Request, Service};
use crate::output::Output;

/* ---- Common flags ---- */

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PageArgs {
    /// Where to start fetching the items
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Number of items to return
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}

impl Default for PageArgs {
    fn default() -> Self {
        PageArgs {
            offset: 0,
            limit: 50,
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SortArgs {
    /// Sort by a specific object property
    #[arg(long, default_value = "")]
    pub sortkey: String,

    /// Sort direction, ASC or DESC
    #[arg(long, default_value = "")]
    pub sortdir: String,
}

impl SortArgs {
    pub fn direction(&self) -> String {
        self.sortdir.to_uppercase()
    }
}

/// Query-string helpers for the common flag groups.
pub trait Paged: Sized {
    fn page(self, page: &PageArgs) -> Self;
    fn sort(self, sort: &SortArgs) -> Self;
}

impl Paged for Request {
    fn page(self, page: &PageArgs) -> Self {
        self.query("offset", page.offset).query("limit", page.limit)
    }

    fn sort(self, sort: &SortArgs) -> Self {
        self.query("sortkey", &sort.sortkey)
            .query("sortdir", sort.direction())
    }
}

/* ---- Argument shaping ---- */

/// Split a comma separated list, dropping blanks.
pub fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode a request body file. `.yaml` / `.yml` files are read as YAML,
/// anything else as JSON.
pub fn read_body(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lower = path.to_string_lossy().to_ascii_lowercase();

    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse YAML file {}", path.display()))?;
        serde_json::to_value(yaml).context("failed to convert YAML to JSON")
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON file {}", path.display()))
    }
}

/// Optional search body; an absent file means an empty search object.
pub fn read_optional_body(path: Option<&PathBuf>) -> Result<Value> {
    match path {
        Some(p) => read_body(p),
        None => Ok(Value::Object(Default::default())),
    }
}

/// String field of a JSON object, empty when absent.
pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("")
}

/* ---- Sequential loops ---- */

/// Fetch each ID in order and print the collected array.
pub async fn show_each<C, W, F>(
    api: &C,
    out: &mut Output<W>,
    ids: &str,
    request: F,
) -> Result<()>
where
    C: Connector,
    W: Write,
    F: Fn(&str) -> Request,
{
    let mut found = Vec::new();
    for id in split_ids(ids) {
        found.push(api::call(api, request(&id)).await?);
    }
    out.json(&found)
}

/// Send one request per ID, printing each ID once its request succeeded.
pub async fn for_each_id<C, W, F>(
    api: &C,
    out: &mut Output<W>,
    ids: &str,
    request: F,
) -> Result<()>
where
    C: Connector,
    W: Write,
    F: Fn(&str) -> Request,
{
    for id in split_ids(ids) {
        api.send(request(&id)).await?;
        out.line(&id)?;
    }
    Ok(())
}

/// Print the response, whatever its shape.
pub async fn print<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    request: Request,
) -> Result<()> {
    let value = api::call(api, request).await?;
    out.json(&value)
}

/// Print a collection response, unwrapping the `items` array.
pub async fn print_items<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    request: Request,
) -> Result<()> {
    let value = api::call_items(api, request).await?;
    out.json(&value)
}

/// Print the `id` of a create response.
pub async fn print_id<C: Connector, W: Write>(
    api: &C,
    out: &mut Output<W>,
    request: Request,
) -> Result<()> {
    let value = api::call(api, request).await?;
    match value.get("id") {
        Some(id) => out.json(id),
        None => out.json(&value),
    }
}

/// Send a request and discard the response.
pub async fn send<C: Connector>(api: &C, request: Request) -> Result<()> {
    api.send(request).await?;
    Ok(())
}

/* ---- Plain collections ---- */

/// A REST collection with the usual create/show/update/delete verbs.
pub struct Collection {
    pub service: Service,
    pub path: &'static str,
}

impl Collection {
    pub const fn new(service: Service, path: &'static str) -> Self {
        Collection { service, path }
    }

    pub fn list(&self) -> Request {
        Request::get(self.service, self.path)
    }

    pub fn item(&self, id: &str) -> String {
        format!("{}/{id}", self.path)
    }

    pub async fn create<C: Connector, W: Write>(
        &self,
        api: &C,
        out: &mut Output<W>,
        file: &Path,
    ) -> Result<()> {
        let req = Request::post(self.service, self.path).json(read_body(file)?);
        print_id(api, out, req).await
    }

    pub async fn show<C: Connector, W: Write>(
        &self,
        api: &C,
        out: &mut Output<W>,
        ids: &str,
    ) -> Result<()> {
        show_each(api, out, ids, |id| Request::get(self.service, self.item(id))).await
    }

    pub async fn show_one<C: Connector, W: Write>(
        &self,
        api: &C,
        out: &mut Output<W>,
        id: &str,
    ) -> Result<()> {
        print(api, out, Request::get(self.service, self.item(id))).await
    }

    pub async fn update<C: Connector>(&self, api: &C, id: &str, file: &Path) -> Result<()> {
        let req = Request::put(self.service, self.item(id)).json(read_body(file)?);
        send(api, req).await
    }

    pub async fn delete<C: Connector, W: Write>(
        &self,
        api: &C,
        out: &mut Output<W>,
        ids: &str,
    ) -> Result<()> {
        for_each_id(api, out, ids, |id| Request::delete(self.service, self.item(id))).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for command tests.

    use std::io::Write as _;
    use std::path::PathBuf;

    use clap::Parser;

    use crate::Cli;
    use crate::api::stub::StubConnector;
    use crate::output::Output;

    pub fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["privx-cli"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(e) => panic!("failed to parse {args:?}: {e}"),
        }
    }

    pub fn parse_err(args: &[&str]) -> clap::Error {
        let mut argv = vec!["privx-cli"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv) {
            Ok(cli) => panic!("expected parse failure for {args:?}, got {cli:?}"),
            Err(e) => e,
        }
    }

    /// Parse `args` and dispatch against `api`, returning the result and
    /// everything written to stdout.
    pub async fn run(api: &StubConnector, args: &[&str]) -> (anyhow::Result<()>, String) {
        let cli = parse(args);
        let mut out = Output::new(Vec::new());
        let res = crate::dispatch(cli.command, api, &mut out).await;
        (res, String::from_utf8_lossy(&out.into_inner()).into_owned())
    }

    /// Write `content` into a file inside `dir` and return its path.
    pub fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::testing::write_file;
    use super::*;
    use crate::api::stub::StubConnector;
    use crate::api::{Method, Service};
    use serde_json::json;

    #[test]
    fn split_ids_keeps_order_and_drops_blanks() {
        assert_eq!(split_ids("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_ids(" a , ,b,"), vec!["a", "b"]);
        assert!(split_ids("").is_empty());
    }

    #[test]
    fn page_and_sort_query_params() {
        let sort = SortArgs {
            sortkey: "name".into(),
            sortdir: "desc".into(),
        };
        let req = Request::get(Service::HostStore, "/hosts")
            .page(&PageArgs {
                offset: 10,
                limit: 5,
            })
            .sort(&sort);
        let q: Vec<(&str, &str)> = req
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            q,
            vec![
                ("offset", "10"),
                ("limit", "5"),
                ("sortkey", "name"),
                ("sortdir", "DESC")
            ]
        );
    }

    #[test]
    fn read_body_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = write_file(&dir, "host.json", r#"{"common_name":"web","x":{"y":[1,2]}}"#);
        assert_eq!(
            read_body(&json_path).unwrap(),
            json!({"common_name": "web", "x": {"y": [1, 2]}})
        );

        let yaml_path = write_file(&dir, "host.YAML", "common_name: web\nport: 22\n");
        assert_eq!(
            read_body(&yaml_path).unwrap(),
            json!({"common_name": "web", "port": 22})
        );

        let bad = write_file(&dir, "bad.json", "{oops");
        let err = read_body(&bad).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON file"));
        assert!(read_body(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn optional_body_defaults_to_empty_object() {
        assert_eq!(read_optional_body(None).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn for_each_id_stops_at_first_failure() {
        let api = StubConnector::new().fail(
            Method::Delete,
            "/vault/api/v1/secrets/b",
            500,
            "boom",
        );
        let mut out = Output::new(Vec::new());
        let res = for_each_id(&api, &mut out, "a,b,c", |id| {
            Request::delete(Service::Vault, format!("/secrets/{id}"))
        })
        .await;
        assert!(res.is_err());
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "a\n");
        assert_eq!(
            api.call_lines(),
            vec![
                "DELETE /vault/api/v1/secrets/a",
                "DELETE /vault/api/v1/secrets/b"
            ]
        );
    }

    #[tokio::test]
    async fn print_id_prefers_the_id_field() {
        let api = StubConnector::new().reply(
            Method::Post,
            "/host-store/api/v1/hosts",
            json!({"id": "new-host"}),
        );
        let mut out = Output::new(Vec::new());
        print_id(&api, &mut out, Request::post(Service::HostStore, "/hosts"))
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), r#""new-host""#);
    }
}
