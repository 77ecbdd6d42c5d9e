/*!
Closed value sets for `--type` flags.

  ClientType - trusted client kinds: extender, webproxy, carrier
  TagType    - tag owners: user, host

Each enum carries a static lookup table mapping the CLI spelling to the
endpoint data that differs between the otherwise identical code paths, so
handlers pick a row instead of branching on strings.

Helpers:
  - variants()
  - from_str_ci()
  - parse()  (error names the rejected value and the allowed set)
*/

use std::fmt;

use anyhow::{Result, anyhow};

use crate::api::Service;

/// `["a", "b", "c"]` -> `"a, b or c"`.
fn options<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.into_iter().collect();
    match names.split_last() {
        Some((last, [])) => last.to_string(),
        Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
        None => String::new(),
    }
}

/* ---- Trusted client types ---- */

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ClientType {
    Extender,
    Webproxy,
    Carrier,
}

/// Endpoint data per client type.
pub struct ClientRoute {
    pub kind: ClientType,
    /// CLI spelling
    pub name: &'static str,
    /// `type` field of the trusted client object
    pub trusted_client_type: &'static str,
    /// authorizer path segment (`/{segment}/conf`, `/{segment}/cas`)
    pub segment: &'static str,
    /// whether the authorizer serves CA certificates for this type
    pub has_ca: bool,
}

static CLIENT_ROUTES: [ClientRoute; 3] = [
    ClientRoute {
        kind: ClientType::Extender,
        name: "extender",
        trusted_client_type: "EXTENDER",
        segment: "extender",
        has_ca: true,
    },
    ClientRoute {
        kind: ClientType::Webproxy,
        name: "webproxy",
        trusted_client_type: "ICAP",
        segment: "icap",
        has_ca: true,
    },
    ClientRoute {
        kind: ClientType::Carrier,
        name: "carrier",
        trusted_client_type: "CARRIER",
        segment: "carrier",
        has_ca: false,
    },
];

impl ClientType {
    pub const fn variants() -> &'static [ClientType] {
        &[ClientType::Extender, ClientType::Webproxy, ClientType::Carrier]
    }

    fn names(ca_only: bool) -> String {
        options(
            Self::variants()
                .iter()
                .map(|k| k.route())
                .filter(|r| r.has_ca || !ca_only)
                .map(|r| r.name),
        )
    }

    pub fn from_str_ci(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        CLIENT_ROUTES
            .iter()
            .find(|r| r.name == norm)
            .map(|r| r.kind)
    }

    /// Parse a `--type` value for config downloads.
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str_ci(s).ok_or_else(|| {
            anyhow!(
                "ca type does not exist: {s}. You have the following ca type options: {}",
                Self::names(false)
            )
        })
    }

    /// Parse a `--type` value used to filter trusted clients.
    pub fn parse_client(s: &str) -> Result<Self> {
        Self::from_str_ci(s).ok_or_else(|| {
            anyhow!(
                "client type does not exist: {s}. You have the following client type options: {}",
                Self::names(false)
            )
        })
    }

    /// Parse a `--type` value for CA certificate commands (no carrier).
    pub fn parse_with_ca(s: &str) -> Result<Self> {
        match Self::from_str_ci(s) {
            Some(kind) if kind.route().has_ca => Ok(kind),
            _ => Err(anyhow!(
                "client type does not exist: {s}. You have the following client type options: {}",
                Self::names(true)
            )),
        }
    }

    pub fn route(&self) -> &'static ClientRoute {
        match self {
            ClientType::Extender => &CLIENT_ROUTES[0],
            ClientType::Webproxy => &CLIENT_ROUTES[1],
            ClientType::Carrier => &CLIENT_ROUTES[2],
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route().name)
    }
}

/* ---- Tag types ---- */

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TagType {
    User,
    Host,
}

pub struct TagRoute {
    pub kind: TagType,
    pub name: &'static str,
    pub service: Service,
    pub path: &'static str,
}

static TAG_ROUTES: [TagRoute; 2] = [
    TagRoute {
        kind: TagType::User,
        name: "user",
        service: Service::LocalUserStore,
        path: "/users/tags",
    },
    TagRoute {
        kind: TagType::Host,
        name: "host",
        service: Service::HostStore,
        path: "/hosts/tags",
    },
];

impl TagType {
    pub const fn variants() -> &'static [TagType] {
        &[TagType::User, TagType::Host]
    }

    pub fn from_str_ci(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        TAG_ROUTES.iter().find(|r| r.name == norm).map(|r| r.kind)
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str_ci(s).ok_or_else(|| {
            anyhow!(
                "tag type does not exist: {s}. You have the following tag type options: {}",
                options(Self::variants().iter().map(|k| k.route().name))
            )
        })
    }

    pub fn route(&self) -> &'static TagRoute {
        match self {
            TagType::User => &TAG_ROUTES[0],
            TagType::Host => &TAG_ROUTES[1],
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route().name)
    }
}

/* --------------------------------- Tests ---------------------------------- */
