/*!
Command groups, one module per PrivX resource family.

Layout:
  src/cmd/
    mod.rs            (this file: declarations + re-exports for main.rs)
    shared.rs         (paging/sort flags, body files, per-ID loops, Collection)
    kind.rs           (ClientType / TagType route tables)
    hosts.rs          (hosts, deploy)
    roles.rs          (roles, identity-providers)
    users.rs          (directory users, role grants)
    local_users.rs    (local-users, api-clients)
    trusted_clients.rs
    preconfig.rs      (pre-configurations download)
    cas.rs            (extender / web-proxy CA certificates)
    authorizer.rs     (authorizer CAs, certificates, deployment scripts)
    access_groups.rs
    principals.rs     (principals, principal-keys)
    authorized_keys.rs
    sources.rs        (sources, aws-roles, collectors)
    secrets.rs        (secrets, user-secrets)
    connections.rs    (connections, ueba)
    workflows.rs      (workflows, requests)
    settings.rs
    sessions.rs
    tags.rs
    trail_index.rs
    network_targets.rs
    license.rs        (license, mobile-gateway)
    idp_clients.rs
    monitor.rs        (components, instance, audit-events)
    db_proxy.rs

Conventions:
  - Each group exposes `XArgs` (derives `clap::Args`) and an
    `execute_x(args, api, out)` returning `anyhow::Result<()>`.
  - Handlers talk to PrivX only through `api::Connector`, so tests run
    them against `api::stub::StubConnector`.
  - A group invoked without a verb lists its collection where that makes
    sense.
*/

pub mod access_groups;
pub mod authorized_keys;
pub mod authorizer;
pub mod cas;
pub mod connections;
pub mod db_proxy;
pub mod hosts;
pub mod idp_clients;
pub mod kind;
pub mod license;
pub mod local_users;
pub mod monitor;
pub mod network_targets;
pub mod preconfig;
pub mod principals;
pub mod roles;
pub mod secrets;
pub mod sessions;
pub mod settings;
pub mod shared;
pub mod sources;
pub mod tags;
pub mod trail_index;
pub mod trusted_clients;
pub mod users;
pub mod workflows;

pub use access_groups::{AccessGroupsArgs, execute_access_groups};
pub use authorized_keys::{AuthorizedKeysArgs, execute_authorized_keys};
pub use authorizer::{AuthorizerArgs, execute_authorizer};
pub use cas::{CaArgs, execute_cas};
pub use connections::{ConnectionsArgs, UebaArgs, execute_connections, execute_ueba};
pub use db_proxy::{DbProxyArgs, execute_db_proxy};
pub use hosts::{HostsArgs, execute_hosts};
pub use idp_clients::{IdpClientsArgs, execute_idp_clients};
pub use kind::ClientType;
pub use license::{LicenseArgs, MobileGatewayArgs, execute_license, execute_mobile_gateway};
pub use local_users::{ApiClientsArgs, LocalUsersArgs, execute_api_clients, execute_local_users};
pub use monitor::{
    AuditEventsArgs, ComponentsArgs, InstanceArgs, execute_audit_events, execute_components,
    execute_instance,
};
pub use network_targets::{NetworkTargetsArgs, execute_network_targets};
pub use preconfig::{PreConfigArgs, execute_preconfig};
pub use principals::{
    PrincipalKeysArgs, PrincipalsArgs, execute_principal_keys, execute_principals,
};
pub use roles::{RolesArgs, execute_roles};
pub use secrets::{SecretsArgs, UserSecretsArgs, execute_secrets, execute_user_secrets};
pub use sessions::{SessionsArgs, execute_sessions};
pub use settings::{SettingsArgs, execute_settings};
pub use sources::{
    AwsRolesArgs, CollectorsArgs, SourcesArgs, execute_aws_roles, execute_collectors,
    execute_sources,
};
pub use tags::{TagsArgs, execute_tags};
pub use trail_index::{TrailIndexArgs, execute_trail_index};
pub use trusted_clients::{TrustedClientsArgs, execute_trusted_clients};
pub use users::{UsersArgs, execute_users};
pub use workflows::{RequestsArgs, WorkflowsArgs, execute_requests, execute_workflows};
