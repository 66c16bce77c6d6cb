//! Askama contexts for the rendered artifacts.
//!
//! `.xml` templates go through Askama's default escaper, so contract paths and
//! names are emitted as well-formed XML without escaping at the call site.

use askama::Template;

use crate::error::GenerateError;

/// Render a template, attributing failures to the artifact path.
pub fn render<T: Template>(template: &T, path: &str) -> Result<String, GenerateError> {
    template.render().map_err(|source| GenerateError::Render {
        path: path.to_string(),
        source,
    })
}

/// Row of the README environment table
#[derive(Debug, Clone)]
pub struct EnvironmentRow {
    /// Stage name, e.g. `uat1`
    pub name: String,
    /// Product published for the stage
    pub product: String,
    /// Target-server name, identical in every row
    pub target_server: String,
    /// Backend host for the stage
    pub host: String,
    /// Backend port
    pub port: u16,
}

/// Operation listed in the README
#[derive(Debug, Clone)]
pub struct OperationRow {
    /// Uppercased HTTP method
    pub method: String,
    /// Contract path as written
    pub path: String,
}

/// Project README, rendered unescaped as Markdown
#[derive(Template)]
#[template(path = "README.md", escape = "none")]
pub struct ReadmeTemplate {
    /// Proxy name, also the bundle root directory
    pub proxy_name: String,
    /// One-sentence summary built from the atoms
    pub description: String,
    /// Crate version that produced the bundle
    pub generator_version: String,
    /// Path the gateway serves the proxy on
    pub base_path: String,
    /// Path prefix forwarded to the backend
    pub target_path: String,
    /// Southbound auth scheme: `none`, `basic`, `apikey` or `oauth2`
    pub auth_type: String,
    /// One row per stage, in canonical order
    pub environments: Vec<EnvironmentRow>,
    /// Contract operations, in contract order
    pub operations: Vec<OperationRow>,
}

/// Proxy descriptor listing every policy
#[derive(Template)]
#[template(path = "apiproxy/descriptor.xml")]
pub struct ProxyDescriptorTemplate {
    /// Descriptor `name` attribute
    pub proxy_name: String,
    /// `<businessObject>-<version>`
    pub display_name: String,
    /// Stage-independent summary
    pub description: String,
    /// Path the gateway serves the proxy on
    pub base_path: String,
    /// Policy names in bundle order
    pub policies: Vec<String>,
}

/// One conditional flow of the proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDef {
    /// `<method>-<path slug>`, suffixed `-2`, `-3`, ... when slugs collide
    pub name: String,
    /// Path with templated segments replaced by `*`
    pub pattern: String,
    /// Uppercased HTTP method
    pub method: String,
}

/// Northbound endpoint: key verification, secret lookups, one flow per operation
#[derive(Template)]
#[template(path = "apiproxy/proxy_endpoint.xml")]
pub struct ProxyEndpointTemplate {
    /// Path the gateway serves the proxy on
    pub base_path: String,
    /// PreFlow request policies, executed in order
    pub request_steps: Vec<String>,
    /// One flow per distinct path and method
    pub flows: Vec<FlowDef>,
    /// Raised when no flow matches
    pub not_found_policy: String,
}

/// Southbound endpoint bound to the stage-independent target-server name
#[derive(Template)]
#[template(path = "apiproxy/target_endpoint.xml")]
pub struct TargetEndpointTemplate {
    /// Target-server name, resolved per stage by the gateway
    pub target_server: String,
    /// Path prefix appended to the target server
    pub target_path: String,
    /// Southbound auth and path rewrite policies
    pub request_steps: Vec<String>,
}

/// Checks the caller's API key
#[derive(Template)]
#[template(path = "apiproxy/policies/verify_api_key.xml")]
pub struct VerifyApiKeyTemplate {
    /// Policy name
    pub name: String,
}

/// Secret-map lookup for one backend application
#[derive(Template)]
#[template(path = "apiproxy/policies/kvm_lookup.xml")]
pub struct KvmLookupTemplate {
    /// `KVM-Get-<backendApp>`
    pub name: String,
    /// Secret-map name, `backendApp.version.backend`
    pub map: String,
    /// Entries read into `private.<map>.<key>` variables
    pub keys: Vec<String>,
}

/// Basic authentication from the primary secret map's `username` and `password`
#[derive(Template)]
#[template(path = "apiproxy/policies/basic_auth.xml")]
pub struct BasicAuthTemplate {
    /// Policy name
    pub name: String,
    /// Primary secret-map name
    pub map: String,
}

/// `x-api-key` header from the primary secret map's `api_key`
#[derive(Template)]
#[template(path = "apiproxy/policies/api_key_auth.xml")]
pub struct ApiKeyAuthTemplate {
    /// Policy name
    pub name: String,
    /// Primary secret-map name
    pub map: String,
}

/// Bearer token from the primary secret map's `access_token`
#[derive(Template)]
#[template(path = "apiproxy/policies/oauth2_auth.xml")]
pub struct OAuth2AuthTemplate {
    /// Policy name
    pub name: String,
    /// Primary secret-map name
    pub map: String,
}

/// Re-targets requests when the contract base path is templated
#[derive(Template)]
#[template(path = "apiproxy/policies/rewrite_path.xml")]
pub struct RewritePathTemplate {
    /// Policy name
    pub name: String,
    /// Templated contract base path, kept verbatim
    pub target_path: String,
}

/// 404 fault raised when no flow matches
#[derive(Template)]
#[template(path = "apiproxy/policies/not_found.xml")]
pub struct NotFoundTemplate {
    /// Policy name
    pub name: String,
}
