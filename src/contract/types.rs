use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::EnvironmentName;

/// One operation exposed by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPath {
    pub path: String,
    pub method: String,
}

impl ContractPath {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        ContractPath {
            path: path.into(),
            method: method.into(),
        }
    }
}

/// A server URL hint for one environment label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHint {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// URL scheme was plain `http`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
}

/// Already-parsed contract data. Producing it is the parser's job; nothing
/// here re-validates the document it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInput {
    #[serde(default)]
    pub paths: Vec<ContractPath>,
    /// Keyed by free-form environment label (`dev`, `production`, ...)
    #[serde(default)]
    pub servers: BTreeMap<String, ServerHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(default)]
    pub is_path_templated: bool,
}

impl ContractInput {
    /// Every distinct path, in first-appearance order.
    pub fn unique_paths(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for p in &self.paths {
            if !out.contains(&p.path) {
                out.push(p.path.clone());
            }
        }
        out
    }
}

/// Authentication the proxy applies towards the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    None,
    Basic,
    ApiKey,
    OAuth2,
}

impl AuthType {
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "basic" | "basic-auth" | "basic_auth" => AuthType::Basic,
            "apikey" | "api-key" | "api_key" => AuthType::ApiKey,
            "oauth2" | "oauth" | "client_credentials" | "client-credentials" | "bearer" => {
                AuthType::OAuth2
            }
            _ => AuthType::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::Basic => "basic",
            AuthType::ApiKey => "apikey",
            AuthType::OAuth2 => "oauth2",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved host for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

/// Auto-detected hints derived from a [`ContractInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub environment_hosts: BTreeMap<EnvironmentName, HostHint>,
    pub auth_type: AuthType,
    pub target_path: String,
    pub has_variable_path: bool,
}
