use anyhow::Context;
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::types::{ContractInput, ContractPath, ServerHint};
use crate::config::EnvironmentName;

const METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// Drop path-item keys `oas3` would reject (custom verbs, stray fields).
fn strip_unknown_verbs(val: &mut Value) {
    if let Some(Value::Object(paths_map)) = val.get_mut("paths") {
        for item in paths_map.values_mut() {
            if let Value::Object(obj) = item {
                obj.retain(|k, _| {
                    let lk = k.to_ascii_lowercase();
                    match lk.as_str() {
                        "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                        m if METHODS.contains(&m) => true,
                        _ => k.starts_with("x-"),
                    }
                });
            }
        }
    }
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contract: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);
    let value = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML contract: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON contract: {}", path.display()))?
    };
    Ok(value)
}

/// Load an OpenAPI 3 document and normalize it into a [`ContractInput`].
pub fn load_contract(path: &Path) -> anyhow::Result<ContractInput> {
    let value = read_document(path)?;
    let input = contract_from_value(value)?;
    info!(
        contract = %path.display(),
        operations = input.paths.len(),
        servers = input.servers.len(),
        "contract loaded"
    );
    Ok(input)
}

/// Normalize an already-deserialized OpenAPI document.
pub fn contract_from_value(mut value: Value) -> anyhow::Result<ContractInput> {
    strip_unknown_verbs(&mut value);
    let spec: OpenApiV3Spec =
        serde_json::from_value(value.clone()).context("Document is not an OpenAPI 3 contract")?;

    let mut paths = Vec::new();
    if let Some(paths_map) = spec.paths.as_ref() {
        for (path, item) in paths_map {
            for (method, _operation) in item.methods() {
                paths.push(ContractPath::new(
                    path.clone(),
                    method.as_str().to_ascii_uppercase(),
                ));
            }
        }
    }

    let raw_servers = value
        .get("servers")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut servers = BTreeMap::new();
    let mut base_path = None;
    let mut is_path_templated = false;
    for (i, server) in spec.servers.iter().enumerate() {
        let raw = raw_servers.get(i).cloned().unwrap_or(Value::Null);
        let resolved_url = substitute_variables(&server.url, &raw);
        let parsed = parse_server_url(&resolved_url);

        if i == 0 {
            let raw_path = raw_url_path(&server.url);
            is_path_templated = raw_path.contains('{');
            if raw_path != "/" && !raw_path.is_empty() {
                base_path = Some(raw_path);
            }
        }

        let Some(hint) = parsed else {
            debug!(url = %server.url, "server url carries no host");
            continue;
        };
        let label = raw
            .get("x-environment")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| server.description.as_deref().and_then(label_from_text))
            .or_else(|| label_from_text(&hint.host.replace('.', " ")));
        match label {
            Some(label) => {
                servers.entry(label).or_insert(hint);
            }
            None => debug!(url = %server.url, "server matches no environment label"),
        }
    }

    Ok(ContractInput {
        paths,
        servers,
        auth_hint: auth_hint(&value),
        base_path,
        is_path_templated,
    })
}

/// First word of `text` that names a known environment.
fn label_from_text(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .find(|w| EnvironmentName::from_label(w).is_some())
        .map(|w| w.to_ascii_lowercase())
}

fn substitute_variables(url: &str, raw_server: &Value) -> String {
    let mut out = url.to_string();
    if let Some(vars) = raw_server.get("variables").and_then(Value::as_object) {
        for (name, var) in vars {
            if let Some(default) = var.get("default").and_then(Value::as_str) {
                out = out.replace(&format!("{{{name}}}"), default);
            }
        }
    }
    out
}

fn parse_server_url(url_str: &str) -> Option<ServerHint> {
    let url = url::Url::parse(url_str).ok()?;
    let host = url.host_str()?.to_string();
    Some(ServerHint {
        host,
        port: url.port(),
        insecure: url.scheme() == "http",
    })
}

/// Path component of a server URL without decoding template braces.
fn raw_url_path(url_str: &str) -> String {
    let without_scheme = match url_str.find("://") {
        Some(idx) => &url_str[idx + 3..],
        None => url_str,
    };
    let path = if url_str.contains("://") {
        without_scheme
            .find('/')
            .map(|idx| &without_scheme[idx..])
            .unwrap_or("/")
    } else {
        without_scheme
    };
    let path = path.split(['?', '#']).next().unwrap_or("/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `x-southbound-auth` wins; otherwise the first declared security scheme.
fn auth_hint(value: &Value) -> Option<String> {
    if let Some(explicit) = value.get("x-southbound-auth").and_then(Value::as_str) {
        return Some(explicit.to_string());
    }
    let schemes = value
        .get("components")
        .and_then(|c| c.get("securitySchemes"))
        .and_then(Value::as_object)?;
    schemes.values().find_map(|scheme| {
        let ty = scheme.get("type").and_then(Value::as_str)?;
        match ty {
            "apiKey" => Some("apikey".to_string()),
            "http" => {
                let http_scheme = scheme.get("scheme").and_then(Value::as_str).unwrap_or("");
                if http_scheme.eq_ignore_ascii_case("basic") {
                    Some("basic".to_string())
                } else {
                    Some("oauth2".to_string())
                }
            }
            "oauth2" | "openIdConnect" => Some("oauth2".to_string()),
            _ => None,
        }
    })
}
