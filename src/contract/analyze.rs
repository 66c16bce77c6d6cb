use std::collections::BTreeMap;
use tracing::debug;

use super::types::{AuthType, ContractAnalysis, ContractInput, HostHint};
use crate::config::EnvironmentName;

const TLS_PORT: u16 = 443;
const PLAIN_PORT: u16 = 80;

/// Reshape parsed contract data into the hints the synthesizer consumes.
///
/// Server labels that resolve to no known stage are skipped. When two labels
/// resolve to the same stage the first one (in label order) wins.
pub fn analyze_contract(contract: &ContractInput) -> ContractAnalysis {
    let mut environment_hosts = BTreeMap::new();
    for (label, server) in &contract.servers {
        let Some(env) = EnvironmentName::from_label(label) else {
            debug!(label = %label, "server label matches no environment");
            continue;
        };
        if server.host.trim().is_empty() || environment_hosts.contains_key(&env) {
            continue;
        }
        let tls = !server.insecure;
        let port = server
            .port
            .unwrap_or(if tls { TLS_PORT } else { PLAIN_PORT });
        environment_hosts.insert(
            env,
            HostHint {
                host: server.host.trim().to_string(),
                port,
                tls,
            },
        );
    }

    let target_path = contract
        .base_path
        .as_deref()
        .map(normalize_base_path)
        .unwrap_or_else(|| "/".to_string());
    let has_variable_path = contract.is_path_templated || target_path.contains('{');

    ContractAnalysis {
        environment_hosts,
        auth_type: contract
            .auth_hint
            .as_deref()
            .map(AuthType::from_hint)
            .unwrap_or_default(),
        target_path,
        has_variable_path,
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ServerHint;

    fn hint(host: &str, port: Option<u16>) -> ServerHint {
        ServerHint {
            host: host.to_string(),
            port,
            insecure: false,
        }
    }

    #[test]
    fn test_hosts_by_label() {
        let mut contract = ContractInput::default();
        contract
            .servers
            .insert("development".into(), hint("dev.api.local", None));
        contract
            .servers
            .insert("production".into(), hint("api.example.com", Some(8443)));
        contract
            .servers
            .insert("sandbox".into(), hint("sandbox.example.com", None));

        let analysis = analyze_contract(&contract);
        assert_eq!(analysis.environment_hosts.len(), 2);
        let dev = &analysis.environment_hosts[&EnvironmentName::Dev1];
        assert_eq!(dev.host, "dev.api.local");
        assert_eq!(dev.port, 443);
        assert_eq!(
            analysis.environment_hosts[&EnvironmentName::Prod1].port,
            8443
        );
    }

    #[test]
    fn test_insecure_server_defaults_to_port_80() {
        let mut contract = ContractInput::default();
        contract.servers.insert(
            "uat".into(),
            ServerHint {
                host: "uat.internal".into(),
                port: None,
                insecure: true,
            },
        );
        let analysis = analyze_contract(&contract);
        let uat = &analysis.environment_hosts[&EnvironmentName::Uat1];
        assert_eq!(uat.port, 80);
        assert!(!uat.tls);
    }

    #[test]
    fn test_target_path_and_variables() {
        let contract = ContractInput {
            base_path: Some("api/{tenant}/v1/".into()),
            auth_hint: Some("Basic".into()),
            ..ContractInput::default()
        };
        let analysis = analyze_contract(&contract);
        assert_eq!(analysis.target_path, "/api/{tenant}/v1");
        assert!(analysis.has_variable_path);
        assert_eq!(analysis.auth_type, AuthType::Basic);

        let plain = analyze_contract(&ContractInput::default());
        assert_eq!(plain.target_path, "/");
        assert!(!plain.has_variable_path);
        assert_eq!(plain.auth_type, AuthType::None);
    }
}
