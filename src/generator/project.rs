use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use super::bundle::ArtifactBundle;
use super::templates::{
    render, ApiKeyAuthTemplate, BasicAuthTemplate, EnvironmentRow, FlowDef,
    KvmLookupTemplate, NotFoundTemplate, OAuth2AuthTemplate, OperationRow,
    ProxyDescriptorTemplate, ProxyEndpointTemplate, ReadmeTemplate, RewritePathTemplate,
    TargetEndpointTemplate, VerifyApiKeyTemplate,
};
use crate::config::{
    AccessLevel, ApprovalType, ConfigurationAtoms, EnvironmentConfig, EnvironmentName,
    SecretMapEntry,
};
use crate::contract::{analyze_contract, AuthType, ContractAnalysis, ContractInput};
use crate::environment::{EnvironmentSet, ProxyConfiguration};
use crate::error::{FieldError, GenerateError, InputError};
use crate::grouping::{authorized_paths_for, find_smallest_common_root};
use crate::naming;
use crate::reconcile::{validate_entries, EntryLimits};

/// Project manifest written at the bundle root.
pub const MANIFEST_FILE: &str = "proxygen.json";

const VERIFY_API_KEY_POLICY: &str = "VA-VerifyApiKey";
const REWRITE_PATH_POLICY: &str = "AM-RewriteTargetPath";
const NOT_FOUND_POLICY: &str = "RF-NotFound";

/// Every missing atom and every stage without a configuration or host.
fn check_inputs(
    atoms: &ConfigurationAtoms,
    environments: &EnvironmentSet,
) -> Result<(), InputError> {
    let mut missing = atoms.missing_fields();
    for env in EnvironmentName::ALL {
        match environments.get(env) {
            None => missing.push(FieldError::missing(format!("environments.{env}"))),
            Some(cfg) if cfg.target_server.host.trim().is_empty() => missing.push(
                FieldError::missing(format!("environments.{env}.targetServer.host")),
            ),
            Some(_) => {}
        }
    }
    InputError::check(missing)
}

fn auth_policy_name(auth: AuthType) -> Option<&'static str> {
    match auth {
        AuthType::None => None,
        AuthType::Basic => Some("BA-SouthboundAuth"),
        AuthType::ApiKey => Some("AM-SouthboundApiKey"),
        AuthType::OAuth2 => Some("AM-SouthboundOAuth2"),
    }
}

/// Secret-map keys the southbound auth policy reads.
fn auth_keys(auth: AuthType) -> &'static [&'static str] {
    match auth {
        AuthType::None => &[],
        AuthType::Basic => &["username", "password"],
        AuthType::ApiKey => &["api_key"],
        AuthType::OAuth2 => &["access_token"],
    }
}

fn kvm_policy_name(backend_app: &str) -> String {
    format!("KVM-Get-{}", backend_app.trim())
}

/// `/invoices/{id}` → `/invoices/*`
fn flow_pattern(path: &str) -> String {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| if s.contains('{') { "*" } else { s })
        .collect();
    format!("/{}", parts.join("/"))
}

fn flow_slug(path: &str) -> String {
    let parts: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        "root".to_string()
    } else {
        parts.join("-")
    }
}

/// One flow per distinct path/method pair, in contract order.
fn build_flows(contract: &ContractInput) -> Vec<FlowDef> {
    let mut seen_ops = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut flows = Vec::new();
    for op in &contract.paths {
        let method = op.method.to_ascii_uppercase();
        if !seen_ops.insert((op.path.clone(), method.clone())) {
            continue;
        }
        let base = format!("{}-{}", method.to_ascii_lowercase(), flow_slug(&op.path));
        let mut name = base.clone();
        let mut n = 2;
        while !seen_names.insert(name.clone()) {
            name = format!("{base}-{n}");
            n += 1;
        }
        flows.push(FlowDef {
            name,
            pattern: flow_pattern(&op.path),
            method,
        });
    }
    flows
}

fn proxy_base_path(atoms: &ConfigurationAtoms, contract: &ContractInput, analysis: &ContractAnalysis) -> String {
    match &contract.base_path {
        // a templated base path cannot be served as-is
        Some(_) if !analysis.has_variable_path => analysis.target_path.clone(),
        _ => format!(
            "/{}/{}",
            atoms.business_object.trim(),
            atoms.version.trim()
        ),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, path: &str) -> Result<String, GenerateError> {
    let mut out = serde_json::to_string_pretty(value).map_err(|source| GenerateError::Serialize {
        path: path.to_string(),
        source,
    })?;
    out.push('\n');
    Ok(out)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    generator: &'static str,
    generator_version: &'static str,
    proxy_name: &'a str,
    atoms: &'a ConfigurationAtoms,
    base_path: &'a str,
    target_path: &'a str,
    auth_type: AuthType,
    environments: Vec<EnvironmentName>,
    policies: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SslInfoDoc {
    enabled: bool,
    client_auth_enabled: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetServerDoc<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    is_enabled: bool,
    #[serde(rename = "sSLInfo")]
    ssl_info: SslInfoDoc,
}

#[derive(Serialize)]
struct KvmDoc<'a> {
    name: &'a str,
    encrypted: bool,
    entry: &'a [SecretMapEntry],
}

#[derive(Serialize)]
struct AttributeDoc {
    name: &'static str,
    value: AccessLevel,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiProductDoc<'a> {
    name: &'a str,
    display_name: &'a str,
    description: &'a str,
    approval_type: ApprovalType,
    attributes: Vec<AttributeDoc>,
    environments: Vec<&'static str>,
    proxies: Vec<&'a str>,
    api_resources: Vec<String>,
}

fn environment_documents(
    env: EnvironmentName,
    cfg: &EnvironmentConfig,
    proxy: &str,
    default_paths: &[String],
) -> Result<[(String, String); 3], GenerateError> {
    let servers: Vec<TargetServerDoc<'_>> = cfg
        .target_servers()
        .map(|s| TargetServerDoc {
            name: &s.name,
            host: &s.host,
            port: s.port,
            is_enabled: true,
            ssl_info: SslInfoDoc {
                enabled: s.tls_enabled,
                client_auth_enabled: s.client_auth_enabled,
            },
        })
        .collect();
    let kvms: Vec<KvmDoc<'_>> = cfg
        .secret_maps
        .iter()
        .map(|m| KvmDoc {
            name: &m.name,
            encrypted: m.encrypted,
            entry: &m.entries,
        })
        .collect();
    let products: Vec<ApiProductDoc<'_>> = cfg
        .products()
        .map(|p| ApiProductDoc {
            name: &p.name,
            display_name: &p.display_name,
            description: &p.description,
            approval_type: p.approval_type,
            attributes: vec![AttributeDoc {
                name: "access",
                value: p.access_level,
            }],
            environments: vec![env.as_str()],
            proxies: vec![proxy],
            api_resources: if p.authorized_paths.is_empty() {
                default_paths.to_vec()
            } else {
                p.authorized_paths.clone()
            },
        })
        .collect();

    let dir = format!("config/{env}");
    let servers_path = format!("{dir}/targetServers.json");
    let kvms_path = format!("{dir}/kvms.json");
    let products_path = format!("{dir}/apiProducts.json");
    Ok([
        (servers_path.clone(), to_json(&servers, &servers_path)?),
        (kvms_path.clone(), to_json(&kvms, &kvms_path)?),
        (products_path.clone(), to_json(&products, &products_path)?),
    ])
}

/// Every stage's secret maps must pass the same rules a secret-store sync enforces.
fn check_secret_maps(environments: &EnvironmentSet, limits: &EntryLimits) -> Result<(), GenerateError> {
    for (env, cfg) in environments.iter() {
        for map in &cfg.secret_maps {
            validate_entries(&map.entries, limits).map_err(|source| GenerateError::Validation {
                env,
                map: map.name.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Build the artifact bundle for one proxy.
///
/// Pure: identical inputs produce a byte-identical bundle. Refuses to produce
/// anything while an atom or a stage host is missing, or while a secret map
/// breaks the default [`EntryLimits`].
pub fn generate(
    atoms: &ConfigurationAtoms,
    environments: &EnvironmentSet,
    contract: &ContractInput,
) -> Result<ArtifactBundle, GenerateError> {
    generate_with_limits(atoms, environments, contract, &EntryLimits::default())
}

/// [`generate`] with explicit secret-map limits.
pub fn generate_with_limits(
    atoms: &ConfigurationAtoms,
    environments: &EnvironmentSet,
    contract: &ContractInput,
    limits: &EntryLimits,
) -> Result<ArtifactBundle, GenerateError> {
    check_inputs(atoms, environments)?;
    check_secret_maps(environments, limits)?;
    let proxy = naming::proxy_name(atoms)?;
    let analysis = analyze_contract(contract);
    let base_path = proxy_base_path(atoms, contract, &analysis);
    let map_names = naming::secret_map_names(atoms);
    let primary_map = map_names.first().cloned().unwrap_or_default();
    let source = environments.source();

    // policies, in descriptor order
    let mut policies: Vec<(String, String)> = Vec::new();
    policies.push((
        VERIFY_API_KEY_POLICY.to_string(),
        render(
            &VerifyApiKeyTemplate {
                name: VERIFY_API_KEY_POLICY.to_string(),
            },
            VERIFY_API_KEY_POLICY,
        )?,
    ));

    let mut kvm_steps = Vec::new();
    for (slot, (app, map)) in atoms.backend_apps.iter().zip(&map_names).enumerate() {
        let name = kvm_policy_name(app);
        let mut keys: Vec<String> = Vec::new();
        if slot == 0 {
            keys.extend(auth_keys(analysis.auth_type).iter().map(|k| k.to_string()));
        }
        if let Some(existing) = source.and_then(|cfg| cfg.secret_map(map)) {
            for entry in &existing.entries {
                if !keys.contains(&entry.name) {
                    keys.push(entry.name.clone());
                }
            }
        }
        let content = render(
            &KvmLookupTemplate {
                name: name.clone(),
                map: map.clone(),
                keys,
            },
            &name,
        )?;
        kvm_steps.push(name.clone());
        policies.push((name, content));
    }

    let mut target_steps = Vec::new();
    if let Some(name) = auth_policy_name(analysis.auth_type) {
        let map = primary_map.clone();
        let content = match analysis.auth_type {
            AuthType::Basic => render(&BasicAuthTemplate { name: name.into(), map }, name)?,
            AuthType::ApiKey => render(&ApiKeyAuthTemplate { name: name.into(), map }, name)?,
            AuthType::OAuth2 => render(&OAuth2AuthTemplate { name: name.into(), map }, name)?,
            AuthType::None => String::new(),
        };
        target_steps.push(name.to_string());
        policies.push((name.to_string(), content));
    }
    if analysis.has_variable_path {
        let content = render(
            &RewritePathTemplate {
                name: REWRITE_PATH_POLICY.to_string(),
                target_path: analysis.target_path.clone(),
            },
            REWRITE_PATH_POLICY,
        )?;
        target_steps.push(REWRITE_PATH_POLICY.to_string());
        policies.push((REWRITE_PATH_POLICY.to_string(), content));
    }
    policies.push((
        NOT_FOUND_POLICY.to_string(),
        render(
            &NotFoundTemplate {
                name: NOT_FOUND_POLICY.to_string(),
            },
            NOT_FOUND_POLICY,
        )?,
    ));
    let policy_names: Vec<String> = policies.iter().map(|(n, _)| n.clone()).collect();

    let mut bundle = ArtifactBundle::new(proxy.clone());

    // project scaffolding
    let readme = ReadmeTemplate {
        proxy_name: proxy.clone(),
        description: format!(
            "{} {} API of the {} {} domain, served by {}.",
            atoms.business_object.trim(),
            atoms.version.trim(),
            atoms.entity.trim(),
            atoms.domain.trim(),
            atoms.backend_apps.join(", ")
        ),
        generator_version: env!("CARGO_PKG_VERSION").to_string(),
        base_path: base_path.clone(),
        target_path: analysis.target_path.clone(),
        auth_type: analysis.auth_type.to_string(),
        environments: environments
            .iter()
            .map(|(env, cfg)| EnvironmentRow {
                name: env.to_string(),
                product: cfg.product.name.clone(),
                target_server: cfg.target_server.name.clone(),
                host: cfg.target_server.host.clone(),
                port: cfg.target_server.port,
            })
            .collect(),
        operations: contract
            .paths
            .iter()
            .map(|p| OperationRow {
                method: p.method.to_ascii_uppercase(),
                path: p.path.clone(),
            })
            .collect(),
    };
    bundle.insert("README.md", render(&readme, "README.md")?)?;

    let manifest = Manifest {
        generator: env!("CARGO_PKG_NAME"),
        generator_version: env!("CARGO_PKG_VERSION"),
        proxy_name: &proxy,
        atoms,
        base_path: &base_path,
        target_path: &analysis.target_path,
        auth_type: analysis.auth_type,
        environments: environments.iter().map(|(env, _)| env).collect(),
        policies: &policy_names,
    };
    bundle.insert(MANIFEST_FILE, to_json(&manifest, MANIFEST_FILE)?)?;

    // proxy definition
    let descriptor_path = format!("apiproxy/{proxy}.xml");
    let descriptor = ProxyDescriptorTemplate {
        proxy_name: proxy.clone(),
        display_name: format!(
            "{}-{}",
            atoms.business_object.trim(),
            atoms.version.trim()
        ),
        description: format!(
            "{} {} API of the {} {} domain",
            atoms.business_object.trim(),
            atoms.version.trim(),
            atoms.entity.trim(),
            atoms.domain.trim()
        ),
        base_path: base_path.clone(),
        policies: policy_names.clone(),
    };
    bundle.insert(descriptor_path.clone(), render(&descriptor, &descriptor_path)?)?;

    let mut request_steps = vec![VERIFY_API_KEY_POLICY.to_string()];
    request_steps.extend(kvm_steps);
    let proxy_endpoint_path = "apiproxy/proxies/default.xml";
    let proxy_endpoint = ProxyEndpointTemplate {
        base_path: base_path.clone(),
        request_steps,
        flows: build_flows(contract),
        not_found_policy: NOT_FOUND_POLICY.to_string(),
    };
    bundle.insert(
        proxy_endpoint_path,
        render(&proxy_endpoint, proxy_endpoint_path)?,
    )?;

    let target_endpoint_path = "apiproxy/targets/default.xml";
    let target_endpoint = TargetEndpointTemplate {
        target_server: naming::target_server_name(atoms),
        target_path: analysis.target_path.clone(),
        request_steps: target_steps,
    };
    bundle.insert(
        target_endpoint_path,
        render(&target_endpoint, target_endpoint_path)?,
    )?;

    for (name, content) in policies {
        bundle.insert(format!("apiproxy/policies/{name}.xml"), content)?;
    }

    let contract_path = "apiproxy/resources/oas/contract.json";
    bundle.insert(contract_path, to_json(contract, contract_path)?)?;

    // per-stage configuration
    let default_paths = authorized_paths_for(&find_smallest_common_root(&contract.unique_paths()));
    for (env, cfg) in environments.iter() {
        for (path, content) in environment_documents(env, cfg, &proxy, &default_paths)? {
            bundle.insert(path, content)?;
        }
        debug!(env = %env, "environment artifacts generated");
    }

    info!(
        proxy = %proxy,
        files = bundle.len(),
        fingerprint = %bundle.fingerprint(),
        "bundle generated"
    );
    Ok(bundle)
}

/// [`generate`] for an owned configuration object.
pub fn generate_configuration(
    config: &ProxyConfiguration,
    contract: &ContractInput,
) -> Result<ArtifactBundle, GenerateError> {
    generate(&config.atoms, &config.environments, contract)
}
