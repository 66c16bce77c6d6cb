#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::{ConfigurationAtoms, EnvironmentName, SecretMapEntry};
use crate::contract::{ContractInput, ContractPath};
use crate::environment::EnvironmentSet;
use crate::error::GenerateError;
use crate::reconcile::EntryLimits;
use std::fs;

fn atoms() -> ConfigurationAtoms {
    ConfigurationAtoms::new("elis", "billing", &["sap"], "invoice", "v1")
}

fn environments() -> EnvironmentSet {
    let mut set = EnvironmentSet::synthesize(&atoms()).unwrap();
    for env in EnvironmentName::ALL {
        set.set_host(env, format!("sap.{env}.internal"));
    }
    set
}

fn contract() -> ContractInput {
    ContractInput {
        paths: vec![
            ContractPath::new("/invoices", "GET"),
            ContractPath::new("/invoices", "POST"),
            ContractPath::new("/invoices/{id}", "GET"),
            ContractPath::new("/health", "get"),
        ],
        auth_hint: Some("basic".into()),
        ..ContractInput::default()
    }
}

#[test]
fn test_generate_is_deterministic() {
    let a = generate(&atoms(), &environments(), &contract()).unwrap();
    let b = generate(&atoms(), &environments(), &contract()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_layout_and_order() {
    let bundle = generate(&atoms(), &environments(), &contract()).unwrap();
    assert_eq!(bundle.root_directory_name, "elis.billing.sap.invoice.v1");
    let paths: Vec<&str> = bundle.paths().collect();
    assert_eq!(paths[0], "README.md");
    assert_eq!(paths[1], MANIFEST_FILE);
    assert_eq!(paths[2], "apiproxy/elis.billing.sap.invoice.v1.xml");
    assert_eq!(paths[3], "apiproxy/proxies/default.xml");
    assert_eq!(paths[4], "apiproxy/targets/default.xml");
    assert!(paths.contains(&"apiproxy/policies/VA-VerifyApiKey.xml"));
    assert!(paths.contains(&"apiproxy/policies/KVM-Get-sap.xml"));
    assert!(paths.contains(&"apiproxy/policies/BA-SouthboundAuth.xml"));
    assert!(paths.contains(&"apiproxy/policies/RF-NotFound.xml"));
    assert!(!paths.contains(&"apiproxy/policies/AM-RewriteTargetPath.xml"));
    let tail: Vec<&str> = paths[paths.len() - 12..].to_vec();
    assert_eq!(
        tail,
        vec![
            "config/dev1/targetServers.json",
            "config/dev1/kvms.json",
            "config/dev1/apiProducts.json",
            "config/uat1/targetServers.json",
            "config/uat1/kvms.json",
            "config/uat1/apiProducts.json",
            "config/staging/targetServers.json",
            "config/staging/kvms.json",
            "config/staging/apiProducts.json",
            "config/prod1/targetServers.json",
            "config/prod1/kvms.json",
            "config/prod1/apiProducts.json",
        ]
    );
    assert_eq!(paths[paths.len() - 13], "apiproxy/resources/oas/contract.json");
}

#[test]
fn test_proxy_endpoint_flows() {
    let bundle = generate(&atoms(), &environments(), &contract()).unwrap();
    let xml = bundle.get("apiproxy/proxies/default.xml").unwrap();
    assert!(xml.contains(r#"<Flow name="get-invoices">"#));
    assert!(xml.contains(r#"<Flow name="post-invoices">"#));
    assert!(xml.contains(r#"MatchesPath "/invoices/*") and (request.verb = "GET")"#));
    assert!(xml.contains(r#"<Flow name="get-health">"#));
    assert!(xml.contains("<BasePath>/invoice/v1</BasePath>"));
    assert!(xml.contains("<Name>KVM-Get-sap</Name>"));
}

#[test]
fn test_target_endpoint_uses_target_server_name() {
    let bundle = generate(&atoms(), &environments(), &contract()).unwrap();
    let xml = bundle.get("apiproxy/targets/default.xml").unwrap();
    assert!(xml.contains(r#"<Server name="elis.sap.v1.backend"/>"#));
    assert!(xml.contains("<Name>BA-SouthboundAuth</Name>"));
    assert!(xml.contains("<Path>/</Path>"));
}

#[test]
fn test_templated_base_path_adds_rewrite_policy() {
    let mut c = contract();
    c.base_path = Some("/{tenant}/v1".into());
    c.is_path_templated = true;
    let bundle = generate(&atoms(), &environments(), &c).unwrap();
    let rewrite = bundle
        .get("apiproxy/policies/AM-RewriteTargetPath.xml")
        .unwrap();
    assert!(rewrite.contains("<Template>/{tenant}/v1{proxy.pathsuffix}</Template>"));
    let proxy = bundle.get("apiproxy/proxies/default.xml").unwrap();
    assert!(proxy.contains("<BasePath>/invoice/v1</BasePath>"));
}

#[test]
fn test_plain_base_path_is_used_for_proxy() {
    let mut c = contract();
    c.base_path = Some("/billing/v1/".into());
    let bundle = generate(&atoms(), &environments(), &c).unwrap();
    let proxy = bundle.get("apiproxy/proxies/default.xml").unwrap();
    assert!(proxy.contains("<BasePath>/billing/v1</BasePath>"));
}

#[test]
fn test_kvm_lookup_lists_auth_and_entry_keys() {
    let mut envs = environments();
    envs.get_mut(EnvironmentName::Dev1).unwrap().secret_maps[0]
        .entries
        .push(SecretMapEntry::new("tenant_id", "t-1"));
    let bundle = generate(&atoms(), &envs, &contract()).unwrap();
    let kvm = bundle.get("apiproxy/policies/KVM-Get-sap.xml").unwrap();
    assert!(kvm.contains(r#"mapIdentifier="sap.v1.backend""#));
    assert!(kvm.contains(r#"<Get assignTo="private.sap.v1.backend.username">"#));
    assert!(kvm.contains(r#"<Get assignTo="private.sap.v1.backend.password">"#));
    assert!(kvm.contains(r#"<Get assignTo="private.sap.v1.backend.tenant_id">"#));
}

#[test]
fn test_environment_documents() {
    let bundle = generate(&atoms(), &environments(), &contract()).unwrap();

    let servers: serde_json::Value =
        serde_json::from_str(bundle.get("config/staging/targetServers.json").unwrap()).unwrap();
    assert_eq!(servers[0]["name"], "elis.sap.v1.backend");
    assert_eq!(servers[0]["host"], "sap.staging.internal");
    assert_eq!(servers[0]["port"], 443);
    assert_eq!(servers[0]["sSLInfo"]["enabled"], true);

    let products: serde_json::Value =
        serde_json::from_str(bundle.get("config/prod1/apiProducts.json").unwrap()).unwrap();
    assert_eq!(products[0]["name"], "elis.billing.sap.invoice.v1");
    assert_eq!(products[0]["approvalType"], "auto");
    assert_eq!(products[0]["attributes"][0]["value"], "private");
    // no explicit selection: common root of the contract
    assert_eq!(products[0]["apiResources"], serde_json::json!(["/", "/**"]));

    let kvms: serde_json::Value =
        serde_json::from_str(bundle.get("config/uat1/kvms.json").unwrap()).unwrap();
    assert_eq!(kvms[0]["name"], "sap.v1.backend");
    assert_eq!(kvms[0]["encrypted"], true);
}

#[test]
fn test_fails_fast_listing_every_missing_field() {
    let mut incomplete = atoms();
    incomplete.entity.clear();
    let mut envs = environments();
    envs.set_host(EnvironmentName::Uat1, "");
    match generate(&incomplete, &envs, &contract()) {
        Err(GenerateError::Input(err)) => assert_eq!(
            err.field_names(),
            vec!["atoms.entity", "environments.uat1.targetServer.host"]
        ),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_repeated_backend_app_blocks_generation() {
    let mut repeated = atoms();
    repeated.backend_apps.push("sap".into());
    match generate(&repeated, &environments(), &contract()) {
        Err(GenerateError::Input(err)) => {
            assert_eq!(err.field_names(), vec!["atoms.backendApps[1]"]);
        }
        other => panic!("expected input error, got {other:?}"),
    }
}

#[test]
fn test_missing_environment_is_reported() {
    let mut envs = EnvironmentSet::new();
    envs.insert(
        EnvironmentName::Dev1,
        environments().get(EnvironmentName::Dev1).unwrap().clone(),
    );
    let err = generate(&atoms(), &envs, &contract()).unwrap_err();
    let GenerateError::Input(err) = err else {
        panic!("expected input error");
    };
    assert_eq!(
        err.field_names(),
        vec!["environments.uat1", "environments.staging", "environments.prod1"]
    );
}

#[test]
fn test_bundle_rejects_path_collision() {
    let mut bundle = ArtifactBundle::new("root");
    bundle.insert("a.txt", "1").unwrap();
    let err = bundle.insert("a.txt", "2").unwrap_err();
    assert!(matches!(err, GenerateError::PathCollision(p) if p == "a.txt"));
    assert_eq!(bundle.get("a.txt"), Some("1"));
}

#[test]
fn test_fingerprint_changes_with_content() {
    let mut a = ArtifactBundle::new("root");
    a.insert("a.txt", "1").unwrap();
    let mut b = ArtifactBundle::new("root");
    b.insert("a.txt", "2").unwrap();
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}

#[test]
fn test_write_bundle_refuses_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = generate(&atoms(), &environments(), &contract()).unwrap();
    let root = write_bundle(&bundle, dir.path(), false).unwrap();
    assert!(root.join("apiproxy").join("proxies").join("default.xml").exists());
    assert_eq!(
        fs::read_to_string(root.join("config").join("dev1").join("kvms.json")).unwrap(),
        bundle.get("config/dev1/kvms.json").unwrap()
    );

    let err = write_bundle(&bundle, dir.path(), false).unwrap_err();
    assert!(err.to_string().contains("already exist"));
    assert!(write_bundle(&bundle, dir.path(), true).is_ok());
}

#[test]
fn test_markup_in_contract_paths_is_escaped() {
    let mut c = contract();
    c.paths.push(ContractPath::new("/search&sort/<name>", "GET"));
    let bundle = generate(&atoms(), &environments(), &c).unwrap();
    let xml = bundle.get("apiproxy/proxies/default.xml").unwrap();
    assert!(xml.contains(r#"<Flow name="get-searchsort-name">"#));
    assert!(xml.contains(r#"MatchesPath "/search&amp;sort/&lt;name&gt;")"#));
    assert!(!xml.contains("/search&sort/<name>"));
}

#[test]
fn test_duplicate_secret_entries_block_generation() {
    let mut envs = environments();
    let map = &mut envs.get_mut(EnvironmentName::Dev1).unwrap().secret_maps[0];
    map.entries.push(SecretMapEntry::new("password", "a"));
    map.entries.push(SecretMapEntry::new("password", "b"));
    match generate(&atoms(), &envs, &contract()) {
        Err(GenerateError::Validation { env, map, source }) => {
            assert_eq!(env, EnvironmentName::Dev1);
            assert_eq!(map, "sap.v1.backend");
            assert_eq!(source.duplicate_names(), vec!["password"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_limits_apply_to_every_stage() {
    let mut envs = environments();
    envs.get_mut(EnvironmentName::Prod1).unwrap().secret_maps[0]
        .entries
        .extend([
            SecretMapEntry::new("a", "1"),
            SecretMapEntry::new("b", "2"),
        ]);
    let limits = EntryLimits {
        max_entries: 1,
        ..EntryLimits::default()
    };
    let err = generate_with_limits(&atoms(), &envs, &contract(), &limits).unwrap_err();
    assert!(matches!(
        err,
        GenerateError::Validation { env: EnvironmentName::Prod1, .. }
    ));
    assert!(generate(&atoms(), &envs, &contract()).is_ok());
}
