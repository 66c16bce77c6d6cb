#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::process::Command;

const CONTRACT: &str = r#"{
  "openapi": "3.0.3",
  "info": { "title": "Invoices", "version": "1.0" },
  "servers": [
    { "url": "https://sap.dev.internal/api", "x-environment": "dev" },
    { "url": "https://sap.uat.internal/api", "x-environment": "uat" },
    { "url": "https://sap.stg.internal/api", "x-environment": "stg" },
    { "url": "https://sap.internal/api", "x-environment": "prod" }
  ],
  "paths": {
    "/invoices": { "get": { "responses": { "200": { "description": "ok" } } } }
  }
}
"#;

fn proxygen() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_proxygen"));
    cmd.env("PROXYGEN_LOG_LEVEL", "warn");
    cmd
}

#[test]
fn test_cli_init_then_generate() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("openapi.json"), CONTRACT).unwrap();

    let status = proxygen()
        .current_dir(dir.path())
        .args([
            "init",
            "--entity",
            "elis",
            "--domain",
            "billing",
            "--backend-app",
            "sap",
            "--business-object",
            "invoice",
            "--api-version",
            "v1",
            "--contract",
            "openapi.json",
        ])
        .status()
        .expect("run init");
    assert!(status.success());
    assert!(dir.path().join("proxy.yaml").exists());

    let output = proxygen()
        .current_dir(dir.path())
        .args(["generate", "--contract", "openapi.json", "--output", "out"])
        .output()
        .expect("run generate");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fingerprint"));

    let root = dir.path().join("out").join("elis.billing.sap.invoice.v1");
    assert!(root.join("apiproxy/elis.billing.sap.invoice.v1.xml").exists());
    assert!(root.join("config/staging/apiProducts.json").exists());
}

#[test]
fn test_cli_suggest_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("openapi.json"), CONTRACT).unwrap();
    let output = proxygen()
        .current_dir(dir.path())
        .args(["suggest", "--contract", "openapi.json"])
        .output()
        .expect("run suggest");
    assert!(output.status.success());
    let suggestions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(suggestions[0]["id"], "invoices");
}

#[test]
fn test_cli_generate_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("openapi.json"), CONTRACT).unwrap();
    let status = proxygen()
        .current_dir(dir.path())
        .args(["generate", "--contract", "openapi.json"])
        .status()
        .expect("run generate");
    assert!(!status.success());
}
