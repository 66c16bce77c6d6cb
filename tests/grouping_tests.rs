#![allow(clippy::unwrap_used, clippy::expect_used)]

use proxygen::config::{ConfigurationAtoms, EnvironmentName};
use proxygen::contract::ContractPath;
use proxygen::environment::ProxyConfiguration;
use proxygen::grouping::{
    add_suggested_product, apply_suggestion, build_suggestions, find_smallest_common_root,
};

fn invoice_operations() -> Vec<ContractPath> {
    vec![
        ContractPath::new("/invoices", "GET"),
        ContractPath::new("/invoices/{id}", "GET"),
        ContractPath::new("/invoices/{id}/lines", "GET"),
        ContractPath::new("/health", "GET"),
    ]
}

#[test]
fn test_invoice_and_health_groups() {
    let ops = invoice_operations();
    let paths: Vec<&str> = ops.iter().map(|o| o.path.as_str()).collect();
    assert_eq!(find_smallest_common_root(&paths), "/");

    let suggestions = build_suggestions(&ops);
    assert!(suggestions.len() >= 2);
    let prefixes: Vec<&str> = suggestions.iter().map(|s| s.path_prefix.as_str()).collect();
    assert!(prefixes.contains(&"/invoices"));
    assert!(prefixes.contains(&"/health"));

    let invoices = suggestions
        .iter()
        .find(|s| s.path_prefix == "/invoices")
        .unwrap();
    assert_eq!(invoices.authorized_paths, vec!["/invoices", "/invoices/**"]);
    assert_eq!(invoices.paths.len(), 3);
}

#[test]
fn test_suggestions_are_sorted_and_stable() {
    let mut ops = invoice_operations();
    ops.push(ContractPath::new("/customers", "post"));
    let first = build_suggestions(&ops);
    let second = build_suggestions(&ops);
    assert_eq!(first, second);
    let ids: Vec<&str> = first.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["customers", "health", "invoices"]);
}

#[test]
fn test_suggestions_are_only_persisted_when_applied() {
    let atoms = ConfigurationAtoms::new("elis", "billing", &["sap"], "invoice", "v1");
    let mut config = ProxyConfiguration::from_atoms(atoms.clone()).unwrap();
    let before = config.clone();
    let suggestions = build_suggestions(&invoice_operations());
    assert_eq!(config, before);

    let health = suggestions.iter().find(|s| s.id == "health").unwrap();
    let invoices = suggestions.iter().find(|s| s.id == "invoices").unwrap();
    let dev = config.environments.get_mut(EnvironmentName::Dev1).unwrap();
    apply_suggestion(dev, invoices);
    add_suggested_product(dev, EnvironmentName::Dev1, &atoms, health).unwrap();

    assert_eq!(dev.product.authorized_paths, vec!["/invoices", "/invoices/**"]);
    assert_eq!(dev.additional_products.len(), 1);
    assert_eq!(
        dev.additional_products[0].name,
        "elis.billing.sap.invoice.v1.dev1.health"
    );
}
