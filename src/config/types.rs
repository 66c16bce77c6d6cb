use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{FieldError, InputError};

/// One of the four canonical deployment stages, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnvironmentName {
    #[serde(rename = "dev1")]
    Dev1,
    #[serde(rename = "uat1")]
    Uat1,
    #[serde(rename = "staging")]
    Staging,
    #[serde(rename = "prod1")]
    Prod1,
}

/// Naming suffixes attached to a stage. Kept as data so the stage set can grow
/// without touching the derivation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentSuffix {
    pub env: EnvironmentName,
    /// Appended to the proxy name for the product name
    pub product: &'static str,
    /// Appended to `businessObject-version` for the display name
    pub display: &'static str,
}

pub static SUFFIX_TABLE: [EnvironmentSuffix; 4] = [
    EnvironmentSuffix {
        env: EnvironmentName::Dev1,
        product: ".dev1",
        display: "-dev1",
    },
    EnvironmentSuffix {
        env: EnvironmentName::Uat1,
        product: ".uat1",
        display: "-uat1",
    },
    EnvironmentSuffix {
        env: EnvironmentName::Staging,
        product: ".stg",
        display: "-stg",
    },
    EnvironmentSuffix {
        env: EnvironmentName::Prod1,
        product: "",
        display: "",
    },
];

impl EnvironmentName {
    /// All stages in precedence order.
    pub const ALL: [EnvironmentName; 4] = [
        EnvironmentName::Dev1,
        EnvironmentName::Uat1,
        EnvironmentName::Staging,
        EnvironmentName::Prod1,
    ];

    /// The stage whose secret-map edits are broadcast to every other stage.
    pub const SOURCE: EnvironmentName = EnvironmentName::Dev1;

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentName::Dev1 => "dev1",
            EnvironmentName::Uat1 => "uat1",
            EnvironmentName::Staging => "staging",
            EnvironmentName::Prod1 => "prod1",
        }
    }

    pub fn is_source(&self) -> bool {
        *self == Self::SOURCE
    }

    pub fn suffix(&self) -> &'static EnvironmentSuffix {
        // The table holds one row per variant, in declaration order.
        &SUFFIX_TABLE[*self as usize]
    }

    /// Resolve a free-form label (`dev`, `production`, `UAT`, ...) to a stage.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "dev" | "dev1" | "development" => Some(EnvironmentName::Dev1),
            "uat" | "uat1" | "test" | "qa" => Some(EnvironmentName::Uat1),
            "stg" | "staging" | "preprod" | "pre-prod" => Some(EnvironmentName::Staging),
            "prod" | "prod1" | "production" | "prd" => Some(EnvironmentName::Prod1),
            _ => None,
        }
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvironmentName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvironmentName::from_label(s).ok_or_else(|| format!("unknown environment '{s}'"))
    }
}

/// The user-supplied naming components every derived name is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationAtoms {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub backend_apps: Vec<String>,
    #[serde(default)]
    pub business_object: String,
    #[serde(default)]
    pub version: String,
}

impl ConfigurationAtoms {
    pub fn new(
        entity: impl Into<String>,
        domain: impl Into<String>,
        backend_apps: &[&str],
        business_object: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ConfigurationAtoms {
            entity: entity.into(),
            domain: domain.into(),
            backend_apps: backend_apps.iter().map(|s| s.to_string()).collect(),
            business_object: business_object.into(),
            version: version.into(),
        }
    }

    /// Every missing, blank or repeated atom, reported per field.
    pub fn missing_fields(&self) -> Vec<FieldError> {
        let mut missing = Vec::new();
        let scalar = [
            ("atoms.entity", &self.entity),
            ("atoms.domain", &self.domain),
            ("atoms.businessObject", &self.business_object),
            ("atoms.version", &self.version),
        ];
        for (field, value) in scalar {
            if value.trim().is_empty() {
                missing.push(FieldError::missing(field));
            }
        }
        if self.backend_apps.is_empty() {
            missing.push(FieldError::new(
                "atoms.backendApps",
                "at least one backend application is required",
            ));
        }
        let mut seen = HashSet::new();
        for (i, app) in self.backend_apps.iter().enumerate() {
            let app = app.trim();
            if app.is_empty() {
                missing.push(FieldError::missing(format!("atoms.backendApps[{i}]")));
            } else if !seen.insert(app) {
                // two apps would share one secret map and one lookup policy
                missing.push(FieldError::new(
                    format!("atoms.backendApps[{i}]"),
                    format!("duplicate backend application '{app}'"),
                ));
            }
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn require_complete(&self) -> Result<(), InputError> {
        InputError::check(self.missing_fields())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetServer {
    pub name: String,
    #[serde(default)]
    pub host: String,
    pub port: u16,
    pub tls_enabled: bool,
    #[serde(default)]
    pub client_auth_enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Private,
    Public,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub approval_type: ApprovalType,
    #[serde(default)]
    pub authorized_paths: Vec<String>,
    #[serde(default)]
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMapEntry {
    pub name: String,
    pub value: String,
}

impl SecretMapEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        SecretMapEntry {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named, optionally encrypted key/value store (one per backend application).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMap {
    pub name: String,
    #[serde(default = "default_encrypted")]
    pub encrypted: bool,
    #[serde(default)]
    pub entries: Vec<SecretMapEntry>,
}

fn default_encrypted() -> bool {
    true
}

impl SecretMap {
    pub fn empty(name: impl Into<String>) -> Self {
        SecretMap {
            name: name.into(),
            encrypted: true,
            entries: Vec::new(),
        }
    }
}

/// Everything deployed to one stage.
///
/// The primary target server and product are the records derived names are
/// written into; the `additional_*` lists are free-form and never renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub target_server: TargetServer,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_target_servers: Vec<TargetServer>,
    pub product: Product,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_products: Vec<Product>,
    #[serde(default)]
    pub secret_maps: Vec<SecretMap>,
    /// Set while the primary host holds a contract-derived value the user has not edited
    #[serde(default)]
    pub host_auto_filled: bool,
}

impl EnvironmentConfig {
    pub fn target_servers(&self) -> impl Iterator<Item = &TargetServer> {
        std::iter::once(&self.target_server).chain(self.additional_target_servers.iter())
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        std::iter::once(&self.product).chain(self.additional_products.iter())
    }

    pub fn secret_map(&self, name: &str) -> Option<&SecretMap> {
        self.secret_maps.iter().find(|m| m.name == name)
    }

    pub fn secret_map_mut(&mut self, name: &str) -> Option<&mut SecretMap> {
        self.secret_maps.iter_mut().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_table_matches_variants() {
        for env in EnvironmentName::ALL {
            assert_eq!(env.suffix().env, env);
        }
        assert_eq!(EnvironmentName::Staging.suffix().product, ".stg");
        assert_eq!(EnvironmentName::Prod1.suffix().product, "");
    }

    #[test]
    fn test_from_label_aliases() {
        assert_eq!(EnvironmentName::from_label("Production"), Some(EnvironmentName::Prod1));
        assert_eq!(EnvironmentName::from_label("qa"), Some(EnvironmentName::Uat1));
        assert_eq!(EnvironmentName::from_label("preprod"), Some(EnvironmentName::Staging));
        assert_eq!(EnvironmentName::from_label(" DEV "), Some(EnvironmentName::Dev1));
        assert_eq!(EnvironmentName::from_label("sandbox"), None);
    }

    #[test]
    fn test_missing_atoms_reported_per_field() {
        let atoms = ConfigurationAtoms {
            entity: "ext".into(),
            domain: " ".into(),
            backend_apps: vec![],
            business_object: "order".into(),
            version: String::new(),
        };
        let fields: Vec<String> = atoms.missing_fields().into_iter().map(|f| f.field).collect();
        assert_eq!(
            fields,
            vec!["atoms.domain", "atoms.version", "atoms.backendApps"]
        );
    }

    #[test]
    fn test_repeated_backend_app_is_rejected() {
        let atoms = ConfigurationAtoms::new("ext", "sales", &["crm", " crm ", "erp"], "order", "v2");
        let missing = atoms.missing_fields();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field, "atoms.backendApps[1]");
        assert!(missing[0].message.contains("duplicate"));
        assert!(!atoms.is_complete());
    }

    #[test]
    fn test_environment_serde_names() {
        let json = serde_json::to_string(&EnvironmentName::Staging).unwrap();
        assert_eq!(json, "\"staging\"");
        let env: EnvironmentName = serde_json::from_str("\"prod1\"").unwrap();
        assert_eq!(env, EnvironmentName::Prod1);
    }
}
