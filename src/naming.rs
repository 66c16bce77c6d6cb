//! # Naming
//!
//! Pure derivation of every canonical identifier from [`ConfigurationAtoms`].
//!
//! ```text
//! proxy name     entity.domain.app1-app2.businessObject.version
//! target server  entity.app1-app2.version.backend
//! product        <proxy name><env suffix>          (.dev1 / .uat1 / .stg / "")
//! display name   businessObject-version<env suffix> (-dev1 / -uat1 / -stg / "")
//! secret map     backendApp.version.backend
//! ```
//!
//! The environment suffixes come from [`SUFFIX_TABLE`](crate::config::SUFFIX_TABLE).

use crate::config::{ConfigurationAtoms, EnvironmentName};
use crate::error::InputError;

const APP_SEPARATOR: &str = "-";
const BACKEND_SUFFIX: &str = "backend";

fn joined_apps(backend_apps: &[String]) -> String {
    backend_apps
        .iter()
        .map(|a| a.trim())
        .collect::<Vec<_>>()
        .join(APP_SEPARATOR)
}

/// Build the proxy name from raw atoms.
///
/// Total for non-empty inputs; callers that cannot guarantee that should go
/// through [`proxy_name`] instead.
pub fn derive_proxy_name(
    entity: &str,
    domain: &str,
    backend_apps: &[String],
    business_object: &str,
    version: &str,
) -> String {
    format!(
        "{}.{}.{}.{}.{}",
        entity.trim(),
        domain.trim(),
        joined_apps(backend_apps),
        business_object.trim(),
        version.trim()
    )
}

/// Proxy name for a complete set of atoms, or every missing field.
pub fn proxy_name(atoms: &ConfigurationAtoms) -> Result<String, InputError> {
    atoms.require_complete()?;
    Ok(derive_proxy_name(
        &atoms.entity,
        &atoms.domain,
        &atoms.backend_apps,
        &atoms.business_object,
        &atoms.version,
    ))
}

/// `entity.app1-app2.version.backend`, shared by every stage.
pub fn target_server_name(atoms: &ConfigurationAtoms) -> String {
    format!(
        "{}.{}.{}.{}",
        atoms.entity.trim(),
        joined_apps(&atoms.backend_apps),
        atoms.version.trim(),
        BACKEND_SUFFIX
    )
}

/// Product name for a stage; production carries no suffix.
pub fn product_name(proxy_name: &str, env: EnvironmentName) -> String {
    format!("{proxy_name}{}", env.suffix().product)
}

/// `businessObject-version` plus the stage's display suffix.
pub fn product_display_name(atoms: &ConfigurationAtoms, env: EnvironmentName) -> String {
    format!(
        "{}-{}{}",
        atoms.business_object.trim(),
        atoms.version.trim(),
        env.suffix().display
    )
}

/// Human-readable product description naming the stage.
pub fn product_description(atoms: &ConfigurationAtoms, env: EnvironmentName) -> String {
    format!(
        "{} {} API of the {} {} domain ({})",
        atoms.business_object.trim(),
        atoms.version.trim(),
        atoms.entity.trim(),
        atoms.domain.trim(),
        env
    )
}

/// `backendApp.version.backend`
///
/// Depends only on the backend application and the version, so renames of
/// the entity, domain or business object keep every secret map in place.
pub fn secret_map_name(backend_app: &str, version: &str) -> String {
    format!("{}.{}.{}", backend_app.trim(), version.trim(), BACKEND_SUFFIX)
}

/// One secret-map name per backend application, in atom order.
pub fn secret_map_names(atoms: &ConfigurationAtoms) -> Vec<String> {
    atoms
        .backend_apps
        .iter()
        .map(|app| secret_map_name(app, &atoms.version))
        .collect()
}

/// All names derived for a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedNames {
    pub proxy: String,
    /// Shared by every stage
    pub target_server: String,
    /// Stage-suffixed product name
    pub product: String,
    pub display_name: String,
    pub description: String,
    /// One per backend application, in atom order
    pub secret_maps: Vec<String>,
}

impl DerivedNames {
    /// Derive every name for `env`, or report the missing atoms.
    pub fn for_environment(
        atoms: &ConfigurationAtoms,
        env: EnvironmentName,
    ) -> Result<Self, InputError> {
        let proxy = proxy_name(atoms)?;
        Ok(DerivedNames {
            product: product_name(&proxy, env),
            target_server: target_server_name(atoms),
            display_name: product_display_name(atoms, env),
            description: product_description(atoms, env),
            secret_maps: secret_map_names(atoms),
            proxy,
        })
    }
}
