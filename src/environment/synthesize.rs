use tracing::{debug, warn};

use crate::config::{
    AccessLevel, ApprovalType, ConfigurationAtoms, EnvironmentConfig, EnvironmentName, Product,
    SecretMap, TargetServer,
};
use crate::error::InputError;
use crate::naming::{self, DerivedNames};

const DEFAULT_PORT: u16 = 443;

/// Knobs for [`rebind_name_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebindOptions {
    /// When a secret map's computed name changes, carry its entries over from the
    /// map computed from the previous atoms for the same backend-application slot.
    pub migrate_renamed_secret_maps: bool,
}

/// What a rebind did to one environment's secret maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebindReport {
    pub env: Option<EnvironmentName>,
    /// Maps that existed under the new computed name and kept their entries
    pub preserved: Vec<String>,
    /// Maps recreated empty under a new computed name
    pub created: Vec<String>,
    /// Maps created under a new name that inherited entries from their old name
    pub migrated: Vec<(String, String)>,
    /// Previous maps (with entries) that no longer match any computed name
    pub dropped: Vec<String>,
}

impl RebindReport {
    /// `true` when entries were discarded because a computed name changed.
    pub fn lost_entries(&self) -> bool {
        !self.dropped.is_empty()
    }
}

/// A fresh configuration for `env`: empty host, port 443 with TLS, one private
/// auto-approved product and one empty secret map per backend application.
pub fn synthesize_default(
    env: EnvironmentName,
    atoms: &ConfigurationAtoms,
) -> Result<EnvironmentConfig, InputError> {
    let names = DerivedNames::for_environment(atoms, env)?;
    debug!(env = %env, proxy = %names.proxy, "synthesizing default environment");
    Ok(EnvironmentConfig {
        target_server: TargetServer {
            name: names.target_server,
            host: String::new(),
            port: DEFAULT_PORT,
            tls_enabled: true,
            client_auth_enabled: false,
        },
        additional_target_servers: Vec::new(),
        product: Product {
            name: names.product,
            display_name: names.display_name,
            description: names.description,
            approval_type: ApprovalType::Auto,
            authorized_paths: Vec::new(),
            access_level: AccessLevel::Private,
        },
        additional_products: Vec::new(),
        secret_maps: names.secret_maps.into_iter().map(SecretMap::empty).collect(),
        host_auto_filled: false,
    })
}

/// Rename the primary records of `existing` after an atom change.
///
/// Only the primary target server's name and the primary product's
/// name/display name/description change. Secret maps are re-keyed by computed
/// name: a map whose computed name already exists keeps its entries, any
/// other computed name gets an empty map, and previous maps matching no
/// computed name are discarded.
pub fn rebind_name(
    existing: &EnvironmentConfig,
    env: EnvironmentName,
    atoms: &ConfigurationAtoms,
) -> Result<(EnvironmentConfig, RebindReport), InputError> {
    rebind_name_with(existing, env, atoms, None, RebindOptions::default())
}

/// [`rebind_name`] with an optional migrate-by-old-name fallback.
///
/// `previous` are the atoms `existing` was derived from; it is only consulted
/// when `options.migrate_renamed_secret_maps` is set.
pub fn rebind_name_with(
    existing: &EnvironmentConfig,
    env: EnvironmentName,
    atoms: &ConfigurationAtoms,
    previous: Option<&ConfigurationAtoms>,
    options: RebindOptions,
) -> Result<(EnvironmentConfig, RebindReport), InputError> {
    let names = DerivedNames::for_environment(atoms, env)?;
    let mut report = RebindReport {
        env: Some(env),
        ..RebindReport::default()
    };

    let mut updated = existing.clone();
    updated.target_server.name = names.target_server;
    updated.product.name = names.product;
    updated.product.display_name = names.display_name;
    updated.product.description = names.description;

    let previous_names = match (options.migrate_renamed_secret_maps, previous) {
        (true, Some(prev)) => naming::secret_map_names(prev),
        _ => Vec::new(),
    };

    let mut secret_maps = Vec::with_capacity(names.secret_maps.len());
    for (slot, name) in names.secret_maps.iter().enumerate() {
        if let Some(kept) = existing.secret_map(name) {
            report.preserved.push(name.clone());
            secret_maps.push(kept.clone());
            continue;
        }
        let migrated_from = previous_names
            .get(slot)
            .and_then(|old| existing.secret_map(old));
        match migrated_from {
            Some(old) => {
                report.migrated.push((old.name.clone(), name.clone()));
                secret_maps.push(SecretMap {
                    name: name.clone(),
                    encrypted: old.encrypted,
                    entries: old.entries.clone(),
                });
            }
            None => {
                report.created.push(name.clone());
                secret_maps.push(SecretMap::empty(name.clone()));
            }
        }
    }

    let migrated_sources: Vec<&str> = report.migrated.iter().map(|(old, _)| old.as_str()).collect();
    for old in &existing.secret_maps {
        let still_computed = names.secret_maps.iter().any(|n| n == &old.name);
        if !still_computed && !old.entries.is_empty() && !migrated_sources.contains(&old.name.as_str())
        {
            report.dropped.push(old.name.clone());
        }
    }
    if report.lost_entries() {
        warn!(
            env = %env,
            dropped = ?report.dropped,
            "secret maps renamed; their entries were not carried over"
        );
    }

    updated.secret_maps = secret_maps;
    Ok((updated, report))
}
