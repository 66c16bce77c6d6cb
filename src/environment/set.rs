use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::synthesize::{rebind_name_with, synthesize_default, RebindOptions, RebindReport};
use crate::config::{ConfigurationAtoms, EnvironmentConfig, EnvironmentName};
use crate::error::InputError;
use crate::naming;

/// The per-stage configurations, keyed and iterated in canonical stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentSet {
    environments: BTreeMap<EnvironmentName, EnvironmentConfig>,
}

impl EnvironmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configurations for all four stages.
    pub fn synthesize(atoms: &ConfigurationAtoms) -> Result<Self, InputError> {
        let mut set = EnvironmentSet::new();
        for env in EnvironmentName::ALL {
            set.insert(env, synthesize_default(env, atoms)?);
        }
        Ok(set)
    }

    pub fn get(&self, env: EnvironmentName) -> Option<&EnvironmentConfig> {
        self.environments.get(&env)
    }

    pub fn get_mut(&mut self, env: EnvironmentName) -> Option<&mut EnvironmentConfig> {
        self.environments.get_mut(&env)
    }

    pub fn insert(&mut self, env: EnvironmentName, config: EnvironmentConfig) {
        self.environments.insert(env, config);
    }

    pub fn contains(&self, env: EnvironmentName) -> bool {
        self.environments.contains_key(&env)
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Stages present, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (EnvironmentName, &EnvironmentConfig)> {
        self.environments.iter().map(|(env, cfg)| (*env, cfg))
    }

    pub fn source(&self) -> Option<&EnvironmentConfig> {
        self.get(EnvironmentName::SOURCE)
    }
}

/// Result of [`ProxyConfiguration::update_atoms`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingChange {
    pub previous: Option<String>,
    /// `None` while required atoms are still missing
    pub current: Option<String>,
    /// Stages synthesized because they did not exist yet
    pub synthesized: Vec<EnvironmentName>,
    /// One report per rebound stage
    pub rebinds: Vec<RebindReport>,
}

impl NamingChange {
    pub fn renamed(&self) -> bool {
        self.current.is_some() && self.previous != self.current
    }
}

/// The single owned configuration object carried through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfiguration {
    #[serde(default)]
    pub atoms: ConfigurationAtoms,
    /// Last computed proxy name; absent until every required atom is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_name: Option<String>,
    #[serde(default)]
    pub environments: EnvironmentSet,
    /// Atoms the stages were last derived from, held while `atoms` is incomplete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<ConfigurationAtoms>,
}

impl ProxyConfiguration {
    /// A configuration with all four stages synthesized from `atoms`.
    pub fn from_atoms(atoms: ConfigurationAtoms) -> Result<Self, InputError> {
        let proxy = naming::proxy_name(&atoms)?;
        let environments = EnvironmentSet::synthesize(&atoms)?;
        Ok(ProxyConfiguration {
            atoms,
            proxy_name: Some(proxy),
            environments,
            derived_from: None,
        })
    }

    /// Replace the atoms and cascade a proxy-name change into every stage.
    ///
    /// Incomplete atoms are stored but nothing is derived from them. Missing
    /// stages are synthesized once the atoms are complete. Renames are computed
    /// against the atoms the stages were last derived from, so an edit that
    /// passes through an incomplete state still migrates secret maps.
    pub fn update_atoms(
        &mut self,
        atoms: ConfigurationAtoms,
        options: RebindOptions,
    ) -> Result<NamingChange, InputError> {
        let previous_atoms = std::mem::replace(&mut self.atoms, atoms);
        let mut change = NamingChange {
            previous: self.proxy_name.clone(),
            ..NamingChange::default()
        };
        if !self.atoms.is_complete() {
            if self.derived_from.is_none() && previous_atoms.is_complete() {
                self.derived_from = Some(previous_atoms);
            }
            return Ok(change);
        }
        let previous_atoms = self.derived_from.take().unwrap_or(previous_atoms);

        let current = naming::proxy_name(&self.atoms)?;
        change.current = Some(current.clone());

        for env in EnvironmentName::ALL {
            if !self.environments.contains(env) {
                self.environments
                    .insert(env, synthesize_default(env, &self.atoms)?);
                change.synthesized.push(env);
            }
        }

        // Secret-map names depend on backend apps and version, which can change
        // without changing anything else visible; rebind whenever atoms differ.
        if change.previous.as_deref() != Some(current.as_str()) || previous_atoms != self.atoms {
            for env in EnvironmentName::ALL {
                if change.synthesized.contains(&env) {
                    continue;
                }
                let Some(existing) = self.environments.get(env) else {
                    continue;
                };
                let (rebound, report) = rebind_name_with(
                    existing,
                    env,
                    &self.atoms,
                    Some(&previous_atoms),
                    options,
                )?;
                self.environments.insert(env, rebound);
                change.rebinds.push(report);
            }
            info!(
                previous = ?change.previous,
                current = %current,
                rebound = change.rebinds.len(),
                "proxy naming updated"
            );
        }

        self.proxy_name = Some(current);
        Ok(change)
    }
}
