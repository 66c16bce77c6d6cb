use tracing::{debug, info};

use super::set::EnvironmentSet;
use crate::config::{EnvironmentName, SecretMap};
use crate::contract::ContractAnalysis;

/// One secret map written into a sibling stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagatedMap {
    pub env: EnvironmentName,
    pub map: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub written: Vec<PropagatedMap>,
    /// Sibling maps that already matched the source and were left alone
    pub unchanged: usize,
}

impl PropagationReport {
    pub fn is_noop(&self) -> bool {
        self.written.is_empty()
    }
}

impl EnvironmentSet {
    /// Broadcast the source stage's secret maps to every other stage.
    ///
    /// Each sibling ends up with a map of the same name, encryption flag and
    /// entries as the source (full overwrite). Sibling maps the source does not
    /// have are left in place, and nothing flows from a sibling back to the source.
    /// Invoke once per logical commit, not per keystroke.
    pub fn propagate_secret_maps(&mut self) -> PropagationReport {
        let mut report = PropagationReport::default();
        let source_maps: Vec<SecretMap> = match self.source() {
            Some(cfg) => cfg.secret_maps.clone(),
            None => return report,
        };

        for env in EnvironmentName::ALL {
            if env.is_source() {
                continue;
            }
            let Some(sibling) = self.get_mut(env) else {
                continue;
            };
            for map in &source_maps {
                match sibling.secret_map_mut(&map.name) {
                    Some(existing) if existing == map => report.unchanged += 1,
                    Some(existing) => {
                        *existing = map.clone();
                        report.written.push(PropagatedMap {
                            env,
                            map: map.name.clone(),
                        });
                    }
                    None => {
                        sibling.secret_maps.push(map.clone());
                        report.written.push(PropagatedMap {
                            env,
                            map: map.name.clone(),
                        });
                    }
                }
            }
        }

        if !report.is_noop() {
            info!(
                source = %EnvironmentName::SOURCE,
                written = report.written.len(),
                unchanged = report.unchanged,
                "secret maps propagated"
            );
        }
        report
    }

    /// Record a user-entered host. Clears the auto-filled marker.
    ///
    /// Returns `false` when the stage does not exist.
    pub fn set_host(&mut self, env: EnvironmentName, host: impl Into<String>) -> bool {
        match self.get_mut(env) {
            Some(cfg) => {
                cfg.target_server.host = host.into();
                cfg.host_auto_filled = false;
                true
            }
            None => false,
        }
    }

    /// Fill empty primary hosts from contract-derived hints.
    ///
    /// A non-empty host is never overwritten. Filled stages are marked
    /// auto-filled until [`set_host`](Self::set_host) is called for them.
    pub fn apply_host_hints(&mut self, analysis: &ContractAnalysis) -> Vec<EnvironmentName> {
        let mut filled = Vec::new();
        for (env, hint) in &analysis.environment_hosts {
            let Some(cfg) = self.get_mut(*env) else {
                continue;
            };
            if !cfg.target_server.host.trim().is_empty() {
                debug!(env = %env, "host already set; contract hint ignored");
                continue;
            }
            cfg.target_server.host = hint.host.clone();
            cfg.target_server.port = hint.port;
            cfg.target_server.tls_enabled = hint.tls;
            cfg.host_auto_filled = true;
            filled.push(*env);
        }
        if !filled.is_empty() {
            info!(filled = ?filled, "target hosts auto-filled from contract");
        }
        filled
    }
}
