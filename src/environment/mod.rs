//! # Environment Module
//!
//! Keeps the four per-stage [`EnvironmentConfig`](crate::config::EnvironmentConfig)
//! entries consistent with the current atoms and proxy name.
//!
//! ## Operations
//!
//! - [`synthesize_default`] - fresh configuration for one stage
//! - [`rebind_name`] / [`rebind_name_with`] - non-destructive rename after an atom change
//! - [`ProxyConfiguration::update_atoms`] - recompute the proxy name and cascade it
//! - [`EnvironmentSet::propagate_secret_maps`] - broadcast source-stage secret maps
//! - [`EnvironmentSet::apply_host_hints`] / [`EnvironmentSet::set_host`] - host auto-fill
//!
//! ## Propagation
//!
//! ```text
//!            propagate_secret_maps()
//!   dev1 ──────────────┬──────────────┬──────────────┐
//!  (source)            ▼              ▼              ▼
//!                    uat1          staging         prod1
//! ```
//!
//! Propagation only ever flows from the source stage outwards. Edits made
//! directly in a sibling survive until the next broadcast overwrites a map of
//! the same name.

mod propagate;
mod set;
mod synthesize;

pub use propagate::{PropagatedMap, PropagationReport};
pub use set::{EnvironmentSet, NamingChange, ProxyConfiguration};
pub use synthesize::{rebind_name, rebind_name_with, synthesize_default, RebindOptions, RebindReport};
