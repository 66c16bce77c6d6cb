//! # proxygen
//!
//! **proxygen** derives the configuration of an API-gateway proxy from a
//! handful of naming atoms and an [OpenAPI 3](https://spec.openapis.org/oas/v3.1.0)
//! contract, keeps that configuration consistent across four deployment
//! stages, and generates the deployable proxy bundle.
//!
//! ## Architecture
//!
//! - **[`naming`]** - Pure derivation of proxy, target server, product and secret-map names
//! - **[`config`]** - Configuration types, the YAML/JSON document and `proxygen.toml` settings
//! - **[`environment`]** - Stage synthesis, rename cascades, secret-map propagation, host hints
//! - **[`contract`]** - OpenAPI loading and the hints extracted from it
//! - **[`grouping`]** - Product suggestions from contract path groups
//! - **[`reconcile`]** - Entry diffing, validation and sequential sync against a [`SecretStore`]
//! - **[`generator`]** - Askama-rendered bundle with a stable layout and fingerprint
//! - **[`publish`]** - Batched, incremental publication to a [`RemoteRepository`]
//! - **[`cli`]** - The `proxygen` command
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(proxygen)
//!     participant Contract as contract::load_contract
//!     participant Env as environment
//!     participant Gen as generator::generate
//!     participant FS as File System
//!
//!     User->>CLI: proxygen init --entity ... --contract openapi.yaml
//!     CLI->>Env: ProxyConfiguration::from_atoms(atoms)
//!     Env-->>CLI: dev1, uat1, staging, prod1
//!     CLI->>Contract: load_contract("openapi.yaml")
//!     Contract-->>CLI: ContractInput
//!     CLI->>Env: apply_host_hints(analysis)
//!     CLI->>FS: proxy.yaml
//!
//!     User->>CLI: proxygen generate --contract openapi.yaml
//!     CLI->>Gen: generate_with_limits(atoms, environments, contract, limits)
//!     Gen->>Gen: check atoms and hosts (all missing fields at once)
//!     Gen->>Gen: render descriptor, endpoints, policies
//!     Gen->>Gen: per-stage targetServers / kvms / apiProducts
//!     Gen-->>CLI: ArtifactBundle
//!     CLI->>FS: write_bundle(out_dir)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use proxygen::config::{ConfigurationAtoms, EnvironmentName};
//! use proxygen::environment::ProxyConfiguration;
//! use proxygen::generator::generate_configuration;
//! use std::path::Path;
//!
//! let atoms = ConfigurationAtoms::new("ext", "sales", &["crm"], "order", "v2");
//! let mut config = ProxyConfiguration::from_atoms(atoms)?;
//! for env in EnvironmentName::ALL {
//!     config.environments.set_host(env, format!("crm.{env}.internal"));
//! }
//! let contract = proxygen::contract::load_contract(Path::new("openapi.yaml"))?;
//! let bundle = generate_configuration(&config, &contract)?;
//! println!("{} files, fingerprint {}", bundle.len(), bundle.fingerprint());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Logging
//!
//! Library code only emits `tracing` events. Binaries install a subscriber
//! with [`logging::init_logging`]; see that module for the `PROXYGEN_LOG_*`
//! variables.

pub mod cli;
pub mod config;
pub mod contract;
pub mod environment;
pub mod error;
pub mod generator;
pub mod grouping;
pub mod logging;
pub mod naming;
pub mod publish;
pub mod reconcile;
pub mod runtime_config;

pub use config::{ConfigurationAtoms, EnvironmentConfig, EnvironmentName};
pub use environment::{EnvironmentSet, ProxyConfiguration};
pub use error::{GenerateError, InputError, PublishError, SyncError, ValidationError};
pub use generator::{generate, generate_configuration, ArtifactBundle};
pub use publish::{publish_bundle, RemoteRepository};
pub use reconcile::{reconcile, sync_entries, SecretStore};
