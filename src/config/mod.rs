//! # Config Module
//!
//! Data model for the proxy configuration document and the generator settings.
//!
//! - atoms, stages, target servers, products, secret maps
//! - [`load_configuration`] / [`save_configuration`] - YAML or JSON document I/O
//! - [`GeneratorSettings`] - `proxygen.toml`, auto-detected next to the document
//!
//! A document looks like:
//!
//! ```yaml
//! atoms:
//!   entity: ext
//!   domain: sales
//!   backendApps: [crm]
//!   businessObject: order
//!   version: v2
//! proxyName: ext.sales.crm.order.v2
//! environments:
//!   dev1:
//!     targetServer: { name: ext.crm.v2.backend, host: crm.dev.internal, port: 443, tlsEnabled: true }
//!     product: { name: ext.sales.crm.order.v2.dev1, displayName: order-v2-dev1, ... }
//!     secretMaps:
//!       - { name: crm.v2.backend, encrypted: true, entries: [] }
//! ```

mod load;
mod settings;
mod types;

pub use load::{load_configuration, save_configuration};
pub use settings::{
    auto_detect_settings_path, load_settings, resolve_settings, GeneratorSettings,
    PublishSettings, SETTINGS_FILE_NAME,
};
pub use types::{
    AccessLevel, ApprovalType, ConfigurationAtoms, EnvironmentConfig, EnvironmentName,
    EnvironmentSuffix, Product, SecretMap, SecretMapEntry, TargetServer, SUFFIX_TABLE,
};
