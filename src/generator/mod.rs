//! # Generator Module
//!
//! Turns a proxy configuration and a contract into a deterministic bundle of
//! deployable artifacts.
//!
//! ## Overview
//!
//! ```text
//! atoms + EnvironmentSet + ContractInput ──generate──▶ ArtifactBundle ──▶ write_bundle (directory)
//!                                                                   └──▶ publish_bundle (remote repository)
//! ```
//!
//! [`generate`] is a pure function: the same inputs always yield the same
//! bytes, so [`ArtifactBundle::fingerprint`] can be compared across runs and
//! publication diffs only show real changes. It fails fast with an
//! [`InputError`](crate::error::InputError) listing every missing atom and
//! every stage without a host, and with
//! [`GenerateError::Validation`](crate::error::GenerateError::Validation) when a
//! stage's secret map could not be stored; it never emits a partial bundle.
//!
//! ## Generated Structure
//!
//! ```text
//! <proxy name>/
//! ├── README.md
//! ├── proxygen.json                     # manifest
//! ├── apiproxy/
//! │   ├── <proxy name>.xml              # proxy descriptor
//! │   ├── proxies/default.xml           # one conditional flow per operation
//! │   ├── targets/default.xml           # bound to the target-server name
//! │   ├── policies/*.xml
//! │   └── resources/oas/contract.json
//! └── config/
//!     └── <env>/                        # dev1, uat1, staging, prod1
//!         ├── targetServers.json
//!         ├── kvms.json
//!         └── apiProducts.json
//! ```
//!
//! ## Template Customization
//!
//! XML and Markdown artifacts are rendered from Askama templates in the
//! `templates/` directory:
//!
//! - `README.md` - project scaffolding
//! - `apiproxy/descriptor.xml`, `apiproxy/proxy_endpoint.xml`, `apiproxy/target_endpoint.xml`
//! - `apiproxy/policies/*.xml` - one template per policy kind
//!
//! Values interpolated into the XML templates are escaped by Askama's default
//! escaper for the `.xml` extension. JSON artifacts are serialized with
//! `serde_json`.

mod bundle;
mod project;
mod templates;
#[cfg(test)]
mod tests;

pub use bundle::{write_bundle, ArtifactBundle, GeneratedFile};
pub use project::{generate, generate_configuration, generate_with_limits, MANIFEST_FILE};
