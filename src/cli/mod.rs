//! # CLI Module
//!
//! Command-line front end over the library. Every command reads and writes
//! the configuration document, so a session is a sequence of invocations:
//!
//! ```bash
//! # create proxy.yaml with four environments, hosts pre-filled from the contract
//! proxygen init --entity ext --domain sales --backend-app crm \
//!     --business-object order --api-version v2 --contract openapi.yaml
//!
//! # edit dev1 secret maps, then broadcast them
//! proxygen propagate
//!
//! # scope products from contract path groups
//! proxygen suggest --contract openapi.yaml
//! proxygen suggest --contract openapi.yaml --apply invoices -C proxy.yaml
//!
//! # rename: every environment follows, secret maps are re-keyed
//! proxygen update --api-version v3 --migrate-secret-maps
//!
//! # write ./ext.sales.crm.order.v3/
//! proxygen generate --contract openapi.yaml
//!
//! # compare two entry lists
//! proxygen diff saved.yaml edited.yaml
//! ```
//!
//! Settings come from `proxygen.toml` next to the document, overridden by
//! `PROXYGEN_*` environment variables.

mod commands;


pub use commands::{run_cli, run_command, AtomArgs, Cli, Commands};
