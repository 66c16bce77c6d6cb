//! # Contract Module
//!
//! Adapts a parsed API contract into the hints the rest of the pipeline uses.
//!
//! ```text
//! openapi.yaml ──load_contract──▶ ContractInput ──analyze_contract──▶ ContractAnalysis
//!                                     │                               (hosts per stage,
//!                                     │                                auth type,
//!                                     ▼                                target path)
//!                              grouping / generator
//! ```
//!
//! [`ContractInput`] is the normalized structure the core consumes. It can be
//! built directly (e.g. from another parser) or via [`load_contract`], which
//! reads an OpenAPI 3 document with `oas3`. Neither step validates the schema
//! content of the contract.

mod analyze;
mod load;
mod types;

pub use analyze::analyze_contract;
pub use load::{contract_from_value, load_contract};
pub use types::{
    AuthType, ContractAnalysis, ContractInput, ContractPath, HostHint, ServerHint,
};
