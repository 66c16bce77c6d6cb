//! # Path Grouping
//!
//! Clusters contract paths into API product suggestions.
//!
//! 1. [`find_smallest_common_root`] - longest segment prefix shared by every path
//! 2. [`extract_group_prefix`] - clustering key per path (one or two leading segments)
//! 3. [`build_suggestions`] - one [`SuggestedProduct`] per key, root group first
//!
//! Templated segments (`{id}`) end a prefix: nothing after a variable segment
//! is used for grouping.
//!
//! ```text
//! /invoices            ─┐
//! /invoices/{id}        ├─▶ /invoices   [GET, POST]
//! /invoices/{id}/lines ─┘
//! /health              ───▶ /health     [GET]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::{ConfigurationAtoms, EnvironmentConfig, EnvironmentName, Product};
use crate::contract::ContractPath;
use crate::error::InputError;
use crate::naming;

const ROOT: &str = "/";
const WILDCARD: &str = "/**";

/// A product suggestion derived from the contract. Nothing persists it until
/// it is applied to an [`EnvironmentConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedProduct {
    /// Lowercased prefix slug, unique within one suggestion list
    pub id: String,
    pub display_name: String,
    pub name: String,
    pub path_prefix: String,
    pub authorized_paths: Vec<String>,
    pub methods: BTreeSet<String>,
    pub paths: Vec<String>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_templated(segment: &str) -> bool {
    segment.contains('{')
}

/// `api`, `rest` and `v<digits>` carry no meaning on their own.
fn is_version_marker(segment: &str) -> bool {
    let lower = segment.to_ascii_lowercase();
    if lower == "api" || lower == "rest" {
        return true;
    }
    match lower.strip_prefix('v') {
        Some(rest) => !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn join_root(segs: &[&str]) -> String {
    if segs.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{}", segs.join("/"))
    }
}

/// Longest segment prefix shared by all paths, stopping at the first templated
/// segment. `/` when there is none.
pub fn find_smallest_common_root<S: AsRef<str>>(paths: &[S]) -> String {
    let mut iter = paths.iter();
    let Some(first) = iter.next() else {
        return ROOT.to_string();
    };
    let mut common: Vec<&str> = segments(first.as_ref())
        .take_while(|s| !is_templated(s))
        .collect();
    for path in iter {
        let shared = common
            .iter()
            .zip(segments(path.as_ref()))
            .take_while(|(a, b)| *a == b)
            .count();
        common.truncate(shared);
        if common.is_empty() {
            break;
        }
    }
    join_root(&common)
}

/// Clustering key for a path: its first meaningful segment, or the first two
/// when the first is a version/api marker.
pub fn extract_group_prefix(path: &str) -> String {
    let fixed: Vec<&str> = segments(path).take_while(|s| !is_templated(s)).collect();
    match fixed.as_slice() {
        [] => ROOT.to_string(),
        [first, second, ..] if is_version_marker(first) => join_root(&[*first, *second]),
        [first, ..] => join_root(&[*first]),
    }
}

/// `{prefix, prefix/**}`, collapsing to `{/, /**}` at the root.
pub fn authorized_paths_for(prefix: &str) -> Vec<String> {
    if prefix == ROOT {
        vec![ROOT.to_string(), WILDCARD.to_string()]
    } else {
        vec![prefix.to_string(), format!("{prefix}{WILDCARD}")]
    }
}

/// Authorized paths to use when the user selected nothing: the common root
/// when there is a single group, otherwise the group's own prefix.
pub fn default_authorized_paths(common_root: &str, group_prefix: &str, group_count: usize) -> Vec<String> {
    if group_count <= 1 {
        authorized_paths_for(common_root)
    } else {
        authorized_paths_for(group_prefix)
    }
}

fn slug(prefix: &str) -> String {
    let segs: Vec<&str> = segments(prefix).collect();
    if segs.is_empty() {
        "root".to_string()
    } else {
        segs.join("-").to_ascii_lowercase()
    }
}

fn display_name(prefix: &str) -> String {
    let segs: Vec<String> = segments(prefix)
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if segs.is_empty() {
        "Root".to_string()
    } else {
        segs.join(" ")
    }
}

#[derive(Default)]
struct Group {
    methods: BTreeSet<String>,
    paths: Vec<String>,
}

impl Group {
    fn add(&mut self, op: &ContractPath) {
        self.methods.insert(op.method.to_ascii_uppercase());
        if !self.paths.contains(&op.path) {
            self.paths.push(op.path.clone());
        }
    }
}

/// Group contract operations into product suggestions.
///
/// Groups whose prefix equals the common root merge into one root-level
/// suggestion, which comes first; the rest follow in ascending prefix order.
pub fn build_suggestions(operations: &[ContractPath]) -> Vec<SuggestedProduct> {
    if operations.is_empty() {
        return Vec::new();
    }
    let all_paths: Vec<&str> = operations.iter().map(|o| o.path.as_str()).collect();
    let common_root = find_smallest_common_root(&all_paths);

    let mut root_group: Option<Group> = None;
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for op in operations {
        let prefix = extract_group_prefix(&op.path);
        // A prefix no longer than the common root cannot narrow it further.
        if prefix == common_root || segments(&prefix).count() < segments(&common_root).count() {
            root_group.get_or_insert_with(Group::default).add(op);
        } else {
            groups.entry(prefix).or_default().add(op);
        }
    }

    let group_count = groups.len() + usize::from(root_group.is_some());
    let mut out = Vec::with_capacity(group_count);
    let mut used_ids = HashSet::new();
    if let Some(group) = root_group {
        let id = unique_id(slug(&common_root), &mut used_ids);
        out.push(suggestion(id, &common_root, &common_root, group, group_count));
    }
    for (prefix, group) in groups {
        let id = unique_id(slug(&prefix), &mut used_ids);
        out.push(suggestion(id, &prefix, &common_root, group, group_count));
    }
    out
}

/// `id`, or `id-2`, `id-3`, ... when prefixes differing only in case collide.
fn unique_id(id: String, used: &mut HashSet<String>) -> String {
    let mut candidate = id.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{id}-{n}");
        n += 1;
    }
    candidate
}

fn suggestion(
    id: String,
    prefix: &str,
    common_root: &str,
    group: Group,
    group_count: usize,
) -> SuggestedProduct {
    SuggestedProduct {
        name: id.clone(),
        id,
        display_name: display_name(prefix),
        path_prefix: prefix.to_string(),
        authorized_paths: default_authorized_paths(common_root, prefix, group_count),
        methods: group.methods,
        paths: group.paths,
    }
}

/// Copy a suggestion's authorized paths into the primary product.
pub fn apply_suggestion(config: &mut EnvironmentConfig, suggestion: &SuggestedProduct) {
    config.product.authorized_paths = suggestion.authorized_paths.clone();
}

/// Append an additional product built from a suggestion, named
/// `<primary product name>.<suggestion name>`. Replaces an earlier one of the same name.
pub fn add_suggested_product(
    config: &mut EnvironmentConfig,
    env: EnvironmentName,
    atoms: &ConfigurationAtoms,
    suggestion: &SuggestedProduct,
) -> Result<(), InputError> {
    let proxy = naming::proxy_name(atoms)?;
    let base = naming::product_name(&proxy, env);
    let product = Product {
        name: format!("{base}.{}", suggestion.name),
        display_name: format!(
            "{} {}",
            naming::product_display_name(atoms, env),
            suggestion.display_name
        ),
        description: format!(
            "{} operations of {}",
            suggestion.display_name,
            naming::product_description(atoms, env)
        ),
        approval_type: config.product.approval_type,
        authorized_paths: suggestion.authorized_paths.clone(),
        access_level: config.product.access_level,
    };
    match config
        .additional_products
        .iter_mut()
        .find(|p| p.name == product.name)
    {
        Some(existing) => *existing = product,
        None => config.additional_products.push(product),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(list: &[(&str, &str)]) -> Vec<ContractPath> {
        list.iter().map(|(m, p)| ContractPath::new(*p, *m)).collect()
    }

    #[test]
    fn test_common_root_none_shared() {
        let paths = ["/invoices", "/invoices/{id}", "/invoices/{id}/lines", "/health"];
        assert_eq!(find_smallest_common_root(&paths), "/");
    }

    #[test]
    fn test_common_root_shared_prefix() {
        let paths = ["/v1/orders", "/v1/orders/{id}", "/v1/customers"];
        assert_eq!(find_smallest_common_root(&paths), "/v1");
        let paths = ["/orders/{id}", "/orders/{id}/items"];
        assert_eq!(find_smallest_common_root(&paths), "/orders");
        let empty: [&str; 0] = [];
        assert_eq!(find_smallest_common_root(&empty), "/");
    }

    #[test]
    fn test_extract_group_prefix() {
        assert_eq!(extract_group_prefix("/invoices/{id}/lines"), "/invoices");
        assert_eq!(extract_group_prefix("/v1/orders/{id}"), "/v1/orders");
        assert_eq!(extract_group_prefix("/api/customers"), "/api/customers");
        assert_eq!(extract_group_prefix("/health"), "/health");
        assert_eq!(extract_group_prefix("/{tenant}/orders"), "/");
        assert_eq!(extract_group_prefix("/"), "/");
        assert_eq!(extract_group_prefix("/v2"), "/v2");
    }

    #[test]
    fn test_build_suggestions_groups() {
        let operations = ops(&[
            ("get", "/invoices"),
            ("post", "/invoices"),
            ("get", "/invoices/{id}"),
            ("get", "/invoices/{id}/lines"),
            ("get", "/health"),
        ]);
        let suggestions = build_suggestions(&operations);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].path_prefix, "/health");
        assert_eq!(suggestions[1].path_prefix, "/invoices");

        let invoices = &suggestions[1];
        assert_eq!(invoices.display_name, "Invoices");
        assert_eq!(invoices.id, "invoices");
        assert_eq!(
            invoices.methods.iter().cloned().collect::<Vec<_>>(),
            vec!["GET".to_string(), "POST".to_string()]
        );
        assert_eq!(
            invoices.paths,
            vec!["/invoices", "/invoices/{id}", "/invoices/{id}/lines"]
        );
        assert_eq!(invoices.authorized_paths, vec!["/invoices", "/invoices/**"]);
    }

    #[test]
    fn test_single_group_uses_common_root() {
        let operations = ops(&[("get", "/orders"), ("get", "/orders/{id}")]);
        let suggestions = build_suggestions(&operations);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].path_prefix, "/orders");
        assert_eq!(suggestions[0].authorized_paths, vec!["/orders", "/orders/**"]);
    }

    #[test]
    fn test_root_group_comes_first() {
        let operations = ops(&[
            ("get", "/v1/orders"),
            ("get", "/v1"),
            ("get", "/v1/customers/{id}"),
        ]);
        let suggestions = build_suggestions(&operations);
        let prefixes: Vec<&str> = suggestions.iter().map(|s| s.path_prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["/v1", "/v1/customers", "/v1/orders"]);
        assert_eq!(suggestions[0].authorized_paths, vec!["/v1", "/v1/**"]);
        assert_eq!(suggestions[1].display_name, "V1 Customers");
    }

    #[test]
    fn test_templated_first_segment_lands_in_root() {
        let operations = ops(&[("get", "/{tenant}/orders"), ("get", "/health")]);
        let suggestions = build_suggestions(&operations);
        assert_eq!(suggestions[0].id, "root");
        assert_eq!(suggestions[0].authorized_paths, vec!["/", "/**"]);
        assert_eq!(suggestions[1].path_prefix, "/health");
    }

    #[test]
    fn test_prefixes_differing_in_case_get_distinct_ids() {
        let operations = ops(&[("get", "/Invoices"), ("get", "/invoices"), ("get", "/health")]);
        let suggestions = build_suggestions(&operations);
        let ids: Vec<&str> = suggestions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["invoices", "health", "invoices-2"]);
        let names: BTreeSet<&str> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), suggestions.len());
    }

    #[test]
    fn test_default_authorized_paths() {
        assert_eq!(
            default_authorized_paths("/api", "/api/orders", 1),
            vec!["/api", "/api/**"]
        );
        assert_eq!(
            default_authorized_paths("/api", "/api/orders", 3),
            vec!["/api/orders", "/api/orders/**"]
        );
    }
}
