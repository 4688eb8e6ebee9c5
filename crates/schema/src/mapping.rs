//! Header-to-canonical-field mapping.
//!
//! When the caller supplies no column map, field names are inferred from the
//! header row: exact match against the alias table first, then an ordered
//! substring scan. Each canonical target is assigned at most once; the first
//! header wins. A user-supplied map replaces inference entirely.

use std::collections::{HashMap, HashSet};

use crate::records::ColumnMap;

/// Exact-match alias table: normalized header to canonical field.
const EXACT_MAPPINGS: &[(&str, &str)] = &[
    // Email
    ("email", "email"),
    ("emailaddress", "email"),
    ("mail", "email"),
    ("userprincipalname", "email"),
    ("upn", "email"),
    // User id
    ("userid", "userId"),
    ("username", "userId"),
    ("samaccountname", "userId"),
    ("login", "userId"),
    ("uid", "userId"),
    ("account", "userId"),
    ("accountname", "userId"),
    // Employee id
    ("employeeid", "employeeId"),
    ("empid", "employeeId"),
    ("personnelnumber", "employeeId"),
    // Display name
    ("displayname", "displayName"),
    ("fullname", "displayName"),
    ("name", "displayName"),
    ("cn", "displayName"),
    // Department
    ("department", "department"),
    ("dept", "department"),
    ("division", "department"),
    ("org", "department"),
    ("organizationalunit", "department"),
    ("ou", "department"),
    // Manager
    ("manager", "manager"),
    ("managername", "manager"),
    ("supervisor", "manager"),
    ("reportsto", "manager"),
    // Status
    ("status", "accountStatus"),
    ("accountstatus", "accountStatus"),
    ("enabled", "accountStatus"),
    ("active", "accountStatus"),
    ("employmentstatus", "employmentStatus"),
    ("empstatus", "employmentStatus"),
    // Role / entitlement
    ("role", "role"),
    ("rolename", "role"),
    ("group", "role"),
    ("groupname", "role"),
    ("memberof", "role"),
    ("entitlement", "entitlement"),
    ("permission", "entitlement"),
    ("access", "entitlement"),
    ("accesslevel", "entitlement"),
    ("privilege", "entitlement"),
    // Last login
    ("lastlogin", "lastLogin"),
    ("lastlogon", "lastLogin"),
    ("lastlogontimestamp", "lastLogin"),
    ("lastsignin", "lastLogin"),
    ("lastactivity", "lastLogin"),
];

/// Substring fallbacks, most specific first. Order matters: `email` must be
/// tried before `mail`, `employeeid` before `userid`, `accountstatus`
/// before `status`.
const SUBSTRING_MAPPINGS: &[(&str, &str)] = &[
    ("email", "email"),
    ("mail", "email"),
    ("upn", "email"),
    ("employeeid", "employeeId"),
    ("empid", "employeeId"),
    ("userid", "userId"),
    ("username", "userId"),
    ("login", "userId"),
    ("displayname", "displayName"),
    ("fullname", "displayName"),
    ("name", "displayName"),
    ("department", "department"),
    ("dept", "department"),
    ("division", "department"),
    ("manager", "manager"),
    ("supervisor", "manager"),
    ("reportsto", "manager"),
    ("employmentstatus", "employmentStatus"),
    ("empstatus", "employmentStatus"),
    ("accountstatus", "accountStatus"),
    ("status", "accountStatus"),
    ("enabled", "accountStatus"),
    ("entitlement", "entitlement"),
    ("permission", "entitlement"),
    ("privilege", "entitlement"),
    ("accesslevel", "entitlement"),
    ("role", "role"),
    ("group", "role"),
    ("memberof", "role"),
    ("lastlogin", "lastLogin"),
    ("lastlogon", "lastLogin"),
    ("lastsignin", "lastLogin"),
    ("lastactivity", "lastLogin"),
];

/// Lowercase a header and strip spaces, underscores, and hyphens.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect()
}

fn exact_target(normalized: &str) -> Option<&'static str> {
    EXACT_MAPPINGS
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, target)| *target)
}

/// Infer source-header to canonical-field assignments for a header row.
///
/// Headers are visited in column order; each canonical target is handed out
/// once. A header whose exact-match target is already taken still gets a
/// chance at the substring scan. Headers matching nothing stay unmapped.
pub fn infer_mappings(headers: &[String]) -> HashMap<String, String> {
    let mut result = HashMap::with_capacity(headers.len());
    let mut used: HashSet<&str> = HashSet::new();

    for header in headers {
        let normalized = normalize_header(header);

        if let Some(target) = exact_target(&normalized) {
            if used.insert(target) {
                result.insert(header.clone(), target.to_string());
                continue;
            }
        }

        for (substring, target) in SUBSTRING_MAPPINGS {
            if normalized.contains(substring) && used.insert(target) {
                result.insert(header.clone(), target.to_string());
                break;
            }
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Column-position bindings resolved once per file, applied once per row.
///
/// Built either from header inference (empty user map) or from the user's
/// direct + concat entries. Direct bindings are kept in source column order,
/// so when two columns feed the same canonical field the later column wins.
#[derive(Debug)]
pub struct FieldMapper {
    direct: Vec<(usize, String)>,
    concat: Vec<ConcatBinding>,
}

#[derive(Debug)]
struct ConcatBinding {
    source_indices: Vec<usize>,
    separator: String,
    target_field: String,
}

impl FieldMapper {
    pub fn new(map: &ColumnMap, headers: &[String]) -> FieldMapper {
        if map.is_empty() {
            let inferred = infer_mappings(headers);
            let direct = headers
                .iter()
                .enumerate()
                .filter_map(|(i, h)| inferred.get(h).map(|target| (i, target.clone())))
                .collect();
            return FieldMapper {
                direct,
                concat: Vec::new(),
            };
        }

        let direct = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| map.direct.get(h).map(|target| (i, target.clone())))
            .collect();

        let concat = map
            .concat
            .iter()
            .map(|ct| ConcatBinding {
                source_indices: ct
                    .source_columns
                    .iter()
                    .filter_map(|col| headers.iter().position(|h| h == col))
                    .collect(),
                separator: ct.separator.clone(),
                target_field: ct.target_field.clone(),
            })
            .collect();

        FieldMapper { direct, concat }
    }

    /// Produce canonical-field values for one row.
    pub fn map_row(&self, values: &[String]) -> HashMap<String, String> {
        let mut out = HashMap::new();

        for (index, target) in &self.direct {
            if let Some(value) = values.get(*index) {
                out.insert(target.clone(), value.clone());
            }
        }

        for binding in &self.concat {
            let parts: Vec<&str> = binding
                .source_indices
                .iter()
                .filter_map(|&i| values.get(i))
                .map(|s| s.as_str())
                .filter(|s| !s.is_empty())
                .collect();
            if !parts.is_empty() {
                out.insert(binding.target_field.clone(), parts.join(&binding.separator));
            }
        }

        out
    }
}
