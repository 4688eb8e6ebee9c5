//! Name normalization and canonical record construction.
//!
//! Display names arrive as `"Müller, Thomas"`, `"Thomas Muller Jr."`, or
//! `"THOMAS J. MULLER"` depending on the exporting system; all three must
//! land on the same comparison key for the fuzzy join to work.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use attest_ingest::ParsedCsv;

use crate::mapping::FieldMapper;
use crate::records::{ColumnMap, SatelliteRecord, SotRecord};

/// Generational and professional suffixes stripped from name tails.
const NAME_SUFFIXES: &[&str] = &[
    "jr", "sr", "ii", "iii", "iv", "v", "phd", "md", "dds", "esq", "cpa",
];

/// A single lowercase letter, an optional period, then whitespace.
fn middle_initial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-z]\.?\s").expect("middle-initial pattern"))
}

/// Build the comparison key for a display name.
///
/// Lowercases and trims, strips diacritics (NFD, drop combining marks),
/// strips trailing name suffixes, removes middle initials, collapses
/// whitespace, and folds a single `Last, First` comma into `first last`.
/// Empty input returns empty output, and the transformation is idempotent
/// on its own output.
pub fn normalize_name(name: &str) -> String {
    let mut current = name.trim().to_lowercase();
    if current.is_empty() {
        return current;
    }
    // The comma swap can expose a fresh middle initial or suffix
    // ("smith, john q." becomes "john q. smith"), so run passes until the
    // key is stable. Every changing pass removes a character or a comma,
    // which bounds the loop.
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn normalize_pass(name: &str) -> String {
    let mut s = name.trim().to_lowercase();

    // é -> e + combining acute -> e
    s = s.nfd().filter(|c| !is_combining_mark(*c)).collect();

    for suffix in NAME_SUFFIXES {
        if let Some(stripped) = s.strip_suffix(&format!(" {suffix}")) {
            s = stripped.to_string();
        } else if let Some(stripped) = s.strip_suffix(&format!(",{suffix}")) {
            s = stripped.to_string();
        }
    }

    s = middle_initial_re().replace_all(&s, "").into_owned();

    s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    // Exactly one comma means `Last, First`.
    if s.matches(',').count() == 1 {
        if let Some((last, first)) = s.split_once(',') {
            let (first, last) = (first.trim(), last.trim());
            if !first.is_empty() && !last.is_empty() {
                s = format!("{first} {last}");
            }
        }
    }

    s.trim().to_string()
}

// ---------------------------------------------------------------------------
// Admin columns
// ---------------------------------------------------------------------------

/// Positions of columns whose header contains `admin` (case-insensitive),
/// ordered by header name so the joined value is stable across exports.
fn admin_column_indices(headers: &[String]) -> Vec<usize> {
    let mut columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.to_lowercase().contains("admin"))
        .map(|(i, _)| i)
        .collect();
    columns.sort_by(|&a, &b| headers[a].cmp(&headers[b]));
    columns
}

fn collect_admin_values(columns: &[usize], values: &[String]) -> String {
    let parts: Vec<&str> = columns
        .iter()
        .filter_map(|&i| values.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    parts.join("; ")
}

// ---------------------------------------------------------------------------
// Record construction
// ---------------------------------------------------------------------------

fn mapped_field(mapped: &std::collections::HashMap<String, String>, field: &str) -> String {
    mapped
        .get(field)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Build canonical SoT records from parsed CSV rows.
///
/// A record whose canonical id comes out empty is still produced: it is
/// unreachable by email or id lookup but can participate in name lookups.
pub fn build_sot_records(parsed: &ParsedCsv, map: &ColumnMap) -> Vec<SotRecord> {
    let mapper = FieldMapper::new(map, &parsed.headers);
    let admin_columns = admin_column_indices(&parsed.headers);

    parsed
        .rows
        .iter()
        .map(|row| {
            let mapped = mapper.map_row(&row.values);

            let email = mapped_field(&mapped, "email").to_lowercase();
            let employee_id = mapped_field(&mapped, "employeeId");
            let display_name = mapped_field(&mapped, "displayName");
            let canonical_id = if email.is_empty() {
                employee_id.clone()
            } else {
                email.clone()
            };

            SotRecord {
                canonical_id,
                employee_id,
                normalized_name: normalize_name(&display_name),
                display_name,
                email,
                department: mapped_field(&mapped, "department"),
                manager: mapped_field(&mapped, "manager"),
                employment_status: mapped_field(&mapped, "employmentStatus").to_lowercase(),
                admin_info: collect_admin_values(&admin_columns, &row.values),
            }
        })
        .collect()
}

/// Build satellite records from parsed CSV rows.
///
/// The mapped role value is extended with admin-column values; when either
/// side is empty the other is used alone.
pub fn build_satellite_records(
    parsed: &ParsedCsv,
    system_name: &str,
    map: &ColumnMap,
) -> Vec<SatelliteRecord> {
    let mapper = FieldMapper::new(map, &parsed.headers);
    let admin_columns = admin_column_indices(&parsed.headers);

    parsed
        .rows
        .iter()
        .map(|row| {
            let mapped = mapper.map_row(&row.values);

            let role = mapped_field(&mapped, "role");
            let admin_values = collect_admin_values(&admin_columns, &row.values);
            let role = match (role.is_empty(), admin_values.is_empty()) {
                (false, false) => format!("{role}; {admin_values}"),
                (true, false) => admin_values,
                _ => role,
            };

            SatelliteRecord {
                email: mapped_field(&mapped, "email").to_lowercase(),
                user_id: mapped_field(&mapped, "userId"),
                display_name: mapped_field(&mapped, "displayName"),
                role,
                entitlement: mapped_field(&mapped, "entitlement"),
                last_login: mapped_field(&mapped, "lastLogin"),
                account_status: mapped_field(&mapped, "accountStatus").to_lowercase(),
                source_file: system_name.to_string(),
                source_row: row.row_number,
            }
        })
        .collect()
}
