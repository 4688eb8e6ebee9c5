//! The satellite-to-SoT join cascade.
//!
//! Each satellite row is tried against the directory in priority order:
//! exact email, exact employee id, fuzzy normalized name. The first hit
//! wins; rows that survive all three levels become orphans.

use serde::Serialize;

use attest_schema::{normalize_name, SatelliteRecord, SotRecord};

use crate::conflict::{detect_conflicts, FieldConflict};
use crate::index::SotIndex;
use crate::similarity::similarity;

/// Minimum similarity for a fuzzy match.
const FUZZY_MATCH_THRESHOLD: f64 = 0.85;
/// Minimum lead over the runner-up for a clear fuzzy winner.
const FUZZY_AMBIGUITY_GAP: f64 = 0.10;
/// Exact-key candidate lists longer than this are flagged ambiguous
/// without scoring.
const MAX_FUZZY_CANDIDATES: usize = 10;

/// How a satellite row was tied to a SoT row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactEmail,
    ExactId,
    FuzzyName,
    FuzzyAmbiguous,
    Orphan,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactEmail => "exact_email",
            Self::ExactId => "exact_id",
            Self::FuzzyName => "fuzzy_name",
            Self::FuzzyAmbiguous => "fuzzy_ambiguous",
            Self::Orphan => "orphan",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A satellite row joined to its SoT record. The SoT side borrows from the
/// index; the satellite row is copied into the result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedRecord<'a> {
    pub sot: &'a SotRecord,
    pub satellite: SatelliteRecord,
    pub match_type: MatchType,
    pub conflicts: Vec<FieldConflict>,
}

/// A satellite row with no SoT match on any cascade level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanRecord {
    pub satellite: SatelliteRecord,
    /// Keys tried before giving up, in attempt order
    /// (`email:…`, `employeeId:…`, `name:…`).
    pub attempted_matches: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStats {
    pub total_processed: usize,
    pub exact_email: usize,
    pub exact_id: usize,
    pub fuzzy_name: usize,
    pub fuzzy_ambiguous: usize,
    pub orphans: usize,
}

/// Per-satellite-file join output, in input row order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResult<'a> {
    pub matched: Vec<MatchedRecord<'a>>,
    pub orphans: Vec<OrphanRecord>,
    pub stats: JoinStats,
}

/// Join satellite rows against the SoT directory.
///
/// The satellite `user_id` is deliberately tried as a candidate employee id
/// in step two: HRIS systems that double as identity providers share that
/// namespace.
pub fn join<'a>(index: &'a SotIndex, satellites: &[SatelliteRecord]) -> JoinResult<'a> {
    let mut result = JoinResult {
        matched: Vec::new(),
        orphans: Vec::new(),
        stats: JoinStats::default(),
    };

    for sat in satellites {
        result.stats.total_processed += 1;
        let mut attempted = Vec::new();

        if !sat.email.is_empty() {
            let key = sat.email.to_lowercase();
            attempted.push(format!("email:{key}"));
            if let Some(sot) = index.lookup_email(&key) {
                result.matched.push(matched(sot, sat, MatchType::ExactEmail));
                result.stats.exact_email += 1;
                continue;
            }
        }

        if !sat.user_id.is_empty() {
            attempted.push(format!("employeeId:{}", sat.user_id));
            if let Some(sot) = index.lookup_employee_id(&sat.user_id) {
                result.matched.push(matched(sot, sat, MatchType::ExactId));
                result.stats.exact_id += 1;
                continue;
            }
        }

        if !sat.display_name.is_empty() {
            let norm = normalize_name(&sat.display_name);
            attempted.push(format!("name:{norm}"));
            if let Some(found) = fuzzy_name_match(index, &norm, sat) {
                match found.match_type {
                    MatchType::FuzzyAmbiguous => result.stats.fuzzy_ambiguous += 1,
                    _ => result.stats.fuzzy_name += 1,
                }
                result.matched.push(found);
                continue;
            }
        }

        result.orphans.push(OrphanRecord {
            satellite: sat.clone(),
            attempted_matches: attempted,
        });
        result.stats.orphans += 1;
    }

    result
}

fn matched<'a>(
    sot: &'a SotRecord,
    sat: &SatelliteRecord,
    match_type: MatchType,
) -> MatchedRecord<'a> {
    MatchedRecord {
        sot,
        satellite: sat.clone(),
        match_type,
        conflicts: detect_conflicts(sot, sat),
    }
}

/// Fuzzy match against the name multimap.
///
/// An exact normalized-key hit is resolved within its candidate list; a
/// single candidate below the threshold does not broaden. Only a missing
/// key falls back to the broad scan.
fn fuzzy_name_match<'a>(
    index: &'a SotIndex,
    norm: &str,
    sat: &SatelliteRecord,
) -> Option<MatchedRecord<'a>> {
    if norm.is_empty() {
        return None;
    }

    let Some(candidates) = index.lookup_name(norm) else {
        return broad_name_search(index, norm, sat);
    };

    if candidates.len() > MAX_FUZZY_CANDIDATES {
        // Too many same-name records to score meaningfully.
        return Some(matched(candidates[0], sat, MatchType::FuzzyAmbiguous));
    }

    if candidates.len() == 1 {
        let only = candidates[0];
        if similarity(norm, &only.normalized_name) >= FUZZY_MATCH_THRESHOLD {
            return Some(matched(only, sat, MatchType::FuzzyName));
        }
        return None;
    }

    let mut scored: Vec<(f64, &SotRecord)> = candidates
        .iter()
        .map(|c| (similarity(norm, &c.normalized_name), *c))
        .collect();
    sort_by_score(&mut scored);

    if scored[0].0 < FUZZY_MATCH_THRESHOLD {
        return None;
    }
    if scored[0].0 - scored[1].0 >= FUZZY_AMBIGUITY_GAP {
        return Some(matched(scored[0].1, sat, MatchType::FuzzyName));
    }
    Some(matched(scored[0].1, sat, MatchType::FuzzyAmbiguous))
}

/// Score the query against every name-indexed record (sorted-key traversal,
/// see [`SotIndex::name_candidates`]) and keep those above the threshold.
fn broad_name_search<'a>(
    index: &'a SotIndex,
    norm: &str,
    sat: &SatelliteRecord,
) -> Option<MatchedRecord<'a>> {
    let mut scored: Vec<(f64, &SotRecord)> = index
        .name_candidates()
        .map(|c| (similarity(norm, &c.normalized_name), c))
        .filter(|(score, _)| *score >= FUZZY_MATCH_THRESHOLD)
        .collect();

    match scored.len() {
        0 => None,
        1 => Some(matched(scored[0].1, sat, MatchType::FuzzyName)),
        _ => {
            sort_by_score(&mut scored);
            if scored[0].0 - scored[1].0 >= FUZZY_AMBIGUITY_GAP {
                Some(matched(scored[0].1, sat, MatchType::FuzzyName))
            } else {
                Some(matched(scored[0].1, sat, MatchType::FuzzyAmbiguous))
            }
        }
    }
}

/// Stable descending sort; equal scores keep insertion order, which is what
/// makes tie-breaking deterministic.
fn sort_by_score(scored: &mut [(f64, &SotRecord)]) {
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SotIndex;

    fn sot(email: &str, employee_id: &str, name: &str) -> SotRecord {
        SotRecord {
            canonical_id: email.to_string(),
            employee_id: employee_id.to_string(),
            display_name: name.to_string(),
            normalized_name: normalize_name(name),
            email: email.to_string(),
            employment_status: "active".to_string(),
            ..SotRecord::default()
        }
    }

    fn sat(email: &str, user_id: &str, name: &str) -> SatelliteRecord {
        SatelliteRecord {
            email: email.to_string(),
            user_id: user_id.to_string(),
            display_name: name.to_string(),
            source_file: "okta".to_string(),
            source_row: 1,
            ..SatelliteRecord::default()
        }
    }

    #[test]
    fn exact_email_match() {
        let index = SotIndex::build(vec![sot("alice@x.com", "E1", "Alice Smith")]);
        let result = join(&index, &[sat("alice@x.com", "", "")]);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].match_type, MatchType::ExactEmail);
        assert_eq!(result.stats.exact_email, 1);
        assert_eq!(result.stats.total_processed, 1);
    }

    #[test]
    fn email_beats_name_even_when_names_differ() {
        let index = SotIndex::build(vec![sot("alice@x.com", "E1", "Alice Smith")]);
        let result = join(&index, &[sat("alice@x.com", "", "Completely Different")]);
        assert_eq!(result.matched[0].match_type, MatchType::ExactEmail);
        assert_eq!(result.stats.fuzzy_name, 0);
        assert_eq!(result.stats.fuzzy_ambiguous, 0);
    }

    #[test]
    fn user_id_is_tried_as_employee_id() {
        let index = SotIndex::build(vec![sot("alice@x.com", "E1", "Alice Smith")]);
        let result = join(&index, &[sat("other@x.com", "E1", "")]);
        assert_eq!(result.matched[0].match_type, MatchType::ExactId);
        assert_eq!(result.stats.exact_id, 1);
    }

    #[test]
    fn fuzzy_exact_key_single_candidate() {
        let index = SotIndex::build(vec![
            sot("t@x.com", "", "Thomas Muller"),
            sot("l@x.com", "", "Lena Muller"),
        ]);
        let result = join(&index, &[sat("", "", "Thomas Müller")]);
        assert_eq!(result.matched[0].match_type, MatchType::FuzzyName);
        assert_eq!(result.matched[0].sot.email, "t@x.com");
        assert_eq!(result.stats.fuzzy_name, 1);
    }

    #[test]
    fn fuzzy_tie_is_ambiguous_and_binds_first() {
        let index = SotIndex::build(vec![
            sot("c1@x.com", "", "Chris Lee"),
            sot("c2@x.com", "", "Chris Lee"),
        ]);
        let result = join(&index, &[sat("", "", "Chris Lee")]);
        assert_eq!(result.matched[0].match_type, MatchType::FuzzyAmbiguous);
        assert_eq!(result.matched[0].sot.email, "c1@x.com");
        assert_eq!(result.stats.fuzzy_ambiguous, 1);
    }

    #[test]
    fn oversized_candidate_list_is_ambiguous_unscored() {
        let records: Vec<SotRecord> = (0..11)
            .map(|i| sot(&format!("u{i}@x.com"), "", "Sam Park"))
            .collect();
        let index = SotIndex::build(records);
        let result = join(&index, &[sat("", "", "Sam Park")]);
        assert_eq!(result.matched[0].match_type, MatchType::FuzzyAmbiguous);
        assert_eq!(result.matched[0].sot.email, "u0@x.com");
    }

    #[test]
    fn broad_search_catches_typos() {
        // "jon smith" vs "john smith": similarity 0.9.
        let index = SotIndex::build(vec![sot("j@x.com", "", "John Smith")]);
        let result = join(&index, &[sat("", "", "Jon Smith")]);
        assert_eq!(result.matched[0].match_type, MatchType::FuzzyName);
        assert_eq!(result.stats.fuzzy_name, 1);
    }

    #[test]
    fn broad_search_close_pair_is_ambiguous() {
        // Both "john smith" and "joan smith" score 0.9 against "jon smith";
        // the gap is zero, and sorted-key order binds "joan smith" first.
        let index = SotIndex::build(vec![
            sot("john@x.com", "", "John Smith"),
            sot("joan@x.com", "", "Joan Smith"),
        ]);
        let result = join(&index, &[sat("", "", "Jon Smith")]);
        assert_eq!(result.matched[0].match_type, MatchType::FuzzyAmbiguous);
        assert_eq!(result.matched[0].sot.email, "joan@x.com");
    }

    #[test]
    fn broad_search_below_threshold_is_an_orphan() {
        let index = SotIndex::build(vec![sot("a@x.com", "", "Alice Smith")]);
        let result = join(&index, &[sat("", "", "Zelda Quinn")]);
        assert_eq!(result.matched.len(), 0);
        assert_eq!(result.orphans.len(), 1);
        assert_eq!(result.stats.orphans, 1);
    }

    #[test]
    fn orphan_collects_attempted_keys() {
        let index = SotIndex::build(vec![sot("a@x.com", "E1", "Alice Smith")]);
        let result = join(&index, &[sat("ghost@ext.com", "GHOST", "Nobody Known")]);
        assert_eq!(result.matched.len(), 0);
        assert_eq!(result.orphans.len(), 1);
        assert_eq!(
            result.orphans[0].attempted_matches,
            vec![
                "email:ghost@ext.com",
                "employeeId:GHOST",
                "name:nobody known",
            ],
        );
        assert_eq!(result.stats.orphans, 1);
    }

    #[test]
    fn blank_satellite_is_an_orphan_with_no_attempts() {
        let index = SotIndex::build(vec![sot("a@x.com", "E1", "Alice Smith")]);
        let result = join(&index, &[sat("", "", "")]);
        assert_eq!(result.orphans.len(), 1);
        assert!(result.orphans[0].attempted_matches.is_empty());
    }

    #[test]
    fn stats_add_up() {
        let index = SotIndex::build(vec![
            sot("a@x.com", "E1", "Alice Smith"),
            sot("b@x.com", "E2", "Bob Jones"),
        ]);
        let satellites = vec![
            sat("a@x.com", "", ""),
            sat("", "E2", ""),
            sat("", "", "Bob Jones"),
            sat("", "", "Nobody Here"),
        ];
        let result = join(&index, &satellites);
        let stats = result.stats;
        assert_eq!(stats.total_processed, 4);
        assert_eq!(stats.exact_email, 1);
        assert_eq!(stats.exact_id, 1);
        assert_eq!(stats.fuzzy_name, 1);
        assert_eq!(stats.orphans, 1);
        assert_eq!(
            stats.exact_email + stats.exact_id + stats.fuzzy_name + stats.fuzzy_ambiguous
                + stats.orphans,
            stats.total_processed,
        );
    }

    #[test]
    fn matched_results_keep_input_row_order() {
        let index = SotIndex::build(vec![
            sot("a@x.com", "E1", "Alice Smith"),
            sot("b@x.com", "E2", "Bob Jones"),
        ]);
        let result = join(&index, &[sat("b@x.com", "", ""), sat("a@x.com", "", "")]);
        assert_eq!(result.matched[0].sot.email, "b@x.com");
        assert_eq!(result.matched[1].sot.email, "a@x.com");
    }
}
