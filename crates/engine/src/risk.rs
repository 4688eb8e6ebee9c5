//! Risk scoring for join findings.
//!
//! Every rule is evaluated and the highest score wins, with two
//! short-circuits: an orphan is HIGH outright, and terminated-with-active-
//! access is CRITICAL outright. The processing timestamp is a caller input
//! so a whole review run scores against one clock.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;

use attest_schema::{SatelliteRecord, SotRecord};

use crate::join::MatchType;

/// Severity of a finding. Wire names are uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Info => "INFO",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keywords whose presence in a role or entitlement marks privileged access.
pub const DEFAULT_PRIVILEGED_KEYWORDS: &[&str] = &[
    "admin",
    "root",
    "superuser",
    "owner",
    "global_admin",
    "domain_admin",
    "system",
    "privileged",
];

const DEFAULT_DORMANCY_DAYS: i64 = 90;

/// `last_login` formats with a time component, tried after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Date-only formats; parsed values land on midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
];

/// Evaluate the rule table for one finding.
///
/// `sot` is `None` for orphans. A non-positive `dormancy_days` falls back
/// to 90; `None` keywords fall back to [`DEFAULT_PRIVILEGED_KEYWORDS`].
pub fn score(
    sot: Option<&SotRecord>,
    sat: &SatelliteRecord,
    match_type: MatchType,
    processing_millis: i64,
    dormancy_days: i64,
    keywords: Option<&[&str]>,
) -> (RiskLevel, u32) {
    let keywords = keywords.unwrap_or(DEFAULT_PRIVILEGED_KEYWORDS);
    let dormancy_days = if dormancy_days <= 0 {
        DEFAULT_DORMANCY_DAYS
    } else {
        dormancy_days
    };

    if match_type == MatchType::Orphan {
        return (RiskLevel::High, 80);
    }

    if let Some(sot) = sot {
        if sot.employment_status.to_lowercase() == "terminated"
            && matches!(sat.account_status.to_lowercase().as_str(), "active" | "enabled" | "")
        {
            return (RiskLevel::Critical, 100);
        }
    }

    let privileged = is_privileged(&sat.role, &sat.entitlement, keywords);
    let dormant = is_dormant(&sat.last_login, processing_millis, dormancy_days);

    let mut level = RiskLevel::Info;
    let mut points = 0;

    if privileged && dormant {
        level = RiskLevel::High;
        points = 80;
    } else if privileged || dormant {
        level = RiskLevel::Medium;
        points = 50;
    }

    if let Some(sot) = sot {
        if sot.employment_status.to_lowercase() == "contractor" && privileged && points < 50 {
            level = RiskLevel::Medium;
            points = 50;
        }
    }

    if match_type == MatchType::FuzzyAmbiguous && points < 20 {
        level = RiskLevel::Low;
        points = 20;
    }

    (level, points)
}

fn is_privileged(role: &str, entitlement: &str, keywords: &[&str]) -> bool {
    let role = role.to_lowercase();
    let entitlement = entitlement.to_lowercase();
    keywords.iter().any(|kw| {
        let kw = kw.to_lowercase();
        role.contains(&kw) || entitlement.contains(&kw)
    })
}

/// Dormant iff the login parses and predates the processing time minus the
/// threshold. Unparseable dates are never dormant, which keeps bad exports
/// from flooding a review with false positives.
fn is_dormant(last_login: &str, processing_millis: i64, dormancy_days: i64) -> bool {
    let Some(login) = parse_last_login(last_login) else {
        return false;
    };
    let Some(processing) = DateTime::<Utc>::from_timestamp_millis(processing_millis) else {
        return false;
    };
    let Some(window) = Duration::try_days(dormancy_days) else {
        return false;
    };
    login < processing.naive_utc() - window
}

/// Try the fixed format list in order; zoneless values are read as UTC.
fn parse_last_login(value: &str) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}
