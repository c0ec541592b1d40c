use serde::{Deserialize, Serialize};

use crate::core::types::{FindingsData, GeolocationRecord, RiskFactors, RiskLevel};

pub const BREACH_HISTORY_CAP: u8 = 25;
pub const INFRASTRUCTURE_AGE_CAP: u8 = 15;
pub const GEOGRAPHIC_RISK_CAP: u8 = 20;
pub const BLACKLIST_STATUS_CAP: u8 = 20;
pub const SECURITY_SCAN_CAP: u8 = 20;
pub const THREAT_SCORE_CAP: u8 = 100;

const BREACH_WEIGHT: u64 = 8;
const DETECTION_WEIGHT: u64 = 4;
const EMAIL_BLACKLIST_POINTS: u8 = 15;
const ABUSE_CONFIDENCE_DIVISOR: u8 = 20;

/// Coarse banding of the threat score for reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

/// Risk factors for one scan. The same formula applies to live and simulated
/// findings.
pub fn calculate_risk_factors(
    data: &FindingsData,
    geolocation: Option<&GeolocationRecord>,
) -> RiskFactors {
    let mut factors = RiskFactors::default();

    if let Some(email) = data.email() {
        let weighted = (email.breaches.len() as u64).saturating_mul(BREACH_WEIGHT);
        factors.breach_history = weighted.min(BREACH_HISTORY_CAP as u64) as u8;
    }

    if let Some(domain) = data.domain() {
        let age = domain.whois.age.min(INFRASTRUCTURE_AGE_CAP as u32) as u8;
        factors.infrastructure_age = INFRASTRUCTURE_AGE_CAP - age;

        let weighted = (domain.virus_total.detections as u64).saturating_mul(DETECTION_WEIGHT);
        factors.security_scan_results = weighted.min(SECURITY_SCAN_CAP as u64) as u8;
    }

    if let Some(geo) = geolocation {
        factors.geographic_risk = geographic_points(geo.risk_level);
    }

    let mut blacklist: u8 = 0;
    if data.email().is_some_and(|e| e.reputation.blacklisted) {
        blacklist = blacklist.saturating_add(EMAIL_BLACKLIST_POINTS);
    }
    if let Some(ip) = data.ip() {
        blacklist = blacklist.saturating_add(ip.abuse.confidence / ABUSE_CONFIDENCE_DIVISOR);
    }
    factors.blacklist_status = blacklist.min(BLACKLIST_STATUS_CAP);

    factors
}

/// Sum of the factors, each clamped to its cap first, clipped to 100.
pub fn threat_score(factors: &RiskFactors) -> u8 {
    let f = clamp_factors(*factors);
    let total = f.breach_history as u16
        + f.infrastructure_age as u16
        + f.geographic_risk as u16
        + f.blacklist_status as u16
        + f.security_scan_results as u16;
    total.min(THREAT_SCORE_CAP as u16) as u8
}

pub fn clamp_factors(factors: RiskFactors) -> RiskFactors {
    RiskFactors {
        breach_history: factors.breach_history.min(BREACH_HISTORY_CAP),
        infrastructure_age: factors.infrastructure_age.min(INFRASTRUCTURE_AGE_CAP),
        geographic_risk: factors.geographic_risk.min(GEOGRAPHIC_RISK_CAP),
        blacklist_status: factors.blacklist_status.min(BLACKLIST_STATUS_CAP),
        security_scan_results: factors.security_scan_results.min(SECURITY_SCAN_CAP),
    }
}

pub fn threat_level(score: u8) -> ThreatLevel {
    match score {
        0..=29 => ThreatLevel::Low,
        30..=69 => ThreatLevel::Medium,
        _ => ThreatLevel::High,
    }
}

fn geographic_points(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::Low => 0,
        RiskLevel::Medium => 10,
        RiskLevel::High => 20,
    }
}
