use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{error::FalconError, time::today};

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Email,
    Domain,
    Ip,
    Username,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Email => "email",
            InputType::Domain => "domain",
            InputType::Ip => "ip",
            InputType::Username => "username",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = FalconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(InputType::Email),
            "domain" => Ok(InputType::Domain),
            "ip" => Ok(InputType::Ip),
            "username" => Ok(InputType::Username),
            other => Err(FalconError::Validation(format!("unknown input type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScanDepth {
    Quick,
    Standard,
    Deep,
}

impl ScanDepth {
    pub fn is_deep(&self) -> bool {
        *self == ScanDepth::Deep
    }

    /// Standard and deep scans; quick scans skip the secondary lookups.
    pub fn beyond_quick(&self) -> bool {
        *self != ScanDepth::Quick
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanDepth::Quick => "quick",
            ScanDepth::Standard => "standard",
            ScanDepth::Deep => "deep",
        }
    }
}

impl fmt::Display for ScanDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanDepth {
    type Err = FalconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(ScanDepth::Quick),
            "standard" => Ok(ScanDepth::Standard),
            "deep" => Ok(ScanDepth::Deep),
            other => Err(FalconError::Validation(format!("unknown scan depth: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub input_type: InputType,
    pub depth: ScanDepth,
}

/// Full report for one scanned target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OsintResult {
    pub input_type: InputType,
    pub target: String,
    pub scan_depth: ScanDepth,
    pub timestamp: DateTime<Utc>,
    pub threat_score: u8,
    pub risk_factors: RiskFactors,
    pub data: FindingsData,
    pub timeline: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<GeolocationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_web: Option<DarkWebData>,
    #[serde(default)]
    pub mitre_attack: Vec<MitreTechnique>,
    #[serde(default)]
    pub similar_targets: Vec<SimilarTarget>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub breach_history: u8,
    pub infrastructure_age: u8,
    pub geographic_risk: u8,
    pub blacklist_status: u8,
    pub security_scan_results: u8,
}

/// Per-type findings; exactly one variant is populated per scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FindingsData {
    Email(EmailData),
    Domain(DomainData),
    Ip(IpData),
    Username(UsernameData),
}

impl FindingsData {
    pub fn input_type(&self) -> InputType {
        match self {
            FindingsData::Email(_) => InputType::Email,
            FindingsData::Domain(_) => InputType::Domain,
            FindingsData::Ip(_) => InputType::Ip,
            FindingsData::Username(_) => InputType::Username,
        }
    }

    pub fn email(&self) -> Option<&EmailData> {
        match self {
            FindingsData::Email(data) => Some(data),
            _ => None,
        }
    }

    pub fn domain(&self) -> Option<&DomainData> {
        match self {
            FindingsData::Domain(data) => Some(data),
            _ => None,
        }
    }

    pub fn ip(&self) -> Option<&IpData> {
        match self {
            FindingsData::Ip(data) => Some(data),
            _ => None,
        }
    }

    pub fn username(&self) -> Option<&UsernameData> {
        match self {
            FindingsData::Username(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailData {
    pub breaches: Vec<Breach>,
    pub reputation: EmailReputation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<EmailPatterns>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Breach {
    pub name: String,
    pub date: String,
    pub accounts: u64,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmailReputation {
    pub score: u8,
    pub blacklisted: bool,
    pub risk_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmailPatterns {
    pub corporate_format: bool,
    pub common_pattern: String,
    pub similarity_score: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainData {
    pub whois: WhoisInfo,
    pub virus_total: MalwareScan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shodan: Option<HostExposure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhoisInfo {
    pub registrar: String,
    pub creation_date: String,
    pub country: String,
    /// Whole years since registration.
    pub age: u32,
}

impl Default for WhoisInfo {
    fn default() -> Self {
        Self {
            registrar: UNKNOWN.to_string(),
            creation_date: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            age: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MalwareScan {
    pub detections: u32,
    pub scan_date: String,
    pub categories: Vec<String>,
}

impl Default for MalwareScan {
    fn default() -> Self {
        Self {
            detections: 0,
            scan_date: today(),
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostExposure {
    pub open_ports: Vec<u16>,
    pub vulnerabilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsInfo {
    pub records: Vec<DnsRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SslInfo {
    pub issuer: String,
    pub expires: String,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IpData {
    pub geolocation: IpLocation,
    pub organization: String,
    pub abuse: AbuseReport,
}

impl Default for IpData {
    fn default() -> Self {
        Self {
            geolocation: IpLocation::default(),
            organization: UNKNOWN.to_string(),
            abuse: AbuseReport::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpLocation {
    pub country: String,
    pub city: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for IpLocation {
    fn default() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AbuseReport {
    /// Abuse confidence percentage, 0..=100.
    pub confidence: u8,
    pub reports: u32,
    pub last_reported: String,
}

impl Default for AbuseReport {
    fn default() -> Self {
        Self {
            confidence: 0,
            reports: 0,
            last_reported: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsernameData {
    pub platforms: Vec<PlatformPresence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patterns: Option<UsernamePatterns>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPresence {
    pub name: String,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsernamePatterns {
    pub format: String,
    pub variations: Vec<String>,
    pub corporate_indicators: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Registration,
    Breach,
    Malicious,
    Suspicious,
    Scan,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    pub confidence: Confidence,
    pub source: String,
    pub severity: EventSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationRecord {
    pub country: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub asn: String,
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abuse_contact: Option<String>,
    pub risk_level: RiskLevel,
    pub flag: String,
}

impl Default for GeolocationRecord {
    fn default() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            country_code: "XX".to_string(),
            city: Some(UNKNOWN.to_string()),
            region: Some(UNKNOWN.to_string()),
            latitude: 0.0,
            longitude: 0.0,
            asn: UNKNOWN.to_string(),
            organization: UNKNOWN.to_string(),
            abuse_contact: None,
            risk_level: RiskLevel::Low,
            flag: "🏳️".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DarkWebData {
    pub appearances: u32,
    pub sources: Vec<String>,
    pub exposure_dates: Vec<String>,
    pub data_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    pub risk_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MitreTechnique {
    pub technique_id: String,
    pub tactic_category: String,
    pub technique: String,
    pub confidence: Confidence,
    pub description: String,
    pub mitigation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimilarTarget {
    pub target: String,
    pub similarity: u8,
    pub correlation_factors: Vec<String>,
    pub last_seen: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Fresh,
    Stale,
    Expired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub data_freshness: Freshness,
    pub cache_status: CacheStatus,
    #[serde(rename = "scanDuration")]
    pub scan_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_serialize_under_type_key() {
        let data = FindingsData::Ip(IpData::default());
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("ip").is_some());
        assert_eq!(json["ip"]["abuse"]["lastReported"], UNKNOWN);
    }

    #[test]
    fn depth_and_type_parse_case_insensitively() {
        assert_eq!("DEEP".parse::<ScanDepth>().unwrap(), ScanDepth::Deep);
        assert_eq!(" ip ".parse::<InputType>().unwrap(), InputType::Ip);
        assert!("phone".parse::<InputType>().is_err());
        assert!(ScanDepth::Standard.beyond_quick());
        assert!(!ScanDepth::Quick.beyond_quick());
    }
}
