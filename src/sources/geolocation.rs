use std::{net::IpAddr, time::Duration};

use serde_json::Value;

use crate::{
    config::SourceId,
    core::{
        error::FalconError,
        types::{GeolocationRecord, IpLocation, RiskLevel, UNKNOWN},
    },
    sources::{endpoint, text_at, SourceClient, SourceResult},
};

const HIGH_RISK_COUNTRIES: &[&str] = &["RU", "KP", "IR", "SY", "BY"];
const MEDIUM_RISK_COUNTRIES: &[&str] = &["CN", "BR", "NG", "VN", "UA", "RO"];
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(3);

/// IPinfo lookup for one IPv4 address.
pub async fn lookup_ip(
    client: &SourceClient,
    ip: &str,
) -> Result<SourceResult<GeolocationRecord>, FalconError> {
    client
        .query(
            SourceId::IpInfo,
            &[("ip", ip)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &[ip])?;
                Ok(http
                    .get(url)
                    .query(&[("token", cfg.credential().unwrap_or_default())]))
            },
            normalize_ipinfo,
        )
        .await
}

/// Resolve a domain to its first IPv4 address; `None` when it does not resolve.
pub async fn resolve_ipv4(domain: &str) -> Option<String> {
    let lookup = tokio::net::lookup_host((domain, 80));
    match tokio::time::timeout(RESOLVE_TIMEOUT, lookup).await {
        Ok(Ok(addrs)) => addrs
            .map(|a| a.ip())
            .find(IpAddr::is_ipv4)
            .map(|ip| ip.to_string()),
        Ok(Err(err)) => {
            tracing::debug!(domain, "resolution failed: {}", err);
            None
        }
        Err(_) => {
            tracing::debug!(domain, "resolution timed out");
            None
        }
    }
}

pub fn normalize_ipinfo(payload: &Value) -> GeolocationRecord {
    let code = text_at(payload, "/country")
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_else(|| "XX".to_string());
    let (latitude, longitude) = text_at(payload, "/loc")
        .as_deref()
        .map(parse_loc)
        .unwrap_or((0.0, 0.0));
    let organization = text_at(payload, "/org").unwrap_or_else(|| UNKNOWN.to_string());
    let asn = organization
        .split_whitespace()
        .next()
        .filter(|first| first.starts_with("AS"))
        .unwrap_or(UNKNOWN)
        .to_string();

    GeolocationRecord {
        country: if code == "XX" { UNKNOWN.to_string() } else { code.clone() },
        country_code: code.clone(),
        city: Some(text_at(payload, "/city").unwrap_or_else(|| UNKNOWN.to_string())),
        region: Some(text_at(payload, "/region").unwrap_or_else(|| UNKNOWN.to_string())),
        latitude,
        longitude,
        asn,
        organization,
        abuse_contact: text_at(payload, "/abuse/email"),
        risk_level: country_risk(&code),
        flag: country_flag(&code),
    }
}

/// The IP-scan view of a geolocation record.
pub fn to_ip_location(record: &GeolocationRecord) -> IpLocation {
    IpLocation {
        country: record.country.clone(),
        city: record.city.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        region: record.region.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        latitude: record.latitude,
        longitude: record.longitude,
    }
}

pub fn country_risk(code: &str) -> RiskLevel {
    let code = code.to_uppercase();
    if HIGH_RISK_COUNTRIES.contains(&code.as_str()) {
        RiskLevel::High
    } else if MEDIUM_RISK_COUNTRIES.contains(&code.as_str()) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Regional-indicator flag for a two-letter code; white flag otherwise.
pub fn country_flag(code: &str) -> String {
    let code = code.to_uppercase();
    if code.len() != 2 || code == "XX" || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return "🏳️".to_string();
    }
    code.chars()
        .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

fn parse_loc(loc: &str) -> (f64, f64) {
    let mut parts = loc.split(',').map(|p| p.trim().parse::<f64>().unwrap_or(0.0));
    let lat = parts.next().unwrap_or(0.0);
    let lon = parts.next().unwrap_or(0.0);
    (lat, lon)
}
