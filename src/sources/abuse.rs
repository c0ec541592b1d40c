use serde_json::Value;

use crate::{
    config::SourceId,
    core::{
        error::FalconError,
        types::{AbuseReport, UNKNOWN},
    },
    sources::{endpoint, number_at, text_at, SourceClient, SourceResult},
};

const MAX_AGE_DAYS: &str = "90";

/// AbuseIPDB `check` for one address.
pub async fn check_ip(
    client: &SourceClient,
    ip: &str,
) -> Result<SourceResult<AbuseReport>, FalconError> {
    client
        .query(
            SourceId::AbuseIpDb,
            &[("ip", ip)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &["check"])?;
                Ok(http
                    .get(url)
                    .query(&[("ipAddress", ip), ("maxAgeInDays", MAX_AGE_DAYS)])
                    .header("Key", cfg.credential().unwrap_or_default())
                    .header("Accept", "application/json"))
            },
            normalize_abuse,
        )
        .await
}

pub fn normalize_abuse(payload: &Value) -> AbuseReport {
    AbuseReport {
        confidence: number_at(payload, "/data/abuseConfidencePercentage")
            .map(|c| c.min(100) as u8)
            .unwrap_or(0),
        reports: number_at(payload, "/data/totalReports")
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        last_reported: text_at(payload, "/data/lastReportedAt")
            .unwrap_or_else(|| UNKNOWN.to_string()),
    }
}
