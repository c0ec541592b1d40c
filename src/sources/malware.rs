use serde_json::Value;

use crate::{
    config::SourceId,
    core::{error::FalconError, time::today, types::MalwareScan},
    sources::{endpoint, number_at, text_at, SourceClient, SourceResult},
};

const MAX_CATEGORIES: usize = 5;

/// VirusTotal domain report.
pub async fn scan_domain(
    client: &SourceClient,
    domain: &str,
) -> Result<SourceResult<MalwareScan>, FalconError> {
    client
        .query(
            SourceId::VirusTotal,
            &[("domain", domain)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &["domain", "report"])?;
                Ok(http.get(url).query(&[
                    ("apikey", cfg.credential().unwrap_or_default()),
                    ("domain", domain),
                ]))
            },
            normalize_scan,
        )
        .await
}

/// `positives` may be absent on domain reports; detected URLs still count
/// then, one detection per flagged URL.
pub fn normalize_scan(payload: &Value) -> MalwareScan {
    let detected: Vec<&Value> = payload
        .pointer("/detected_urls")
        .and_then(Value::as_array)
        .map(|urls| urls.iter().collect())
        .unwrap_or_default();
    let detections = number_at(payload, "/positives")
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(detected.len() as u32);
    let categories = detected
        .iter()
        .filter_map(|entry| text_at(entry, "/scan_date"))
        .take(MAX_CATEGORIES)
        .collect();
    MalwareScan {
        detections,
        scan_date: text_at(payload, "/scan_date").unwrap_or_else(today),
        categories,
    }
}
