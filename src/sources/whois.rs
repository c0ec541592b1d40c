use serde_json::Value;

use crate::{
    config::SourceId,
    core::{
        error::FalconError,
        time::{parse_loose_date, years_since},
        types::{WhoisInfo, UNKNOWN},
    },
    sources::{endpoint, text_at, SourceClient, SourceResult},
};

pub async fn lookup_whois(
    client: &SourceClient,
    domain: &str,
) -> Result<SourceResult<WhoisInfo>, FalconError> {
    client
        .query(
            SourceId::WhoisXml,
            &[("domain", domain)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &[])?;
                Ok(http.get(url).query(&[
                    ("apiKey", cfg.credential().unwrap_or_default()),
                    ("domainName", domain),
                    ("outputFormat", "JSON"),
                ]))
            },
            normalize_whois,
        )
        .await
}

/// Registry data wins over the top-level record when both are present.
pub fn normalize_whois(payload: &Value) -> WhoisInfo {
    let pick = |field: &str| {
        text_at(payload, &format!("/WhoisRecord/registryData/{field}"))
            .or_else(|| text_at(payload, &format!("/WhoisRecord/{field}")))
    };
    let creation_date = pick("createdDate");
    let age = creation_date
        .as_deref()
        .and_then(parse_loose_date)
        .map(years_since)
        .unwrap_or(0);
    WhoisInfo {
        registrar: pick("registrarName").unwrap_or_else(|| UNKNOWN.to_string()),
        creation_date: creation_date.unwrap_or_else(|| UNKNOWN.to_string()),
        country: pick("registrant/country").unwrap_or_else(|| UNKNOWN.to_string()),
        age,
    }
}
