use serde_json::Value;

use crate::{
    config::SourceId,
    core::{
        error::FalconError,
        types::{Breach, UNKNOWN},
    },
    sources::{endpoint, flag_at, number_at, text_at, SourceClient, SourceResult},
};

/// Breached-account lookup against HaveIBeenPwned. A 404 means the address is
/// in no known breach and yields an empty list.
pub async fn check_breaches(
    client: &SourceClient,
    email: &str,
) -> Result<SourceResult<Vec<Breach>>, FalconError> {
    client
        .query(
            SourceId::HaveIBeenPwned,
            &[("email", email)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &["breachedaccount", email])?;
                Ok(http
                    .get(url)
                    .query(&[("truncateResponse", "false")])
                    .header("hibp-api-key", cfg.credential().unwrap_or_default()))
            },
            normalize_breaches,
        )
        .await
}

pub fn normalize_breaches(payload: &Value) -> Vec<Breach> {
    let Some(items) = payload.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| Breach {
            name: text_at(item, "/Name").unwrap_or_else(|| UNKNOWN.to_string()),
            date: text_at(item, "/BreachDate").unwrap_or_else(|| UNKNOWN.to_string()),
            accounts: number_at(item, "/PwnCount").unwrap_or(0),
            verified: flag_at(item, "/IsVerified").unwrap_or(false),
        })
        .collect()
}
