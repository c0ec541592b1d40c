use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    config::SourceId,
    core::{error::FalconError, types::HostExposure},
    sources::{endpoint, number_at, SourceClient, SourceResult},
};

const MAX_PORTS: usize = 10;
const MAX_VULNS: usize = 5;

/// Shodan host search; only run for deep domain scans.
pub async fn search_host(
    client: &SourceClient,
    query: &str,
) -> Result<SourceResult<HostExposure>, FalconError> {
    client
        .query(
            SourceId::Shodan,
            &[("query", query)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &["shodan", "host", "search"])?;
                Ok(http.get(url).query(&[
                    ("key", cfg.credential().unwrap_or_default()),
                    ("query", query),
                ]))
            },
            normalize_host_search,
        )
        .await
}

pub fn normalize_host_search(payload: &Value) -> HostExposure {
    let Some(matches) = payload.pointer("/matches").and_then(Value::as_array) else {
        return HostExposure::default();
    };

    let mut seen = BTreeSet::new();
    let mut open_ports = Vec::new();
    for port in matches
        .iter()
        .filter_map(|m| number_at(m, "/port"))
        .filter_map(|p| u16::try_from(p).ok())
    {
        if seen.insert(port) {
            open_ports.push(port);
        }
        if open_ports.len() == MAX_PORTS {
            break;
        }
    }

    let vulnerabilities = matches
        .iter()
        .filter_map(|m| m.pointer("/vulns").and_then(Value::as_object))
        .flat_map(|vulns| vulns.keys().cloned())
        .take(MAX_VULNS)
        .collect();

    HostExposure {
        open_ports,
        vulnerabilities,
    }
}
