use std::fs;
use std::path::Path;

use crate::core::error::FalconError;
use crate::core::types::{FindingsData, OsintResult};
use crate::pipeline::scorer::{threat_level, ThreatLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

pub fn render_report(result: &OsintResult, format: OutputFormat) -> Result<String, FalconError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Markdown => Ok(render_markdown(result)),
    }
}

pub fn write_report(
    result: &OsintResult,
    format: OutputFormat,
    path: &Path,
) -> Result<(), FalconError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_report(result, format)?)?;
    Ok(())
}

fn level_label(score: u8) -> &'static str {
    match threat_level(score) {
        ThreatLevel::Low => "LOW",
        ThreatLevel::Medium => "MEDIUM",
        ThreatLevel::High => "HIGH",
    }
}

fn render_markdown(result: &OsintResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Falcon-Intel Report: {}\n\n", result.target));
    out.push_str(&format!(
        "- Type: {}\n- Depth: {}\n- Generated: {}\n- Expires: {}\n- Cache: {:?}\n- Duration: {} ms\n\n",
        result.input_type,
        result.scan_depth.as_str(),
        result.metadata.generated_at.to_rfc3339(),
        result.metadata.expires_at.to_rfc3339(),
        result.metadata.cache_status,
        result.metadata.scan_duration_ms,
    ));

    let f = &result.risk_factors;
    out.push_str(&format!(
        "## Threat score: {}/100 ({})\n\n",
        result.threat_score,
        level_label(result.threat_score)
    ));
    out.push_str(&format!(
        "| Factor | Points |\n|---|---|\n| Breach history | {} |\n| Infrastructure age | {} |\n| Geographic risk | {} |\n| Blacklist status | {} |\n| Security scans | {} |\n\n",
        f.breach_history,
        f.infrastructure_age,
        f.geographic_risk,
        f.blacklist_status,
        f.security_scan_results
    ));

    out.push_str("## Findings\n\n");
    match &result.data {
        FindingsData::Email(email) => {
            out.push_str(&format!(
                "- Reputation score: {}\n- Blacklisted: {}\n",
                email.reputation.score, email.reputation.blacklisted
            ));
            if email.breaches.is_empty() {
                out.push_str("- Breaches: none\n");
            }
            for b in &email.breaches {
                out.push_str(&format!("- Breach: {} ({}, {} accounts)\n", b.name, b.date, b.accounts));
            }
        }
        FindingsData::Domain(domain) => {
            out.push_str(&format!(
                "- Registrar: {}\n- Created: {} ({} years)\n- Detections: {}\n",
                domain.whois.registrar,
                domain.whois.creation_date,
                domain.whois.age,
                domain.virus_total.detections
            ));
            if let Some(shodan) = &domain.shodan {
                let ports: Vec<String> = shodan.open_ports.iter().map(u16::to_string).collect();
                out.push_str(&format!("- Open ports: {}\n", ports.join(", ")));
                out.push_str(&format!("- Vulnerabilities: {}\n", shodan.vulnerabilities.join(", ")));
            }
        }
        FindingsData::Ip(ip) => {
            out.push_str(&format!(
                "- Location: {}, {}\n- Organization: {}\n- Abuse confidence: {}% ({} reports)\n",
                ip.geolocation.city,
                ip.geolocation.country,
                ip.organization,
                ip.abuse.confidence,
                ip.abuse.reports
            ));
        }
        FindingsData::Username(user) => {
            let found: Vec<&str> = user
                .platforms
                .iter()
                .filter(|p| p.found)
                .map(|p| p.name.as_str())
                .collect();
            if found.is_empty() {
                out.push_str("- Platforms: none found\n");
            } else {
                out.push_str(&format!("- Platforms: {}\n", found.join(", ")));
            }
        }
    }
    out.push('\n');

    if let Some(geo) = &result.geolocation {
        out.push_str(&format!(
            "## Geolocation\n\n{} {} ({}), {} / {}, risk {:?}\n\n",
            geo.flag, geo.country, geo.country_code, geo.asn, geo.organization, geo.risk_level
        ));
    }

    out.push_str("## Timeline\n\n");
    if result.timeline.is_empty() {
        out.push_str("_No events._\n");
    }
    for ev in &result.timeline {
        out.push_str(&format!(
            "- {} [{:?}] {}: {}\n",
            ev.date, ev.severity, ev.title, ev.description
        ));
    }
    out.push('\n');

    if let Some(dw) = &result.dark_web {
        out.push_str(&format!(
            "## Dark web\n\n- Appearances: {}\n- Sources: {}\n- Data types: {}\n- Risk score: {}\n\n",
            dw.appearances,
            dw.sources.join(", "),
            dw.data_types.join(", "),
            dw.risk_score
        ));
    }
    if !result.mitre_attack.is_empty() {
        out.push_str("## MITRE ATT&CK\n\n");
        for t in &result.mitre_attack {
            out.push_str(&format!("- {} {} ({})\n", t.technique_id, t.technique, t.tactic_category));
        }
        out.push('\n');
    }
    if !result.similar_targets.is_empty() {
        out.push_str("## Similar targets\n\n");
        for s in &result.similar_targets {
            out.push_str(&format!("- {} ({}%)\n", s.target, s.similarity));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        core::{
            engine::Engine,
            types::{InputType, ScanDepth},
        },
        sources::{cache::ResultCache, rate_limiter::RateLimiter},
    };

    async fn sample(depth: ScanDepth) -> OsintResult {
        let cache = Arc::new(ResultCache::new(Duration::from_secs(60)));
        Engine::new(AppConfig::default(), cache, Arc::new(RateLimiter::default()))
            .unwrap()
            .with_seed(3)
            .scan("bob@example.com", InputType::Email, depth)
            .await
    }

    #[tokio::test]
    async fn json_report_uses_camel_case() {
        let json = render_report(&sample(ScanDepth::Quick).await, OutputFormat::Json).unwrap();
        assert!(json.contains("\"threatScore\""));
        assert!(json.contains("\"riskFactors\""));
        assert!(json.contains("\"scanDuration\""));
    }

    #[tokio::test]
    async fn markdown_lists_deep_sections() {
        let md = render_report(&sample(ScanDepth::Deep).await, OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Falcon-Intel Report: bob@example.com"));
        assert!(md.contains("## Threat score:"));
        assert!(md.contains("## Dark web"));
        assert!(md.contains("## Similar targets"));
    }
}
