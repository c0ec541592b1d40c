//! Schema-conformant synthetic findings.
//!
//! Every generator draws from an injected RNG so a seeded `StdRng` reproduces a
//! report exactly. Output shapes match the live adapters field for field.

use std::sync::LazyLock;

use chrono::{Datelike, TimeDelta};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        time::{now_utc, today},
        types::{
            AbuseReport, Breach, DarkWebData, DnsInfo, DnsRecord, DomainData, EmailData,
            EmailPatterns, EmailReputation, FindingsData, GeolocationRecord, HostExposure,
            InputType, IpData, MalwareScan, MitreTechnique, PlatformPresence,
            ScanDepth, ScanRequest, SimilarTarget, SslInfo, UsernameData, UsernamePatterns,
            WhoisInfo,
        },
    },
    sources::geolocation::{country_flag, to_ip_location},
};

pub mod catalog;

use catalog::*;

/// Everything a scan contributes to one report before scoring, whether it
/// came from live sources or the simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Findings {
    pub data: FindingsData,
    #[serde(default)]
    pub geolocation: Option<GeolocationRecord>,
    #[serde(default)]
    pub dark_web: Option<DarkWebData>,
    #[serde(default)]
    pub mitre_attack: Vec<MitreTechnique>,
    #[serde(default)]
    pub similar_targets: Vec<SimilarTarget>,
}

/// Extra sections only deep scans carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepSections {
    pub dark_web: Option<DarkWebData>,
    pub mitre_attack: Vec<MitreTechnique>,
    pub similar_targets: Vec<SimilarTarget>,
}

pub fn simulate_scan<R: Rng>(rng: &mut R, request: &ScanRequest) -> Findings {
    let target = request.target.trim();
    let depth = request.depth;

    let geolocation = match request.input_type {
        InputType::Ip => Some(simulate_geolocation(rng)),
        InputType::Domain if depth.beyond_quick() => Some(simulate_geolocation(rng)),
        _ => None,
    };

    let data = match request.input_type {
        InputType::Email => FindingsData::Email(simulate_email(rng, target, depth)),
        InputType::Domain => FindingsData::Domain(simulate_domain(rng, depth)),
        InputType::Ip => {
            let record = geolocation.clone().unwrap_or_default();
            FindingsData::Ip(simulate_ip(rng, &record))
        }
        InputType::Username => FindingsData::Username(simulate_username(rng, target, depth)),
    };

    let deep = if depth.is_deep() {
        simulate_deep_sections(rng, target, request.input_type)
    } else {
        DeepSections::default()
    };

    Findings {
        data,
        geolocation,
        dark_web: deep.dark_web,
        mitre_attack: deep.mitre_attack,
        similar_targets: deep.similar_targets,
    }
}

pub fn simulate_deep_sections<R: Rng>(
    rng: &mut R,
    target: &str,
    input_type: InputType,
) -> DeepSections {
    DeepSections {
        dark_web: Some(simulate_dark_web(rng)),
        mitre_attack: select_mitre_techniques(rng, input_type),
        similar_targets: simulate_similar_targets(rng, target, input_type),
    }
}

fn pick<'a, R: Rng, T>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

fn sample<R: Rng>(rng: &mut R, items: &[&str], p: f64) -> Vec<String> {
    items
        .iter()
        .filter(|_| rng.random_bool(p))
        .map(|s| s.to_string())
        .collect()
}

fn days_ago<R: Rng>(rng: &mut R, max_days: i64) -> String {
    let back = TimeDelta::days(rng.random_range(0..max_days));
    (now_utc() - back).format("%Y-%m-%d").to_string()
}

pub fn simulate_email<R: Rng>(rng: &mut R, email: &str, depth: ScanDepth) -> EmailData {
    let count = rng.random_range(0..=3usize);
    let breaches = BREACHES[..count]
        .iter()
        .map(|b| Breach {
            name: b.name.to_string(),
            date: b.date.to_string(),
            accounts: b.accounts,
            verified: true,
        })
        .collect();

    let reputation = EmailReputation {
        score: rng.random_range(0..=100),
        blacklisted: rng.random_bool(0.2),
        risk_tags: sample(rng, EMAIL_RISK_TAGS, 0.3),
    };

    let patterns = depth.beyond_quick().then(|| {
        let common_pattern = detect_email_pattern(email).to_string();
        EmailPatterns {
            corporate_format: matches!(common_pattern.as_str(), "firstname.lastname" | "f.lastname"),
            common_pattern,
            similarity_score: rng.random_range(0..=100),
        }
    });

    EmailData {
        breaches,
        reputation,
        patterns,
    }
}

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+\.[a-z]+$").expect("full name regex"));
static INITIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]\.[a-z]+$").expect("initial regex"));
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("numeric regex"));
static NAME_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+\d+$").expect("name number regex"));

/// Classify the local part of an address by its naming convention.
pub fn detect_email_pattern(email: &str) -> &'static str {
    let local = email.split('@').next().unwrap_or_default().to_lowercase();
    // single-letter first segment must win over the general dotted form
    if INITIAL_RE.is_match(&local) {
        "f.lastname"
    } else if FULL_NAME_RE.is_match(&local) {
        "firstname.lastname"
    } else if NUMERIC_RE.is_match(&local) {
        "numeric"
    } else if NAME_NUMBER_RE.is_match(&local) {
        "name+number"
    } else {
        "custom"
    }
}

pub fn simulate_domain<R: Rng>(rng: &mut R, depth: ScanDepth) -> DomainData {
    let year = rng.random_range(2010..=2023);
    let month = rng.random_range(1..=12u32);
    let day = rng.random_range(1..=28u32);
    let age = (now_utc().year() - year).max(0) as u32;

    let whois = WhoisInfo {
        registrar: pick(rng, REGISTRARS).to_string(),
        creation_date: format!("{year:04}-{month:02}-{day:02}"),
        country: pick(rng, REGISTRANT_COUNTRIES).to_string(),
        age,
    };

    let virus_total = MalwareScan {
        detections: rng.random_range(0..8),
        scan_date: today(),
        categories: sample(rng, SCAN_CATEGORIES, 0.3),
    };

    let mut data = DomainData {
        whois,
        virus_total,
        shodan: None,
        dns: None,
        ssl: None,
    };

    if depth.is_deep() {
        data.shodan = Some(HostExposure {
            open_ports: COMMON_PORTS
                .iter()
                .copied()
                .filter(|_| rng.random_bool(0.4))
                .collect(),
            vulnerabilities: sample(rng, KNOWN_CVES, 0.2),
        });
        data.dns = Some(DnsInfo {
            records: vec![
                DnsRecord {
                    record_type: "A".to_string(),
                    value: random_ipv4(rng),
                },
                DnsRecord {
                    record_type: "MX".to_string(),
                    value: "10 mail.protection.outlook.com".to_string(),
                },
                DnsRecord {
                    record_type: "TXT".to_string(),
                    value: "v=spf1 include:_spf.google.com ~all".to_string(),
                },
            ],
        });
        let expires = now_utc() + TimeDelta::days(rng.random_range(-30..365));
        data.ssl = Some(SslInfo {
            issuer: pick(rng, SSL_ISSUERS).to_string(),
            expires: expires.format("%Y-%m-%d").to_string(),
            valid: expires > now_utc(),
        });
    }
    data
}

fn random_ipv4<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.random_range(1..=223u8),
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(1..=254u8)
    )
}

/// IP findings consistent with `record`, the way the live path derives them.
pub fn simulate_ip<R: Rng>(rng: &mut R, record: &GeolocationRecord) -> IpData {
    let abuse = AbuseReport {
        confidence: rng.random_range(0..=100),
        reports: rng.random_range(0..100),
        last_reported: days_ago(rng, 30),
    };
    IpData {
        geolocation: to_ip_location(record),
        organization: record.organization.clone(),
        abuse,
    }
}

pub fn simulate_username<R: Rng>(rng: &mut R, username: &str, depth: ScanDepth) -> UsernameData {
    let platforms = USERNAME_PLATFORMS
        .iter()
        .map(|name| {
            let found = rng.random_bool(0.4);
            let url = found.then(|| {
                format!("https://{}.com/{}", name.to_lowercase(), username)
            });
            let last_seen = (found && rng.random_bool(0.7)).then(|| days_ago(rng, 365));
            PlatformPresence {
                name: name.to_string(),
                found,
                url,
                last_seen,
            }
        })
        .collect();

    let patterns = depth.beyond_quick().then(|| UsernamePatterns {
        format: detect_username_format(username).to_string(),
        variations: username_variations(username),
        corporate_indicators: FULL_NAME_RE.is_match(&username.to_lowercase()),
    });

    UsernameData {
        platforms,
        patterns,
    }
}

fn detect_username_format(username: &str) -> &'static str {
    let lower = username.to_lowercase();
    if FULL_NAME_RE.is_match(&lower) {
        "name.surname"
    } else if lower.contains('_') {
        "underscore_separated"
    } else if NAME_NUMBER_RE.is_match(&lower) {
        "name+number"
    } else if lower.chars().all(|c| c.is_ascii_alphabetic()) {
        "alphabetic"
    } else {
        "mixed"
    }
}

fn username_variations(username: &str) -> Vec<String> {
    vec![
        format!("{username}1"),
        format!("{username}_"),
        format!("_{username}"),
        format!("{username}123"),
        format!("the{username}"),
        username.replace(['.', '_', '-'], ""),
    ]
    .into_iter()
    .filter(|v| v != username)
    .collect()
}

pub fn simulate_geolocation<R: Rng>(rng: &mut R) -> GeolocationRecord {
    let country = pick(rng, GEO_COUNTRIES);
    GeolocationRecord {
        country: country.name.to_string(),
        country_code: country.code.to_string(),
        city: Some(country.city.to_string()),
        region: Some(country.region.to_string()),
        latitude: rng.random_range(-90.0..90.0),
        longitude: rng.random_range(-180.0..180.0),
        asn: format!("AS{}", rng.random_range(1_000..65_000u32)),
        organization: pick(rng, HOSTING_ORGS).to_string(),
        abuse_contact: None,
        risk_level: country.risk,
        flag: country_flag(country.code),
    }
}

pub fn simulate_dark_web<R: Rng>(rng: &mut R) -> DarkWebData {
    let appearances = rng.random_range(0..20u32);

    let mut sources = sample(rng, DARK_WEB_SOURCES, 0.4);
    if sources.is_empty() {
        sources.push(DARK_WEB_SOURCES[0].to_string());
    }
    let mut data_types = sample(rng, DARK_WEB_DATA_TYPES, 0.5);
    if data_types.is_empty() {
        data_types.push(DARK_WEB_DATA_TYPES[0].to_string());
    }

    let mut exposure_dates: Vec<String> = (0..appearances.min(5))
        .map(|_| days_ago(rng, 365))
        .collect();
    exposure_dates.sort();

    let last_seen = rng.random_bool(0.5).then(|| days_ago(rng, 30));
    let risk = appearances * 5 + data_types.len() as u32 * 10;

    DarkWebData {
        appearances,
        sources,
        exposure_dates,
        data_types,
        last_seen,
        risk_score: risk.min(100) as u8,
    }
}

/// Techniques relevant to `input_type`, each kept with even-ish odds.
pub fn select_mitre_techniques<R: Rng>(rng: &mut R, input_type: InputType) -> Vec<MitreTechnique> {
    MITRE_TECHNIQUES
        .iter()
        .filter(|t| t.applies_to.contains(&input_type))
        .filter(|_| rng.random_bool(0.6))
        .map(|t| MitreTechnique {
            technique_id: t.id.to_string(),
            tactic_category: t.tactic.to_string(),
            technique: t.name.to_string(),
            confidence: t.confidence,
            description: t.description.to_string(),
            mitigation: t.mitigation.to_string(),
        })
        .collect()
}

/// Five neighbours of `target`, most similar first.
pub fn simulate_similar_targets<R: Rng>(
    rng: &mut R,
    target: &str,
    input_type: InputType,
) -> Vec<SimilarTarget> {
    let mut similar: Vec<SimilarTarget> = (1..=5u32)
        .map(|i| {
            let mut factors = sample(rng, CORRELATION_FACTORS, 0.5);
            if factors.is_empty() {
                factors.push(CORRELATION_FACTORS[0].to_string());
            }
            SimilarTarget {
                target: neighbour(target, input_type, i),
                similarity: rng.random_range(60..=100),
                correlation_factors: factors,
                last_seen: days_ago(rng, 90),
            }
        })
        .collect();
    similar.sort_by(|a, b| b.similarity.cmp(&a.similarity));
    similar
}

fn neighbour(target: &str, input_type: InputType, i: u32) -> String {
    match input_type {
        InputType::Email => match target.split_once('@') {
            Some((local, domain)) => format!("{local}{i}@{domain}"),
            None => format!("{target}{i}"),
        },
        InputType::Domain => match target.split_once('.') {
            Some((label, rest)) => format!("{label}{i}.{rest}"),
            None => format!("{target}{i}"),
        },
        InputType::Ip => match target.rsplit_once('.') {
            Some((prefix, last)) => {
                let octet = last.parse::<u32>().unwrap_or(0);
                format!("{prefix}.{}", (octet + i) % 256)
            }
            None => format!("{target}{i}"),
        },
        InputType::Username => format!("{target}{i}"),
    }
}
