use std::{sync::Arc, time::Duration};

use falcon_intel::config::{AppConfig, SourceConfig, SourceId};
use falcon_intel::core::engine::Engine;
use falcon_intel::core::types::{CacheStatus, EventSeverity, FindingsData, InputType, RiskLevel, ScanDepth};
use falcon_intel::sources::{cache::ResultCache, rate_limiter::RateLimiter};
use httpmock::prelude::*;
use serde_json::json;

/// Live config with every source pointed at its own prefix on `server`.
fn live_config(server: &MockServer, caching: bool) -> AppConfig {
    let mut cfg = AppConfig {
        real_apis_enabled: true,
        caching_enabled: caching,
        timeout_ms: 2000,
        user_agent: "falcon-test".to_string(),
        ..AppConfig::default()
    };
    for id in SourceId::ALL {
        cfg.sources.insert(
            id.key().to_string(),
            SourceConfig {
                base_url: format!("{}/{}", server.base_url(), id.key()),
                api_key: Some("test-key".to_string()),
                min_interval_ms: Some(0),
            },
        );
    }
    cfg
}

fn engine_with(cfg: AppConfig, limiter: RateLimiter) -> Engine {
    let cache = Arc::new(ResultCache::new(Duration::from_secs(600)));
    Engine::new(cfg, cache, Arc::new(limiter)).unwrap().with_seed(1)
}

fn mock_email_sources(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let hibp = server.mock(|when, then| {
        when.method(GET)
            .path("/hibp/breachedaccount/alice@example.com")
            .header("hibp-api-key", "test-key");
        then.status(200).json_body(json!([
            {"Name": "LinkedIn", "BreachDate": "2021-06-22", "PwnCount": 700000000, "IsVerified": true},
            {"Name": "Adobe", "BreachDate": "2013-10-04", "PwnCount": 152000000, "IsVerified": true},
            {"Name": "Dropbox", "BreachDate": "2012-07-31", "PwnCount": 68648009, "IsVerified": false}
        ]));
    });
    let rep = server.mock(|when, then| {
        when.method(GET).path("/emailrep/alice@example.com");
        then.status(200).json_body(json!({
            "reputation": "low",
            "suspicious": true,
            "details": {"blacklisted": ["spamhaus"]}
        }));
    });
    (hibp, rep)
}

#[tokio::test]
async fn live_email_scan_scores_breaches_and_blacklist() -> anyhow::Result<()> {
    let server = MockServer::start();
    let (hibp, rep) = mock_email_sources(&server);
    let engine = engine_with(live_config(&server, true), RateLimiter::default());

    let result = engine.scan_text("alice@example.com", ScanDepth::Quick).await?;

    hibp.assert();
    rep.assert();
    let email = result.data.email().expect("email findings");
    assert_eq!(email.breaches.len(), 3);
    assert!(email.reputation.blacklisted);
    assert_eq!(email.reputation.risk_tags, vec!["spamhaus"]);
    assert_eq!(result.risk_factors.breach_history, 24);
    assert_eq!(result.risk_factors.blacklist_status, 15);
    assert_eq!(result.threat_score, 39);

    let dates: Vec<&str> = result.timeline.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, ["2012-07-31", "2013-10-04", "2021-06-22"]);
    assert!(result.timeline.iter().all(|e| e.severity == EventSeverity::Critical));
    assert_eq!(result.metadata.cache_status, CacheStatus::Miss);
    Ok(())
}

#[tokio::test]
async fn second_identical_scan_is_served_from_cache() -> anyhow::Result<()> {
    let server = MockServer::start();
    let (hibp, rep) = mock_email_sources(&server);
    let engine = engine_with(live_config(&server, true), RateLimiter::default());

    let first = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;
    let second = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;

    assert_eq!(hibp.hits(), 1);
    assert_eq!(rep.hits(), 1);
    assert_eq!(first.data, second.data);
    assert_eq!(second.metadata.cache_status, CacheStatus::Hit);
    Ok(())
}

#[tokio::test]
async fn live_ip_scan_combines_geolocation_and_abuse() {
    let server = MockServer::start();
    let info = server.mock(|when, then| {
        when.method(GET).path("/ipinfo/185.220.101.1").query_param("token", "test-key");
        then.status(200).json_body(json!({
            "ip": "185.220.101.1",
            "city": "Moscow",
            "region": "Moscow",
            "country": "RU",
            "loc": "55.7558,37.6173",
            "org": "AS60729 Example Hosting"
        }));
    });
    let abuse = server.mock(|when, then| {
        when.method(GET)
            .path("/abuseipdb/check")
            .query_param("ipAddress", "185.220.101.1")
            .header("Key", "test-key");
        then.status(200).json_body(json!({
            "data": {
                "abuseConfidencePercentage": 100,
                "totalReports": 57,
                "lastReportedAt": "2024-03-01T12:00:00+00:00"
            }
        }));
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("185.220.101.1", InputType::Ip, ScanDepth::Standard).await;

    info.assert();
    abuse.assert();
    let ip = result.data.ip().expect("ip findings");
    assert_eq!(ip.geolocation.city, "Moscow");
    assert_eq!(ip.organization, "AS60729 Example Hosting");
    assert_eq!(ip.abuse.confidence, 100);
    assert_eq!(ip.abuse.reports, 57);

    let geo = result.geolocation.as_ref().expect("geolocation");
    assert_eq!(geo.asn, "AS60729");
    assert_eq!(geo.risk_level, RiskLevel::High);
    assert_eq!(result.risk_factors.geographic_risk, 20);
    assert_eq!(result.risk_factors.blacklist_status, 5);
    assert_eq!(result.threat_score, 25);
}

#[tokio::test]
async fn live_domain_scan_uses_whois_and_malware_scan() {
    let server = MockServer::start();
    let whois = server.mock(|when, then| {
        when.method(GET).path("/whoisxml").query_param("domainName", "example.com");
        then.status(200).json_body(json!({
            "WhoisRecord": {
                "registrarName": "Example Registrar, Inc.",
                "createdDate": "1995-08-14T04:00:00Z",
                "registrant": {"country": "US"}
            }
        }));
    });
    let vt = server.mock(|when, then| {
        when.method(GET).path("/virustotal/domain/report").query_param("domain", "example.com");
        then.status(200).json_body(json!({"positives": 9, "scan_date": "2024-05-01 08:00:00"}));
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("example.com", InputType::Domain, ScanDepth::Quick).await;

    whois.assert();
    vt.assert();
    let domain = result.data.domain().expect("domain findings");
    assert_eq!(domain.whois.registrar, "Example Registrar, Inc.");
    assert!(domain.whois.age >= 15);
    assert_eq!(domain.virus_total.detections, 9);
    assert!(domain.shodan.is_none());
    assert_eq!(result.risk_factors.infrastructure_age, 0);
    assert_eq!(result.risk_factors.security_scan_results, 20);
    assert_eq!(result.threat_score, 20);
    assert!(result.timeline.iter().any(|e| e.date == "1995-08-14T04:00:00Z"));
}

#[tokio::test]
async fn failing_source_leaves_defaults() {
    let server = MockServer::start();
    let hibp = server.mock(|when, then| {
        when.method(GET).path("/hibp/breachedaccount/alice@example.com");
        then.status(500);
    });
    let rep = server.mock(|when, then| {
        when.method(GET).path("/emailrep/alice@example.com");
        then.status(200).json_body(json!({"reputation": "high", "suspicious": false}));
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;

    hibp.assert();
    rep.assert();
    let email = result.data.email().unwrap();
    assert!(email.breaches.is_empty());
    assert_eq!(email.reputation.score, 80);
    assert_eq!(result.threat_score, 0);
}

#[tokio::test]
async fn hibp_not_found_means_no_breaches() {
    let server = MockServer::start();
    let hibp = server.mock(|when, then| {
        when.method(GET).path("/hibp/breachedaccount/clean@example.com");
        then.status(404);
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("clean@example.com", InputType::Email, ScanDepth::Quick).await;

    hibp.assert();
    assert!(result.data.email().unwrap().breaches.is_empty());
    assert!(result.timeline.is_empty());
}

#[tokio::test]
async fn disabled_live_mode_never_touches_network() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(200).json_body(json!({}));
    });
    let mut cfg = live_config(&server, true);
    cfg.real_apis_enabled = false;
    let engine = engine_with(cfg, RateLimiter::default());

    for (target, kind) in [
        ("alice@example.com", InputType::Email),
        ("example.com", InputType::Domain),
        ("8.8.8.8", InputType::Ip),
        ("darkfalcon", InputType::Username),
    ] {
        let result = engine.scan(target, kind, ScanDepth::Deep).await;
        assert_eq!(result.data.input_type(), kind);
        assert!(result.threat_score <= 100);
    }
    assert_eq!(any.hits(), 0);
}

#[tokio::test]
async fn rate_limit_breach_falls_back_to_simulation() {
    let server = MockServer::start();
    let (hibp, _rep) = mock_email_sources(&server);
    let limiter = RateLimiter::new(Duration::from_secs(60), 1);
    let engine = engine_with(live_config(&server, false), limiter);

    let first = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;
    assert_eq!(first.data.email().unwrap().breaches.len(), 3);

    let second = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;
    assert_eq!(hibp.hits(), 1);
    assert!(matches!(second.data, FindingsData::Email(_)));
    assert!(second.data.email().unwrap().breaches.len() <= 3);
    assert!(second.threat_score <= 100);
}

#[tokio::test]
async fn deep_sections_only_on_deep_scans() {
    let server = MockServer::start();
    let mut cfg = live_config(&server, false);
    cfg.real_apis_enabled = false;
    let engine = engine_with(cfg, RateLimiter::default());

    let standard = engine.scan("darkfalcon", InputType::Username, ScanDepth::Standard).await;
    assert!(standard.dark_web.is_none());
    assert!(standard.mitre_attack.is_empty());
    assert!(standard.similar_targets.is_empty());

    let deep = engine.scan("darkfalcon", InputType::Username, ScanDepth::Deep).await;
    assert!(deep.dark_web.is_some());
    assert_eq!(deep.similar_targets.len(), 5);
    assert!(deep
        .similar_targets
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn live_username_scan_is_degraded() {
    let server = MockServer::start();
    let any = server.mock(|when, then| {
        when.any_request();
        then.status(200);
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("darkfalcon", InputType::Username, ScanDepth::Quick).await;

    let user = result.data.username().unwrap();
    assert!(!user.platforms.is_empty());
    assert!(user.platforms.iter().all(|p| !p.found));
    assert_eq!(any.hits(), 0);
}

fn mock_domain_sources<'a>(server: &'a MockServer, domain: &str) -> (httpmock::Mock<'a>, httpmock::Mock<'a>) {
    let whois = server.mock(|when, then| {
        when.method(GET).path("/whoisxml").query_param("domainName", domain);
        then.status(200).json_body(json!({
            "WhoisRecord": {
                "registrarName": "Example Registrar, Inc.",
                "createdDate": "2023-01-10T00:00:00Z",
                "registrant": {"country": "DE"}
            }
        }));
    });
    let vt = server.mock(|when, then| {
        when.method(GET).path("/virustotal/domain/report").query_param("domain", domain);
        then.status(200).json_body(json!({"positives": 2, "scan_date": "2024-05-01 08:00:00"}));
    });
    (whois, vt)
}

#[tokio::test]
async fn repeated_deep_domain_scan_reuses_cached_sources() {
    let server = MockServer::start();
    let (whois, vt) = mock_domain_sources(&server, "localhost");
    let shodan = server.mock(|when, then| {
        when.method(GET).path("/shodan/shodan/host/search").query_param("query", "localhost");
        then.status(200).json_body(json!({"matches": [{"port": 443}]}));
    });
    let engine = engine_with(live_config(&server, true), RateLimiter::default());

    let first = engine.scan("localhost", InputType::Domain, ScanDepth::Deep).await;
    let second = engine.scan("localhost", InputType::Domain, ScanDepth::Deep).await;

    assert_eq!(whois.hits(), 1);
    assert_eq!(vt.hits(), 1);
    assert_eq!(shodan.hits(), 1);
    let (a, b) = (first.data.domain().unwrap(), second.data.domain().unwrap());
    assert_eq!(a.whois, b.whois);
    assert_eq!(a.virus_total, b.virus_total);
    assert_eq!(a.whois.registrar, "Example Registrar, Inc.");
    assert_eq!(first.metadata.cache_status, CacheStatus::Miss);
    assert_eq!(second.metadata.cache_status, CacheStatus::Hit);
}

#[tokio::test]
async fn deep_domain_scan_reports_exposed_services() {
    let server = MockServer::start();
    let (whois, vt) = mock_domain_sources(&server, "example.com");
    let shodan = server.mock(|when, then| {
        when.method(GET)
            .path("/shodan/shodan/host/search")
            .query_param("key", "test-key")
            .query_param("query", "example.com");
        then.status(200).json_body(json!({
            "matches": [
                {"port": 443, "vulns": {"CVE-2021-44228": {}}},
                {"port": 22},
                {"port": 443}
            ]
        }));
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("example.com", InputType::Domain, ScanDepth::Deep).await;

    whois.assert();
    vt.assert();
    shodan.assert();
    let exposure = result.data.domain().unwrap().shodan.as_ref().expect("host search section");
    assert_eq!(exposure.open_ports, vec![443, 22]);
    assert_eq!(exposure.vulnerabilities, vec!["CVE-2021-44228"]);
    assert!(result.dark_web.is_some());
}

#[tokio::test]
async fn standard_domain_scan_geolocates_resolved_address() {
    let server = MockServer::start();
    let (_whois, _vt) = mock_domain_sources(&server, "localhost");
    let info = server.mock(|when, then| {
        when.method(GET).path("/ipinfo/127.0.0.1").query_param("token", "test-key");
        then.status(200).json_body(json!({
            "ip": "127.0.0.1",
            "city": "Berlin",
            "region": "Berlin",
            "country": "DE",
            "loc": "52.5200,13.4050",
            "org": "AS3320 Example Carrier"
        }));
    });
    let shodan = server.mock(|when, then| {
        when.method(GET).path("/shodan/shodan/host/search");
        then.status(200).json_body(json!({"matches": []}));
    });
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("localhost", InputType::Domain, ScanDepth::Standard).await;

    info.assert();
    assert_eq!(shodan.hits(), 0);
    assert!(result.data.domain().unwrap().shodan.is_none());
    let geo = result.geolocation.as_ref().expect("geolocation");
    assert_eq!(geo.country_code, "DE");
    assert_eq!(geo.city.as_deref(), Some("Berlin"));
    assert_eq!(geo.asn, "AS3320");
    assert_eq!(geo.risk_level, RiskLevel::Low);
    assert_eq!(result.risk_factors.geographic_risk, 0);
}

#[tokio::test]
async fn slow_source_times_out_softly() {
    let server = MockServer::start();
    let _hibp = server.mock(|when, then| {
        when.method(GET).path("/hibp/breachedaccount/alice@example.com");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!([{"Name": "Adobe", "BreachDate": "2013-10-04", "PwnCount": 1}]));
    });
    let rep = server.mock(|when, then| {
        when.method(GET).path("/emailrep/alice@example.com");
        then.status(200).json_body(json!({"reputation": "high", "suspicious": false}));
    });
    let mut cfg = live_config(&server, false);
    cfg.timeout_ms = 300;
    let engine = engine_with(cfg, RateLimiter::default());

    let started = std::time::Instant::now();
    let result = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    rep.assert();
    let email = result.data.email().expect("live findings, not a simulated fallback");
    assert!(email.breaches.is_empty());
    assert_eq!(email.reputation.score, 80);
    assert_eq!(result.risk_factors.breach_history, 0);
}

#[tokio::test]
async fn quick_email_scan_has_no_geolocation() {
    let server = MockServer::start();
    let (_hibp, _rep) = mock_email_sources(&server);
    let engine = engine_with(live_config(&server, false), RateLimiter::default());

    let result = engine.scan("alice@example.com", InputType::Email, ScanDepth::Quick).await;

    assert!(result.geolocation.is_none());
    assert_eq!(result.risk_factors.geographic_risk, 0);
}
