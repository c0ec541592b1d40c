use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::core::error::FalconError;

pub const DEFAULT_CONFIG_PATH: &str = "config/falcon-intel.toml";
const FALLBACK_MIN_INTERVAL_MS: u64 = 1_000;

/// Intelligence sources the engine knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    HaveIBeenPwned,
    VirusTotal,
    Shodan,
    AbuseIpDb,
    IpInfo,
    WhoisXml,
    EmailRep,
}

impl SourceId {
    pub const ALL: [SourceId; 7] = [
        SourceId::HaveIBeenPwned,
        SourceId::VirusTotal,
        SourceId::Shodan,
        SourceId::AbuseIpDb,
        SourceId::IpInfo,
        SourceId::WhoisXml,
        SourceId::EmailRep,
    ];

    /// Key used in the config file, cache keys and rate-limiter state.
    pub fn key(&self) -> &'static str {
        match self {
            SourceId::HaveIBeenPwned => "hibp",
            SourceId::VirusTotal => "virustotal",
            SourceId::Shodan => "shodan",
            SourceId::AbuseIpDb => "abuseipdb",
            SourceId::IpInfo => "ipinfo",
            SourceId::WhoisXml => "whoisxml",
            SourceId::EmailRep => "emailrep",
        }
    }

    /// Display name used in timeline events and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::HaveIBeenPwned => "HaveIBeenPwned",
            SourceId::VirusTotal => "VirusTotal",
            SourceId::Shodan => "Shodan",
            SourceId::AbuseIpDb => "AbuseIPDB",
            SourceId::IpInfo => "IPinfo",
            SourceId::WhoisXml => "WHOIS",
            SourceId::EmailRep => "EmailRep",
        }
    }

    /// Whether a live call is pointless without a credential.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, SourceId::EmailRep)
    }

    fn env_key(&self) -> String {
        format!("FALCON_{}_API_KEY", self.key().to_uppercase())
    }

    fn default_config(&self) -> SourceConfig {
        let (base_url, min_interval_ms) = match self {
            SourceId::HaveIBeenPwned => ("https://haveibeenpwned.com/api/v3", 1_500),
            SourceId::VirusTotal => ("https://www.virustotal.com/vtapi/v2", 15_000),
            SourceId::Shodan => ("https://api.shodan.io", 1_000),
            SourceId::AbuseIpDb => ("https://api.abuseipdb.com/api/v2", 1_000),
            SourceId::IpInfo => ("https://ipinfo.io", 1_000),
            SourceId::WhoisXml => ("https://www.whoisxmlapi.com/whoisserver/WhoisService", 1_000),
            SourceId::EmailRep => ("https://emailrep.io", 1_000),
        };
        SourceConfig {
            base_url: base_url.to_string(),
            api_key: None,
            min_interval_ms: Some(min_interval_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Spacing between calls; a table that leaves it out gets the source's own default.
    #[serde(default)]
    pub min_interval_ms: Option<u64>,
}

impl SourceConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms.unwrap_or(FALLBACK_MIN_INTERVAL_MS))
    }

    /// Credential with blank values treated as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub real_apis_enabled: bool,
    #[serde(default = "default_true")]
    pub caching_enabled: bool,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,
    #[serde(default = "default_rate_max_requests")]
    pub rate_max_requests: u32,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

impl AppConfig {
    /// Config for one source, falling back to built-in endpoints.
    pub fn source(&self, id: SourceId) -> SourceConfig {
        let mut cfg = self
            .sources
            .get(id.key())
            .cloned()
            .unwrap_or_else(|| id.default_config());
        if cfg.min_interval_ms.is_none() {
            cfg.min_interval_ms = id.default_config().min_interval_ms;
        }
        cfg
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 3_600)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        default_config()
    }
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, FalconError> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = path.map(Path::new).unwrap_or(default_path);

    let cfg = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| FalconError::Config(e.to_string()))?;
        let mut cfg: AppConfig =
            toml::from_str(&content).map_err(|e| FalconError::Config(e.to_string()))?;
        fill_missing_sources(&mut cfg);
        cfg
    } else {
        default_config()
    };
    Ok(apply_env_overrides(cfg, |key| std::env::var(key).ok()))
}

/// Overlay `FALCON_*` variables on top of file/default values. The lookup is
/// injected so tests do not touch the process environment.
pub fn apply_env_overrides<F>(mut cfg: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(flag) = lookup("FALCON_ENABLE_REAL_APIS").and_then(|v| parse_flag(&v)) {
        cfg.real_apis_enabled = flag;
    }
    if let Some(flag) = lookup("FALCON_ENABLE_CACHING").and_then(|v| parse_flag(&v)) {
        cfg.caching_enabled = flag;
    }
    if let Some(hours) = lookup("FALCON_CACHE_DURATION_HOURS").and_then(|v| v.trim().parse().ok()) {
        cfg.cache_ttl_hours = hours;
    }
    for id in SourceId::ALL {
        if let Some(key) = lookup(&id.env_key()).filter(|k| !k.trim().is_empty()) {
            cfg.sources
                .entry(id.key().to_string())
                .or_insert_with(|| id.default_config())
                .api_key = Some(key);
        }
    }
    cfg
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn fill_missing_sources(cfg: &mut AppConfig) {
    for id in SourceId::ALL {
        let entry = cfg
            .sources
            .entry(id.key().to_string())
            .or_insert_with(|| id.default_config());
        if entry.min_interval_ms.is_none() {
            entry.min_interval_ms = id.default_config().min_interval_ms;
        }
    }
}

fn default_config() -> AppConfig {
    let mut cfg = AppConfig {
        real_apis_enabled: false,
        caching_enabled: true,
        cache_ttl_hours: default_cache_ttl_hours(),
        timeout_ms: default_timeout_ms(),
        user_agent: default_user_agent(),
        rate_window_ms: default_rate_window_ms(),
        rate_max_requests: default_rate_max_requests(),
        sources: BTreeMap::new(),
    };
    fill_missing_sources(&mut cfg);
    cfg
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_hours() -> u64 {
    2
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "falcon-intel/1.0".to_string()
}

fn default_rate_window_ms() -> u64 {
    60_000
}

fn default_rate_max_requests() -> u32 {
    60
}
