//! Static reference data the simulator draws from.

use crate::core::types::{Confidence, InputType, RiskLevel};

pub struct BreachEntry {
    pub name: &'static str,
    pub date: &'static str,
    pub accounts: u64,
}

pub const BREACHES: &[BreachEntry] = &[
    BreachEntry { name: "LinkedIn", date: "2021-06-22", accounts: 700_000_000 },
    BreachEntry { name: "Adobe", date: "2013-10-04", accounts: 152_000_000 },
    BreachEntry { name: "Dropbox", date: "2012-07-31", accounts: 68_648_009 },
    BreachEntry { name: "Yahoo", date: "2014-09-22", accounts: 500_000_000 },
    BreachEntry { name: "Equifax", date: "2017-07-29", accounts: 147_900_000 },
];

pub const EMAIL_RISK_TAGS: &[&str] = &["spam", "phishing", "malware", "suspicious"];

pub const REGISTRARS: &[&str] = &["GoDaddy LLC", "Namecheap Inc", "Google Domains", "Cloudflare"];
pub const REGISTRANT_COUNTRIES: &[&str] = &["US", "UK", "CA", "DE", "FR"];
pub const SCAN_CATEGORIES: &[&str] = &["safe", "suspicious", "malicious", "phishing"];
pub const COMMON_PORTS: &[u16] = &[80, 443, 22, 21, 25, 53, 3389];
pub const KNOWN_CVES: &[&str] = &["CVE-2021-44228", "CVE-2022-0778", "CVE-2023-1234"];
pub const SSL_ISSUERS: &[&str] = &["Let's Encrypt Authority X3", "DigiCert Inc", "Cloudflare Inc"];

pub const USERNAME_PLATFORMS: &[&str] = &[
    "GitHub", "Twitter", "Reddit", "Instagram", "LinkedIn", "Facebook", "TikTok", "YouTube",
    "Pastebin", "Discord", "Steam", "Twitch", "Pinterest", "Snapchat", "WhatsApp",
];

pub struct GeoCountry {
    pub name: &'static str,
    pub code: &'static str,
    pub city: &'static str,
    pub region: &'static str,
    pub risk: RiskLevel,
}

pub const GEO_COUNTRIES: &[GeoCountry] = &[
    GeoCountry { name: "United States", code: "US", city: "New York", region: "New York", risk: RiskLevel::Low },
    GeoCountry { name: "United Kingdom", code: "GB", city: "London", region: "England", risk: RiskLevel::Low },
    GeoCountry { name: "Germany", code: "DE", city: "Berlin", region: "Berlin", risk: RiskLevel::Low },
    GeoCountry { name: "France", code: "FR", city: "Paris", region: "Île-de-France", risk: RiskLevel::Low },
    GeoCountry { name: "Japan", code: "JP", city: "Tokyo", region: "Tokyo", risk: RiskLevel::Low },
    GeoCountry { name: "Russia", code: "RU", city: "Moscow", region: "Moscow", risk: RiskLevel::High },
    GeoCountry { name: "China", code: "CN", city: "Beijing", region: "Beijing", risk: RiskLevel::Medium },
    GeoCountry { name: "Brazil", code: "BR", city: "São Paulo", region: "São Paulo", risk: RiskLevel::Medium },
];
pub const HOSTING_ORGS: &[&str] = &[
    "Cloudflare Inc.",
    "Amazon Technologies Inc.",
    "Google LLC",
    "Microsoft Corporation",
    "Digital Ocean",
];

pub const DARK_WEB_SOURCES: &[&str] = &["Tor Markets", "Paste Sites", "Forums", "Telegram", "Discord", "IRC"];
pub const DARK_WEB_DATA_TYPES: &[&str] = &["Credentials", "Personal Info", "Financial", "Corporate"];

pub const CORRELATION_FACTORS: &[&str] = &[
    "Infrastructure Pattern",
    "Temporal Relationship",
    "Geographic Cluster",
];

pub struct Technique {
    pub id: &'static str,
    pub tactic: &'static str,
    pub name: &'static str,
    pub confidence: Confidence,
    pub description: &'static str,
    pub mitigation: &'static str,
    /// Target kinds the technique is plausibly correlated with.
    pub applies_to: &'static [InputType],
}

const ALL_TYPES: &[InputType] = &[
    InputType::Email,
    InputType::Domain,
    InputType::Ip,
    InputType::Username,
];

pub const MITRE_TECHNIQUES: &[Technique] = &[
    Technique {
        id: "T1566.001",
        tactic: "Initial Access",
        name: "Spearphishing Attachment",
        confidence: Confidence::High,
        description: "Adversaries may send spearphishing emails with a malicious attachment in an attempt to gain access to victim systems.",
        mitigation: "Implement email security solutions and user awareness training.",
        applies_to: &[InputType::Email, InputType::Domain],
    },
    Technique {
        id: "T1078",
        tactic: "Defense Evasion",
        name: "Valid Accounts",
        confidence: Confidence::Medium,
        description: "Adversaries may obtain and abuse credentials of existing accounts as a means of gaining Initial Access.",
        mitigation: "Implement multi-factor authentication and monitor account usage.",
        applies_to: ALL_TYPES,
    },
    Technique {
        id: "T1110",
        tactic: "Credential Access",
        name: "Brute Force",
        confidence: Confidence::Medium,
        description: "Adversaries may use brute force techniques to gain access to accounts when passwords are unknown.",
        mitigation: "Implement account lockout policies and monitor failed login attempts.",
        applies_to: &[InputType::Email, InputType::Ip, InputType::Username],
    },
    Technique {
        id: "T1589.002",
        tactic: "Reconnaissance",
        name: "Gather Victim Identity Information: Email Addresses",
        confidence: Confidence::Medium,
        description: "Adversaries may gather email addresses that can be used during targeting.",
        mitigation: "Limit the public exposure of staff email addresses.",
        applies_to: &[InputType::Email],
    },
    Technique {
        id: "T1583.001",
        tactic: "Resource Development",
        name: "Acquire Infrastructure: Domains",
        confidence: Confidence::Low,
        description: "Adversaries may acquire domains that can be used during targeting, including lookalikes of legitimate brands.",
        mitigation: "Monitor newly registered lookalike domains.",
        applies_to: &[InputType::Domain],
    },
    Technique {
        id: "T1595.002",
        tactic: "Reconnaissance",
        name: "Active Scanning: Vulnerability Scanning",
        confidence: Confidence::Medium,
        description: "Adversaries may scan victims for vulnerabilities that can be used during targeting.",
        mitigation: "Minimise exposed services and patch internet-facing hosts.",
        applies_to: &[InputType::Domain, InputType::Ip],
    },
    Technique {
        id: "T1593",
        tactic: "Reconnaissance",
        name: "Search Open Websites/Domains",
        confidence: Confidence::Low,
        description: "Adversaries may search social media and public sites for information about victims.",
        mitigation: "Review what personal and corporate details are published publicly.",
        applies_to: &[InputType::Username, InputType::Email],
    },
];
