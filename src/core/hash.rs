use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Stable cache key for a source call. Parameters are ordered by name and
/// values trimmed and lowercased, so equivalent lookups collide.
pub fn cache_key(source: &str, params: &[(&str, &str)]) -> String {
    let ordered: BTreeMap<&str, String> = params
        .iter()
        .map(|(k, v)| (*k, v.trim().to_lowercase()))
        .collect();
    let mut buf = String::new();
    buf.push_str(source);
    for (k, v) in &ordered {
        buf.push('|');
        buf.push_str(k);
        buf.push('=');
        buf.push_str(v);
    }
    format!("{}_{}", source, sha256_hex(buf.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_param_order() {
        let a = cache_key("whoisxml", &[("domain", "example.com"), ("format", "json")]);
        let b = cache_key("whoisxml", &[("format", "json"), ("domain", "Example.com ")]);
        assert_eq!(a, b);
        assert!(a.starts_with("whoisxml_"));
    }

    #[test]
    fn cache_key_separates_sources() {
        let a = cache_key("ipinfo", &[("ip", "8.8.8.8")]);
        let b = cache_key("abuseipdb", &[("ip", "8.8.8.8")]);
        assert_ne!(a, b);
    }
}
