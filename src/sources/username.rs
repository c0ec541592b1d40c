use crate::core::types::{PlatformPresence, UsernameData};

/// Platforms reported for every username scan, in display order.
pub const PLATFORMS: &[&str] = &[
    "GitHub", "Twitter", "Reddit", "Instagram", "LinkedIn", "Facebook", "TikTok", "YouTube",
    "Discord", "Steam",
];

/// Per-platform presence for a username.
///
/// Degraded by contract: the platforms above block or rate-limit anonymous
/// profile lookups, so no request is made and every platform comes back with
/// `found = false`. Callers must treat this as "not checked", not "absent".
pub fn check_presence(username: &str) -> UsernameData {
    tracing::debug!(username, "username presence checks are not performed live");
    UsernameData {
        platforms: PLATFORMS
            .iter()
            .map(|name| PlatformPresence {
                name: (*name).to_string(),
                found: false,
                url: None,
                last_seen: None,
            })
            .collect(),
        patterns: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_reported_not_found() {
        let data = check_presence("falcon_ops");
        assert_eq!(data.platforms.len(), PLATFORMS.len());
        assert!(data.platforms.iter().all(|p| !p.found && p.url.is_none()));
    }
}
