use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::types::{CacheStatus, Freshness, ReportMetadata};

/// Stamp a finished scan. `ttl` is the cache lifetime, which is also how long
/// the report is considered valid.
pub fn build_metadata(
    generated_at: DateTime<Utc>,
    ttl: Duration,
    cache_hit: bool,
    elapsed: Duration,
) -> ReportMetadata {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(2));
    let expires_at = generated_at + ttl;
    ReportMetadata {
        generated_at,
        expires_at,
        data_freshness: freshness_between(generated_at, expires_at, generated_at),
        cache_status: if cache_hit {
            CacheStatus::Hit
        } else {
            CacheStatus::Miss
        },
        scan_duration_ms: elapsed.as_millis().min(u64::MAX as u128) as u64,
    }
}

/// Freshness of a report as seen at `now`.
pub fn freshness_at(metadata: &ReportMetadata, now: DateTime<Utc>) -> Freshness {
    freshness_between(metadata.generated_at, metadata.expires_at, now)
}

/// Fresh for the first half of the validity window, stale until expiry.
fn freshness_between(
    generated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Freshness {
    if now >= expires_at {
        return Freshness::Expired;
    }
    let half = (expires_at - generated_at) / 2;
    if now < generated_at + half {
        Freshness::Fresh
    } else {
        Freshness::Stale
    }
}
