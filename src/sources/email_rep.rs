use serde_json::Value;

use crate::{
    config::SourceId,
    core::{error::FalconError, types::EmailReputation},
    sources::{endpoint, flag_at, text_at, SourceClient, SourceResult},
};

/// EmailRep reputation lookup. Works without a key at a lower quota; the key is
/// sent when configured.
pub async fn check_reputation(
    client: &SourceClient,
    email: &str,
) -> Result<SourceResult<EmailReputation>, FalconError> {
    client
        .query(
            SourceId::EmailRep,
            &[("email", email)],
            |http, cfg| {
                let url = endpoint(&cfg.base_url, &[email])?;
                let mut req = http.get(url).header("Accept", "application/json");
                if let Some(key) = cfg.credential() {
                    req = req.header("Key", key);
                }
                Ok(req)
            },
            normalize_reputation,
        )
        .await
}

pub fn normalize_reputation(payload: &Value) -> EmailReputation {
    let score = match text_at(payload, "/reputation").as_deref() {
        Some("high") => 80,
        Some("medium") => 50,
        _ => 20,
    };
    EmailReputation {
        score,
        blacklisted: flag_at(payload, "/suspicious").unwrap_or(false),
        risk_tags: risk_tags(payload),
    }
}

/// `details.blacklisted` is a bool in the public API and a list of list names
/// on some plans; both shapes are accepted.
fn risk_tags(payload: &Value) -> Vec<String> {
    match payload.pointer("/details/blacklisted") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Some(Value::Bool(true)) => vec!["blacklisted".to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_reputation_levels() {
        let rep = normalize_reputation(&json!({
            "reputation": "high",
            "suspicious": false,
            "details": {"blacklisted": false}
        }));
        assert_eq!(rep.score, 80);
        assert!(!rep.blacklisted);
        assert!(rep.risk_tags.is_empty());

        let rep = normalize_reputation(&json!({
            "reputation": "none",
            "suspicious": true,
            "details": {"blacklisted": true}
        }));
        assert_eq!(rep.score, 20);
        assert!(rep.blacklisted);
        assert_eq!(rep.risk_tags, vec!["blacklisted"]);
    }

    #[test]
    fn accepts_list_of_blacklists() {
        let rep = normalize_reputation(&json!({
            "reputation": "medium",
            "details": {"blacklisted": ["spamhaus", "sorbs"]}
        }));
        assert_eq!(rep.score, 50);
        assert_eq!(rep.risk_tags, vec!["spamhaus", "sorbs"]);
    }
}
