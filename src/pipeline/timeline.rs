use crate::{
    config::SourceId,
    core::{
        time::parse_loose_date,
        types::{Confidence, EventKind, EventSeverity, FindingsData, TimelineEvent, UNKNOWN},
    },
};

/// Dated events derived from the findings, oldest first.
pub fn build_timeline(data: &FindingsData) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    if let Some(domain) = data.domain() {
        let created = domain.whois.creation_date.trim();
        if !created.is_empty() && created != UNKNOWN {
            events.push(TimelineEvent {
                id: "domain-registration".to_string(),
                date: created.to_string(),
                kind: EventKind::Registration,
                title: "Domain Registration".to_string(),
                description: format!("Domain registered with {}", domain.whois.registrar),
                confidence: Confidence::High,
                source: SourceId::WhoisXml.label().to_string(),
                severity: EventSeverity::Info,
            });
        }
    }

    if let Some(email) = data.email() {
        for (index, breach) in email.breaches.iter().enumerate() {
            events.push(TimelineEvent {
                id: format!("breach-{index}"),
                date: breach.date.clone(),
                kind: EventKind::Breach,
                title: format!("{} Data Breach", breach.name),
                description: format!(
                    "Email found in {} breach affecting {} accounts",
                    breach.name,
                    group_thousands(breach.accounts)
                ),
                confidence: if breach.verified {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
                source: SourceId::HaveIBeenPwned.label().to_string(),
                severity: EventSeverity::Critical,
            });
        }
    }

    if let Some(domain) = data.domain() {
        if domain.virus_total.detections > 0 {
            events.push(TimelineEvent {
                id: "security-detections".to_string(),
                date: domain.virus_total.scan_date.clone(),
                kind: EventKind::Malicious,
                title: "Security Threats Detected".to_string(),
                description: format!(
                    "{} security detections found by {}",
                    domain.virus_total.detections,
                    SourceId::VirusTotal.label()
                ),
                confidence: Confidence::High,
                source: SourceId::VirusTotal.label().to_string(),
                severity: EventSeverity::Warning,
            });
        }
    }

    sort_events(&mut events);
    events
}

/// Stable ascending sort by date. Undated events lead, ties keep insertion order.
pub fn sort_events(events: &mut [TimelineEvent]) {
    events.sort_by_key(|event| parse_loose_date(&event.date));
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{
        Breach, DomainData, EmailData, MalwareScan, UsernameData, WhoisInfo,
    };

    fn event(id: &str, date: &str) -> TimelineEvent {
        TimelineEvent {
            id: id.to_string(),
            date: date.to_string(),
            kind: EventKind::Scan,
            title: id.to_string(),
            description: String::new(),
            confidence: Confidence::Low,
            source: "test".into(),
            severity: EventSeverity::Info,
        }
    }

    #[test]
    fn breaches_sorted_regardless_of_input_order() {
        let data = FindingsData::Email(EmailData {
            breaches: vec![
                Breach {
                    name: "LinkedIn".into(),
                    date: "2021-06-22".into(),
                    accounts: 700_000_000,
                    verified: true,
                },
                Breach {
                    name: "Dropbox".into(),
                    date: "2012-07-31".into(),
                    accounts: 68_648_009,
                    verified: false,
                },
            ],
            ..EmailData::default()
        });
        let events = build_timeline(&data);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Dropbox Data Breach");
        assert_eq!(events[0].confidence, Confidence::Medium);
        assert_eq!(events[1].confidence, Confidence::High);
        assert!(events.iter().all(|e| e.severity == EventSeverity::Critical));
        assert!(events[1].description.contains("700,000,000"));
    }

    #[test]
    fn domain_events_registration_and_detections() {
        let data = FindingsData::Domain(DomainData {
            whois: WhoisInfo {
                registrar: "Cloudflare".into(),
                creation_date: "2015-03-02".into(),
                country: "US".into(),
                age: 11,
            },
            virus_total: MalwareScan {
                detections: 2,
                scan_date: "2024-05-01".into(),
                categories: vec![],
            },
            ..DomainData::default()
        });
        let events = build_timeline(&data);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Registration);
        assert_eq!(events[1].kind, EventKind::Malicious);
        assert_eq!(events[1].severity, EventSeverity::Warning);
    }

    #[test]
    fn unknown_registration_and_clean_scan_emit_nothing() {
        let data = FindingsData::Domain(DomainData::default());
        assert!(build_timeline(&data).is_empty());
        let data = FindingsData::Username(UsernameData::default());
        assert!(build_timeline(&data).is_empty());
    }

    #[test]
    fn sort_is_stable_and_non_decreasing() {
        let mut events = vec![
            event("c", "2022-01-01"),
            event("a", "2020-05-05T10:00:00Z"),
            event("d", "2022-01-01"),
            event("undated", "Unknown"),
            event("b", "2021-12-31 23:59:59"),
        ];
        sort_events(&mut events);
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["undated", "a", "b", "c", "d"]);
        let dates: Vec<_> = events.iter().map(|e| parse_loose_date(&e.date)).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(152_000_000), "152,000,000");
    }
}
