use crate::{
    core::{
        error::FalconError,
        types::{
            DomainData, EmailData, FindingsData, GeolocationRecord, InputType, IpData, ScanRequest,
        },
    },
    sources::{
        abuse::check_ip,
        breach::check_breaches,
        email_rep::check_reputation,
        geolocation::{lookup_ip, resolve_ipv4, to_ip_location},
        host_search::search_host,
        malware::scan_domain,
        username::check_presence,
        whois::lookup_whois,
        SourceClient, SourceResult,
    },
};

/// Findings gathered from live sources for one request.
#[derive(Debug, Clone)]
pub struct LiveFindings {
    pub data: FindingsData,
    pub geolocation: Option<GeolocationRecord>,
    /// True when at least one source answered from cache.
    pub cache_hit: bool,
    /// Sources that failed softly and left defaults behind.
    pub failed_sources: Vec<String>,
}

#[derive(Default)]
struct Tally {
    cache_hit: bool,
    failed: Vec<String>,
}

impl Tally {
    fn take<T>(&mut self, result: SourceResult<T>) -> Option<T> {
        if result.cached {
            self.cache_hit = true;
        }
        if !result.success {
            tracing::warn!(
                "source {} unavailable: {}",
                result.source.label(),
                result.error.as_deref().unwrap_or("unknown error")
            );
            self.failed.push(result.source.label().to_string());
        }
        result.into_data()
    }
}

/// Fan out to the sources that apply to the request's input type.
///
/// Soft source failures leave defaults in place. The only error returned is
/// one that should abandon the live scan altogether.
pub async fn collect_live(
    client: &SourceClient,
    request: &ScanRequest,
) -> Result<LiveFindings, FalconError> {
    let mut tally = Tally::default();
    let target = request.target.trim();

    let (data, geolocation) = match request.input_type {
        InputType::Email => (
            FindingsData::Email(collect_email(client, target, &mut tally).await?),
            None,
        ),
        InputType::Domain => {
            let (domain, geo) = collect_domain(client, request, &mut tally).await?;
            (FindingsData::Domain(domain), geo)
        }
        InputType::Ip => {
            let (ip, geo) = collect_ip(client, target, &mut tally).await?;
            (FindingsData::Ip(ip), Some(geo))
        }
        InputType::Username => (FindingsData::Username(check_presence(target)), None),
    };

    Ok(LiveFindings {
        data,
        geolocation,
        cache_hit: tally.cache_hit,
        failed_sources: tally.failed,
    })
}

async fn collect_email(
    client: &SourceClient,
    email: &str,
    tally: &mut Tally,
) -> Result<EmailData, FalconError> {
    let (breaches, reputation) =
        tokio::join!(check_breaches(client, email), check_reputation(client, email));

    let mut data = EmailData::default();
    if let Some(breaches) = tally.take(breaches?) {
        data.breaches = breaches;
    }
    if let Some(reputation) = tally.take(reputation?) {
        data.reputation = reputation;
    }
    Ok(data)
}

async fn collect_domain(
    client: &SourceClient,
    request: &ScanRequest,
    tally: &mut Tally,
) -> Result<(DomainData, Option<GeolocationRecord>), FalconError> {
    let domain = request.target.trim();
    let deep = request.depth.is_deep();
    let with_geo = request.depth.beyond_quick();

    let host_search = async {
        if deep {
            Some(search_host(client, domain).await)
        } else {
            None
        }
    };
    let geolocation = async {
        if !with_geo {
            return None;
        }
        match resolve_ipv4(domain).await {
            Some(ip) => Some(lookup_ip(client, &ip).await.map(Some)),
            None => {
                tracing::info!(domain, "domain does not resolve; geolocation left at defaults");
                Some(Ok(None))
            }
        }
    };

    let (whois, scan, hosts, geo) = tokio::join!(
        lookup_whois(client, domain),
        scan_domain(client, domain),
        host_search,
        geolocation
    );

    let mut data = DomainData::default();
    if let Some(whois) = tally.take(whois?) {
        data.whois = whois;
    }
    if let Some(scan) = tally.take(scan?) {
        data.virus_total = scan;
    }
    if let Some(hosts) = hosts.transpose()? {
        data.shodan = Some(tally.take(hosts).unwrap_or_default());
    }

    let record = match geo.transpose()? {
        Some(Some(result)) => Some(tally.take(result).unwrap_or_default()),
        Some(None) => Some(GeolocationRecord::default()),
        None => None,
    };
    Ok((data, record))
}

async fn collect_ip(
    client: &SourceClient,
    ip: &str,
    tally: &mut Tally,
) -> Result<(IpData, GeolocationRecord), FalconError> {
    let (info, abuse) = tokio::join!(lookup_ip(client, ip), check_ip(client, ip));

    let record = tally.take(info?).unwrap_or_default();
    let mut data = IpData {
        geolocation: to_ip_location(&record),
        organization: record.organization.clone(),
        ..IpData::default()
    };
    if let Some(abuse) = tally.take(abuse?) {
        data.abuse = abuse;
    }
    Ok((data, record))
}
