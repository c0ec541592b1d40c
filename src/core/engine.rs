use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::AppConfig,
    core::{
        error::FalconError,
        input::classify,
        time::now_utc,
        types::{InputType, OsintResult, ScanDepth, ScanRequest},
    },
    pipeline::{
        collector::collect_live,
        metadata::build_metadata,
        scorer::{calculate_risk_factors, threat_score},
        timeline::build_timeline,
    },
    simulation::{simulate_deep_sections, simulate_scan, Findings},
    sources::{cache::ResultCache, rate_limiter::RateLimiter, SourceClient},
};

/// Coarse lifecycle of one scan, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Classifying,
    Dispatching,
    Aggregating,
    Scoring,
    Finalizing,
}

/// Findings after dispatch, whichever path produced them.
struct Gathered {
    scan: Findings,
    cache_hit: bool,
    simulated: bool,
}

pub struct Engine {
    client: SourceClient,
    pub config: AppConfig,
    cache: Arc<ResultCache>,
    rng: Mutex<StdRng>,
}

impl Engine {
    pub fn new(
        config: AppConfig,
        cache: Arc<ResultCache>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, FalconError> {
        let client = SourceClient::new(config.clone(), cache.clone(), limiter)?;
        Ok(Self {
            client,
            config,
            cache,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// Fix the simulator's RNG so simulated reports are reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Classify `raw` and scan it. Unrecognised text is rejected before any
    /// source is touched.
    pub async fn scan_text(&self, raw: &str, depth: ScanDepth) -> Result<OsintResult, FalconError> {
        log_state(ScanState::Classifying, raw);
        let input_type = classify(raw).ok_or_else(|| {
            FalconError::Validation(format!("unrecognised target: {:?}", raw.trim()))
        })?;
        Ok(self.scan(raw, input_type, depth).await)
    }

    /// Run one scan end to end. Never fails: a live path that has to be
    /// abandoned is replaced wholesale by simulated findings.
    pub async fn scan(&self, target: &str, input_type: InputType, depth: ScanDepth) -> OsintResult {
        let started = Instant::now();
        let generated_at = now_utc();
        let request = ScanRequest {
            target: target.trim().to_string(),
            input_type,
            depth,
        };

        log_state(ScanState::Dispatching, &request.target);
        let gathered = self.dispatch(&request).await;

        log_state(ScanState::Aggregating, &request.target);
        let Gathered {
            scan,
            cache_hit,
            simulated,
        } = gathered;

        log_state(ScanState::Scoring, &request.target);
        let risk_factors = calculate_risk_factors(&scan.data, scan.geolocation.as_ref());
        let score = threat_score(&risk_factors);
        let timeline = build_timeline(&scan.data);

        log_state(ScanState::Finalizing, &request.target);
        let metadata = build_metadata(
            generated_at,
            self.config.cache_ttl(),
            cache_hit,
            started.elapsed(),
        );

        tracing::info!(
            scan_target = %request.target,
            kind = %input_type,
            depth = depth.as_str(),
            simulated,
            score,
            "scan complete"
        );

        OsintResult {
            input_type,
            target: request.target,
            scan_depth: depth,
            timestamp: generated_at,
            threat_score: score,
            risk_factors,
            data: scan.data,
            timeline,
            geolocation: scan.geolocation,
            dark_web: scan.dark_web,
            mitre_attack: scan.mitre_attack,
            similar_targets: scan.similar_targets,
            metadata,
        }
    }

    async fn dispatch(&self, request: &ScanRequest) -> Gathered {
        if !self.config.real_apis_enabled {
            return self.simulated(request);
        }

        match collect_live(&self.client, request).await {
            Ok(live) => {
                if !live.failed_sources.is_empty() {
                    tracing::info!(
                        "{} source(s) fell back to defaults: {}",
                        live.failed_sources.len(),
                        live.failed_sources.join(", ")
                    );
                }
                let mut scan = Findings {
                    data: live.data,
                    geolocation: live.geolocation,
                    dark_web: None,
                    mitre_attack: Vec::new(),
                    similar_targets: Vec::new(),
                };
                if request.depth.is_deep() {
                    let deep = {
                        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                        simulate_deep_sections(&mut *rng, &request.target, request.input_type)
                    };
                    scan.dark_web = deep.dark_web;
                    scan.mitre_attack = deep.mitre_attack;
                    scan.similar_targets = deep.similar_targets;
                }
                Gathered {
                    scan,
                    cache_hit: live.cache_hit,
                    simulated: false,
                }
            }
            Err(err) => {
                if err.is_fatal_for_live_scan() {
                    tracing::warn!("{}; simulating instead", err);
                } else {
                    tracing::warn!("live scan abandoned ({}); using simulated findings", err);
                }
                self.simulated(request)
            }
        }
    }

    /// Simulated findings, served from cache when an identical request ran
    /// within the TTL so repeated scans agree.
    fn simulated(&self, request: &ScanRequest) -> Gathered {
        let key = ResultCache::generate_key(
            "simulation",
            &[
                ("target", request.target.as_str()),
                ("type", request.input_type.as_str()),
                ("depth", request.depth.as_str()),
            ],
        );

        if self.config.caching_enabled {
            if let Some(hit) = self.cache.get(&key) {
                match serde_json::from_value::<Findings>(hit) {
                    Ok(scan) => {
                        tracing::debug!(scan_target = %request.target, "simulated findings from cache");
                        return Gathered {
                            scan,
                            cache_hit: true,
                            simulated: true,
                        };
                    }
                    Err(err) => tracing::warn!("unreadable simulated cache entry: {}", err),
                }
            }
        }

        let scan = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            simulate_scan(&mut *rng, request)
        };

        if self.config.caching_enabled {
            match serde_json::to_value(&scan) {
                Ok(value) => self.cache.set(&key, value),
                Err(err) => tracing::warn!("not caching simulated findings: {}", err),
            }
        }

        Gathered {
            scan,
            cache_hit: false,
            simulated: true,
        }
    }
}

fn log_state(state: ScanState, target: &str) {
    tracing::debug!(?state, scan_target = target, "scan state");
}
