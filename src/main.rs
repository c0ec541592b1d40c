use std::sync::Arc;
use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use falcon_intel::{
    config::load_config,
    core::{
        engine::Engine,
        error::FalconError,
        input::validate,
        output::{render_report, write_report, OutputFormat},
        types::{InputType, ScanDepth},
    },
    sources::{cache::ResultCache, rate_limiter::RateLimiter},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "falcon-intel",
    about = "OSINT aggregation and threat scoring for emails, domains, IPs and usernames"
)]
struct Cli {
    /// Target to investigate (email, domain, IPv4 address or username)
    target: String,
    /// Force the input type instead of auto-detecting it
    #[arg(long = "type", value_enum)]
    input_type: Option<TypeArg>,
    /// Scan depth
    #[arg(long, default_value = "standard", value_enum)]
    depth: DepthArg,
    /// Path to config file (TOML). Default: config/falcon-intel.toml
    #[arg(long)]
    config: Option<String>,
    /// Report format
    #[arg(long, default_value = "json", value_enum)]
    format: FormatArg,
    /// Also write the report to this file
    #[arg(long)]
    output: Option<String>,
    /// Query live sources (overrides config)
    #[arg(long)]
    live: bool,
    /// Disable the in-memory result cache
    #[arg(long)]
    no_cache: bool,
    /// Seed for simulated findings
    #[arg(long)]
    seed: Option<u64>,
    /// Increase verbosity (info, debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Optional log file path
    #[arg(long, default_value = "data/falcon-intel.log")]
    log_file: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TypeArg {
    Email,
    Domain,
    Ip,
    Username,
}

impl From<TypeArg> for InputType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::Email => InputType::Email,
            TypeArg::Domain => InputType::Domain,
            TypeArg::Ip => InputType::Ip,
            TypeArg::Username => InputType::Username,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DepthArg {
    Quick,
    Standard,
    Deep,
}

impl From<DepthArg> for ScanDepth {
    fn from(value: DepthArg) -> Self {
        match value {
            DepthArg::Quick => ScanDepth::Quick,
            DepthArg::Standard => ScanDepth::Standard,
            DepthArg::Deep => ScanDepth::Deep,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Json,
    Md,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Md => OutputFormat::Markdown,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli).context("failed to initialise logging")?;

    let mut cfg = load_config(cli.config.as_deref())?;
    if cli.live {
        cfg.real_apis_enabled = true;
    }
    if cli.no_cache {
        cfg.caching_enabled = false;
    }
    if !cfg.real_apis_enabled {
        tracing::info!("live sources disabled; findings will be simulated");
    }

    let cache = Arc::new(ResultCache::from_hours(cfg.cache_ttl_hours));
    let limiter = Arc::new(RateLimiter::new(
        Duration::from_millis(cfg.rate_window_ms),
        cfg.rate_max_requests,
    ));
    let mut engine = Engine::new(cfg, cache, limiter)?;
    if let Some(seed) = cli.seed {
        engine = engine.with_seed(seed);
    }

    let depth: ScanDepth = cli.depth.into();
    let result = match cli.input_type {
        Some(kind) => {
            let kind: InputType = kind.into();
            if !validate(&cli.target, kind) {
                return Err(FalconError::Validation(format!(
                    "{:?} is not a valid {}",
                    cli.target.trim(),
                    kind
                ))
                .into());
            }
            engine.scan(&cli.target, kind, depth).await
        }
        None => engine.scan_text(&cli.target, depth).await?,
    };

    let format: OutputFormat = cli.format.into();
    if let Some(out) = &cli.output {
        let path = Path::new(out);
        write_report(&result, format, path)
            .with_context(|| format!("writing report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }
    println!("{}", render_report(&result, format)?);
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<(), FalconError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let log_path = Path::new(&cli.log_file);
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| FalconError::Config(e.to_string()))?;
    }
    if log_path.exists() {
        if let Ok(meta) = fs::metadata(log_path) {
            if meta.len() > 1_000_000 {
                let rotated = log_path.with_extension("log.1");
                let _ = fs::rename(log_path, rotated);
            }
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| FalconError::Config(e.to_string()))?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false);

    // stdout carries the report itself
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| FalconError::Config(e.to_string()))
}
