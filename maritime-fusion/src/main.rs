use clap::Parser;
use maritime_fusion::{FusionConfig, FusionRunner};
use maritime_store::{bus, ObservationBus, StatusHash, TrackStore};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Fusion runner: drives the read-correlate-update-publish loop against the
/// observation bus and track store.
#[derive(Parser, Debug)]
#[command(name = "fusion-runner")]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: String,
    #[arg(long)]
    redis_url: Option<String>,
    #[arg(long)]
    rate: Option<f64>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct FullConfig {
    #[serde(default)]
    fusion: FusionConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fusion_runner=info".into()))
        .init();

    let args = Args::parse();
    let mut cfg = match std::fs::read_to_string(&args.config) {
        Ok(raw) => toml::from_str::<FullConfig>(&raw).unwrap_or_else(|e| {
            warn!("failed to parse {}: {e}, using defaults", args.config);
            FullConfig::default()
        }),
        Err(_) => {
            info!("no config file at {}, using defaults", args.config);
            FullConfig::default()
        }
    };
    if let Some(url) = args.redis_url {
        cfg.fusion.redis_url = url;
    }
    if let Some(r) = args.rate {
        cfg.fusion.rate_hz = r;
    }

    info!(redis_url = %cfg.fusion.redis_url, rate_hz = cfg.fusion.rate_hz, "fusion-runner starting");

    let conn = maritime_store::connect(&cfg.fusion.redis_url).await?;
    let observation_bus = ObservationBus::new(conn.clone());
    let track_store = TrackStore::new(conn.clone());
    let status = StatusHash::new(conn, "fusion");

    let consumer = bus::consumer_name("fusion", std::time::SystemTime::now());
    let mut runner = FusionRunner::new(observation_bus, track_store, consumer, cfg.fusion.clone());
    runner.ensure_groups().await?;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.fusion.rate_hz));
    let mut ticks: u64 = 0;
    let mut errors: u64 = 0;
    let mut tracks_created: u64 = 0;
    let mut tracks_updated: u64 = 0;
    let mut dark_ship_alerts: u64 = 0;
    let start = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = chrono::Utc::now();
                match runner.tick(now).await {
                    Ok(report) => {
                        ticks += 1;
                        tracks_created += report.tracks_created as u64;
                        tracks_updated += report.tracks_updated as u64;
                        dark_ship_alerts += report.alerts_published as u64;
                    }
                    Err(e) => {
                        error!("fusion tick failed: {e}");
                        errors += 1;
                    }
                }

                let (messages_processed, messages_dropped) = runner.counters();
                let stats = runner.manager().stats();
                let _ = status.set_fields(&[
                    ("ticks".into(), ticks.to_string()),
                    ("messages_processed".into(), messages_processed.to_string()),
                    ("messages_dropped".into(), messages_dropped.to_string()),
                    ("tracks_created".into(), tracks_created.to_string()),
                    ("tracks_updated".into(), tracks_updated.to_string()),
                    ("tracks_dropped".into(), stats.tracks_dropped.to_string()),
                    ("dark_ship_alerts".into(), dark_ship_alerts.to_string()),
                    ("invariant_violations".into(), stats.invariant_violations.to_string()),
                    ("errors".into(), errors.to_string()),
                    ("uptime_secs".into(), start.elapsed().as_secs().to_string()),
                    ("running".into(), "true".into()),
                ]).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, finishing tick and exiting");
                let _ = status.set_fields(&[
                    ("ticks".into(), ticks.to_string()),
                    ("errors".into(), errors.to_string()),
                    ("running".into(), "false".into()),
                ]).await;
                break;
            }
        }
    }

    Ok(())
}
