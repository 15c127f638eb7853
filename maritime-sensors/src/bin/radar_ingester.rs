use clap::Parser;
use maritime_sensors::config::{default_stations, IngesterConfig, StationsFile};
use maritime_sensors::radar::{self, RadarStation};
use maritime_store::{bus, FleetStore, ObservationBus, StatusHash};
use rand::SeedableRng;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STREAM_MAXLEN: usize = 100_000;

/// Coastal radar ingester: per (station, vessel) pair applies the range,
/// weather, and RCS-dependent detection model. Never emits identity fields.
#[derive(Parser, Debug)]
#[command(name = "radar-ingester")]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: String,
    #[arg(long)]
    redis_url: Option<String>,
    #[arg(long)]
    rate: Option<f64>,
    /// Optional TOML file with a `[[stations]]` table; defaults are used if absent.
    #[arg(long)]
    stations: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct FullConfig {
    #[serde(default)]
    radar: IngesterConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "radar_ingester=info".into()))
        .init();

    let args = Args::parse();
    let mut cfg = match std::fs::read_to_string(&args.config) {
        Ok(raw) => toml::from_str::<FullConfig>(&raw).unwrap_or_default(),
        Err(_) => {
            warn!("no config at {}, using defaults", args.config);
            FullConfig::default()
        }
    };
    if let Some(url) = args.redis_url {
        cfg.radar.redis_url = url;
    }
    if let Some(r) = args.rate {
        cfg.radar.rate_hz = r;
    }

    let stations: Vec<RadarStation> = match args.stations.as_deref().map(std::fs::read_to_string) {
        Some(Ok(raw)) => toml::from_str::<StationsFile>(&raw)
            .map(|f| f.stations)
            .unwrap_or_else(|_| default_stations()),
        _ => default_stations(),
    };

    let conn = maritime_store::connect(&cfg.radar.redis_url).await?;
    let fleet_store = FleetStore::new(conn.clone());
    let observation_bus = ObservationBus::new(conn.clone());
    let status = StatusHash::new(conn, "radar-ingester");

    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.radar.rate_hz));
    let mut messages_processed: u64 = 0;
    let mut errors: u64 = 0;
    let start = tokio::time::Instant::now();

    info!(stations = stations.len(), "radar-ingester starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let vessels = match fleet_store.get_all().await {
                    Ok(v) => v,
                    Err(e) => { error!("fleet store read failed: {e}"); errors += 1; continue; }
                };
                let now_ms = chrono::Utc::now().timestamp_millis();

                for station in &stations {
                    for vessel in &vessels {
                        if let Some(fields) = radar::detect(station, vessel, now_ms, &mut rng) {
                            match observation_bus.write(bus::RADAR_CONTACTS, &fields, STREAM_MAXLEN).await {
                                Ok(_) => messages_processed += 1,
                                Err(e) => { error!("bus write failed: {e}"); errors += 1; }
                            }
                        }
                    }
                }

                let _ = status.set_fields(&[
                    ("messages_processed".into(), messages_processed.to_string()),
                    ("errors".into(), errors.to_string()),
                    ("uptime_secs".into(), start.elapsed().as_secs().to_string()),
                    ("running".into(), "true".into()),
                ]).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                let _ = status.set_fields(&[("running".into(), "false".into())]).await;
                break;
            }
        }
    }

    Ok(())
}
