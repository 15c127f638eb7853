use clap::Parser;
use maritime_sensors::config::{default_satellites, IngesterConfig, SatellitesFile};
use maritime_sensors::satellite::{self, Satellite};
use maritime_store::{bus, FleetStore, ObservationBus, StatusHash};
use rand::SeedableRng;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STREAM_MAXLEN: usize = 100_000;
// Matches the world simulator's ocean bounding box (maritime-world::ocean).
const AOI: (f64, f64, f64, f64) = (5.0, 25.0, 65.0, 100.0);

/// Satellite ingester: advances a logical cycle counter, generates a random
/// swath footprint on satellites whose revisit boundary falls on this
/// cycle, and reports detections within the swath — including the
/// satellite-native `is_dark_ship` flag.
#[derive(Parser, Debug)]
#[command(name = "satellite-ingester")]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: String,
    #[arg(long)]
    redis_url: Option<String>,
    #[arg(long)]
    rate: Option<f64>,
    #[arg(long)]
    satellites: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct FullConfig {
    #[serde(default)]
    satellite: IngesterConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "satellite_ingester=info".into()))
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
        cfg.satellite.redis_url = url;
    }
    if let Some(r) = args.rate {
        cfg.satellite.rate_hz = r;
    }

    let satellites: Vec<Satellite> = match args.satellites.as_deref().map(std::fs::read_to_string) {
        Some(Ok(raw)) => toml::from_str::<SatellitesFile>(&raw)
            .map(|f| f.satellites)
            .unwrap_or_else(|_| default_satellites()),
        _ => default_satellites(),
    };

    let conn = maritime_store::connect(&cfg.satellite.redis_url).await?;
    let fleet_store = FleetStore::new(conn.clone());
    let observation_bus = ObservationBus::new(conn.clone());
    let status = StatusHash::new(conn, "satellite-ingester");

    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.satellite.rate_hz));
    let mut messages_processed: u64 = 0;
    let mut errors: u64 = 0;
    let mut cycle: u64 = 0;
    let start = tokio::time::Instant::now();

    info!(satellites = satellites.len(), "satellite-ingester starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let vessels = match fleet_store.get_all().await {
                    Ok(v) => v,
                    Err(e) => { error!("fleet store read failed: {e}"); errors += 1; cycle += 1; continue; }
                };
                let now_ms = chrono::Utc::now().timestamp_millis();

                for sat in &satellites {
                    if let Some(swath) = satellite::maybe_pass(sat, cycle, AOI, &mut rng) {
                        for vessel in &vessels {
                            let detection_id = format!("{}-{}-{}", sat.id, cycle, vessel.id);
                            if let Some(fields) = satellite::detect(sat, &swath, vessel, &detection_id, now_ms, &mut rng) {
                                match observation_bus.write(bus::SATELLITE_DETECTIONS, &fields, STREAM_MAXLEN).await {
                                    Ok(_) => messages_processed += 1,
                                    Err(e) => { error!("bus write failed: {e}"); errors += 1; }
                                }
                            }
                        }
                    }
                }
                cycle += 1;

                let _ = status.set_fields(&[
                    ("messages_processed".into(), messages_processed.to_string()),
                    ("errors".into(), errors.to_string()),
                    ("uptime_secs".into(), start.elapsed().as_secs().to_string()),
                    ("cycle".into(), cycle.to_string()),
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
