use clap::Parser;
use maritime_sensors::config::{default_zones, IngesterConfig, ZonesFile};
use maritime_sensors::drone::{self, PatrolZone};
use maritime_store::{bus, FleetStore, ObservationBus, StatusHash};
use rand::SeedableRng;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STREAM_MAXLEN: usize = 100_000;

/// Patrol drone ingester: each zone is independently active this cycle
/// with its own probability; vessels within an active zone's radius are
/// detected and may yield a visual identification — the strongest dark
/// ship evidence source in the fleet.
#[derive(Parser, Debug)]
#[command(name = "drone-ingester")]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: String,
    #[arg(long)]
    redis_url: Option<String>,
    #[arg(long)]
    rate: Option<f64>,
    #[arg(long)]
    zones: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct FullConfig {
    #[serde(default)]
    drone: IngesterConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "drone_ingester=info".into()))
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
        cfg.drone.redis_url = url;
    }
    if let Some(r) = args.rate {
        cfg.drone.rate_hz = r;
    }

    let zones: Vec<PatrolZone> = match args.zones.as_deref().map(std::fs::read_to_string) {
        Some(Ok(raw)) => toml::from_str::<ZonesFile>(&raw)
            .map(|f| f.zones)
            .unwrap_or_else(|_| default_zones()),
        _ => default_zones(),
    };

    let conn = maritime_store::connect(&cfg.drone.redis_url).await?;
    let fleet_store = FleetStore::new(conn.clone());
    let observation_bus = ObservationBus::new(conn.clone());
    let status = StatusHash::new(conn, "drone-ingester");

    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.drone.rate_hz));
    let mut messages_processed: u64 = 0;
    let mut errors: u64 = 0;
    let mut frame: u64 = 0;
    let start = tokio::time::Instant::now();

    info!(zones = zones.len(), "drone-ingester starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let vessels = match fleet_store.get_all().await {
                    Ok(v) => v,
                    Err(e) => { error!("fleet store read failed: {e}"); errors += 1; continue; }
                };
                let now_ms = chrono::Utc::now().timestamp_millis();

                for zone in &zones {
                    if !drone::zone_is_active(zone, &mut rng) {
                        continue;
                    }
                    for vessel in &vessels {
                        let detection_id = format!("{}-{}-{}", zone.id, frame, vessel.id);
                        let frame_id = format!("F{frame}");
                        if let Some(fields) = drone::detect(zone, vessel, &detection_id, &frame_id, now_ms, &mut rng) {
                            match observation_bus.write(bus::DRONE_DETECTIONS, &fields, STREAM_MAXLEN).await {
                                Ok(_) => messages_processed += 1,
                                Err(e) => { error!("bus write failed: {e}"); errors += 1; }
                            }
                        }
                    }
                    frame += 1;
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
