use clap::Parser;
use maritime_sensors::{ais, config::IngesterConfig};
use maritime_store::{bus, FleetStore, ObservationBus, StatusHash};
use rand::SeedableRng;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const STREAM_MAXLEN: usize = 100_000;

/// AIS transponder ingester: reads Fleet Store, emits positions for
/// `ais_on` vessels only, perturbed by the AIS error model.
#[derive(Parser, Debug)]
#[command(name = "ais-ingester")]
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
    ais: IngesterConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ais_ingester=info".into()))
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
        cfg.ais.redis_url = url;
    }
    if let Some(r) = args.rate {
        cfg.ais.rate_hz = r;
    }

    let conn = maritime_store::connect(&cfg.ais.redis_url).await?;
    let fleet_store = FleetStore::new(conn.clone());
    let observation_bus = ObservationBus::new(conn.clone());
    let status = StatusHash::new(conn, "ais-ingester");

    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.ais.rate_hz));
    let mut messages_processed: u64 = 0;
    let mut errors: u64 = 0;
    let start = tokio::time::Instant::now();

    info!(redis_url = %cfg.ais.redis_url, rate_hz = cfg.ais.rate_hz, "ais-ingester starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let vessels = match fleet_store.get_all().await {
                    Ok(v) => v,
                    Err(e) => { error!("fleet store read failed: {e}"); errors += 1; continue; }
                };
                let now_ms = chrono::Utc::now().timestamp_millis();

                for vessel in &vessels {
                    if let Some(fields) = ais::detect(vessel, now_ms, &mut rng) {
                        match observation_bus.write(bus::AIS_POSITIONS, &fields, STREAM_MAXLEN).await {
                            Ok(_) => messages_processed += 1,
                            Err(e) => { error!("bus write failed: {e}"); errors += 1; }
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
