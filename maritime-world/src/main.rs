mod config;
mod kinematics;
mod lanes;
mod ocean;
mod spawn;

use clap::Parser;
use config::FullConfig;
use lanes::Lanes;
use maritime_store::{FleetStore, StatusHash};
use rand::SeedableRng;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Ground-truth world simulator: advances vessel kinematics along shipping
/// lanes and rewrites the Fleet Store at a fixed tick.
#[derive(Parser, Debug)]
#[command(name = "world-sim")]
struct Args {
    /// Path to a TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[arg(long)]
    redis_url: Option<String>,

    #[arg(long)]
    ships: Option<u32>,

    #[arg(long)]
    dark_pct: Option<f64>,

    #[arg(long)]
    rate: Option<f64>,

    #[arg(long)]
    speed_mult: Option<f64>,

    /// Initialize the fleet and exit without running the tick loop.
    #[arg(long)]
    init_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "world_sim=info".into()))
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
        cfg.world.redis_url = url;
    }
    if let Some(n) = args.ships {
        cfg.world.num_ships = n;
    }
    if let Some(p) = args.dark_pct {
        cfg.world.dark_pct = p;
    }
    if let Some(r) = args.rate {
        cfg.world.rate_hz = r;
    }
    if let Some(m) = args.speed_mult {
        cfg.world.time_accel = m;
    }

    info!(config = ?cfg.world, "starting world simulator");

    let conn = maritime_store::connect(&cfg.world.redis_url).await?;
    let fleet_store = FleetStore::new(conn.clone());
    let status = StatusHash::new(conn, "world-sim");

    let lanes = Lanes::new();
    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut fleet = spawn::init_fleet(cfg.world.num_ships, cfg.world.dark_pct, &lanes, &mut rng);
    fleet_store.upsert_batch(&fleet).await?;
    info!(count = fleet.len(), "fleet initialized");

    if args.init_only {
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / cfg.world.rate_hz));
    let mut ticks: u64 = 0;
    let mut errors: u64 = 0;
    let start = tokio::time::Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for vessel in fleet.iter_mut() {
                    kinematics::tick(
                        vessel,
                        &lanes,
                        1.0 / cfg.world.rate_hz,
                        cfg.world.time_accel,
                        cfg.world.ais_toggle_probability,
                        &mut rng,
                    );
                }

                if let Err(e) = fleet_store.upsert_batch(&fleet).await {
                    error!("fleet store write failed: {e}");
                    errors += 1;
                }
                ticks += 1;

                let _ = status.set_fields(&[
                    ("ticks".into(), ticks.to_string()),
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
