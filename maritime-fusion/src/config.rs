//! Tunables for the fusion runner binary: connection info, tick rate, and
//! the correlation/dark-ship parameter blocks re-exported from `maritime-types`.

use maritime_types::{CorrelationGates, DarkShipDetectionConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub redis_url: String,
    pub rate_hz: f64,
    pub batch_size: usize,
    pub block_ms: usize,
    pub snapshot_window_s: i64,
    pub correlation: CorrelationGates,
    pub dark_ship: DarkShipDetectionConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            rate_hz: 2.0,
            batch_size: 100,
            block_ms: 100,
            snapshot_window_s: 5,
            correlation: CorrelationGates::default(),
            dark_ship: DarkShipDetectionConfig::default(),
        }
    }
}
