use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub redis_url: String,
    pub num_ships: u32,
    pub dark_pct: f64,
    pub rate_hz: f64,
    pub time_accel: f64,
    pub ais_toggle_probability: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            num_ships: 500,
            dark_pct: 10.0,
            rate_hz: 1.0,
            time_accel: 1.0,
            ais_toggle_probability: 0.001,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FullConfig {
    #[serde(default)]
    pub world: WorldConfig,
}
