use crate::drone::PatrolZone;
use crate::radar::RadarStation;
use crate::satellite::Satellite;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngesterConfig {
    pub redis_url: String,
    pub rate_hz: f64,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        IngesterConfig {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            rate_hz: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StationsFile {
    #[serde(default)]
    pub stations: Vec<RadarStation>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SatellitesFile {
    #[serde(default)]
    pub satellites: Vec<Satellite>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ZonesFile {
    #[serde(default)]
    pub zones: Vec<PatrolZone>,
}

pub fn default_stations() -> Vec<RadarStation> {
    vec![
        RadarStation { id: "RAD-MUM".into(), lat: 18.94, lon: 72.84, range_nm: 40.0, weather: 0.95 },
        RadarStation { id: "RAD-CHN".into(), lat: 13.08, lon: 80.27, range_nm: 35.0, weather: 0.9 },
        RadarStation { id: "RAD-KCH".into(), lat: 9.93, lon: 76.27, range_nm: 35.0, weather: 0.9 },
        RadarStation { id: "RAD-CMB".into(), lat: 6.93, lon: 79.85, range_nm: 30.0, weather: 0.85 },
    ]
}

pub fn default_satellites() -> Vec<Satellite> {
    vec![
        Satellite { id: "SAT-S1A".into(), kind: crate::satellite::SatelliteKind::Sar, revisit: 3600, swath_km: 250.0, cloud: 0.0 },
        Satellite { id: "SAT-S2A".into(), kind: crate::satellite::SatelliteKind::Optical, revisit: 1800, swath_km: 180.0, cloud: 0.3 },
    ]
}

pub fn default_zones() -> Vec<PatrolZone> {
    vec![
        PatrolZone { id: "DRN-001".into(), center_lat: 18.94, center_lon: 72.84, radius_nm: 15.0, active_probability: 0.3 },
        PatrolZone { id: "DRN-002".into(), center_lat: 9.93, center_lon: 76.27, radius_nm: 12.0, active_probability: 0.2 },
    ]
}
