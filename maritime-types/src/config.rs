//! Tunables shared between the correlation engine and the track manager.
//! Mirrors the sensor characteristics table, correlation gates, and
//! dark-ship thresholds every component agrees on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationGates {
    pub max_distance_m: f64,
    pub min_distance_m: f64,
    pub sigma_multiplier: f64,

    pub max_time_delta_s: f64,

    pub max_speed_change_knots: f64,
    pub max_course_change_deg: f64,

    pub tentative_to_confirmed_updates: u32,
    pub coasting_timeout_s: f64,
    pub drop_timeout_s: f64,

    pub min_position_uncertainty_m: f64,
    pub max_position_uncertainty_m: f64,

    /// Score above which the solver prefers opening a new track over
    /// associating with an existing one.
    pub new_track_cost: f64,
}

impl Default for CorrelationGates {
    fn default() -> Self {
        CorrelationGates {
            max_distance_m: 10_000.0,
            min_distance_m: 500.0,
            sigma_multiplier: 4.0,
            max_time_delta_s: 120.0,
            max_speed_change_knots: 15.0,
            max_course_change_deg: 120.0,
            tentative_to_confirmed_updates: 3,
            coasting_timeout_s: 300.0,
            drop_timeout_s: 600.0,
            min_position_uncertainty_m: 100.0,
            max_position_uncertainty_m: 5000.0,
            new_track_cost: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkShipDetectionConfig {
    pub ais_gap_threshold_s: f64,
    pub min_radar_correlations: u32,
    pub min_satellite_detections: u32,
    pub min_drone_detections: u32,

    pub dark_ship_high_confidence: f64,
    pub dark_ship_alert_threshold: f64,

    pub radar_confidence_boost: f64,
    pub satellite_confidence_boost: f64,
    pub drone_confidence_boost: f64,
}

impl Default for DarkShipDetectionConfig {
    fn default() -> Self {
        DarkShipDetectionConfig {
            ais_gap_threshold_s: 900.0,
            min_radar_correlations: 3,
            min_satellite_detections: 1,
            min_drone_detections: 1,
            dark_ship_high_confidence: 0.8,
            dark_ship_alert_threshold: 0.6,
            radar_confidence_boost: 0.2,
            satellite_confidence_boost: 0.1,
            drone_confidence_boost: 0.3,
        }
    }
}
