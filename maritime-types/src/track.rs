use crate::observation::SensorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Tentative,
    Confirmed,
    Coasting,
    Dropped,
}

impl TrackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Tentative => "tentative",
            TrackStatus::Confirmed => "confirmed",
            TrackStatus::Coasting => "coasting",
            TrackStatus::Dropped => "dropped",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => TrackStatus::Confirmed,
            "coasting" => TrackStatus::Coasting,
            "dropped" => TrackStatus::Dropped,
            _ => TrackStatus::Tentative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentitySource {
    Ais,
    DroneVisual,
    Unknown,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::Ais => "ais",
            IdentitySource::DroneVisual => "drone-visual",
            IdentitySource::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ais" => IdentitySource::Ais,
            "drone-visual" => IdentitySource::DroneVisual,
            _ => IdentitySource::Unknown,
        }
    }
}

/// Record of one sensor's contribution to a track's provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorContribution {
    pub sensor_kind: SensorKind,
    pub sensor_id: String,
    pub last_update: DateTime<Utc>,
    pub measurement_count: u32,
    pub last_position: (f64, f64),
    pub confidence: f64,
}

/// The single mutable entity in the fusion core: the fused state of one
/// physical vessel, as seen across however many sensors currently report it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedTrack {
    pub track_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: TrackStatus,

    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: Option<f64>,
    pub course: Option<f64>,
    pub heading: Option<f64>,

    pub position_uncertainty_m: f64,

    pub velocity_north_ms: f64,
    pub velocity_east_ms: f64,

    pub identity_source: IdentitySource,
    pub mmsi: Option<String>,
    pub ship_name: Option<String>,
    pub vessel_type: Option<String>,
    pub vessel_length_m: Option<f64>,

    pub is_dark_ship: bool,
    pub dark_ship_confidence: f64,
    pub ais_last_seen: Option<DateTime<Utc>>,
    pub ais_gap_seconds: Option<f64>,

    pub sensor_contributions: HashMap<SensorKind, SensorContribution>,

    pub track_quality: u32,
    pub correlation_confidence: f64,
    pub update_count: u32,

    pub flagged_for_review: bool,
    pub alert_reason: Option<String>,
}

impl UnifiedTrack {
    pub fn new(id: String, lat: f64, lon: f64, sigma: f64, now: DateTime<Utc>) -> Self {
        UnifiedTrack {
            track_id: id,
            created_at: now,
            updated_at: now,
            status: TrackStatus::Tentative,
            latitude: lat,
            longitude: lon,
            speed_knots: None,
            course: None,
            heading: None,
            position_uncertainty_m: sigma,
            velocity_north_ms: 0.0,
            velocity_east_ms: 0.0,
            identity_source: IdentitySource::Unknown,
            mmsi: None,
            ship_name: None,
            vessel_type: None,
            vessel_length_m: None,
            is_dark_ship: false,
            dark_ship_confidence: 0.0,
            ais_last_seen: None,
            ais_gap_seconds: None,
            sensor_contributions: HashMap::new(),
            track_quality: 0,
            correlation_confidence: 0.0,
            update_count: 0,
            flagged_for_review: false,
            alert_reason: None,
        }
    }

    pub fn contributing_sensors(&self) -> Vec<SensorKind> {
        self.sensor_contributions.keys().copied().collect()
    }

    /// Serialize to the string-valued Redis hash layout used by `track:{id}`.
    pub fn to_redis_fields(&self) -> Vec<(String, String)> {
        let mut sensors: Vec<&str> = self
            .sensor_contributions
            .keys()
            .map(|k| k.as_str())
            .collect();
        sensors.sort_unstable();

        vec![
            ("track_id".into(), self.track_id.clone()),
            ("created_at".into(), self.created_at.to_rfc3339()),
            ("updated_at".into(), self.updated_at.to_rfc3339()),
            ("status".into(), self.status.as_str().into()),
            ("latitude".into(), self.latitude.to_string()),
            ("longitude".into(), self.longitude.to_string()),
            ("speed_knots".into(), self.speed_knots.unwrap_or(0.0).to_string()),
            ("course".into(), self.course.unwrap_or(0.0).to_string()),
            ("heading".into(), self.heading.unwrap_or(0.0).to_string()),
            ("position_uncertainty_m".into(), self.position_uncertainty_m.to_string()),
            ("velocity_north_ms".into(), self.velocity_north_ms.to_string()),
            ("velocity_east_ms".into(), self.velocity_east_ms.to_string()),
            ("identity_source".into(), self.identity_source.as_str().into()),
            ("mmsi".into(), self.mmsi.clone().unwrap_or_default()),
            ("ship_name".into(), self.ship_name.clone().unwrap_or_default()),
            ("vessel_type".into(), self.vessel_type.clone().unwrap_or_default()),
            ("vessel_length_m".into(), self.vessel_length_m.unwrap_or(0.0).to_string()),
            ("is_dark_ship".into(), self.is_dark_ship.to_string()),
            ("dark_ship_confidence".into(), self.dark_ship_confidence.to_string()),
            (
                "ais_last_seen".into(),
                self.ais_last_seen.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ),
            ("ais_gap_seconds".into(), self.ais_gap_seconds.unwrap_or(0.0).to_string()),
            ("contributing_sensors".into(), sensors.join(",")),
            ("track_quality".into(), self.track_quality.to_string()),
            ("correlation_confidence".into(), self.correlation_confidence.to_string()),
            ("update_count".into(), self.update_count.to_string()),
            ("flagged_for_review".into(), self.flagged_for_review.to_string()),
            ("alert_reason".into(), self.alert_reason.clone().unwrap_or_default()),
        ]
    }

    /// Round-trips a subset of state sufficient for persistence/inspection.
    /// Provenance detail (per-sensor contributions) is not reconstructed from
    /// the flat hash; the fusion runner is the sole writer of that state and
    /// never rehydrates tracks from the store between ticks.
    pub fn from_redis_fields(fields: &HashMap<String, String>) -> Option<UnifiedTrack> {
        let get = |k: &str| fields.get(k).cloned().unwrap_or_default();
        let parse_f64 = |k: &str| get(k).parse::<f64>().ok();
        let now = Utc::now();

        let sensors_csv = get("contributing_sensors");
        let mut sensor_contributions = HashMap::new();
        for name in sensors_csv.split(',').filter(|s| !s.is_empty()) {
            if let Some(kind) = SensorKind::from_str(name) {
                sensor_contributions.insert(
                    kind,
                    SensorContribution {
                        sensor_kind: kind,
                        sensor_id: String::new(),
                        last_update: now,
                        measurement_count: 0,
                        last_position: (0.0, 0.0),
                        confidence: 0.0,
                    },
                );
            }
        }

        Some(UnifiedTrack {
            track_id: get("track_id"),
            created_at: DateTime::parse_from_rfc3339(&get("created_at"))
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(now),
            updated_at: DateTime::parse_from_rfc3339(&get("updated_at"))
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or(now),
            status: TrackStatus::from_str(&get("status")),
            latitude: parse_f64("latitude").unwrap_or(0.0),
            longitude: parse_f64("longitude").unwrap_or(0.0),
            speed_knots: parse_f64("speed_knots").filter(|v| *v != 0.0),
            course: parse_f64("course").filter(|v| *v != 0.0),
            heading: parse_f64("heading").filter(|v| *v != 0.0),
            position_uncertainty_m: parse_f64("position_uncertainty_m").unwrap_or(1000.0),
            velocity_north_ms: parse_f64("velocity_north_ms").unwrap_or(0.0),
            velocity_east_ms: parse_f64("velocity_east_ms").unwrap_or(0.0),
            identity_source: IdentitySource::from_str(&get("identity_source")),
            mmsi: Some(get("mmsi")).filter(|s| !s.is_empty()),
            ship_name: Some(get("ship_name")).filter(|s| !s.is_empty()),
            vessel_type: Some(get("vessel_type")).filter(|s| !s.is_empty()),
            vessel_length_m: parse_f64("vessel_length_m").filter(|v| *v != 0.0),
            is_dark_ship: get("is_dark_ship") == "true",
            dark_ship_confidence: parse_f64("dark_ship_confidence").unwrap_or(0.0),
            ais_last_seen: DateTime::parse_from_rfc3339(&get("ais_last_seen"))
                .ok()
                .map(|d| d.with_timezone(&Utc)),
            ais_gap_seconds: parse_f64("ais_gap_seconds").filter(|v| *v != 0.0),
            sensor_contributions,
            track_quality: get("track_quality").parse().unwrap_or(0),
            correlation_confidence: parse_f64("correlation_confidence").unwrap_or(0.0),
            update_count: get("update_count").parse().unwrap_or(0),
            flagged_for_review: get("flagged_for_review") == "true",
            alert_reason: Some(get("alert_reason")).filter(|s| !s.is_empty()),
        })
    }
}
