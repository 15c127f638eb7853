use serde::{Deserialize, Serialize};

/// Vessel category, used both for spawn ratios in the world simulator and
/// for per-class kinematic bands (speed range, base dark rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VesselClass {
    Cargo,
    Tanker,
    Container,
    Fishing,
    Passenger,
    Naval,
    Tug,
    Unknown,
}

impl VesselClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VesselClass::Cargo => "cargo",
            VesselClass::Tanker => "tanker",
            VesselClass::Container => "container",
            VesselClass::Fishing => "fishing",
            VesselClass::Passenger => "passenger",
            VesselClass::Naval => "naval",
            VesselClass::Tug => "tug",
            VesselClass::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "cargo" => VesselClass::Cargo,
            "tanker" => VesselClass::Tanker,
            "container" => VesselClass::Container,
            "fishing" => VesselClass::Fishing,
            "passenger" => VesselClass::Passenger,
            "naval" => VesselClass::Naval,
            "tug" => VesselClass::Tug,
            _ => VesselClass::Unknown,
        }
    }

    /// Spawn ratio out of 100, matching the world simulator's init distribution.
    pub fn spawn_weight(&self) -> u32 {
        match self {
            VesselClass::Cargo => 30,
            VesselClass::Tanker => 25,
            VesselClass::Container => 20,
            VesselClass::Fishing => 12,
            VesselClass::Passenger => 5,
            VesselClass::Naval => 3,
            VesselClass::Tug => 3,
            VesselClass::Unknown => 2,
        }
    }

    /// Cruise speed band in knots, used for initial speed draw and the
    /// per-tick speed random walk.
    pub fn speed_band_knots(&self) -> (f64, f64) {
        match self {
            VesselClass::Cargo => (10.0, 18.0),
            VesselClass::Tanker => (8.0, 15.0),
            VesselClass::Container => (14.0, 24.0),
            VesselClass::Fishing => (4.0, 10.0),
            VesselClass::Passenger => (12.0, 22.0),
            VesselClass::Naval => (10.0, 28.0),
            VesselClass::Tug => (5.0, 12.0),
            VesselClass::Unknown => (5.0, 15.0),
        }
    }

    /// Baseline probability that this class starts with AIS off.
    pub fn base_dark_rate(&self) -> f64 {
        match self {
            VesselClass::Fishing => 0.15,
            VesselClass::Naval => 0.35,
            VesselClass::Unknown => 0.25,
            _ => 0.05,
        }
    }

    /// Typical length/beam/draught/RCS used when spawning a vessel of this class.
    pub fn physical_profile(&self) -> (f64, f64, f64, f64) {
        // (length_m, beam_m, draught_m, rcs)
        match self {
            VesselClass::Cargo => (180.0, 28.0, 10.0, 1.4),
            VesselClass::Tanker => (250.0, 40.0, 15.0, 1.8),
            VesselClass::Container => (300.0, 45.0, 13.0, 1.6),
            VesselClass::Fishing => (25.0, 7.0, 3.0, 0.4),
            VesselClass::Passenger => (200.0, 30.0, 8.0, 1.2),
            VesselClass::Naval => (140.0, 18.0, 7.0, 0.6),
            VesselClass::Tug => (30.0, 10.0, 4.0, 0.5),
            VesselClass::Unknown => (50.0, 12.0, 5.0, 0.7),
        }
    }
}

/// Ground-truth vessel state, owned by the Fleet Store and written only by
/// the World Simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub id: String,
    pub name: String,
    pub class: VesselClass,
    pub mmsi: String,

    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: f64,
    pub course_deg: f64,
    pub heading_deg: f64,

    pub length_m: f64,
    pub beam_m: f64,
    pub draught_m: f64,
    pub rcs: f64,

    pub ais_on: bool,
    pub lane_id: String,
    pub waypoint_index: usize,
    pub target_lat: f64,
    pub target_lon: f64,
    /// Direction of lane traversal: true = forward along waypoints.
    pub lane_forward: bool,
}

impl Vessel {
    pub fn to_kv_fields(&self) -> Vec<(String, String)> {
        vec![
            ("id".into(), self.id.clone()),
            ("name".into(), self.name.clone()),
            ("class".into(), self.class.as_str().into()),
            ("mmsi".into(), self.mmsi.clone()),
            ("latitude".into(), self.latitude.to_string()),
            ("longitude".into(), self.longitude.to_string()),
            ("speed_knots".into(), self.speed_knots.to_string()),
            ("course_deg".into(), self.course_deg.to_string()),
            ("heading_deg".into(), self.heading_deg.to_string()),
            ("length_m".into(), self.length_m.to_string()),
            ("beam_m".into(), self.beam_m.to_string()),
            ("draught_m".into(), self.draught_m.to_string()),
            ("rcs".into(), self.rcs.to_string()),
            ("ais_on".into(), self.ais_on.to_string()),
            ("lane_id".into(), self.lane_id.clone()),
            ("waypoint_index".into(), self.waypoint_index.to_string()),
            ("target_lat".into(), self.target_lat.to_string()),
            ("target_lon".into(), self.target_lon.to_string()),
            ("lane_forward".into(), self.lane_forward.to_string()),
        ]
    }

    pub fn from_kv_fields(
        fields: &std::collections::HashMap<String, String>,
    ) -> Option<Vessel> {
        let get = |k: &str| fields.get(k).cloned().unwrap_or_default();
        let parse_f64 = |k: &str| get(k).parse::<f64>().unwrap_or(0.0);

        Some(Vessel {
            id: get("id"),
            name: get("name"),
            class: VesselClass::from_str(&get("class")),
            mmsi: get("mmsi"),
            latitude: parse_f64("latitude"),
            longitude: parse_f64("longitude"),
            speed_knots: parse_f64("speed_knots"),
            course_deg: parse_f64("course_deg"),
            heading_deg: parse_f64("heading_deg"),
            length_m: parse_f64("length_m"),
            beam_m: parse_f64("beam_m"),
            draught_m: parse_f64("draught_m"),
            rcs: parse_f64("rcs"),
            ais_on: get("ais_on") == "true",
            lane_id: get("lane_id"),
            waypoint_index: get("waypoint_index").parse().unwrap_or(0),
            target_lat: parse_f64("target_lat"),
            target_lon: parse_f64("target_lon"),
            lane_forward: get("lane_forward") != "false",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn vessel_round_trips_through_kv_fields() {
        let v = Vessel {
            id: "V00000001".into(),
            name: "MV Test".into(),
            class: VesselClass::Cargo,
            mmsi: "123456789".into(),
            latitude: 18.9,
            longitude: 72.8,
            speed_knots: 12.5,
            course_deg: 90.0,
            heading_deg: 91.0,
            length_m: 180.0,
            beam_m: 28.0,
            draught_m: 10.0,
            rcs: 1.4,
            ais_on: true,
            lane_id: "lane-1".into(),
            waypoint_index: 2,
            target_lat: 19.0,
            target_lon: 73.0,
            lane_forward: true,
        };
        let fields: HashMap<String, String> = v.to_kv_fields().into_iter().collect();
        let back = Vessel::from_kv_fields(&fields).unwrap();
        assert_eq!(back.id, v.id);
        assert_eq!(back.class, v.class);
        assert!((back.latitude - v.latitude).abs() < 1e-12);
        assert_eq!(back.ais_on, v.ais_on);
        assert_eq!(back.waypoint_index, v.waypoint_index);
    }
}
