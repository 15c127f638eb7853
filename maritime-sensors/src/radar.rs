use crate::noise::{distance_m, perturb_uniform, perturb_uniform_m};
use maritime_types::Vessel;
use rand::Rng;
use serde::Deserialize;

pub const POSITION_ERROR_M: f64 = 500.0;
const BASE_DETECTION_PROB: f64 = 0.85;
const SKIP_PROBABILITY: f64 = 0.3;
const NM_TO_M: f64 = 1852.0;

#[derive(Debug, Clone, Deserialize)]
pub struct RadarStation {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Range in nautical miles.
    pub range_nm: f64,
    /// Weather attenuation factor in (0, 1].
    pub weather: f64,
}

/// Deterministic station-local track label from (station id, vessel id),
/// stable across ticks so the same physical contact keeps the same label.
fn track_label(station_id: &str, vessel_id: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    (station_id, vessel_id).hash(&mut hasher);
    format!("{}-{:08X}", station_id, (hasher.finish() & 0xFFFF_FFFF) as u32)
}

/// Radar detection model for one (station, vessel) pair per cycle.
pub fn detect(
    station: &RadarStation,
    vessel: &Vessel,
    now_ms: i64,
    rng: &mut impl Rng,
) -> Option<Vec<(String, String)>> {
    let range_m = station.range_nm * NM_TO_M;
    let d = distance_m(station.lat, station.lon, vessel.latitude, vessel.longitude);
    if d > range_m {
        return None;
    }

    if rng.gen_bool(SKIP_PROBABILITY) {
        return None;
    }

    let range_factor = 1.0 - (d / range_m).powi(2);
    let rcs_factor = (0.5 + 0.5 * vessel.rcs).clamp(0.5, 1.5);
    let detection_prob = (BASE_DETECTION_PROB * range_factor * rcs_factor * station.weather).clamp(0.0, 1.0);

    if !rng.gen_bool(detection_prob) {
        return None;
    }

    let (lat, lon) = perturb_uniform_m(vessel.latitude, vessel.longitude, POSITION_ERROR_M, rng);
    let speed_knots = perturb_uniform(vessel.speed_knots, 1.0, rng).max(0.0);
    let course = (perturb_uniform(vessel.course_deg, 5.0, rng)).rem_euclid(360.0);
    let quality = (100.0 * detection_prob).floor() as u32;

    Some(vec![
        ("track_id".into(), track_label(&station.id, &vessel.id)),
        ("station_id".into(), station.id.clone()),
        ("latitude".into(), lat.to_string()),
        ("longitude".into(), lon.to_string()),
        ("speed_knots".into(), speed_knots.to_string()),
        ("course".into(), course.to_string()),
        ("quality".into(), quality.to_string()),
        ("timestamp".into(), now_ms.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use maritime_types::VesselClass;
    use rand::SeedableRng;

    fn station() -> RadarStation {
        RadarStation {
            id: "RAD-MUM".into(),
            lat: 18.94,
            lon: 72.84,
            range_nm: 30.0,
            weather: 1.0,
        }
    }

    fn vessel_at(lat: f64, lon: f64) -> Vessel {
        Vessel {
            id: "V00000001".into(),
            name: "MV Test".into(),
            class: VesselClass::Cargo,
            mmsi: "200000001".into(),
            latitude: lat,
            longitude: lon,
            speed_knots: 10.0,
            course_deg: 90.0,
            heading_deg: 90.0,
            length_m: 180.0,
            beam_m: 28.0,
            draught_m: 10.0,
            rcs: 1.4,
            ais_on: true,
            lane_id: "lane".into(),
            waypoint_index: 0,
            target_lat: lat,
            target_lon: lon,
            lane_forward: true,
        }
    }

    #[test]
    fn out_of_range_never_detects() {
        let station = station();
        let far = vessel_at(30.0, 90.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(detect(&station, &far, 0, &mut rng).is_none());
        }
    }

    #[test]
    fn no_identity_fields_emitted() {
        let station = station();
        let near = vessel_at(18.95, 72.85);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut saw_detection = false;
        for _ in 0..200 {
            if let Some(fields) = detect(&station, &near, 0, &mut rng) {
                saw_detection = true;
                assert!(!fields.iter().any(|(k, _)| k == "mmsi"));
            }
        }
        assert!(saw_detection);
    }

    #[test]
    fn track_label_is_stable_across_calls() {
        assert_eq!(track_label("RAD-MUM", "V00000001"), track_label("RAD-MUM", "V00000001"));
    }
}
