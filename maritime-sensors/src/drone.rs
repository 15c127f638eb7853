use crate::noise::{distance_m, perturb_uniform_m};
use maritime_types::Vessel;
use rand::Rng;
use serde::Deserialize;

pub const POSITION_ERROR_M: f64 = 50.0;
const DIMENSION_ERROR_M: f64 = 5.0;
const DETECTION_PROBABILITY: f64 = 0.95;
const VISUAL_NAME_ACCURACY: f64 = 0.9;
const NM_TO_M: f64 = 1852.0;

#[derive(Debug, Clone, Deserialize)]
pub struct PatrolZone {
    pub id: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_nm: f64,
    pub active_probability: f64,
}

/// Whether `zone` is active this cycle, drawn independently per cycle.
pub fn zone_is_active(zone: &PatrolZone, rng: &mut impl Rng) -> bool {
    rng.gen_bool(zone.active_probability.clamp(0.0, 1.0))
}

/// Per-vessel detection within an active zone.
pub fn detect(
    zone: &PatrolZone,
    vessel: &Vessel,
    detection_id: &str,
    frame_id: &str,
    now_ms: i64,
    rng: &mut impl Rng,
) -> Option<Vec<(String, String)>> {
    let radius_m = zone.radius_nm * NM_TO_M;
    if distance_m(zone.center_lat, zone.center_lon, vessel.latitude, vessel.longitude) > radius_m {
        return None;
    }

    if !rng.gen_bool(DETECTION_PROBABILITY) {
        return None;
    }

    let (lat, lon) = perturb_uniform_m(vessel.latitude, vessel.longitude, POSITION_ERROR_M, rng);
    let length = (vessel.length_m + rng.gen_range(-DIMENSION_ERROR_M..DIMENSION_ERROR_M)).max(0.0);
    let width = (vessel.beam_m + rng.gen_range(-DIMENSION_ERROR_M..DIMENSION_ERROR_M)).max(0.0);

    let visual_name = if rng.gen_bool(VISUAL_NAME_ACCURACY) {
        vessel.name.clone()
    } else {
        "UNREADABLE".to_string()
    };

    Some(vec![
        ("detection_id".into(), detection_id.to_string()),
        ("drone_id".into(), zone.id.clone()),
        ("latitude".into(), lat.to_string()),
        ("longitude".into(), lon.to_string()),
        ("confidence".into(), DETECTION_PROBABILITY.to_string()),
        ("object_class".into(), vessel.class.as_str().to_string()),
        ("estimated_length_m".into(), length.to_string()),
        ("estimated_width_m".into(), width.to_string()),
        ("frame_id".into(), frame_id.to_string()),
        ("visual_name".into(), visual_name),
        ("timestamp".into(), now_ms.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use maritime_types::VesselClass;
    use rand::SeedableRng;

    fn zone() -> PatrolZone {
        PatrolZone {
            id: "DRN-001".into(),
            center_lat: 18.9,
            center_lon: 72.8,
            radius_nm: 2.0,
            active_probability: 1.0,
        }
    }

    fn vessel() -> Vessel {
        Vessel {
            id: "V00000001".into(),
            name: "MV Test".into(),
            class: VesselClass::Cargo,
            mmsi: "200000001".into(),
            latitude: 18.9,
            longitude: 72.8,
            speed_knots: 10.0,
            course_deg: 90.0,
            heading_deg: 90.0,
            length_m: 180.0,
            beam_m: 28.0,
            draught_m: 10.0,
            rcs: 1.4,
            ais_on: false,
            lane_id: "lane".into(),
            waypoint_index: 0,
            target_lat: 18.9,
            target_lon: 72.8,
            lane_forward: true,
        }
    }

    #[test]
    fn out_of_radius_never_detects() {
        let zone = zone();
        let mut far = vessel();
        far.latitude = 25.0;
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(detect(&zone, &far, "D1", "F1", 0, &mut rng).is_none());
        }
    }

    #[test]
    fn visual_name_is_sometimes_unreadable_sometimes_correct() {
        let zone = zone();
        let v = vessel();
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let mut correct = 0;
        let mut unreadable = 0;
        for _ in 0..500 {
            if let Some(fields) = detect(&zone, &v, "D1", "F1", 0, &mut rng) {
                let name = &fields.iter().find(|(k, _)| k == "visual_name").unwrap().1;
                if name == &v.name {
                    correct += 1;
                } else {
                    assert_eq!(name, "UNREADABLE");
                    unreadable += 1;
                }
            }
        }
        assert!(correct > 0);
        assert!(unreadable > 0);
    }
}
