use crate::noise::perturb_uniform_m;
use maritime_types::Vessel;
use rand::Rng;

const POSITION_ERROR_M: f64 = 10.0;
const TRANSMISSION_PROBABILITY: f64 = 0.8;
const PACKET_LOSS_RATE: f64 = 0.05;

/// AIS detection model: skip dark vessels, then apply transmission and
/// packet-loss draws, then perturb position only (speed/course/identity
/// pass through untouched).
pub fn detect(vessel: &Vessel, now_ms: i64, rng: &mut impl Rng) -> Option<Vec<(String, String)>> {
    if !vessel.ais_on {
        return None;
    }
    if !rng.gen_bool(TRANSMISSION_PROBABILITY) {
        return None;
    }
    if rng.gen_bool(PACKET_LOSS_RATE) {
        return None;
    }

    let (lat, lon) = perturb_uniform_m(vessel.latitude, vessel.longitude, POSITION_ERROR_M, rng);

    Some(vec![
        ("mmsi".into(), vessel.mmsi.clone()),
        ("ship_name".into(), vessel.name.clone()),
        ("ship_type".into(), vessel.class.as_str().into()),
        ("latitude".into(), lat.to_string()),
        ("longitude".into(), lon.to_string()),
        ("speed_knots".into(), vessel.speed_knots.to_string()),
        ("course".into(), vessel.course_deg.to_string()),
        ("timestamp".into(), now_ms.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use maritime_types::VesselClass;
    use rand::SeedableRng;

    fn make_vessel(ais_on: bool) -> Vessel {
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
            ais_on,
            lane_id: "lane".into(),
            waypoint_index: 0,
            target_lat: 18.9,
            target_lon: 72.8,
            lane_forward: true,
        }
    }

    #[test]
    fn dark_vessel_never_emits_ais() {
        let vessel = make_vessel(false);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..200 {
            assert!(detect(&vessel, 0, &mut rng).is_none());
        }
    }

    #[test]
    fn ais_on_vessel_sometimes_emits() {
        let vessel = make_vessel(true);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let emitted = (0..500).filter(|_| detect(&vessel, 0, &mut rng).is_some()).count();
        assert!(emitted > 0);
    }
}
