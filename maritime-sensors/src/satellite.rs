use crate::noise::perturb_uniform_m;
use maritime_types::Vessel;
use rand::Rng;
use serde::Deserialize;

pub const POSITION_ERROR_M: f64 = 2000.0;
const LENGTH_ERROR_M: f64 = 20.0;
const METERS_PER_DEGREE: f64 = 111_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SatelliteKind {
    Sar,
    Optical,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Satellite {
    pub id: String,
    pub kind: SatelliteKind,
    /// Cycles between passes; a pass triggers iff `cycle % revisit == 0`.
    pub revisit: u32,
    pub swath_km: f64,
    /// Cloud cover fraction in [0,1], only relevant to optical satellites.
    pub cloud: f64,
}

#[derive(Debug, Clone, Copy)]
enum Orientation {
    NorthSouth,
    EastWest,
}

#[derive(Debug, Clone, Copy)]
pub struct Swath {
    orientation: Orientation,
    center_deg: f64,
    half_width_deg: f64,
}

impl Swath {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        match self.orientation {
            Orientation::NorthSouth => (lon - self.center_deg).abs() <= self.half_width_deg,
            Orientation::EastWest => (lat - self.center_deg).abs() <= self.half_width_deg,
        }
    }
}

/// Generates a random swath footprint if satellite `sat` passes this cycle.
pub fn maybe_pass(
    sat: &Satellite,
    cycle: u64,
    aoi: (f64, f64, f64, f64), // lat_min, lat_max, lon_min, lon_max
    rng: &mut impl Rng,
) -> Option<Swath> {
    if sat.revisit == 0 || cycle % sat.revisit as u64 != 0 {
        return None;
    }

    let half_width_deg = (sat.swath_km * 1000.0 / 2.0) / METERS_PER_DEGREE;
    let (lat_min, lat_max, lon_min, lon_max) = aoi;

    let orientation = if rng.gen_bool(0.5) {
        Orientation::NorthSouth
    } else {
        Orientation::EastWest
    };

    let center_deg = match orientation {
        Orientation::NorthSouth => {
            let lo = (lon_min + half_width_deg).min(lon_max);
            let hi = (lon_max - half_width_deg).max(lo);
            rng.gen_range(lo..=hi)
        }
        Orientation::EastWest => {
            let lo = (lat_min + half_width_deg).min(lat_max);
            let hi = (lat_max - half_width_deg).max(lo);
            rng.gen_range(lo..=hi)
        }
    };

    Some(Swath { orientation, center_deg, half_width_deg })
}

fn detection_probability(sat: &Satellite) -> f64 {
    match sat.kind {
        SatelliteKind::Sar => 0.95,
        SatelliteKind::Optical => 0.85 * (1.0 - sat.cloud).max(0.0),
    }
}

/// Per-vessel detection within an active swath.
pub fn detect(
    sat: &Satellite,
    swath: &Swath,
    vessel: &Vessel,
    detection_id: &str,
    now_ms: i64,
    rng: &mut impl Rng,
) -> Option<Vec<(String, String)>> {
    if !swath.contains(vessel.latitude, vessel.longitude) {
        return None;
    }
    let prob = detection_probability(sat);
    if !rng.gen_bool(prob.clamp(0.0, 1.0)) {
        return None;
    }

    let (lat, lon) = perturb_uniform_m(vessel.latitude, vessel.longitude, POSITION_ERROR_M, rng);
    let length = (vessel.length_m + rng.gen_range(-LENGTH_ERROR_M..LENGTH_ERROR_M)).max(0.0);

    Some(vec![
        ("detection_id".into(), detection_id.to_string()),
        ("source_satellite".into(), sat.id.clone()),
        ("latitude".into(), lat.to_string()),
        ("longitude".into(), lon.to_string()),
        ("vessel_length_m".into(), length.to_string()),
        ("confidence".into(), prob.to_string()),
        ("is_dark_ship".into(), (!vessel.ais_on).to_string().replace("true", "True").replace("false", "False")),
        ("timestamp".into(), now_ms.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use maritime_types::VesselClass;
    use rand::SeedableRng;

    const AOI: (f64, f64, f64, f64) = (5.0, 25.0, 65.0, 100.0);

    fn sat() -> Satellite {
        Satellite { id: "SAT-S2A".into(), kind: SatelliteKind::Sar, revisit: 10, swath_km: 200.0, cloud: 0.0 }
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
    fn pass_only_triggers_on_revisit_boundary() {
        let sat = sat();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert!(maybe_pass(&sat, 0, AOI, &mut rng).is_some());
        assert!(maybe_pass(&sat, 5, AOI, &mut rng).is_none());
        assert!(maybe_pass(&sat, 10, AOI, &mut rng).is_some());
    }

    #[test]
    fn dark_vessel_is_reported_as_dark() {
        let sat = sat();
        let v = vessel();
        // Swath centered directly on the vessel's longitude so containment is certain.
        let swath = Swath { orientation: Orientation::NorthSouth, center_deg: v.longitude, half_width_deg: 1.0 };
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let mut saw = false;
        for _ in 0..200 {
            if let Some(fields) = detect(&sat, &swath, &v, "D1", 0, &mut rng) {
                saw = true;
                let is_dark = fields.iter().find(|(k, _)| k == "is_dark_ship").unwrap();
                assert_eq!(is_dark.1, "True");
            }
        }
        assert!(saw, "expected at least one detection across attempts");
    }
}
