use crate::lanes::Lanes;
use crate::ocean;
use maritime_types::{Vessel, VesselClass};
use rand::Rng;

const MAX_PLACEMENT_ATTEMPTS: u32 = 20;
const LANE_OFFSET_DEG: f64 = 0.3;

const CLASSES: &[VesselClass] = &[
    VesselClass::Cargo,
    VesselClass::Tanker,
    VesselClass::Container,
    VesselClass::Fishing,
    VesselClass::Passenger,
    VesselClass::Naval,
    VesselClass::Tug,
    VesselClass::Unknown,
];

fn draw_class(rng: &mut impl Rng) -> VesselClass {
    let total: u32 = CLASSES.iter().map(|c| c.spawn_weight()).sum();
    let mut roll = rng.gen_range(0..total);
    for class in CLASSES {
        let w = class.spawn_weight();
        if roll < w {
            return *class;
        }
        roll -= w;
    }
    VesselClass::Unknown
}

/// Places a vessel on a random segment of a random lane with a small
/// random offset, retrying until the placement lies in ocean; falls back
/// to a deep-ocean cell after `MAX_PLACEMENT_ATTEMPTS`.
fn place_on_lane(lanes: &Lanes, rng: &mut impl Rng) -> (f64, f64, String, usize) {
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let lane = lanes.random(rng);
        let index = rng.gen_range(0..lane.len());
        let (lat, lon) = lane.waypoint(index, true);
        let lat = lat + rng.gen_range(-LANE_OFFSET_DEG..LANE_OFFSET_DEG);
        let lon = lon + rng.gen_range(-LANE_OFFSET_DEG..LANE_OFFSET_DEG);
        if ocean::is_ocean(lat, lon) {
            return (lat, lon, lane.id.to_string(), index);
        }
    }
    let (lat, lon) = ocean::DEEP_OCEAN_FALLBACK;
    let lane = lanes.random(rng);
    (lat, lon, lane.id.to_string(), 0)
}

/// Generates `num` vessels in the class ratios from `VesselClass::spawn_weight`,
/// with `ais_on` starting false at probability `max(class_base_dark_rate, dark_pct/100)`.
pub fn init_fleet(num: u32, dark_pct: f64, lanes: &Lanes, rng: &mut impl Rng) -> Vec<Vessel> {
    (0..num)
        .map(|i| {
            let class = draw_class(rng);
            let (lat, lon, lane_id, waypoint_index) = place_on_lane(lanes, rng);
            let (speed_min, speed_max) = class.speed_band_knots();
            let speed_knots = rng.gen_range(speed_min..=speed_max);
            let course_deg = rng.gen_range(0.0..360.0);
            let (length_m, beam_m, draught_m, rcs) = class.physical_profile();

            let dark_prob = class.base_dark_rate().max(dark_pct / 100.0);
            let ais_on = !rng.gen_bool(dark_prob.clamp(0.0, 1.0));

            let id = format!("V{:08}", i + 1);
            let mmsi = format!("{:09}", 200_000_000 + i);
            let name = format!("{} {}", class.as_str().to_uppercase(), i + 1);

            Vessel {
                id,
                name,
                class,
                mmsi,
                latitude: lat,
                longitude: lon,
                speed_knots,
                course_deg,
                heading_deg: course_deg,
                length_m,
                beam_m,
                draught_m,
                rcs,
                ais_on,
                lane_id,
                waypoint_index,
                target_lat: lat,
                target_lon: lon,
                lane_forward: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn init_fleet_places_every_vessel_in_ocean() {
        let lanes = Lanes::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let fleet = init_fleet(200, 10.0, &lanes, &mut rng);
        assert_eq!(fleet.len(), 200);
        for v in &fleet {
            assert!(ocean::is_ocean(v.latitude, v.longitude), "{:?}", v);
            assert!(v.speed_knots >= 1.0 && v.speed_knots <= 30.0);
        }
    }

    #[test]
    fn init_fleet_respects_dark_pct_floor() {
        let lanes = Lanes::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let fleet = init_fleet(2000, 50.0, &lanes, &mut rng);
        let dark = fleet.iter().filter(|v| !v.ais_on).count();
        // With dark_pct=50 the floor dominates every class's base rate.
        assert!(dark as f64 / fleet.len() as f64 > 0.35);
    }
}
