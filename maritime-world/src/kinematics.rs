use crate::lanes::Lanes;
use crate::ocean;
use maritime_types::geo::{bearing_deg, flat_earth_move, haversine_m, knots_to_ms};
use maritime_types::{Vessel, VesselClass};
use rand::Rng;

const WAYPOINT_ARRIVAL_M: f64 = 5.0 * 1852.0; // 5 nautical miles
const MAX_TURN_RATE_DEG_PER_S: f64 = 5.0;
const HEADING_JITTER_DEG: f64 = 3.0;
const COURSE_JITTER_DEG: f64 = 15.0;
const COURSE_JITTER_PROBABILITY: f64 = 0.05;
const SPEED_WALK_PROBABILITY: f64 = 0.01;
const DEFAULT_AIS_TOGGLE_PROBABILITY: f64 = 0.001;

/// Advances one vessel by `dt_real_s` real seconds, scaled by the
/// time-acceleration factor `time_accel`. Mutates `vessel` in place.
pub fn tick(
    vessel: &mut Vessel,
    lanes: &Lanes,
    dt_real_s: f64,
    time_accel: f64,
    ais_toggle_probability: f64,
    rng: &mut impl Rng,
) {
    let dt_sim_s = dt_real_s * time_accel;

    advance_waypoint(vessel, lanes, rng);

    let mut target_course = bearing_deg(vessel.latitude, vessel.longitude, vessel.target_lat, vessel.target_lon);
    if rng.gen_bool(COURSE_JITTER_PROBABILITY) {
        let course_jitter = rng.gen_range(-COURSE_JITTER_DEG..COURSE_JITTER_DEG);
        target_course = (target_course + course_jitter).rem_euclid(360.0);
    }
    let max_delta = MAX_TURN_RATE_DEG_PER_S * dt_sim_s;
    let delta = maritime_types::geo::angle_diff_deg(target_course, vessel.course_deg).clamp(-max_delta, max_delta);
    let new_course = (vessel.course_deg + delta).rem_euclid(360.0);

    let distance_m = knots_to_ms(vessel.speed_knots) * dt_sim_s;
    let (new_lat, new_lon) = flat_earth_move(vessel.latitude, vessel.longitude, new_course, distance_m);

    if ocean::is_ocean(new_lat, new_lon) {
        vessel.latitude = new_lat;
        vessel.longitude = new_lon;
        vessel.course_deg = new_course;
    } else {
        // Land ahead: reverse course, discard the move.
        vessel.course_deg = (new_course + 180.0).rem_euclid(360.0);
    }

    let jitter = rng.gen_range(-HEADING_JITTER_DEG..HEADING_JITTER_DEG);
    vessel.heading_deg = (vessel.course_deg + jitter).rem_euclid(360.0);

    if rng.gen_bool(SPEED_WALK_PROBABILITY) {
        let (speed_min, speed_max) = vessel.class.speed_band_knots();
        vessel.speed_knots = rng.gen_range(speed_min..=speed_max);
    }

    if rng.gen_bool(ais_toggle_probability) {
        vessel.ais_on = !vessel.ais_on;
    }
}

fn advance_waypoint(vessel: &mut Vessel, lanes: &Lanes, rng: &mut impl Rng) {
    let lane = match lanes.get(&vessel.lane_id) {
        Some(l) => l,
        None => return,
    };

    let (wp_lat, wp_lon) = lane.waypoint(vessel.waypoint_index, vessel.lane_forward);
    let dist = haversine_m(vessel.latitude, vessel.longitude, wp_lat, wp_lon);

    if dist < WAYPOINT_ARRIVAL_M {
        if vessel.waypoint_index + 1 < lane.len() {
            vessel.waypoint_index += 1;
        } else if rng.gen_bool(0.5) {
            // Reverse direction along the same lane.
            vessel.lane_forward = !vessel.lane_forward;
            vessel.waypoint_index = 0;
        } else {
            // Hop to a new lane entirely.
            let new_lane = lanes.random(rng);
            vessel.lane_id = new_lane.id.to_string();
            vessel.waypoint_index = 0;
            vessel.lane_forward = true;
        }
    }

    if let Some(lane) = lanes.get(&vessel.lane_id) {
        let (lat, lon) = lane.waypoint(vessel.waypoint_index, vessel.lane_forward);
        vessel.target_lat = lat;
        vessel.target_lon = lon;
    }
}

pub fn default_ais_toggle_probability() -> f64 {
    DEFAULT_AIS_TOGGLE_PROBABILITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn make_vessel(lat: f64, lon: f64, course: f64, lane_id: &str) -> Vessel {
        Vessel {
            id: "V00000001".into(),
            name: "Test".into(),
            class: VesselClass::Cargo,
            mmsi: "200000001".into(),
            latitude: lat,
            longitude: lon,
            speed_knots: 12.0,
            course_deg: course,
            heading_deg: course,
            length_m: 180.0,
            beam_m: 28.0,
            draught_m: 10.0,
            rcs: 1.4,
            ais_on: true,
            lane_id: lane_id.to_string(),
            waypoint_index: 0,
            target_lat: lat,
            target_lon: lon,
            lane_forward: true,
        }
    }

    #[test]
    fn turn_rate_is_clamped_per_simulated_second() {
        let lanes = Lanes::new();
        let lane_id = lanes.get("Mumbai-Dubai").unwrap().id;
        let mut vessel = make_vessel(10.0, 70.0, 0.0, lane_id);
        vessel.target_lat = 10.0;
        vessel.target_lon = 75.0; // due east: target course ~90
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let before = vessel.course_deg;
        tick(&mut vessel, &lanes, 1.0, 1.0, 0.0, &mut rng);
        let delta = (vessel.course_deg - before).abs();
        assert!(delta <= MAX_TURN_RATE_DEG_PER_S + HEADING_JITTER_DEG + 1e-6);
    }

    #[test]
    fn land_ahead_reverses_course_and_stays_over_ocean() {
        let lanes = Lanes::new();
        // 0.1 degrees offshore of the Indian subcontinent land box, heading east onto it.
        let mut vessel = make_vessel(15.0, 74.4, 90.0, "Mumbai-Kochi");
        vessel.target_lat = 15.0;
        vessel.target_lon = 80.0;
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);

        for _ in 0..5 {
            tick(&mut vessel, &lanes, 1.0, 50.0, 0.0, &mut rng);
            assert!(ocean::is_ocean(vessel.latitude, vessel.longitude));
        }
    }

    #[test]
    fn course_jitter_stays_within_the_turn_rate_clamp() {
        let lanes = Lanes::new();
        let lane_id = lanes.get("Mumbai-Dubai").unwrap().id;
        let mut vessel = make_vessel(10.0, 70.0, 90.0, lane_id);
        vessel.target_lat = 10.0;
        vessel.target_lon = 70.0001; // negligible bearing pull, isolates the jitter term
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut saw_jitter_sized_turn = false;
        for _ in 0..200 {
            let before = vessel.course_deg;
            tick(&mut vessel, &lanes, 1.0, 1.0, 0.0, &mut rng);
            let delta = maritime_types::geo::angle_diff_deg(vessel.course_deg, before).abs();
            assert!(delta <= MAX_TURN_RATE_DEG_PER_S + 1e-6);
            if delta > MAX_TURN_RATE_DEG_PER_S / 2.0 {
                saw_jitter_sized_turn = true;
            }
        }
        assert!(saw_jitter_sized_turn);
    }

    #[test]
    fn waypoint_advance_triggers_near_arrival() {
        let lanes = Lanes::new();
        let lane_id = lanes.get("Mumbai-Dubai").unwrap().id;
        let mut vessel = make_vessel(18.94, 72.84, 0.0, lane_id);
        let lane = lanes.get(lane_id).unwrap();
        let (wp_lat, wp_lon) = lane.waypoint(1, true);
        vessel.latitude = wp_lat;
        vessel.longitude = wp_lon;
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        advance_waypoint(&mut vessel, &lanes, &mut rng);
        assert_eq!(vessel.waypoint_index, 2);
    }
}
