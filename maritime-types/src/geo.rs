//! Flat-earth and great-circle helpers shared by the world simulator,
//! sensor ingesters, and the correlation engine.

const EARTH_RADIUS_M: f64 = 6_371_000.0;
const METERS_PER_DEGREE: f64 = 111_000.0;
const KNOTS_TO_MS: f64 = 0.514_4;

/// Great-circle distance between two WGS84 points, in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Initial bearing from (lat1, lon1) to (lat2, lon2), degrees, 0 = north, clockwise.
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1r, lat2r) = (lat1.to_radians(), lat2.to_radians());
    let dlon = (lon2 - lon1).to_radians();
    let y = dlon.sin() * lat2r.cos();
    let x = lat1r.cos() * lat2r.sin() - lat1r.sin() * lat2r.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();
    (theta + 360.0) % 360.0
}

/// Move `distance_m` along `course_deg` from (lat, lon) using the flat-earth
/// degree approximation: dphi = d*cos(c), dlambda = d*sin(c)/cos(phi).
pub fn flat_earth_move(lat: f64, lon: f64, course_deg: f64, distance_m: f64) -> (f64, f64) {
    let course = course_deg.to_radians();
    let dlat_deg = (distance_m * course.cos()) / METERS_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().max(0.1);
    let dlon_deg = (distance_m * course.sin()) / (METERS_PER_DEGREE * cos_lat);
    (lat + dlat_deg, lon + dlon_deg)
}

/// Constant-velocity position extrapolation used by the correlation engine's
/// track predictor: velocity components are in m/s, dt in seconds.
pub fn extrapolate_position(lat: f64, lon: f64, v_north_ms: f64, v_east_ms: f64, dt_s: f64) -> (f64, f64) {
    let v_north_deg = v_north_ms * dt_s / METERS_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().max(0.1);
    let v_east_deg = v_east_ms * dt_s / (METERS_PER_DEGREE * cos_lat);
    (lat + v_north_deg, lon + v_east_deg)
}

/// Smallest signed angular difference `a - b`, wrapped to (-180, 180].
pub fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Knots to meters/second.
pub fn knots_to_ms(knots: f64) -> f64 {
    knots * KNOTS_TO_MS
}

/// Decompose a (speed_knots, course_deg) pair into (v_north_ms, v_east_ms).
pub fn velocity_components(speed_knots: f64, course_deg: f64) -> (f64, f64) {
    let speed_ms = knots_to_ms(speed_knots);
    let course = course_deg.to_radians();
    (speed_ms * course.cos(), speed_ms * course.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_distance() {
        assert!(haversine_m(18.9, 72.8, 18.9, 72.8) < 1e-6);
    }

    #[test]
    fn haversine_known_distance() {
        // Roughly 1 degree of latitude is ~111km.
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 1000.0);
    }

    #[test]
    fn bearing_due_north() {
        let b = bearing_deg(0.0, 0.0, 1.0, 0.0);
        assert!(b.abs() < 1e-6);
    }

    #[test]
    fn bearing_due_east() {
        let b = bearing_deg(0.0, 0.0, 0.0, 1.0);
        assert!((b - 90.0).abs() < 1e-6);
    }

    #[test]
    fn angle_diff_wraps() {
        assert!((angle_diff_deg(350.0, 10.0) - (-20.0)).abs() < 1e-9);
        assert!((angle_diff_deg(10.0, 350.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn flat_earth_move_north() {
        let (lat, lon) = flat_earth_move(0.0, 0.0, 0.0, 111_000.0);
        assert!((lat - 1.0).abs() < 0.01);
        assert!(lon.abs() < 1e-6);
    }
}
