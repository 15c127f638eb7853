//! Shared position/measurement noise helpers for the four sensor models.
//! Each ingester's detection pipeline is otherwise independent.

use maritime_types::geo::{haversine_m, knots_to_ms};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

const METERS_PER_DEGREE: f64 = 111_000.0;

/// Perturbs (lat, lon) by an independent uniform error of up to `max_err_m`
/// meters on each of the north and east axes.
pub fn perturb_uniform_m(lat: f64, lon: f64, max_err_m: f64, rng: &mut impl Rng) -> (f64, f64) {
    let dist = Uniform::new_inclusive(-max_err_m, max_err_m);
    let dn = dist.sample(rng);
    let de = dist.sample(rng);
    let dlat = dn / METERS_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().max(0.1);
    let dlon = de / (METERS_PER_DEGREE * cos_lat);
    (lat + dlat, lon + dlon)
}

pub fn perturb_uniform(value: f64, max_err: f64, rng: &mut impl Rng) -> f64 {
    let dist = Uniform::new_inclusive(-max_err, max_err);
    value + dist.sample(rng)
}

/// Re-exported for ingesters that need raw distance checks against a
/// station/satellite/zone footprint.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_m(lat1, lon1, lat2, lon2)
}

pub fn knots_to_ms_pub(knots: f64) -> f64 {
    knots_to_ms(knots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn perturb_uniform_m_stays_within_bound() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let (lat, lon) = perturb_uniform_m(18.9, 72.8, 10.0, &mut rng);
            let d = distance_m(18.9, 72.8, lat, lon);
            assert!(d <= 10.0 * 1.5, "perturbation exceeded expected bound: {d}");
        }
    }
}
