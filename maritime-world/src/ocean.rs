//! Ocean bounding box and a coarse land mask over the Indian Ocean / Arabian
//! Sea region. Coarse by design: the world simulator needs "is this move
//! onto land", not a nautical chart.

pub const LAT_MIN: f64 = 5.0;
pub const LAT_MAX: f64 = 25.0;
pub const LON_MIN: f64 = 65.0;
pub const LON_MAX: f64 = 100.0;

const MARGIN_DEG: f64 = 0.5;

/// Rectangular land interiors: (lat_min, lat_max, lon_min, lon_max).
/// Coastal waters around these are left clear so port-to-port lanes
/// never cross them.
const LAND_BOXES: [(f64, f64, f64, f64); 2] = [
    // Indian subcontinent interior.
    (9.5, 22.5, 74.5, 86.5),
    // Sri Lanka interior.
    (6.6, 9.4, 80.0, 81.6),
];

/// A deep-ocean cell guaranteed clear of every land box, used as a spawn
/// fallback when retried placement is exhausted.
pub const DEEP_OCEAN_FALLBACK: (f64, f64) = (12.0, 68.0);

pub fn is_in_bounds_with_margin(lat: f64, lon: f64) -> bool {
    lat >= LAT_MIN + MARGIN_DEG
        && lat <= LAT_MAX - MARGIN_DEG
        && lon >= LON_MIN + MARGIN_DEG
        && lon <= LON_MAX - MARGIN_DEG
}

/// True if (lat, lon) is over water: inside the AOI bounding box (with
/// margin) and outside every land box.
pub fn is_ocean(lat: f64, lon: f64) -> bool {
    if !is_in_bounds_with_margin(lat, lon) {
        return false;
    }
    !LAND_BOXES
        .iter()
        .any(|&(lat_min, lat_max, lon_min, lon_max)| {
            lat >= lat_min && lat <= lat_max && lon >= lon_min && lon <= lon_max
        })
}
