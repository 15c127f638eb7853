//! Two-phase observation-to-track assignment: deterministic MMSI pinning,
//! then a spatially gated minimum-cost bipartite assignment over whatever
//! observations remain.

use chrono::{DateTime, Utc};
use maritime_types::{geo, CorrelationGates, Observation, SensorKind, UnifiedTrack};
use pathfinding::matrix::Matrix;
use pathfinding::prelude::kuhn_munkres_min;
use std::collections::HashMap;

/// A sensor message carried alongside its instrument id, which observations
/// don't uniformly expose through a single field (radar stations, drone
/// zones, and satellites each name it differently).
#[derive(Debug, Clone)]
pub struct IncomingObservation {
    pub observation: Observation,
    pub sensor_id: String,
}

impl IncomingObservation {
    pub fn new(observation: Observation, sensor_id: String) -> Self {
        IncomingObservation { observation, sensor_id }
    }
}

/// The slice of track state the correlator needs; avoids handing it a
/// mutable reference to the track manager's map.
#[derive(Debug, Clone)]
pub struct TrackSnapshot {
    pub track_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: Option<f64>,
    pub course: Option<f64>,
    pub velocity_north_ms: f64,
    pub velocity_east_ms: f64,
    pub position_uncertainty_m: f64,
    pub updated_at: DateTime<Utc>,
    pub mmsi: Option<String>,
}

impl From<&UnifiedTrack> for TrackSnapshot {
    fn from(t: &UnifiedTrack) -> Self {
        TrackSnapshot {
            track_id: t.track_id.clone(),
            latitude: t.latitude,
            longitude: t.longitude,
            speed_knots: t.speed_knots,
            course: t.course,
            velocity_north_ms: t.velocity_north_ms,
            velocity_east_ms: t.velocity_east_ms,
            position_uncertainty_m: t.position_uncertainty_m,
            updated_at: t.updated_at,
            mmsi: t.mmsi.clone(),
        }
    }
}

/// One observation assigned to an existing track, with the score-derived
/// confidence the track manager folds into its update.
#[derive(Debug, Clone)]
pub struct TrackAssignment {
    pub obs_index: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CorrelationResult {
    /// track_id -> assignments, in the order observations appeared in the batch.
    pub to_existing: HashMap<String, Vec<TrackAssignment>>,
    pub new_tracks: Vec<usize>,
}

fn observation_mmsi(obs: &Observation) -> Option<&str> {
    obs.mmsi()
}

/// Integer scale for the cost matrix; `kuhn_munkres` wants ordered, copyable
/// weights, and scaled fixed-point avoids pulling in a float-specialized solver.
const COST_SCALE: f64 = 1000.0;
const INFEASIBLE: i64 = 1_000_000_000;

fn scaled(cost: f64) -> i64 {
    (cost * COST_SCALE).round() as i64
}

/// Score + gate check for one (observation, track) pair. Returns `None` if
/// the pair is outside the gate.
fn score_pair(
    obs: &Observation,
    track: &TrackSnapshot,
    gates: &CorrelationGates,
    now: DateTime<Utc>,
) -> Option<f64> {
    let dt_s = (now - track.updated_at).num_milliseconds() as f64 / 1000.0;
    let dt_s = dt_s.clamp(0.0, gates.max_time_delta_s);

    let (pred_lat, pred_lon) = geo::extrapolate_position(
        track.latitude,
        track.longitude,
        track.velocity_north_ms,
        track.velocity_east_ms,
        dt_s,
    );

    let sigma_sensor = obs.kind().position_error_m();
    let sigma_track = track.position_uncertainty_m;
    let combined = (sigma_track.powi(2) + sigma_sensor.powi(2)).sqrt();
    let gate = (gates.sigma_multiplier * combined).clamp(gates.min_distance_m, gates.max_distance_m);

    let distance = geo::haversine_m(pred_lat, pred_lon, obs.latitude(), obs.longitude());
    if distance > gate {
        return None;
    }

    let mut score = distance / combined;
    if let (Some(speed_o), Some(speed_t)) = (obs.speed_knots(), track.speed_knots) {
        score += (speed_o - speed_t).abs() / gates.max_speed_change_knots;
    }
    if let (Some(course_o), Some(course_t)) = (obs.course_deg(), track.course) {
        score += geo::angle_diff_deg(course_o, course_t).abs() / gates.max_course_change_deg;
    }
    Some(score)
}

/// Correlates a batch of observations against the currently alive tracks.
/// Phase 1 pins any observation whose MMSI already belongs to a track;
/// phase 2 solves a gated minimum-cost assignment over what remains.
pub fn batch_correlate(
    observations: &[IncomingObservation],
    tracks: &[TrackSnapshot],
    gates: &CorrelationGates,
    now: DateTime<Utc>,
) -> CorrelationResult {
    let mut result = CorrelationResult::default();

    let mmsi_to_track: HashMap<&str, &str> = tracks
        .iter()
        .filter_map(|t| t.mmsi.as_deref().map(|m| (m, t.track_id.as_str())))
        .collect();

    let mut remaining: Vec<usize> = Vec::with_capacity(observations.len());
    for (idx, incoming) in observations.iter().enumerate() {
        if let Some(mmsi) = observation_mmsi(&incoming.observation) {
            if let Some(track_id) = mmsi_to_track.get(mmsi) {
                result
                    .to_existing
                    .entry((*track_id).to_string())
                    .or_default()
                    .push(TrackAssignment { obs_index: idx, confidence: 1.0 });
                continue;
            }
        }
        remaining.push(idx);
    }

    if remaining.is_empty() {
        return result;
    }

    let r = remaining.len();
    let t = tracks.len();
    let cols = t + r;
    let size = cols.max(r);

    let mut weights: Vec<i64> = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let cost = if row >= r || col >= cols {
                0
            } else if col < t {
                match score_pair(&observations[remaining[row]].observation, &tracks[col], gates, now) {
                    Some(s) => scaled(s),
                    None => INFEASIBLE,
                }
            } else {
                let pseudo_owner = col - t;
                if pseudo_owner == row {
                    scaled(gates.new_track_cost)
                } else {
                    INFEASIBLE
                }
            };
            weights.push(cost);
        }
    }
    let matrix = Matrix::from_vec(size, size, weights).expect("square cost matrix");
    let (_total, assignment) = kuhn_munkres_min(&matrix);

    for row in 0..r {
        let col = assignment[row];
        let obs_idx = remaining[row];
        if col < t {
            let cost = score_pair(&observations[obs_idx].observation, &tracks[col], gates, now)
                .unwrap_or(gates.new_track_cost);
            let confidence = (1.0 - cost).clamp(0.0, 1.0);
            result
                .to_existing
                .entry(tracks[col].track_id.clone())
                .or_default()
                .push(TrackAssignment { obs_index: obs_idx, confidence });
        } else {
            result.new_tracks.push(obs_idx);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use maritime_types::observation::AisObservation;
    use maritime_types::RadarObservation;

    fn gates() -> CorrelationGates {
        CorrelationGates::default()
    }

    fn ais_obs(mmsi: &str, lat: f64, lon: f64) -> Observation {
        Observation::Ais(AisObservation {
            mmsi: mmsi.into(),
            ship_name: "MV Test".into(),
            ship_type: "cargo".into(),
            latitude: lat,
            longitude: lon,
            speed_knots: 10.0,
            course: 90.0,
            timestamp_ms: 0,
        })
    }

    fn radar_obs(lat: f64, lon: f64) -> Observation {
        Observation::Radar(RadarObservation {
            track_id: "RT1".into(),
            station_id: "RAD-MUM".into(),
            latitude: lat,
            longitude: lon,
            speed_knots: 10.0,
            course: 90.0,
            quality: 80,
            timestamp_ms: 0,
        })
    }

    fn track(id: &str, lat: f64, lon: f64, mmsi: Option<&str>) -> TrackSnapshot {
        TrackSnapshot {
            track_id: id.into(),
            latitude: lat,
            longitude: lon,
            speed_knots: Some(10.0),
            course: Some(90.0),
            velocity_north_ms: 0.0,
            velocity_east_ms: 5.14,
            position_uncertainty_m: 50.0,
            updated_at: Utc::now(),
            mmsi: mmsi.map(|s| s.to_string()),
        }
    }

    #[test]
    fn mmsi_pinning_ignores_spatial_distance() {
        let now = Utc::now();
        let far = track("TRK-1", 18.90, 72.80, Some("123456789"));
        // Observation is ~5km away from the pinned track's position.
        let obs = vec![IncomingObservation::new(ais_obs("123456789", 18.95, 72.80), "123456789".into())];
        let result = batch_correlate(&obs, &[far], &gates(), now);
        assert!(result.to_existing.contains_key("TRK-1"));
        assert_eq!(result.to_existing["TRK-1"][0].confidence, 1.0);
        assert!(result.new_tracks.is_empty());
    }

    #[test]
    fn out_of_gate_observation_becomes_new_track() {
        let now = Utc::now();
        let t = track("TRK-1", 18.90, 72.80, None);
        // 15km spurious contact, beyond max_gate of 10km.
        let obs = vec![IncomingObservation::new(radar_obs(19.03, 72.80), "RAD-MUM".into())];
        let result = batch_correlate(&obs, &[t], &gates(), now);
        assert!(result.to_existing.is_empty());
        assert_eq!(result.new_tracks, vec![0]);
    }

    #[test]
    fn close_observation_associates_with_existing_track() {
        let now = Utc::now();
        let t = track("TRK-1", 18.90, 72.80, None);
        let obs = vec![IncomingObservation::new(radar_obs(18.901, 72.801), "RAD-MUM".into())];
        let result = batch_correlate(&obs, &[t], &gates(), now);
        assert!(result.to_existing.contains_key("TRK-1"));
        assert!(result.new_tracks.is_empty());
    }

    #[test]
    fn every_observation_is_assigned_exactly_once() {
        let now = Utc::now();
        let t = track("TRK-1", 18.90, 72.80, None);
        let obs = vec![
            IncomingObservation::new(radar_obs(18.901, 72.801), "RAD-MUM".into()),
            IncomingObservation::new(radar_obs(25.0, 90.0), "RAD-MUM".into()),
        ];
        let result = batch_correlate(&obs, &[t], &gates(), now);
        let total: usize = result.to_existing.values().map(|v| v.len()).sum::<usize>() + result.new_tracks.len();
        assert_eq!(total, 2);
    }

    #[test]
    fn close_crossing_does_not_swap_mmsi_identity() {
        let now = Utc::now();
        let a = track("TRK-A", 18.900, 72.800, Some("111111111"));
        let b = track("TRK-B", 18.905, 72.800, Some("222222222"));
        let obs = vec![
            IncomingObservation::new(ais_obs("111111111", 18.9001, 72.8001), "111111111".into()),
            IncomingObservation::new(ais_obs("222222222", 18.9049, 72.8001), "222222222".into()),
        ];
        let result = batch_correlate(&obs, &[a, b], &gates(), now);
        assert_eq!(result.to_existing["TRK-A"][0].obs_index, 0);
        assert_eq!(result.to_existing["TRK-B"][0].obs_index, 1);
    }
}
