//! Owns unified-track state: creation, inverse-variance kinematic fusion,
//! the lifecycle state machine, and the dark-ship detection rules. This is
//! the only place `UnifiedTrack` values are mutated after creation.

use crate::correlation::TrackSnapshot;
use chrono::{DateTime, Utc};
use maritime_types::{
    CorrelationGates, DarkShipDetectionConfig, IdentitySource, Observation, SensorContribution,
    SensorKind, TrackStatus, UnifiedTrack,
};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("unknown track id {0}")]
    UnknownTrack(String),
    #[error("update would leave track {track_id} in an invalid state: {reason}")]
    InvariantViolation { track_id: String, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct FusionStats {
    pub tracks_created: u64,
    pub tracks_updated: u64,
    pub tracks_dropped: u64,
    pub dark_ship_alerts: u64,
    pub invariant_violations: u64,
}

pub struct TrackManager {
    tracks: HashMap<String, UnifiedTrack>,
    gates: CorrelationGates,
    dark_cfg: DarkShipDetectionConfig,
    stats: FusionStats,
}

impl TrackManager {
    pub fn new(gates: CorrelationGates, dark_cfg: DarkShipDetectionConfig) -> Self {
        TrackManager {
            tracks: HashMap::new(),
            gates,
            dark_cfg,
            stats: FusionStats::default(),
        }
    }

    pub fn stats(&self) -> &FusionStats {
        &self.stats
    }

    /// Tracks that still participate in correlation and publishing. Once
    /// dropped, a track is frozen and falls out of this view permanently.
    pub fn active_tracks(&self) -> Vec<&UnifiedTrack> {
        self.tracks.values().filter(|t| t.status != TrackStatus::Dropped).collect()
    }

    pub fn active_snapshots(&self) -> Vec<TrackSnapshot> {
        self.active_tracks().into_iter().map(TrackSnapshot::from).collect()
    }

    pub fn dark_ships(&self) -> Vec<&UnifiedTrack> {
        self.tracks.values().filter(|t| t.is_dark_ship).collect()
    }

    pub fn get(&self, track_id: &str) -> Option<&UnifiedTrack> {
        self.tracks.get(track_id)
    }

    /// One-shot clear after an alert has been published to `fusion:dark_ships`.
    /// `is_dark_ship`/`dark_ship_confidence` are left untouched; only the
    /// review flag is one-shot.
    pub fn clear_flag(&mut self, track_id: &str) {
        if let Some(track) = self.tracks.get_mut(track_id) {
            track.flagged_for_review = false;
        }
    }

    /// Creates a new tentative track from an unmatched observation.
    pub fn create_track(&mut self, obs: &Observation, sensor_id: &str, now: DateTime<Utc>) -> String {
        let track_id = format!("TRK-{}", Uuid::new_v4());
        let sigma = obs.kind().position_error_m();
        let mut track = UnifiedTrack::new(track_id.clone(), obs.latitude(), obs.longitude(), sigma, now);

        apply_identity_on_create(&mut track, obs, now);

        track.sensor_contributions.insert(
            obs.kind(),
            SensorContribution {
                sensor_kind: obs.kind(),
                sensor_id: sensor_id.to_string(),
                last_update: now,
                measurement_count: 1,
                last_position: (obs.latitude(), obs.longitude()),
                confidence: 1.0,
            },
        );
        track.update_count = 1;
        track.correlation_confidence = 1.0;
        track.track_quality = compute_quality(&track);

        self.tracks.insert(track_id.clone(), track);
        self.stats.tracks_created += 1;
        track_id
    }

    /// Folds one correlated observation into an existing track.
    pub fn update_track(
        &mut self,
        track_id: &str,
        obs: &Observation,
        sensor_id: &str,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Result<(), FusionError> {
        let track = self
            .tracks
            .get_mut(track_id)
            .ok_or_else(|| FusionError::UnknownTrack(track_id.to_string()))?;

        if track.status == TrackStatus::Dropped {
            return Ok(());
        }

        let sigma_t = track.position_uncertainty_m;
        let sigma_o = obs.kind().position_error_m();
        let w_t = 1.0 / sigma_t.powi(2);
        let w_o = 1.0 / sigma_o.powi(2);
        let new_lat = (track.latitude * w_t + obs.latitude() * w_o) / (w_t + w_o);
        let new_lon = (track.longitude * w_t + obs.longitude() * w_o) / (w_t + w_o);
        let new_sigma = 1.0 / (w_t + w_o).sqrt();

        if !new_lat.is_finite() || !new_lon.is_finite() || !new_sigma.is_finite() || new_sigma <= 0.0 {
            self.stats.invariant_violations += 1;
            return Err(FusionError::InvariantViolation {
                track_id: track_id.to_string(),
                reason: "fused position or uncertainty is not finite".into(),
            });
        }

        track.latitude = new_lat;
        track.longitude = new_lon;
        track.position_uncertainty_m = new_sigma;

        if let (Some(speed), Some(course)) = (obs.speed_knots(), obs.course_deg()) {
            track.speed_knots = Some(speed);
            track.course = Some(course);
            track.heading = Some(course);
            let (v_n, v_e) = maritime_types::geo::velocity_components(speed, course);
            track.velocity_north_ms = v_n;
            track.velocity_east_ms = v_e;
        }

        apply_identity_on_update(track, obs, now, &self.dark_cfg);

        let entry = track
            .sensor_contributions
            .entry(obs.kind())
            .or_insert_with(|| SensorContribution {
                sensor_kind: obs.kind(),
                sensor_id: sensor_id.to_string(),
                last_update: now,
                measurement_count: 0,
                last_position: (obs.latitude(), obs.longitude()),
                confidence,
            });
        entry.sensor_id = sensor_id.to_string();
        entry.last_update = now;
        entry.measurement_count += 1;
        entry.last_position = (obs.latitude(), obs.longitude());
        entry.confidence = confidence;

        track.updated_at = now;
        track.update_count += 1;
        track.correlation_confidence = track.correlation_confidence.max(confidence);

        match track.status {
            TrackStatus::Tentative if track.update_count >= self.gates.tentative_to_confirmed_updates => {
                track.status = TrackStatus::Confirmed;
            }
            TrackStatus::Coasting => {
                track.status = TrackStatus::Confirmed;
            }
            _ => {}
        }

        track.track_quality = compute_quality(track);
        self.stats.tracks_updated += 1;
        Ok(())
    }

    /// Runs once per fusion tick, before `age_tracks`, so a gap computed
    /// from a just-applied AIS update is current for this same tick.
    pub fn check_dark_ships(&mut self, now: DateTime<Utc>) {
        let dark_cfg = self.dark_cfg;
        for track in self.tracks.values_mut() {
            if track.status == TrackStatus::Dropped {
                continue;
            }
            match track.identity_source {
                IdentitySource::Ais => check_ais_gap(track, &dark_cfg, now),
                IdentitySource::Unknown => check_unknown_identity(track, &dark_cfg),
                IdentitySource::DroneVisual => {}
            }
            if track.flagged_for_review {
                self.stats.dark_ship_alerts += 1;
            }
        }
    }

    /// Runs once per fusion tick: coasts tracks with a stale update, drops
    /// tracks past the drop timeout. A dropped track is never touched again.
    pub fn age_tracks(&mut self, now: DateTime<Utc>) {
        for track in self.tracks.values_mut() {
            if track.status == TrackStatus::Dropped {
                continue;
            }
            let gap_s = (now - track.updated_at).num_milliseconds() as f64 / 1000.0;
            if gap_s > self.gates.drop_timeout_s {
                track.status = TrackStatus::Dropped;
                self.stats.tracks_dropped += 1;
            } else if gap_s > self.gates.coasting_timeout_s && track.status != TrackStatus::Coasting {
                track.status = TrackStatus::Coasting;
                track.position_uncertainty_m =
                    (1.5 * track.position_uncertainty_m).min(self.gates.max_position_uncertainty_m);
            }
        }
    }
}

fn check_ais_gap(track: &mut UnifiedTrack, dark_cfg: &DarkShipDetectionConfig, now: DateTime<Utc>) {
    let Some(last_seen) = track.ais_last_seen else { return };
    let gap_s = (now - last_seen).num_milliseconds() as f64 / 1000.0;
    track.ais_gap_seconds = Some(gap_s);

    if gap_s <= dark_cfg.ais_gap_threshold_s {
        return;
    }
    let has_recent_non_ais = track.sensor_contributions.iter().any(|(kind, c)| {
        *kind != SensorKind::Ais && (now - c.last_update).num_milliseconds() as f64 / 1000.0 <= 120.0
    });
    if has_recent_non_ais {
        track.is_dark_ship = true;
        track.dark_ship_confidence = (gap_s / 3600.0).min(1.0);
        track.flagged_for_review = true;
        track.alert_reason = Some(format!("AIS gap: {} minutes", (gap_s / 60.0).round() as i64));
    }
}

fn check_unknown_identity(track: &mut UnifiedTrack, dark_cfg: &DarkShipDetectionConfig) {
    if track.is_dark_ship {
        return;
    }
    let kinds: Vec<SensorKind> = track.sensor_contributions.keys().copied().collect();
    let non_ais_count = kinds.iter().filter(|k| **k != SensorKind::Ais).count();
    let has_drone = kinds.contains(&SensorKind::Drone);
    if non_ais_count < 2 && !has_drone {
        return;
    }

    let radar_boost = track
        .sensor_contributions
        .get(&SensorKind::Radar)
        .filter(|c| c.measurement_count >= dark_cfg.min_radar_correlations)
        .map(|_| dark_cfg.radar_confidence_boost)
        .unwrap_or(0.0);
    let satellite_boost = track
        .sensor_contributions
        .get(&SensorKind::Satellite)
        .filter(|c| c.measurement_count >= dark_cfg.min_satellite_detections)
        .map(|_| dark_cfg.satellite_confidence_boost)
        .unwrap_or(0.0);
    let drone_boost = track
        .sensor_contributions
        .get(&SensorKind::Drone)
        .filter(|c| c.measurement_count >= dark_cfg.min_drone_detections)
        .map(|_| dark_cfg.drone_confidence_boost)
        .unwrap_or(0.0);

    let confidence: f64 = (0.5 + radar_boost + satellite_boost + drone_boost).min(1.0);
    track.is_dark_ship = true;
    track.dark_ship_confidence = confidence;
    if confidence >= dark_cfg.dark_ship_alert_threshold {
        track.flagged_for_review = true;
        track.alert_reason = Some(format!(
            "Unknown identity, multi-sensor confirmation (confidence {confidence:.2})"
        ));
    }
}

fn apply_identity_on_create(track: &mut UnifiedTrack, obs: &Observation, now: DateTime<Utc>) {
    match obs {
        Observation::Ais(o) => {
            track.identity_source = IdentitySource::Ais;
            track.mmsi = Some(o.mmsi.clone());
            track.ship_name = Some(o.ship_name.clone());
            track.vessel_type = Some(o.ship_type.clone());
            track.ais_last_seen = Some(now);
        }
        Observation::Satellite(o) => {
            track.vessel_length_m = Some(o.vessel_length_m);
        }
        Observation::Drone(o) => {
            track.vessel_type = Some(o.object_class.clone());
            track.vessel_length_m = Some(o.estimated_length_m);
        }
        Observation::Radar(_) => {}
    }
}

fn apply_identity_on_update(
    track: &mut UnifiedTrack,
    obs: &Observation,
    now: DateTime<Utc>,
    _dark_cfg: &DarkShipDetectionConfig,
) {
    match obs {
        Observation::Ais(o) => {
            track.identity_source = IdentitySource::Ais;
            track.mmsi = Some(o.mmsi.clone());
            track.ship_name = Some(o.ship_name.clone());
            track.vessel_type = Some(o.ship_type.clone());
            track.ais_last_seen = Some(now);
            track.is_dark_ship = false;
            track.dark_ship_confidence = 0.0;
            track.flagged_for_review = false;
            track.alert_reason = None;
        }
        Observation::Satellite(o) => {
            track.vessel_length_m = Some(o.vessel_length_m);
            if o.is_dark_ship && track.identity_source != IdentitySource::Ais {
                track.is_dark_ship = true;
                track.dark_ship_confidence = track.dark_ship_confidence.max(0.6);
            }
        }
        Observation::Drone(o) => {
            track.vessel_type = Some(o.object_class.clone());
            track.vessel_length_m = Some(o.estimated_length_m);
        }
        Observation::Radar(_) => {}
    }
}

fn compute_quality(track: &UnifiedTrack) -> u32 {
    let sensors = track.sensor_contributions.len() as u32;
    let bucket = if track.position_uncertainty_m < 100.0 {
        30
    } else if track.position_uncertainty_m < 500.0 {
        20
    } else if track.position_uncertainty_m < 1000.0 {
        10
    } else {
        0
    };
    (10 * sensors + 5 * track.update_count.min(6) + bucket).min(100)
}
