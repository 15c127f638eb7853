//! Drives the single read-correlate-update-publish loop. One tick talks to
//! the bus and store; correlation and track-state mutation happen entirely
//! in memory in between.

use crate::config::FusionConfig;
use crate::correlation::{self, IncomingObservation};
use crate::track_manager::TrackManager;
use chrono::{DateTime, Utc};
use maritime_store::{bus, BusMessage, ObservationBus, TrackStore};
use maritime_types::{Observation, SensorKind};
use std::collections::HashMap;
use tracing::{debug, warn};

const INPUT_TOPICS: [&str; 4] = [
    bus::AIS_POSITIONS,
    bus::RADAR_CONTACTS,
    bus::SATELLITE_DETECTIONS,
    bus::DRONE_DETECTIONS,
];

const FUSION_TRACKS_MAXLEN: usize = 10_000;
const FUSION_DARK_SHIPS_MAXLEN: usize = 1_000;

pub struct FusionRunner {
    bus: ObservationBus,
    track_store: TrackStore,
    consumer: String,
    config: FusionConfig,
    manager: TrackManager,
    messages_processed: u64,
    messages_dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub messages_read: usize,
    pub messages_dropped: usize,
    pub tracks_created: usize,
    pub tracks_updated: usize,
    pub alerts_published: usize,
}

impl FusionRunner {
    pub fn new(bus: ObservationBus, track_store: TrackStore, consumer: String, config: FusionConfig) -> Self {
        let manager = TrackManager::new(config.correlation, config.dark_ship);
        FusionRunner {
            bus,
            track_store,
            consumer,
            config,
            manager,
            messages_processed: 0,
            messages_dropped: 0,
        }
    }

    pub fn manager(&self) -> &TrackManager {
        &self.manager
    }

    pub async fn ensure_groups(&self) -> Result<(), maritime_store::BusError> {
        for topic in INPUT_TOPICS {
            self.bus.ensure_group(topic, bus::FUSION_GROUP).await?;
        }
        Ok(())
    }

    pub async fn tick(&mut self, now: DateTime<Utc>) -> anyhow::Result<TickReport> {
        let messages = self
            .bus
            .read_all(
                &INPUT_TOPICS,
                bus::FUSION_GROUP,
                &self.consumer,
                self.config.batch_size,
                self.config.block_ms,
            )
            .await?;

        let mut report = TickReport {
            messages_read: messages.len(),
            ..Default::default()
        };

        let (incoming, ack_targets) = parse_batch(&messages, &mut report);
        self.messages_dropped += report.messages_dropped as u64;

        let snapshots = self.manager.active_snapshots();
        let assignments = correlation::batch_correlate(&incoming, &snapshots, &self.config.correlation, now);

        for obs_idx in &assignments.new_tracks {
            let inc = &incoming[*obs_idx];
            self.manager.create_track(&inc.observation, &inc.sensor_id, now);
            report.tracks_created += 1;
        }

        for (track_id, items) in &assignments.to_existing {
            for item in items {
                let inc = &incoming[item.obs_index];
                if let Err(e) =
                    self.manager
                        .update_track(track_id, &inc.observation, &inc.sensor_id, item.confidence, now)
                {
                    warn!("track update refused: {e}");
                    continue;
                }
                report.tracks_updated += 1;
            }
        }

        self.manager.check_dark_ships(now);
        self.manager.age_tracks(now);

        self.ack_all(&ack_targets).await;
        self.messages_processed += incoming.len() as u64;
        report.alerts_published = self.publish(now).await?;

        Ok(report)
    }

    async fn ack_all(&self, ack_targets: &[(String, String)]) {
        let mut by_topic: HashMap<&str, Vec<String>> = HashMap::new();
        for (topic, id) in ack_targets {
            by_topic.entry(topic.as_str()).or_default().push(id.clone());
        }
        for (topic, ids) in by_topic {
            if let Err(e) = self.bus.ack_many(topic, bus::FUSION_GROUP, &ids).await {
                warn!("ack failed for {topic}: {e}");
            }
        }
    }

    async fn publish(&mut self, now: DateTime<Utc>) -> anyhow::Result<usize> {
        let active: Vec<_> = self.manager.active_tracks().into_iter().cloned().collect();
        self.track_store.publish_alive(&active).await?;

        for track in &active {
            let age_s = (now - track.updated_at).num_milliseconds() as f64 / 1000.0;
            if age_s <= self.config.snapshot_window_s as f64 {
                if let Err(e) = self
                    .bus
                    .write(bus::FUSION_TRACKS, &track.to_redis_fields(), FUSION_TRACKS_MAXLEN)
                    .await
                {
                    warn!("failed to publish track snapshot: {e}");
                }
            }
        }

        let mut alerts_published = 0;
        let flagged_ids: Vec<String> = self
            .manager
            .dark_ships()
            .iter()
            .filter(|t| t.flagged_for_review)
            .map(|t| t.track_id.clone())
            .collect();

        for track_id in flagged_ids {
            let Some(track) = self.manager.get(&track_id) else { continue };
            let mut sensors: Vec<&str> =
                track.sensor_contributions.keys().map(SensorKind::as_str).collect();
            sensors.sort_unstable();

            let fields = vec![
                ("track_id".to_string(), track.track_id.clone()),
                ("latitude".to_string(), track.latitude.to_string()),
                ("longitude".to_string(), track.longitude.to_string()),
                ("confidence".to_string(), track.dark_ship_confidence.to_string()),
                (
                    "alert_reason".to_string(),
                    track.alert_reason.clone().unwrap_or_default(),
                ),
                ("detected_by".to_string(), sensors.join(",")),
                ("timestamp".to_string(), now.timestamp_millis().to_string()),
            ];
            if self
                .bus
                .write(bus::FUSION_DARK_SHIPS, &fields, FUSION_DARK_SHIPS_MAXLEN)
                .await
                .is_ok()
            {
                alerts_published += 1;
            }
            self.clear_alert_flag(&track_id);
        }

        Ok(alerts_published)
    }

    fn clear_alert_flag(&mut self, track_id: &str) {
        self.manager.clear_flag(track_id);
    }

    pub fn counters(&self) -> (u64, u64) {
        (self.messages_processed, self.messages_dropped)
    }
}

fn sensor_id(obs: &Observation) -> String {
    match obs {
        Observation::Ais(o) => o.mmsi.clone(),
        Observation::Radar(o) => format!("{}:{}", o.station_id, o.track_id),
        Observation::Satellite(o) => o.source_satellite.clone(),
        Observation::Drone(o) => o.drone_id.clone(),
    }
}

/// Parses every message in arrival order, tracking which ids to ack
/// (malformed messages are poison-contained: acked but not retried).
fn parse_batch(
    messages: &[BusMessage],
    report: &mut TickReport,
) -> (Vec<IncomingObservation>, Vec<(String, String)>) {
    let mut incoming = Vec::with_capacity(messages.len());
    let mut ack_targets = Vec::with_capacity(messages.len());

    for msg in messages {
        ack_targets.push((msg.topic.clone(), msg.id.clone()));
        match Observation::parse(&msg.topic, &msg.fields) {
            Ok(obs) => {
                let id = sensor_id(&obs);
                incoming.push(IncomingObservation::new(obs, id));
            }
            Err(e) => {
                debug!("dropping malformed message on {}: {e}", msg.topic);
                report.messages_dropped += 1;
            }
        }
    }

    (incoming, ack_targets)
}

/// End-to-end scenario tests: drives the correlator and track manager
/// together across several simulated ticks, the way `FusionRunner::tick`
/// does, without a live store/bus.
#[cfg(test)]
mod scenario_tests {
    use crate::correlation::{self, IncomingObservation};
    use crate::track_manager::TrackManager;
    use chrono::{DateTime, Duration, Utc};
    use maritime_types::{
        AisObservation, CorrelationGates, DarkShipDetectionConfig, DroneObservation,
        IdentitySource, Observation, RadarObservation, SatelliteObservation, SensorKind,
        TrackStatus,
    };

    fn manager() -> TrackManager {
        TrackManager::new(CorrelationGates::default(), DarkShipDetectionConfig::default())
    }

    fn ais_at(mmsi: &str, lat: f64, lon: f64) -> Observation {
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

    fn radar_at(lat: f64, lon: f64) -> Observation {
        Observation::Radar(RadarObservation {
            track_id: "RT-1".into(),
            station_id: "RAD-MUM".into(),
            latitude: lat,
            longitude: lon,
            speed_knots: 10.0,
            course: 90.0,
            quality: 80,
            timestamp_ms: 0,
        })
    }

    /// One fusion tick by hand: correlate against the manager's current
    /// snapshots, apply create/update, then dark-ship check and aging.
    fn run_tick(mgr: &mut TrackManager, batch: Vec<IncomingObservation>, now: DateTime<Utc>) {
        let snapshots = mgr.active_snapshots();
        let gates = CorrelationGates::default();
        let result = correlation::batch_correlate(&batch, &snapshots, &gates, now);

        for idx in &result.new_tracks {
            let inc = &batch[*idx];
            mgr.create_track(&inc.observation, &inc.sensor_id, now);
        }
        for (track_id, assignments) in &result.to_existing {
            for a in assignments {
                let inc = &batch[a.obs_index];
                mgr.update_track(track_id, &inc.observation, &inc.sensor_id, a.confidence, now).unwrap();
            }
        }
        mgr.check_dark_ships(now);
        mgr.age_tracks(now);
    }

    /// S1: two sensors, one ship, five ticks converge to a single confirmed,
    /// non-dark track with AIS identity and both sensors in provenance.
    #[test]
    fn s1_two_sensors_one_ship_converges_to_one_confirmed_track() {
        let mut mgr = manager();
        let now = Utc::now();
        let lat = 18.90;
        let lon = 72.80;

        for i in 0..5 {
            let t = now + Duration::seconds(i);
            let batch = vec![
                IncomingObservation::new(ais_at("200000001", lat, lon), "200000001".into()),
                IncomingObservation::new(radar_at(lat + 0.0001, lon + 0.0001), "RAD-MUM".into()),
            ];
            run_tick(&mut mgr, batch, t);
        }

        let active = mgr.active_tracks();
        assert_eq!(active.len(), 1, "expected exactly one unified track");
        let track = active[0];
        assert_eq!(track.identity_source, IdentitySource::Ais);
        let mut sensors: Vec<&str> = track.sensor_contributions.keys().map(SensorKind::as_str).collect();
        sensors.sort_unstable();
        assert_eq!(sensors, vec!["ais", "radar"]);
        assert!(track.position_uncertainty_m <= 10.0 + 1e-6, "sigma {}", track.position_uncertainty_m);
        assert_eq!(track.status, TrackStatus::Confirmed);
        assert!(!track.is_dark_ship);
    }

    /// S2: AIS blackout. Radar keeps reporting; once the AIS gap crosses the
    /// threshold, the track goes dark with a reason and radar in provenance.
    #[test]
    fn s2_ais_blackout_with_radar_present_flags_dark() {
        let mut mgr = manager();
        let now = Utc::now();
        let lat = 18.90;
        let lon = 72.80;

        let id = mgr.create_track(&ais_at("200000001", lat, lon), "200000001", now);

        let gap = Duration::seconds(901);
        let check_time = now + gap;
        mgr.update_track(&id, &radar_at(lat, lon), "RAD-MUM", 0.9, check_time - Duration::seconds(10)).unwrap();

        mgr.check_dark_ships(check_time);

        let track = mgr.get(&id).unwrap();
        assert!(track.is_dark_ship);
        assert!(track.alert_reason.as_deref().unwrap().starts_with("AIS gap:"));
        assert!(track.flagged_for_review);
        assert!(track.sensor_contributions.contains_key(&SensorKind::Radar));
    }

    /// S3: a dark vessel seen by drone then satellite resolves to an
    /// unknown-identity track flagged for review at confidence >= 0.6.
    #[test]
    fn s3_unknown_dark_ship_confirmed_by_drone_and_satellite() {
        let mut mgr = manager();
        let now = Utc::now();

        let drone_obs = Observation::Drone(DroneObservation {
            detection_id: "D1".into(),
            drone_id: "DRN-001".into(),
            latitude: 18.9,
            longitude: 72.8,
            confidence: 0.95,
            object_class: "fishing".into(),
            estimated_length_m: 25.0,
            estimated_width_m: 7.0,
            frame_id: "F1".into(),
            visual_name: "UNREADABLE".into(),
            mmsi: None,
            timestamp_ms: 0,
        });
        let id = mgr.create_track(&drone_obs, "DRN-001", now);

        let sat_obs = Observation::Satellite(SatelliteObservation {
            detection_id: "S1".into(),
            source_satellite: "SAT-S1A".into(),
            latitude: 18.9,
            longitude: 72.8,
            vessel_length_m: 25.0,
            confidence: 0.95,
            is_dark_ship: true,
            timestamp_ms: 0,
        });
        mgr.update_track(&id, &sat_obs, "SAT-S1A", 0.9, now).unwrap();

        mgr.check_dark_ships(now);

        let track = mgr.get(&id).unwrap();
        assert_eq!(track.identity_source, IdentitySource::Unknown);
        assert!(track.is_dark_ship);
        assert!(track.dark_ship_confidence >= 0.6);
        assert!(track.flagged_for_review);
    }

    /// S4: two crossing vessels 600m apart never swap identity across a
    /// sequence of ticks because phase-1 MMSI pinning beats spatial scoring.
    #[test]
    fn s4_close_crossing_vessels_never_swap_identity() {
        let mut mgr = manager();
        let now = Utc::now();

        let id_a = mgr.create_track(&ais_at("111111111", 18.900, 72.800), "111111111", now);
        let id_b = mgr.create_track(&ais_at("222222222", 18.9054, 72.800), "222222222", now);

        for i in 1..=60 {
            let t = now + Duration::seconds(i);
            let drift = (i as f64) / 60.0 * 0.0054;
            let batch = vec![
                IncomingObservation::new(ais_at("111111111", 18.900 + drift, 72.800), "111111111".into()),
                IncomingObservation::new(ais_at("222222222", 18.9054 - drift, 72.800), "222222222".into()),
            ];
            run_tick(&mut mgr, batch, t);
        }

        let track_a = mgr.get(&id_a).unwrap();
        let track_b = mgr.get(&id_b).unwrap();
        assert_eq!(track_a.mmsi.as_deref(), Some("111111111"));
        assert_eq!(track_b.mmsi.as_deref(), Some("222222222"));
    }

    /// S5: a spurious radar contact far outside the gate of any existing
    /// track opens a new tentative track rather than corrupting the
    /// existing one, and is dropped after the drop timeout.
    #[test]
    fn s5_gate_rejection_spawns_and_then_drops_a_spurious_track() {
        let mut mgr = manager();
        let now = Utc::now();

        let existing_id = mgr.create_track(&radar_at(18.90, 72.80), "RAD-MUM", now);

        let spurious = vec![IncomingObservation::new(radar_at(19.03, 72.80), "RAD-MUM".into())];
        run_tick(&mut mgr, spurious, now);

        let active = mgr.active_tracks();
        assert_eq!(active.len(), 2, "spurious contact should open a second track");
        assert!(active.iter().any(|t| t.track_id == existing_id));

        let spurious_id = active.iter().find(|t| t.track_id != existing_id).unwrap().track_id.clone();

        let later = now + Duration::seconds(601);
        mgr.age_tracks(later);

        assert_eq!(mgr.get(&spurious_id).unwrap().status, TrackStatus::Dropped);
        assert!(!mgr.active_tracks().iter().any(|t| t.track_id == spurious_id));
    }
}
