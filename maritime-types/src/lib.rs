//! Shared domain types for the maritime track fusion workspace.
//!
//! Used by every component binary: the world simulator, the four sensor
//! ingesters, and the fusion runner all exchange `Vessel`, `Observation`,
//! and `UnifiedTrack` values defined here rather than raw store/bus fields.

pub mod config;
pub mod geo;
pub mod observation;
pub mod track;
pub mod vessel;

pub use config::{CorrelationGates, DarkShipDetectionConfig};
pub use observation::{
    AisObservation, DroneObservation, Observation, RadarObservation, SatelliteObservation,
    SchemaError, SensorKind,
};
pub use track::{IdentitySource, SensorContribution, TrackStatus, UnifiedTrack};
pub use vessel::{Vessel, VesselClass};
