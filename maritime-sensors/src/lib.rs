//! Per-sensor detection models that degrade Fleet Store ground truth into
//! observations on the bus. Each module implements exactly one sensor's
//! model from the component design; the four `ais-ingester` /
//! `radar-ingester` / `satellite-ingester` / `drone-ingester` binaries wire
//! these into a tick loop against the store and bus.

pub mod ais;
pub mod config;
pub mod drone;
pub mod noise;
pub mod radar;
pub mod satellite;
