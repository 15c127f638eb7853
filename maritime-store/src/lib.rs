//! Redis-backed store and bus for the maritime fusion workspace: hashes and
//! id sets for the Fleet Store and Track Store, and append-only per-topic
//! streams with consumer-group semantics for the Observation Bus.

pub mod bus;
pub mod error;
pub mod fleet_store;
pub mod status;
pub mod track_store;

pub use bus::{BusMessage, ObservationBus};
pub use error::{BusError, StoreError};
pub use fleet_store::FleetStore;
pub use status::StatusHash;
pub use track_store::TrackStore;

use redis::aio::MultiplexedConnection;

/// Opens one multiplexed connection and hands out the three store/bus
/// facades over clones of it; `redis::aio::MultiplexedConnection` is cheap
/// to clone and safe to share across concurrent callers within a process.
pub async fn connect(redis_url: &str) -> Result<MultiplexedConnection, redis::RedisError> {
    let client = redis::Client::open(redis_url)?;
    client.get_multiplexed_tokio_connection().await
}
