use crate::error::StoreError;
use maritime_types::Vessel;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;

const IDS_KEY: &str = "fleet:ids";
const METADATA_KEY: &str = "fleet:metadata";

fn vessel_key(id: &str) -> String {
    format!("fleet:vessel:{id}")
}

/// Ground-truth vessel state. Written only by the world simulator; read by
/// every sensor ingester. Never written by a sensor.
#[derive(Clone)]
pub struct FleetStore {
    conn: MultiplexedConnection,
}

impl FleetStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        FleetStore { conn }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Vessel>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(vessel_key(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Vessel::from_kv_fields(&fields))
    }

    pub async fn get_all(&self) -> Result<Vec<Vessel>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(IDS_KEY).await?;
        let mut vessels = Vec::with_capacity(ids.len());
        for id in ids {
            let fields: HashMap<String, String> = conn.hgetall(vessel_key(&id)).await?;
            if let Some(v) = Vessel::from_kv_fields(&fields) {
                vessels.push(v);
            }
        }
        Ok(vessels)
    }

    /// Atomic per-vessel multi-field write, batched across the whole fleet
    /// in a single pipeline per tick.
    pub async fn upsert_batch(&self, vessels: &[Vessel]) -> Result<(), StoreError> {
        if vessels.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        let dark_count = vessels.iter().filter(|v| !v.ais_on).count();
        for v in vessels {
            pipe.sadd(IDS_KEY, &v.id).ignore();
            pipe.hset_multiple(vessel_key(&v.id), &v.to_kv_fields()).ignore();
        }
        pipe.hset(METADATA_KEY, "ship_count", vessels.len() as i64).ignore();
        pipe.hset(METADATA_KEY, "dark_count", dark_count as i64).ignore();
        pipe.hset(METADATA_KEY, "last_update", chrono::Utc::now().to_rfc3339())
            .ignore();

        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}
