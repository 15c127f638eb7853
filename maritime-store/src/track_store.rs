use crate::error::StoreError;
use maritime_types::UnifiedTrack;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::HashMap;

const ALIVE_KEY: &str = "tracks:alive";

fn track_key(id: &str) -> String {
    format!("track:{id}")
}

/// Unified track state, owned exclusively by the fusion runner.
#[derive(Clone)]
pub struct TrackStore {
    conn: MultiplexedConnection,
}

impl TrackStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        TrackStore { conn }
    }

    pub async fn get(&self, id: &str) -> Result<Option<UnifiedTrack>, StoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(track_key(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(UnifiedTrack::from_redis_fields(&fields))
    }

    /// Replaces `tracks:alive` wholesale and upserts each alive track's hash
    /// in the same pipeline, per the fusion runner's publish step.
    pub async fn publish_alive(&self, tracks: &[UnifiedTrack]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        pipe.del(ALIVE_KEY).ignore();
        for t in tracks {
            pipe.sadd(ALIVE_KEY, &t.track_id).ignore();
            pipe.hset_multiple(track_key(&t.track_id), &t.to_redis_fields()).ignore();
        }
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    pub async fn alive_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.smembers(ALIVE_KEY).await?)
    }
}
