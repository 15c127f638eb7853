use crate::error::BusError;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::Duration;

/// Stable topic names. Sensor ingesters are multi-writer (their own topic
/// only); the fusion runner is the single reader across all of them.
pub const AIS_POSITIONS: &str = "ais:positions";
pub const RADAR_CONTACTS: &str = "radar:contacts";
pub const SATELLITE_DETECTIONS: &str = "satellite:detections";
pub const DRONE_DETECTIONS: &str = "drone:detections";
pub const FUSION_TRACKS: &str = "fusion:tracks";
pub const FUSION_DARK_SHIPS: &str = "fusion:dark_ships";

pub const FUSION_GROUP: &str = "fusion-group";

/// One delivered message: its origin topic, stream id (for acking), and
/// its string-typed fields exactly as the producer wrote them.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub id: String,
    pub fields: HashMap<String, String>,
}

/// Append-only per-sensor streams with consumer-group reads. Delivery is
/// at-least-once; callers ack only after a message has been fully applied.
#[derive(Clone)]
pub struct ObservationBus {
    conn: MultiplexedConnection,
}

impl ObservationBus {
    pub fn new(conn: MultiplexedConnection) -> Self {
        ObservationBus { conn }
    }

    /// Appends one message to `topic`, bounding the stream length with
    /// oldest-drop trimming.
    pub async fn write(
        &self,
        topic: &str,
        fields: &[(String, String)],
        maxlen: usize,
    ) -> Result<String, BusError> {
        let mut conn = self.conn.clone();
        let id: String = conn
            .xadd_maxlen(topic, StreamMaxlen::Approx(maxlen), "*", fields)
            .await?;
        Ok(id)
    }

    /// Creates the consumer group if missing, tolerating `BUSYGROUP` (group
    /// already exists) as success.
    pub async fn ensure_group(&self, topic: &str, group: &str) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = conn.xgroup_create_mkstream(topic, group, "0").await;
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(BusError::Connection(e)),
        }
    }

    /// Reads new messages (`>`) across every topic in `topics` for `group`/
    /// `consumer`, up to `count` per topic, blocking up to `block_ms`.
    pub async fn read_all(
        &self,
        topics: &[&str],
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<BusMessage>, BusError> {
        let mut conn = self.conn.clone();
        let opts = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms);

        let ids: Vec<&str> = topics.iter().map(|_| ">").collect();
        let reply: StreamReadReply = conn.xread_options(topics, &ids, &opts).await?;

        let mut out = Vec::new();
        for stream_key in reply.keys {
            for entry in stream_key.ids {
                let mut fields = HashMap::new();
                for (k, v) in entry.map {
                    if let redis::Value::BulkString(bytes) = v {
                        if let Ok(s) = String::from_utf8(bytes) {
                            fields.insert(k, s);
                        }
                    } else if let redis::Value::Okay = v {
                        fields.insert(k, "OK".to_string());
                    }
                }
                out.push(BusMessage {
                    topic: stream_key.key.clone(),
                    id: entry.id,
                    fields,
                });
            }
        }
        Ok(out)
    }

    pub async fn ack(&self, topic: &str, group: &str, id: &str) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.xack(topic, group, &[id]).await?;
        Ok(())
    }

    pub async fn ack_many(&self, topic: &str, group: &str, ids: &[String]) -> Result<(), BusError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: i64 = conn.xack(topic, group, ids).await?;
        Ok(())
    }
}

/// Derives a unique consumer name the way the fusion runner does:
/// `fusion-{unix_timestamp}`.
pub fn consumer_name(prefix: &str, now: std::time::SystemTime) -> String {
    let secs = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    format!("{prefix}-{secs}")
}
