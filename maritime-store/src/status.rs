use crate::error::StoreError;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// Per-component `{component}:status` hash: counters and liveness, the only
/// surface failures are observable through besides logs.
#[derive(Clone)]
pub struct StatusHash {
    conn: MultiplexedConnection,
    key: String,
}

impl StatusHash {
    pub fn new(conn: MultiplexedConnection, component: &str) -> Self {
        StatusHash {
            conn,
            key: format!("{component}:status"),
        }
    }

    pub async fn set_fields(&self, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset_multiple(&self.key, fields).await?;
        Ok(())
    }

    pub async fn set_running(&self, running: bool) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.hset(&self.key, "running", running.to_string()).await?;
        Ok(())
    }
}
