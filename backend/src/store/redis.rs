//! # Redis
//!
//! Each todo is a JSON document under `todo:{id}`. The sorted set
//! `todos:by_created` holds every id scored by `createdAt` in milliseconds,
//! which gives newest-first listing without scanning the keyspace.
//!
//! - Insert: one script runs `SET NX` (an existing key is a duplicate) and
//!   `ZADD`, so a document is never left out of the index
//! - Update: one script reads the document, merges the serialized
//!   [`TodoChanges`] into it and writes it back
//! - Delete: `GET` + `DEL` + `ZREM` in one `MULTI`
//! - List: `ZREVRANGE` then `MGET`; ids whose document vanished are skipped
//!
//! Scripts run atomically on the server, so every write touches one document
//! and its index entry as a unit.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, Script};
use shared::Todo;
use tracing::info;
use uuid::Uuid;

use super::{StoreError, TodoChanges, TodoStore};

const TODO_PREFIX: &str = "todo:";
const CREATED_INDEX: &str = "todos:by_created";

// KEYS: todo key, created index. ARGV: document, score, id.
const INSERT_SCRIPT: &str = r"
if not redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    return 0
end
redis.call('ZADD', KEYS[2], ARGV[2], ARGV[3])
return 1
";

// KEYS: todo key. ARGV: JSON object of the fields to overwrite.
const UPDATE_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
if not current then
    return false
end
local todo = cjson.decode(current)
for field, value in pairs(cjson.decode(ARGV[1])) do
    todo[field] = value
end
local merged = cjson.encode(todo)
redis.call('SET', KEYS[1], merged)
return merged
";

impl From<RedisError> for StoreError {
    fn from(error: RedisError) -> Self {
        StoreError::Backend(error.to_string())
    }
}

fn todo_key(id: impl std::fmt::Display) -> String {
    format!("{TODO_PREFIX}{id}")
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        info!("Connected to Redis at {redis_url}");

        Ok(Self { connection })
    }
}

impl TodoStore for RedisStore {
    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let mut connection = self.connection.clone();

        let ids: Vec<String> = connection.zrevrange(CREATED_INDEX, 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(todo_key).collect();
        let documents: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut connection)
            .await?;

        documents
            .into_iter()
            .flatten()
            .map(|document| serde_json::from_str(&document).map_err(StoreError::from))
            .collect()
    }

    async fn insert(&self, todo: &Todo) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let key = todo_key(todo.id);
        let document = serde_json::to_string(todo)?;

        let script = Script::new(INSERT_SCRIPT);
        let inserted: i64 = script
            .key(&key)
            .key(CREATED_INDEX)
            .arg(document)
            .arg(todo.created_at.timestamp_millis())
            .arg(todo.id.to_string())
            .invoke_async(&mut connection)
            .await?;

        if inserted == 0 {
            return Err(StoreError::Duplicate(key));
        }
        Ok(())
    }

    async fn find_by_id_and_update(
        &self,
        id: Uuid,
        changes: &TodoChanges,
    ) -> Result<Option<Todo>, StoreError> {
        let mut connection = self.connection.clone();
        let patch = serde_json::to_string(changes)?;

        let script = Script::new(UPDATE_SCRIPT);
        let merged: Option<String> = script
            .key(todo_key(id))
            .arg(patch)
            .invoke_async(&mut connection)
            .await?;

        Ok(merged
            .map(|document| serde_json::from_str(&document))
            .transpose()?)
    }

    async fn find_by_id_and_delete(&self, id: Uuid) -> Result<Option<Todo>, StoreError> {
        let mut connection = self.connection.clone();
        let key = todo_key(id);

        let (document, _deleted, _unindexed): (Option<String>, i64, i64) = redis::pipe()
            .atomic()
            .get(&key)
            .del(&key)
            .zrem(CREATED_INDEX, id.to_string())
            .query_async(&mut connection)
            .await?;

        Ok(document
            .map(|document| serde_json::from_str(&document))
            .transpose()?)
    }
}
