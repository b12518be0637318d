//! Persistence boundary the core depends on. Trait shape mirrors
//! `MessageStore`/`UserStore`/`RoomStore` from the source system, collapsed into one
//! `Store` trait since this core doesn't own room/user CRUD schema (out of scope) —
//! only the rows the handler pipeline itself reads and writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::models::{ChatMessage, PresenceRecord, User};

#[async_trait]
pub trait Store: Send + Sync {
    async fn save_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError>;
    async fn get_recent_messages(&self, room_id: &str, limit: i64) -> Result<Vec<ChatMessage>, StoreError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;
    async fn add_user_to_room(&self, user_id: &str, username: &str, room_id: &str) -> Result<(), StoreError>;
    /// Persists the presence flag and returns the record as written, the same
    /// write-then-return-the-row shape `save_message` uses for messages.
    async fn update_presence(&self, room_id: &str, user_id: &str, online: bool) -> Result<PresenceRecord, StoreError>;
    async fn update_last_active(&self, user_id: &str) -> Result<(), StoreError>;
}

/// SQLite-backed store. One guarded connection, matching the teacher's
/// `Db { conn: Mutex<Connection> }` shape.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_room_timestamp ON messages(room_id, timestamp);

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS room_members (
                room_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                PRIMARY KEY (room_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS presence (
                room_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                online INTEGER NOT NULL,
                last_seen TEXT NOT NULL,
                PRIMARY KEY (room_id, user_id)
            );",
        )?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn save_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT INTO messages (room_id, sender_id, sender, content, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![message.room_id, message.sender_id, message.sender, message.content, message.timestamp.to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();
        Ok(ChatMessage { id, ..message })
    }

    async fn get_recent_messages(&self, room_id: &str, limit: i64) -> Result<Vec<ChatMessage>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        // Fetch the most recent `limit` rows newest-first, excluding system-origin
        // messages, then reverse so callers always see ascending chronological order.
        let mut stmt = conn.prepare(
            "SELECT id, room_id, sender_id, sender, content, timestamp FROM messages
             WHERE room_id = ?1 AND sender_id != 'system'
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![room_id, limit], |row| {
            let ts: String = row.get(5)?;
            Ok(ChatMessage {
                id: row.get(0)?,
                room_id: row.get(1)?,
                sender_id: row.get(2)?,
                sender: row.get(3)?,
                content: row.get(4)?,
                timestamp: parse_timestamp(&ts),
            })
        })?;

        let mut messages: Vec<ChatMessage> = rows.collect::<Result<_, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let user = conn
            .query_row(
                "SELECT id, username, created_at, last_active FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    let created_at: String = row.get(2)?;
                    let last_active: String = row.get(3)?;
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: parse_timestamp(&created_at),
                        last_active: parse_timestamp(&last_active),
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    async fn add_user_to_room(&self, user_id: &str, username: &str, room_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (id, username, created_at, last_active) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username, last_active = excluded.last_active",
            params![user_id, username, now],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![room_id, user_id, now],
        )?;
        Ok(())
    }

    async fn update_presence(&self, room_id: &str, user_id: &str, online: bool) -> Result<PresenceRecord, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let last_seen = Utc::now();
        conn.execute(
            "INSERT INTO presence (room_id, user_id, online, last_seen) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(room_id, user_id) DO UPDATE SET online = excluded.online, last_seen = excluded.last_seen",
            params![room_id, user_id, online as i64, last_seen.to_rfc3339()],
        )?;
        Ok(PresenceRecord { room_id: room_id.to_string(), user_id: user_id.to_string(), online, last_seen })
    }

    async fn update_last_active(&self, user_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE users SET last_active = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), user_id],
        )?;
        Ok(())
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}
