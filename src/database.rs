//! # SQLite persistence
//!
//! One SQLite database holds reminders and ideas. The connection sits behind
//! an async mutex, so every operation below runs serialized against it.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: `list_id` assigned inside the insert statement; idea categories and tags
//! - 1.0.0: Initial reminder table

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::ReminderError;
use crate::features::ideas::{Idea, IdeaStore, NewIdea};
use crate::features::reminders::{NewReminder, Reminder, ReminderStore};

/// Timestamp format stored in TEXT columns (always UTC, sorts lexicographically)
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    discord_user_id TEXT NOT NULL,
    channel_id TEXT,
    guild_id TEXT,
    message TEXT NOT NULL,
    remind_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    sent INTEGER NOT NULL DEFAULT 0,
    list_id INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders (sent, remind_at);
CREATE INDEX IF NOT EXISTS idx_reminders_owner ON reminders (discord_user_id, sent);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS ideas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    discord_user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT,
    category_id INTEGER NOT NULL REFERENCES categories (id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    reminder_id INTEGER REFERENCES reminders (id),
    archived INTEGER NOT NULL DEFAULT 0,
    pinned INTEGER NOT NULL DEFAULT 0,
    source TEXT
);
CREATE TABLE IF NOT EXISTS idea_tags (
    idea_id INTEGER NOT NULL REFERENCES ideas (id),
    tag_id INTEGER NOT NULL REFERENCES tags (id),
    PRIMARY KEY (idea_id, tag_id)
);
"#;

const REMINDER_COLUMNS: &str =
    "id, discord_user_id, channel_id, guild_id, message, remind_at, created_at, sent, list_id";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists
    ///
    /// `:memory:` gives a private in-memory database.
    pub async fn new(path: &str) -> Result<Self> {
        let connection = sqlite::open(path)?;
        connection.execute("PRAGMA foreign_keys = ON;")?;
        connection.execute(SCHEMA)?;
        info!("Database ready at {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Fetch one reminder by id, sent or not
    pub async fn get_reminder(&self, id: i64) -> Result<Option<Reminder>, ReminderError> {
        let conn = self.connection.lock().await;
        get_reminder(&conn, id)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ReminderError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|ndt| ndt.and_utc())
        .map_err(|e| {
            ReminderError::Storage(sqlite::Error {
                code: None,
                message: Some(format!("bad timestamp `{raw}` in database: {e}")),
            })
        })
}

fn read_reminder(stmt: &Statement<'_>) -> Result<Reminder, ReminderError> {
    Ok(Reminder {
        id: stmt.read::<i64, _>("id")?,
        owner: stmt.read::<String, _>("discord_user_id")?,
        channel_id: stmt.read::<Option<String>, _>("channel_id")?,
        guild_id: stmt.read::<Option<String>, _>("guild_id")?,
        message: stmt.read::<String, _>("message")?,
        remind_at: parse_timestamp(&stmt.read::<String, _>("remind_at")?)?,
        created_at: parse_timestamp(&stmt.read::<String, _>("created_at")?)?,
        sent: stmt.read::<i64, _>("sent")? != 0,
        list_id: stmt.read::<i64, _>("list_id")?,
    })
}

fn collect_reminders(mut stmt: Statement<'_>) -> Result<Vec<Reminder>, ReminderError> {
    let mut reminders = Vec::new();
    while let State::Row = stmt.next()? {
        reminders.push(read_reminder(&stmt)?);
    }
    Ok(reminders)
}

fn get_reminder(conn: &Connection, id: i64) -> Result<Option<Reminder>, ReminderError> {
    let mut stmt = conn.prepare(format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?"))?;
    stmt.bind((1, id))?;
    match stmt.next()? {
        State::Row => Ok(Some(read_reminder(&stmt)?)),
        State::Done => Ok(None),
    }
}

fn last_insert_id(conn: &Connection) -> Result<i64, sqlite::Error> {
    let mut stmt = conn.prepare("SELECT last_insert_rowid() AS id")?;
    stmt.next()?;
    stmt.read::<i64, _>("id")
}

/// Run `f` inside a transaction, rolling back if it fails
fn in_transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<sqlite::Error>,
{
    conn.execute("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            conn.execute("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute("ROLLBACK") {
                warn!("Rollback failed: {rollback}");
            }
            Err(e)
        }
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn create(&self, reminder: NewReminder) -> Result<Reminder, ReminderError> {
        reminder.validate()?;
        let conn = self.connection.lock().await;

        // list_id is computed in the same statement as the insert, so two
        // creations for one owner can never share a number
        let id = in_transaction(&conn, |conn| -> Result<i64, ReminderError> {
            let mut stmt = conn.prepare(
                r#"INSERT INTO reminders
                    (discord_user_id, channel_id, guild_id, message, remind_at, created_at, sent, list_id)
                SELECT ?, ?, ?, ?, ?, ?, 0, COALESCE(MAX(list_id), 0) + 1
                FROM reminders
                WHERE discord_user_id = ? AND sent = 0"#,
            )?;
            stmt.bind((1, reminder.owner.as_str()))?;
            stmt.bind((2, reminder.channel_id.as_deref()))?;
            stmt.bind((3, reminder.guild_id.as_deref()))?;
            stmt.bind((4, reminder.message.as_str()))?;
            stmt.bind((5, format_timestamp(&reminder.remind_at).as_str()))?;
            stmt.bind((6, format_timestamp(&Utc::now()).as_str()))?;
            stmt.bind((7, reminder.owner.as_str()))?;
            stmt.next()?;
            Ok(last_insert_id(conn)?)
        })?;

        let stored = get_reminder(&conn, id)?.ok_or_else(|| {
            ReminderError::Storage(sqlite::Error {
                code: None,
                message: Some(format!("reminder {id} missing right after insert")),
            })
        })?;
        debug!(
            "Stored reminder {} (#{} for user {})",
            stored.id, stored.list_id, stored.owner
        );
        Ok(stored)
    }

    async fn load_due(
        &self,
        owner: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reminder>, ReminderError> {
        let conn = self.connection.lock().await;
        let now = format_timestamp(&now);
        let stmt = match owner {
            Some(owner) => {
                let mut stmt = conn.prepare(format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders
                     WHERE sent = 0 AND remind_at <= ? AND discord_user_id = ?"
                ))?;
                stmt.bind((1, now.as_str()))?;
                stmt.bind((2, owner))?;
                stmt
            }
            None => {
                let mut stmt = conn.prepare(format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders WHERE sent = 0 AND remind_at <= ?"
                ))?;
                stmt.bind((1, now.as_str()))?;
                stmt
            }
        };
        collect_reminders(stmt)
    }

    async fn load_pending_ordered(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<Reminder>, ReminderError> {
        let conn = self.connection.lock().await;
        let stmt = match owner {
            Some(owner) => {
                let mut stmt = conn.prepare(format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders
                     WHERE sent = 0 AND discord_user_id = ?
                     ORDER BY remind_at ASC, list_id ASC"
                ))?;
                stmt.bind((1, owner))?;
                stmt
            }
            None => conn.prepare(format!(
                "SELECT {REMINDER_COLUMNS} FROM reminders
                 WHERE sent = 0
                 ORDER BY remind_at ASC, id ASC"
            ))?,
        };
        collect_reminders(stmt)
    }

    async fn mark_sent(&self, id: i64) -> Result<(), ReminderError> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare("UPDATE reminders SET sent = 1 WHERE id = ? AND sent = 0")?;
        stmt.bind((1, id))?;
        stmt.next()?;
        drop(stmt);

        if conn.change_count() == 0 {
            match get_reminder(&conn, id)? {
                Some(_) => debug!("Reminder {id} was already marked sent"),
                None => warn!("Cannot mark reminder {id} as sent: it no longer exists"),
            }
        }
        Ok(())
    }

    async fn next_list_id(&self, owner: &str) -> Result<i64, ReminderError> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COALESCE(MAX(list_id), 0) + 1 AS next_id FROM reminders WHERE discord_user_id = ? AND sent = 0",
        )?;
        stmt.bind((1, owner))?;
        stmt.next()?;
        Ok(stmt.read::<i64, _>("next_id")?)
    }
}

fn get_or_create_named(conn: &Connection, table: &str, name: &str) -> Result<i64> {
    let mut insert = conn.prepare(format!("INSERT OR IGNORE INTO {table} (name) VALUES (?)"))?;
    insert.bind((1, name))?;
    insert.next()?;
    drop(insert);

    let mut select = conn.prepare(format!("SELECT id FROM {table} WHERE name = ?"))?;
    select.bind((1, name))?;
    match select.next()? {
        State::Row => Ok(select.read::<i64, _>("id")?),
        State::Done => Err(anyhow!("{table} row `{name}` vanished after insert")),
    }
}

fn idea_tags(conn: &Connection, idea_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM tags t JOIN idea_tags it ON it.tag_id = t.id
         WHERE it.idea_id = ? ORDER BY it.rowid",
    )?;
    stmt.bind((1, idea_id))?;
    let mut tags = Vec::new();
    while let State::Row = stmt.next()? {
        tags.push(stmt.read::<String, _>("name")?);
    }
    Ok(tags)
}

const IDEA_SELECT: &str = "SELECT i.id, i.discord_user_id, i.title, i.content, c.name AS category,
        i.created_at, i.updated_at, i.reminder_id, i.archived, i.pinned, i.source
    FROM ideas i JOIN categories c ON c.id = i.category_id";

fn read_idea(stmt: &Statement<'_>) -> Result<Idea> {
    Ok(Idea {
        id: stmt.read::<i64, _>("id")?,
        owner: stmt.read::<String, _>("discord_user_id")?,
        title: stmt.read::<String, _>("title")?,
        content: stmt.read::<Option<String>, _>("content")?,
        category: stmt.read::<String, _>("category")?,
        tags: Vec::new(),
        created_at: parse_timestamp(&stmt.read::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&stmt.read::<String, _>("updated_at")?)?,
        reminder_id: stmt.read::<Option<i64>, _>("reminder_id")?,
        archived: stmt.read::<i64, _>("archived")? != 0,
        pinned: stmt.read::<i64, _>("pinned")? != 0,
        source: stmt.read::<Option<String>, _>("source")?,
    })
}

#[async_trait]
impl IdeaStore for Database {
    async fn save_idea(&self, idea: NewIdea) -> Result<Idea> {
        let idea = idea.normalized()?;
        let conn = self.connection.lock().await;
        let now = format_timestamp(&Utc::now());

        let id = in_transaction(&conn, |conn| -> Result<i64> {
            let category_id = get_or_create_named(conn, "categories", &idea.category)?;

            let mut stmt = conn.prepare(
                "INSERT INTO ideas (discord_user_id, title, content, category_id, created_at, updated_at, source)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            stmt.bind((1, idea.owner.as_str()))?;
            stmt.bind((2, idea.title.as_str()))?;
            stmt.bind((3, idea.content.as_deref()))?;
            stmt.bind((4, category_id))?;
            stmt.bind((5, now.as_str()))?;
            stmt.bind((6, now.as_str()))?;
            stmt.bind((7, idea.source.as_deref()))?;
            stmt.next()?;
            drop(stmt);
            let id = last_insert_id(conn)?;

            for tag in &idea.tags {
                let tag_id = get_or_create_named(conn, "tags", tag)?;
                let mut link = conn.prepare("INSERT OR IGNORE INTO idea_tags (idea_id, tag_id) VALUES (?, ?)")?;
                link.bind((1, id))?;
                link.bind((2, tag_id))?;
                link.next()?;
            }
            Ok(id)
        })?;

        let mut stmt = conn.prepare(format!("{IDEA_SELECT} WHERE i.id = ?"))?;
        stmt.bind((1, id))?;
        if let State::Done = stmt.next()? {
            return Err(anyhow!("idea {id} missing right after insert"));
        }
        let mut stored = read_idea(&stmt)?;
        drop(stmt);
        stored.tags = idea_tags(&conn, id)?;

        info!(
            "Stored idea {} for user {} in category {}",
            stored.id, stored.owner, stored.category
        );
        Ok(stored)
    }

    async fn list_ideas(&self, owner: &str, limit: usize) -> Result<Vec<Idea>> {
        let conn = self.connection.lock().await;
        let mut stmt = conn.prepare(format!(
            "{IDEA_SELECT} WHERE i.discord_user_id = ? AND i.archived = 0
             ORDER BY i.pinned DESC, i.created_at DESC, i.id DESC LIMIT ?"
        ))?;
        stmt.bind((1, owner))?;
        stmt.bind((2, limit as i64))?;

        let mut ideas = Vec::new();
        while let State::Row = stmt.next()? {
            ideas.push(read_idea(&stmt)?);
        }
        drop(stmt);

        for idea in &mut ideas {
            idea.tags = idea_tags(&conn, idea.id)?;
        }
        Ok(ideas)
    }
}
