//! libSQL backend — async implementation of the storage traits.
//!
//! Supports local file and in-memory databases. Singleton content (start
//! greeting, contact card, wizard config) lives in one-row tables keyed by
//! `'singleton'`; button and option lists are stored as JSON text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::content::{
    BotUser, ContactContent, ContactContentUpdate, NewPortfolioEntry, NewReview, PortfolioEntry,
    Review, StartContent, StartContentUpdate, UserPage, UserProfile, WizardConfig,
    WizardConfigPatch,
};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{ContentStore, Database, UserStore};

const SINGLETON_ID: &str = "singleton";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Fetch the first row of `sql`, mapped through `map`.
    async fn query_one<T>(
        &self,
        op: &str,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: impl Fn(&libsql::Row) -> Result<T, DatabaseError>,
    ) -> Result<Option<T>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => map(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("{op}: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw)
        .map_err(|e| DatabaseError::Serialization(format!("{column}: {e}")))
}

// `libsql::FromValue` is not publicly exported, so this is a macro rather than
// a generic fn; the bound is checked at each call site.
macro_rules! get {
    ($row:expr, $idx:expr, $op:expr $(, $t:ty)?) => {
        $row.get$(::<$t>)?($idx)
            .map_err(|e| DatabaseError::Query(format!("{} row parse: {e}", $op)))
    };
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn row_to_review(row: &libsql::Row) -> Result<Review, libsql::Error> {
    Ok(Review {
        id: row.get(0)?,
        name: row.get(1)?,
        date: row.get(2)?,
        text: row.get(3)?,
    })
}

fn row_to_portfolio(row: &libsql::Row) -> Result<PortfolioEntry, libsql::Error> {
    Ok(PortfolioEntry {
        id: row.get(0)?,
        image_src: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
    })
}

fn row_to_user(row: &libsql::Row) -> Result<BotUser, libsql::Error> {
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;
    let last_message_str: Option<String> = row.get(7).ok();

    Ok(BotUser {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        username: row.get(2).ok(),
        first_name: row.get(3).ok(),
        last_name: row.get(4).ok(),
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
        last_message: parse_optional_datetime(&last_message_str),
    })
}

// ── Trait implementations ───────────────────────────────────────────

const REVIEW_COLUMNS: &str = "id, name, date, text";

const PORTFOLIO_COLUMNS: &str = "id, image_src, title, description";

const USER_COLUMNS: &str =
    "id, chat_id, username, first_name, last_name, created_at, updated_at, last_message";

#[async_trait]
impl ContentStore for LibSqlBackend {
    async fn get_start(&self) -> Result<Option<StartContent>, DatabaseError> {
        self.query_one(
            "get_start",
            "SELECT title, content, buttons FROM start WHERE id = ?1",
            params![SINGLETON_ID],
            |row| {
                let buttons: String = get!(row, 2, "get_start")?;
                Ok(StartContent {
                    title: row.get(0).ok(),
                    content: get!(row, 1, "get_start")?,
                    buttons: from_json("start.buttons", &buttons)?,
                })
            },
        )
        .await
    }

    async fn get_contact(&self) -> Result<Option<ContactContent>, DatabaseError> {
        self.query_one(
            "get_contact",
            "SELECT address, manager_text, buttons FROM contact WHERE id = ?1",
            params![SINGLETON_ID],
            |row| {
                let buttons: String = get!(row, 2, "get_contact")?;
                Ok(ContactContent {
                    address: get!(row, 0, "get_contact")?,
                    manager_text: get!(row, 1, "get_contact")?,
                    buttons: from_json("contact.buttons", &buttons)?,
                })
            },
        )
        .await
    }

    async fn get_wizard_config(&self) -> Result<Option<WizardConfig>, DatabaseError> {
        self.query_one(
            "get_wizard_config",
            "SELECT config FROM calculate WHERE id = ?1",
            params![SINGLETON_ID],
            |row| {
                let raw: String = get!(row, 0, "get_wizard_config")?;
                from_json("calculate.config", &raw)
            },
        )
        .await
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {REVIEW_COLUMNS} FROM comments ORDER BY date DESC, id DESC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_reviews: {e}")))?;

        let mut reviews = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_review(&row) {
                Ok(review) => reviews.push(review),
                Err(e) => warn!("Skipping review row: {e}"),
            }
        }
        Ok(reviews)
    }

    async fn list_portfolio(&self) -> Result<Vec<PortfolioEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PORTFOLIO_COLUMNS} FROM portfolios ORDER BY id ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_portfolio: {e}")))?;

        let mut entries = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_portfolio(&row) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping portfolio row: {e}"),
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl UserStore for LibSqlBackend {
    async fn upsert_user(
        &self,
        chat_id: i64,
        profile: &UserProfile,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO users (chat_id, username, first_name, last_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(chat_id) DO UPDATE SET
                    username = COALESCE(excluded.username, users.username),
                    first_name = COALESCE(excluded.first_name, users.first_name),
                    last_name = COALESCE(excluded.last_name, users.last_name),
                    updated_at = excluded.updated_at",
                params![
                    chat_id,
                    opt_text(profile.username.as_deref()),
                    opt_text(profile.first_name.as_deref()),
                    opt_text(profile.last_name.as_deref()),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_user: {e}")))?;

        debug!(chat_id, "User upserted");
        Ok(())
    }

    async fn touch_user(&self, chat_id: i64) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "UPDATE users SET last_message = ?1 WHERE chat_id = ?2",
                params![now, chat_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("touch_user: {e}")))?;
        Ok(())
    }

    async fn list_users(
        &self,
        skip: Option<u32>,
        take: Option<u32>,
    ) -> Result<UserPage, DatabaseError> {
        let total = self
            .query_one("count_users", "SELECT COUNT(*) FROM users", (), |row| {
                get!(row, 0, "count_users", i64)
            })
            .await?
            .unwrap_or(0);

        // SQLite treats a negative LIMIT as "no limit".
        let limit = take.map_or(-1, i64::from);
        let offset = i64::from(skip.unwrap_or(0));

        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
                ),
                params![limit, offset],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?;

        let mut users = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_user(&row) {
                Ok(user) => users.push(user),
                Err(e) => warn!("Skipping user row: {e}"),
            }
        }
        Ok(UserPage { users, total })
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Singletons ──────────────────────────────────────────────────

    async fn update_start(
        &self,
        update: StartContentUpdate,
    ) -> Result<StartContent, DatabaseError> {
        let start = update.merge_into(self.get_start().await?);

        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO start (id, title, content, buttons, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    content = excluded.content,
                    buttons = excluded.buttons,
                    updated_at = excluded.updated_at",
                params![
                    SINGLETON_ID,
                    opt_text(start.title.as_deref()),
                    start.content.as_str(),
                    to_json(&start.buttons)?,
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_start: {e}")))?;

        info!(buttons = start.buttons.len(), "Start content updated");
        Ok(start)
    }

    async fn update_contact(
        &self,
        update: ContactContentUpdate,
    ) -> Result<ContactContent, DatabaseError> {
        let contact = update.merge_into(self.get_contact().await?);

        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO contact (id, address, manager_text, buttons, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    address = excluded.address,
                    manager_text = excluded.manager_text,
                    buttons = excluded.buttons,
                    updated_at = excluded.updated_at",
                params![
                    SINGLETON_ID,
                    contact.address.as_str(),
                    contact.manager_text.as_str(),
                    to_json(&contact.buttons)?,
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_contact: {e}")))?;

        info!(buttons = contact.buttons.len(), "Contact content updated");
        Ok(contact)
    }

    async fn update_wizard_config(
        &self,
        patch: WizardConfigPatch,
    ) -> Result<WizardConfig, DatabaseError> {
        let mut config = self.get_wizard_config().await?.unwrap_or_default();
        config.apply(patch);

        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO calculate (id, config, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                    config = excluded.config,
                    updated_at = excluded.updated_at",
                params![SINGLETON_ID, to_json(&config)?, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_wizard_config: {e}")))?;

        info!("Wizard config updated");
        Ok(config)
    }

    // ── Lists ───────────────────────────────────────────────────────

    async fn create_review(&self, review: &NewReview) -> Result<Review, DatabaseError> {
        let id = self
            .query_one(
                "create_review",
                "INSERT INTO comments (name, date, text) VALUES (?1, ?2, ?3) RETURNING id",
                params![
                    review.name.as_str(),
                    review.date.as_str(),
                    review.text.as_str()
                ],
                |row| get!(row, 0, "create_review", i64),
            )
            .await?
            .ok_or_else(|| DatabaseError::Query("create_review: no id returned".into()))?;

        debug!(review_id = id, "Review created");
        Ok(Review {
            id,
            name: review.name.clone(),
            date: review.date.clone(),
            text: review.text.clone(),
        })
    }

    async fn delete_review(&self, id: i64) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_review: {e}")))?;
        Ok(count > 0)
    }

    async fn create_portfolio_entry(
        &self,
        entry: &NewPortfolioEntry,
    ) -> Result<PortfolioEntry, DatabaseError> {
        let id = self
            .query_one(
                "create_portfolio_entry",
                "INSERT INTO portfolios (image_src, title, description) VALUES (?1, ?2, ?3) RETURNING id",
                params![
                    entry.image_src.as_str(),
                    entry.title.as_str(),
                    entry.description.as_str()
                ],
                |row| get!(row, 0, "create_portfolio_entry", i64),
            )
            .await?
            .ok_or_else(|| DatabaseError::Query("create_portfolio_entry: no id returned".into()))?;

        debug!(portfolio_id = id, "Portfolio entry created");
        Ok(PortfolioEntry {
            id,
            image_src: entry.image_src.clone(),
            title: entry.title.clone(),
            description: entry.description.clone(),
        })
    }

    async fn delete_portfolio_entry(&self, id: i64) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM portfolios WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_portfolio_entry: {e}")))?;
        Ok(count > 0)
    }
}
