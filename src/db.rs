use crate::error::StoreError;
use crate::models;
use crate::store::ThreadStore;
use crate::view::{DetailLevel, HydratedThread};
use async_trait::async_trait;
use inflections::case::to_title_case;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeSet;

type Result<T> = std::result::Result<T, StoreError>;

const MESSAGE_COLUMNS: &str = "id, account_id, thread_id, folder_id, subject, snippet, \
                               from_address, to_address, date, body, unread, starred";

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        use sqlx::sqlite::SqliteConnectOptions;
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    /// A private database living in a single pooled connection, so every
    /// query sees the same data.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        let schema = include_str!("../schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn upsert_thread(&self, thread: &models::Thread) -> Result<()> {
        let participants = serde_json::to_string(&thread.participants)?;
        sqlx::query(
            "INSERT INTO threads (id, account_id, version, remote_thread_id, subject, snippet, unread_count, starred_count,
                                  first_message_date, last_message_date, last_message_received_date, last_message_sent_date, participants)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET account_id=excluded.account_id, version=excluded.version,
             remote_thread_id=excluded.remote_thread_id, subject=excluded.subject, snippet=excluded.snippet,
             unread_count=excluded.unread_count, starred_count=excluded.starred_count,
             first_message_date=excluded.first_message_date, last_message_date=excluded.last_message_date,
             last_message_received_date=excluded.last_message_received_date,
             last_message_sent_date=excluded.last_message_sent_date, participants=excluded.participants",
        )
        .bind(&thread.id)
        .bind(&thread.account_id)
        .bind(thread.version)
        .bind(&thread.remote_thread_id)
        .bind(&thread.subject)
        .bind(&thread.snippet)
        .bind(thread.unread_count)
        .bind(thread.starred_count)
        .bind(thread.first_message_date)
        .bind(thread.last_message_date)
        .bind(thread.last_message_received_date)
        .bind(thread.last_message_sent_date)
        .bind(participants)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_folders(&self, folders: &[models::Folder]) -> Result<()> {
        for folder in folders {
            sqlx::query(
                "INSERT INTO folders (id, account_id, name, role) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, role=excluded.role",
            )
            .bind(&folder.id)
            .bind(&folder.account_id)
            .bind(&folder.name)
            .bind(&folder.role)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn upsert_labels(&self, labels: &[models::Label]) -> Result<()> {
        for label in labels {
            sqlx::query(
                "INSERT INTO labels (id, account_id, name, role) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, role=excluded.role",
            )
            .bind(&label.id)
            .bind(&label.account_id)
            .bind(&label.name)
            .bind(&label.role)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Insert or update messages. Moving a message to another folder is an
    /// upsert with a new `folder_id`.
    pub async fn upsert_messages(&self, messages: &[models::Message]) -> Result<()> {
        for msg in messages {
            sqlx::query(
                "INSERT INTO messages (id, account_id, thread_id, folder_id, subject, snippet, from_address, to_address, date, body, unread, starred)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET thread_id=excluded.thread_id, folder_id=excluded.folder_id,
                 snippet=excluded.snippet, body=excluded.body, unread=excluded.unread, starred=excluded.starred",
            )
            .bind(&msg.id)
            .bind(&msg.account_id)
            .bind(&msg.thread_id)
            .bind(&msg.folder_id)
            .bind(&msg.subject)
            .bind(&msg.snippet)
            .bind(&msg.from_address)
            .bind(&msg.to_address)
            .bind(msg.date)
            .bind(&msg.body)
            .bind(msg.unread)
            .bind(msg.starred)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Overwrite the labels applied to one message.
    pub async fn set_message_labels(&self, message_id: &str, label_ids: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM message_labels WHERE message_id = ?")
            .bind(message_id)
            .execute(&mut *tx)
            .await?;
        for label_id in label_ids {
            sqlx::query("INSERT OR IGNORE INTO message_labels (message_id, label_id) VALUES (?, ?)")
                .bind(message_id)
                .bind(label_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The thread row with its current label and folder membership.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<models::Thread>> {
        let row = sqlx::query(
            "SELECT id, account_id, version, remote_thread_id, subject, snippet, unread_count, starred_count,
                    first_message_date, last_message_date, last_message_received_date, last_message_sent_date, participants
             FROM threads
             WHERE id = ?",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let participants: String = row.try_get("participants")?;
        let mut thread = models::Thread {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            version: row.try_get("version")?,
            remote_thread_id: row.try_get("remote_thread_id")?,
            subject: row.try_get("subject")?,
            snippet: row.try_get("snippet")?,
            unread_count: row.try_get("unread_count")?,
            starred_count: row.try_get("starred_count")?,
            first_message_date: row.try_get("first_message_date")?,
            last_message_date: row.try_get("last_message_date")?,
            last_message_received_date: row.try_get("last_message_received_date")?,
            last_message_sent_date: row.try_get("last_message_sent_date")?,
            participants: serde_json::from_str(&participants)?,
            label_ids: BTreeSet::new(),
            folder_ids: BTreeSet::new(),
        };

        thread.label_ids = self
            .column_set("SELECT label_id FROM thread_labels WHERE thread_id = ?", thread_id)
            .await?;
        thread.folder_ids = self
            .column_set("SELECT folder_id FROM thread_folders WHERE thread_id = ?", thread_id)
            .await?;

        Ok(Some(thread))
    }

    /// Load a thread with folders, labels and messages populated, ready for
    /// `view::project`. At `DetailLevel::Ids` only message identifiers (and
    /// folder ids) are read.
    pub async fn load_thread(
        &self,
        thread_id: &str,
        detail: DetailLevel,
    ) -> Result<Option<HydratedThread>> {
        let Some(thread) = self.get_thread(thread_id).await? else {
            return Ok(None);
        };

        let folders = sqlx::query(
            "SELECT f.id, f.account_id, f.name, f.role
             FROM folders f
             JOIN thread_folders tf ON f.id = tf.folder_id
             WHERE tf.thread_id = ?
             ORDER BY f.name ASC",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> Result<models::Folder> {
            Ok(models::Folder {
                id: row.try_get("id")?,
                account_id: row.try_get("account_id")?,
                name: row.try_get("name")?,
                role: row.try_get("role")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let labels = sqlx::query(
            "SELECT l.id, l.account_id, l.name, l.role
             FROM labels l
             JOIN thread_labels tl ON l.id = tl.label_id
             WHERE tl.thread_id = ?
             ORDER BY l.name ASC",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> Result<models::Label> {
            let name: String = row.try_get("name")?;
            Ok(models::Label {
                id: row.try_get("id")?,
                account_id: row.try_get("account_id")?,
                display_name: to_title_case(&name),
                name,
                role: row.try_get("role")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let messages = match detail {
            DetailLevel::Expanded => {
                sqlx::query(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE thread_id = ? ORDER BY date ASC, id ASC"
                ))
                .bind(thread_id)
                .fetch_all(&self.pool)
                .await?
                .iter()
                .map(message_from_row)
                .collect::<std::result::Result<Vec<_>, _>>()?
            }
            DetailLevel::Ids => sqlx::query(
                "SELECT id, thread_id, folder_id FROM messages WHERE thread_id = ? ORDER BY date ASC, id ASC",
            )
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| -> Result<models::Message> {
                Ok(models::Message {
                    id: row.try_get("id")?,
                    thread_id: row.try_get("thread_id")?,
                    folder_id: row.try_get("folder_id")?,
                    ..Default::default()
                })
            })
            .collect::<Result<Vec<_>>>()?,
        };

        Ok(Some(HydratedThread {
            thread,
            folders: Some(folders),
            labels: Some(labels),
            messages: Some(messages),
            detail,
        }))
    }

    async fn column_set(&self, sql: &str, thread_id: &str) -> Result<BTreeSet<String>> {
        let rows = sqlx::query(sql)
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| r.try_get(0).map_err(StoreError::from))
            .collect()
    }

    async fn replace_membership(
        &self,
        table: &str,
        column: &str,
        thread_id: &str,
        ids: &[String],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DELETE FROM {table} WHERE thread_id = ?"))
            .bind(thread_id)
            .execute(&mut *tx)
            .await?;
        let insert = format!("INSERT OR IGNORE INTO {table} (thread_id, {column}) VALUES (?, ?)");
        for id in ids {
            sqlx::query(&insert)
                .bind(thread_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn message_from_row(row: &SqliteRow) -> std::result::Result<models::Message, sqlx::Error> {
    Ok(models::Message {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        thread_id: row.try_get("thread_id")?,
        folder_id: row.try_get("folder_id")?,
        subject: row.try_get("subject")?,
        snippet: row.try_get("snippet")?,
        from_address: row.try_get("from_address")?,
        to_address: row.try_get("to_address")?,
        date: row.try_get("date")?,
        body: row.try_get("body")?,
        unread: row.try_get("unread")?,
        starred: row.try_get("starred")?,
    })
}

#[async_trait]
impl ThreadStore for Database {
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<models::Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE thread_id = ?"
        ))
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(message_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn list_label_ids(&self, message_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT label_id FROM message_labels WHERE message_id = ?")
            .bind(message_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| r.try_get(0).map_err(StoreError::from))
            .collect()
    }

    async fn replace_labels(&self, thread_id: &str, label_ids: &[String]) -> Result<()> {
        self.replace_membership("thread_labels", "label_id", thread_id, label_ids)
            .await
    }

    async fn replace_folders(&self, thread_id: &str, folder_ids: &[String]) -> Result<()> {
        self.replace_membership("thread_folders", "folder_id", thread_id, folder_ids)
            .await
    }

    async fn save(&self, thread: &models::Thread) -> Result<()> {
        let result = sqlx::query("UPDATE threads SET version = ? WHERE id = ?")
            .bind(thread.version)
            .bind(&thread.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ThreadNotFound(thread.id.clone()));
        }
        Ok(())
    }
}
