use std::path::Path;

use rusqlite::Row;
use tokio_rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::models::{Feed, Item, Tag};

use super::schema::SCHEMA;

pub(super) const ITEM_COLUMNS: &str =
    "id, reference_id, name, position, alert, description, cover, last_update";
pub(super) const FEED_COLUMNS: &str = "id, name, url, chapter_url, chapter_limiter";

/// Handle on the catalog database. Cloning shares the same underlying
/// connection thread, so every clone sees the same committed state.
#[derive(Clone)]
pub struct Repository {
    pub(super) conn: Connection,
}

impl Repository {
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let conn = Connection::open(&path).await?;
        let repo = Self::init(conn).await?;
        info!(path = %path.display(), "opened catalog");
        Ok(repo)
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Waits for queued operations to finish, then closes the connection.
    /// Other clones of this handle fail with a closed-connection error
    /// afterwards.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("closed catalog");
        Ok(())
    }
}

pub(super) fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        reference_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        alert: row.get(4)?,
        description: row.get(5)?,
        cover: row.get(6)?,
        last_update: row.get(7)?,
    })
}

pub(super) fn feed_from_row(row: &Row) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        chapter_url: row.get(3)?,
        chapter_limiter: row.get(4)?,
    })
}

pub(super) fn tag_from_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_all_tables() {
        let repo = Repository::open_in_memory().await.unwrap();
        let tables = repo
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        assert_eq!(
            tables,
            vec!["feeds", "item_feed_links", "item_tag_links", "items", "tags"]
        );
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let repo = Repository::open_in_memory().await.unwrap();
        let enabled: i64 = repo
            .conn
            .call(|conn| Ok(conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn schema_is_reapplied_without_error() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn close_rejects_further_calls_on_clones() {
        let repo = Repository::open_in_memory().await.unwrap();
        let clone = repo.clone();
        repo.close().await.unwrap();
        assert!(clone.list_items().await.is_err());
    }
}
