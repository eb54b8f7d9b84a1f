use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::models::{Feed, Item, NewFeed, NewItem};

use super::relations::{db_delete_item_links, db_ensure_tag, db_insert_feed_link, db_insert_tag_link, unique};
use super::repository::{feed_from_row, item_from_row, Repository, FEED_COLUMNS, ITEM_COLUMNS};

/// Names are not unique for items; lookups by name resolve to the lowest id.
pub(super) fn db_item_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Item>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE name = ?1 ORDER BY id LIMIT 1"),
        params![name],
        item_from_row,
    )
    .optional()
}

pub(super) fn db_feed_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<Feed>> {
    conn.query_row(
        &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE name = ?1"),
        params![name],
        feed_from_row,
    )
    .optional()
}

fn db_update_item_scalars(conn: &Connection, item: &Item) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE items SET reference_id = ?1, name = ?2, position = ?3, alert = ?4 WHERE id = ?5",
        params![item.reference_id, item.name, item.position, item.alert, item.id],
    )?;
    Ok(changed > 0)
}

pub(super) fn db_list_items(conn: &Connection) -> rusqlite::Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))?;
    let items = stmt
        .query_map([], item_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

impl Repository {
    // Item operations

    /// Inserts the item, then links it to `feed_ids` and to each tag in
    /// `tags` (creating missing tags). All or nothing.
    pub async fn create_item(&self, item: NewItem) -> Result<i64> {
        let alert = item.alert();
        let name = item.name.clone();
        let id = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO items (reference_id, name, position, alert, description, cover) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        item.reference_id,
                        item.name,
                        item.position,
                        alert,
                        item.description,
                        item.cover,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                for feed_id in unique(&item.feed_ids) {
                    db_insert_feed_link(&tx, id, feed_id)?;
                }
                for tag in unique(&item.tags) {
                    let tag_id = db_ensure_tag(&tx, &tag)?;
                    db_insert_tag_link(&tx, id, tag_id)?;
                }
                tx.commit()?;
                Ok(id)
            })
            .await?;
        debug!(id, name = %name, "created item");
        Ok(id)
    }

    pub async fn get_item_by_id(&self, id: i64) -> Result<Option<Item>> {
        let item = self
            .conn
            .call(move |conn| {
                let item = conn
                    .query_row(
                        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                        params![id],
                        item_from_row,
                    )
                    .optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    pub async fn get_item_by_name(&self, name: &str) -> Result<Option<Item>> {
        let name = name.to_string();
        let item = self
            .conn
            .call(move |conn| Ok(db_item_by_name(conn, &name)?))
            .await?;
        Ok(item)
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        let items = self.conn.call(|conn| Ok(db_list_items(conn)?)).await?;
        Ok(items)
    }

    /// Overwrites reference id, name, position and alert of the row with
    /// `item.id`. Description, cover and relations are left alone.
    /// Returns false when no such row exists.
    pub async fn update_item_scalars(&self, item: &Item) -> Result<bool> {
        let item = item.clone();
        let id = item.id;
        let changed = self
            .conn
            .call(move |conn| Ok(db_update_item_scalars(conn, &item)?))
            .await?;
        debug!(id, changed, "updated item");
        Ok(changed)
    }

    /// Full update: the scalars of [`Repository::update_item_scalars`] plus a
    /// destructive replace of the item's feed links, all or nothing. Returns
    /// false, leaving links untouched, when no row has `item.id`.
    pub async fn update_item(&self, item: &Item, feed_ids: &[i64]) -> Result<bool> {
        let item = item.clone();
        let id = item.id;
        let feed_ids = unique(feed_ids);
        let changed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                if !db_update_item_scalars(&tx, &item)? {
                    return Ok(false);
                }
                tx.execute("DELETE FROM item_feed_links WHERE item_id = ?1", params![item.id])?;
                for feed_id in feed_ids {
                    db_insert_feed_link(&tx, item.id, feed_id)?;
                }
                tx.commit()?;
                Ok(true)
            })
            .await?;
        debug!(id, changed, "updated item and feeds");
        Ok(changed)
    }

    /// Records a new reading position. An unknown name is not an error:
    /// nothing is written and false is returned.
    pub async fn update_position(&self, name: &str, position: &str, timestamp: &str) -> Result<bool> {
        let (name, position, timestamp) = (name.to_string(), position.to_string(), timestamp.to_string());
        let log_name = name.clone();
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"UPDATE items SET position = ?1, last_update = ?2
                       WHERE id = (SELECT id FROM items WHERE name = ?3 ORDER BY id LIMIT 1)"#,
                    params![position, timestamp, name],
                )?;
                Ok(changed > 0)
            })
            .await?;
        debug!(name = %log_name, changed, "updated position");
        Ok(changed)
    }

    /// Deletes the item and every feed and tag link pointing at it.
    /// Returns false when no item has that name.
    pub async fn delete_item(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        let log_name = name.clone();
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(item) = db_item_by_name(&tx, &name)? else {
                    return Ok(false);
                };
                db_delete_item_links(&tx, item.id)?;
                tx.execute("DELETE FROM items WHERE id = ?1", params![item.id])?;
                tx.commit()?;
                Ok(true)
            })
            .await?;
        debug!(name = %log_name, deleted, "deleted item");
        Ok(deleted)
    }

    // Feed operations

    pub async fn create_feed(&self, feed: NewFeed) -> Result<i64> {
        let name = feed.name.clone();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO feeds (name, url, chapter_url, chapter_limiter) VALUES (?1, ?2, ?3, ?4)",
                    params![feed.name, feed.url, feed.chapter_url, feed.chapter_limiter],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        debug!(id, name = %name, "created feed");
        Ok(id)
    }

    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY id"))?;
                let feeds = stmt
                    .query_map([], feed_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    pub async fn get_feed_by_name(&self, name: &str) -> Result<Option<Feed>> {
        let name = name.to_string();
        let feed = self
            .conn
            .call(move |conn| Ok(db_feed_by_name(conn, &name)?))
            .await?;
        Ok(feed)
    }

    pub async fn get_feed_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let feed = self
            .conn
            .call(move |conn| {
                let feed = conn
                    .query_row(
                        &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?1"),
                        params![id],
                        feed_from_row,
                    )
                    .optional()?;
                Ok(feed)
            })
            .await?;
        Ok(feed)
    }

    /// Rewrites the urls and limiter of the feed named `feed.name`.
    /// Returns false when no feed has that name.
    pub async fn update_feed(&self, feed: &Feed) -> Result<bool> {
        let feed = feed.clone();
        let log_name = feed.name.clone();
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE feeds SET url = ?1, chapter_url = ?2, chapter_limiter = ?3 WHERE name = ?4",
                    params![feed.url, feed.chapter_url, feed.chapter_limiter, feed.name],
                )?;
                Ok(changed > 0)
            })
            .await?;
        debug!(name = %log_name, changed, "updated feed");
        Ok(changed)
    }

    /// Deletes the feed and every item link pointing at it.
    pub async fn delete_feed(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        let log_name = name.clone();
        let deleted = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let Some(feed) = db_feed_by_name(&tx, &name)? else {
                    return Ok(false);
                };
                tx.execute("DELETE FROM item_feed_links WHERE feed_id = ?1", params![feed.id])?;
                tx.execute("DELETE FROM feeds WHERE id = ?1", params![feed.id])?;
                tx.commit()?;
                Ok(true)
            })
            .await?;
        debug!(name = %log_name, deleted, "deleted feed");
        Ok(deleted)
    }
}
