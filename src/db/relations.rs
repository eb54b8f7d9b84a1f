use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::Result;
use crate::models::{Feed, Tag};

use super::catalog::{db_feed_by_name, db_item_by_name};
use super::repository::{feed_from_row, tag_from_row, Repository, FEED_COLUMNS};

/// Order-preserving dedup; payload lists are treated as sets.
pub(super) fn unique<T: PartialEq + Clone>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

pub(super) fn db_insert_feed_link(conn: &Connection, item_id: i64, feed_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO item_feed_links (item_id, feed_id) VALUES (?1, ?2)",
        params![item_id, feed_id],
    )?;
    Ok(())
}

pub(super) fn db_insert_tag_link(conn: &Connection, item_id: i64, tag_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO item_tag_links (item_id, tag_id) VALUES (?1, ?2)",
        params![item_id, tag_id],
    )?;
    Ok(())
}

/// The unique index on `tags.name` makes the insert a no-op when another
/// caller created the tag first.
pub(super) fn db_ensure_tag(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        params![name],
    )?;
    conn.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
}

pub(super) fn db_delete_item_links(conn: &Connection, item_id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM item_feed_links WHERE item_id = ?1", params![item_id])?;
    conn.execute("DELETE FROM item_tag_links WHERE item_id = ?1", params![item_id])?;
    Ok(())
}

pub(super) fn db_feeds_for_item(conn: &Connection, item_id: i64) -> rusqlite::Result<Vec<Feed>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEED_COLUMNS} FROM feeds WHERE id IN (SELECT feed_id FROM item_feed_links WHERE item_id = ?1) ORDER BY id"
    ))?;
    let feeds = stmt
        .query_map(params![item_id], feed_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(feeds)
}

pub(super) fn db_tags_for_item(conn: &Connection, item_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"SELECT t.name FROM tags t
           JOIN item_tag_links l ON l.tag_id = t.id
           WHERE l.item_id = ?1
           ORDER BY t.id"#,
    )?;
    let tags = stmt
        .query_map(params![item_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

impl Repository {
    // Item <-> feed links

    /// Fails with a conflict if the pair is already linked or either side
    /// does not exist.
    pub async fn link_item_to_feed(&self, item_id: i64, feed_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| Ok(db_insert_feed_link(conn, item_id, feed_id)?))
            .await?;
        debug!(item_id, feed_id, "linked feed");
        Ok(())
    }

    /// Returns false when the pair was not linked.
    pub async fn unlink_item_from_feed(&self, item_id: i64, feed_id: i64) -> Result<bool> {
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM item_feed_links WHERE item_id = ?1 AND feed_id = ?2",
                    params![item_id, feed_id],
                )?;
                Ok(removed > 0)
            })
            .await?;
        debug!(item_id, feed_id, removed, "unlinked feed");
        Ok(removed)
    }

    /// Drops every feed link of the item, then links it to `feed_ids`.
    pub async fn replace_item_feeds(&self, item_id: i64, feed_ids: &[i64]) -> Result<()> {
        let feed_ids = unique(feed_ids);
        let count = feed_ids.len();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM item_feed_links WHERE item_id = ?1", params![item_id])?;
                for feed_id in feed_ids {
                    db_insert_feed_link(&tx, item_id, feed_id)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        debug!(item_id, count, "replaced feeds");
        Ok(())
    }

    /// Links by names. Nothing is written, and false returned, when either
    /// the item or the feed is unknown.
    pub async fn add_feed_to_item(&self, item_name: &str, feed_name: &str) -> Result<bool> {
        let (item_name, feed_name) = (item_name.to_string(), feed_name.to_string());
        let added = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let (Some(item), Some(feed)) =
                    (db_item_by_name(&tx, &item_name)?, db_feed_by_name(&tx, &feed_name)?)
                else {
                    return Ok(false);
                };
                db_insert_feed_link(&tx, item.id, feed.id)?;
                tx.commit()?;
                Ok(true)
            })
            .await?;
        Ok(added)
    }

    pub async fn remove_feed_from_item(&self, item_name: &str, feed_name: &str) -> Result<bool> {
        let (item_name, feed_name) = (item_name.to_string(), feed_name.to_string());
        let removed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let (Some(item), Some(feed)) =
                    (db_item_by_name(&tx, &item_name)?, db_feed_by_name(&tx, &feed_name)?)
                else {
                    return Ok(false);
                };
                let removed = tx.execute(
                    "DELETE FROM item_feed_links WHERE item_id = ?1 AND feed_id = ?2",
                    params![item.id, feed.id],
                )?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await?;
        Ok(removed)
    }

    pub async fn feeds_for_item(&self, item_id: i64) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(move |conn| Ok(db_feeds_for_item(conn, item_id)?))
            .await?;
        Ok(feeds)
    }

    // Tags

    /// Returns the id of the tag named `name`, creating it if needed.
    /// Concurrent calls with the same name agree on one row.
    pub async fn ensure_tag(&self, name: &str) -> Result<i64> {
        let name = name.to_string();
        let id = self
            .conn
            .call(move |conn| Ok(db_ensure_tag(conn, &name)?))
            .await?;
        Ok(id)
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY id")?;
                let tags = stmt
                    .query_map([], tag_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(tags)
            })
            .await?;
        Ok(tags)
    }

    pub async fn link_item_to_tag(&self, item_id: i64, tag_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| Ok(db_insert_tag_link(conn, item_id, tag_id)?))
            .await?;
        debug!(item_id, tag_id, "linked tag");
        Ok(())
    }

    pub async fn unlink_item_from_tag(&self, item_id: i64, tag_id: i64) -> Result<bool> {
        let removed = self
            .conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM item_tag_links WHERE item_id = ?1 AND tag_id = ?2",
                    params![item_id, tag_id],
                )?;
                Ok(removed > 0)
            })
            .await?;
        debug!(item_id, tag_id, removed, "unlinked tag");
        Ok(removed)
    }

    /// Drops every tag link of the item, then links it to `names`, creating
    /// missing tags. Tags left without items are kept.
    pub async fn replace_item_tags(&self, item_id: i64, names: &[String]) -> Result<()> {
        let names = unique(names);
        let count = names.len();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM item_tag_links WHERE item_id = ?1", params![item_id])?;
                for name in &names {
                    let tag_id = db_ensure_tag(&tx, name)?;
                    db_insert_tag_link(&tx, item_id, tag_id)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        debug!(item_id, count, "replaced tags");
        Ok(())
    }

    pub async fn tags_for_item(&self, item_id: i64) -> Result<Vec<String>> {
        let tags = self
            .conn
            .call(move |conn| Ok(db_tags_for_item(conn, item_id)?))
            .await?;
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_keeps_first_occurrence_order() {
        assert_eq!(unique(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert_eq!(unique::<i64>(&[]), Vec::<i64>::new());
    }

    #[tokio::test]
    async fn ensure_tag_in_transaction_sees_existing_row() {
        let repo = Repository::open_in_memory().await.unwrap();
        let first = repo.ensure_tag("Action").await.unwrap();
        let second = repo
            .conn
            .call(|conn| {
                let tx = conn.transaction()?;
                let id = db_ensure_tag(&tx, "Action")?;
                tx.commit()?;
                Ok(id)
            })
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
