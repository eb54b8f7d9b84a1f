use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Feed, Item, ItemInfo, ItemView};
use crate::slug::slug;

use super::catalog::{db_item_by_name, db_list_items};
use super::relations::{db_feeds_for_item, db_tags_for_item};
use super::repository::{item_from_row, Repository, ITEM_COLUMNS};

const ITEMS_BY_FEED: &str =
    "SELECT item_id FROM item_feed_links WHERE feed_id = (SELECT id FROM feeds WHERE name = ?1)";

/// Builds the client view of `item` from its linked feeds and tag names.
/// Each feed's urls get the item's slug appended.
pub fn assemble(item: Item, feeds: Vec<Feed>, tags: Vec<String>) -> ItemView {
    let fragment = slug(&item.name);
    let feeds = feeds
        .into_iter()
        .map(|feed| Feed {
            url: format!("{}{}", feed.url, fragment),
            chapter_url: format!("{}{}", feed.chapter_url, fragment),
            ..feed
        })
        .collect();

    ItemView {
        id: item.id,
        reference_id: item.reference_id,
        name: item.name,
        position: item.position,
        alert: item.alert,
        last_update: item.last_update.unwrap_or_default(),
        feeds,
        info: ItemInfo {
            description: item.description.unwrap_or_default(),
            cover: item.cover.unwrap_or_default(),
            tags,
        },
    }
}

fn db_assemble(conn: &Connection, item: Item) -> rusqlite::Result<ItemView> {
    let feeds = db_feeds_for_item(conn, item.id)?;
    let tags = db_tags_for_item(conn, item.id)?;
    Ok(assemble(item, feeds, tags))
}

fn db_items_by_feed(conn: &Connection, feed_name: &str, limit: Option<i64>) -> rusqlite::Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id IN ({ITEMS_BY_FEED}) ORDER BY id LIMIT ?2"
    ))?;
    // SQLite treats a negative LIMIT as unbounded.
    let items = stmt
        .query_map(params![feed_name, limit.unwrap_or(-1)], item_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

impl Repository {
    /// Assembles a view for an item row the caller already holds. Feeds and
    /// tags are read in one call, so no write lands between them.
    pub async fn assemble_item(&self, item: Item) -> Result<ItemView> {
        let view = self
            .conn
            .call(move |conn| Ok(db_assemble(conn, item)?))
            .await?;
        Ok(view)
    }

    pub async fn list_item_views(&self) -> Result<Vec<ItemView>> {
        let views = self
            .conn
            .call(|conn| {
                let conn = &*conn;
                let views = db_list_items(conn)?
                    .into_iter()
                    .map(|item| db_assemble(conn, item))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(views)
            })
            .await?;
        Ok(views)
    }

    pub async fn get_item_view_by_name(&self, name: &str) -> Result<Option<ItemView>> {
        let name = name.to_string();
        let view = self
            .conn
            .call(move |conn| {
                let conn = &*conn;
                let view = db_item_by_name(conn, &name)?
                    .map(|item| db_assemble(conn, item))
                    .transpose()?;
                Ok(view)
            })
            .await?;
        Ok(view)
    }

    /// The item with the lowest id among those linked to `feed_name`.
    pub async fn get_item_view_by_feed(&self, feed_name: &str) -> Result<Option<ItemView>> {
        let feed_name = feed_name.to_string();
        let view = self
            .conn
            .call(move |conn| {
                let conn = &*conn;
                let view = db_items_by_feed(conn, &feed_name, Some(1))?
                    .into_iter()
                    .next()
                    .map(|item| db_assemble(conn, item))
                    .transpose()?;
                Ok(view)
            })
            .await?;
        Ok(view)
    }

    /// Every item linked to `feed_name`, by ascending id. Empty for an
    /// unknown feed.
    pub async fn list_item_views_by_feed(&self, feed_name: &str) -> Result<Vec<ItemView>> {
        let feed_name = feed_name.to_string();
        let views = self
            .conn
            .call(move |conn| {
                let conn = &*conn;
                let views = db_items_by_feed(conn, &feed_name, None)?
                    .into_iter()
                    .map(|item| db_assemble(conn, item))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(views)
            })
            .await?;
        Ok(views)
    }

    /// Single-row variant of [`Repository::get_item_by_id`] that also loads
    /// relations in one round trip.
    pub async fn get_item_view_by_id(&self, id: i64) -> Result<Option<ItemView>> {
        let view = self
            .conn
            .call(move |conn| {
                let conn = &*conn;
                let view = conn
                    .query_row(
                        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                        params![id],
                        item_from_row,
                    )
                    .optional()?
                    .map(|item| db_assemble(conn, item))
                    .transpose()?;
                Ok(view)
            })
            .await?;
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_item(name: &str) -> Item {
        Item {
            id: 7,
            reference_id: 123,
            name: name.to_string(),
            position: "Chapter 3".to_string(),
            alert: false,
            description: None,
            cover: None,
            last_update: None,
        }
    }

    fn raw_feed() -> Feed {
        Feed {
            id: 1,
            name: "Site A".to_string(),
            url: "https://site-a.com/".to_string(),
            chapter_url: "https://site-a.com/chapters/".to_string(),
            chapter_limiter: "/ch-".to_string(),
        }
    }

    #[tokio::test]
    async fn assemble_item_sees_feeds_and_tags_from_one_snapshot() {
        use crate::models::{NewFeed, NewItem};

        let repo = Repository::open_in_memory().await.unwrap();
        let mut sites = Vec::new();
        for name in ["A", "B"] {
            let id = repo
                .create_feed(NewFeed {
                    name: name.to_string(),
                    url: format!("https://{name}.example/"),
                    chapter_url: format!("https://{name}.example/ch/"),
                    chapter_limiter: String::new(),
                })
                .await
                .unwrap();
            sites.push(id);
        }
        let id = repo
            .create_item(NewItem {
                feed_ids: vec![sites[0]],
                tags: vec!["a".into()],
                ..NewItem::new(1, "Manga One", "1")
            })
            .await
            .unwrap();
        let tag_b = repo.ensure_tag("b").await.unwrap();
        let tag_a = repo.ensure_tag("a").await.unwrap();

        // Swaps (A, a) <-> (B, b) atomically.
        let writer = {
            let repo = repo.clone();
            let (site_a, site_b) = (sites[0], sites[1]);
            tokio::spawn(async move {
                for round in 0..50 {
                    let (feed, tag) = if round % 2 == 0 { (site_b, tag_b) } else { (site_a, tag_a) };
                    repo.conn
                        .call(move |conn| {
                            let tx = conn.transaction()?;
                            tx.execute("DELETE FROM item_feed_links WHERE item_id = ?1", params![id])?;
                            tx.execute("DELETE FROM item_tag_links WHERE item_id = ?1", params![id])?;
                            tx.execute(
                                "INSERT INTO item_feed_links (item_id, feed_id) VALUES (?1, ?2)",
                                params![id, feed],
                            )?;
                            tx.execute(
                                "INSERT INTO item_tag_links (item_id, tag_id) VALUES (?1, ?2)",
                                params![id, tag],
                            )?;
                            tx.commit()?;
                            Ok(())
                        })
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        let item = repo.get_item_by_id(id).await.unwrap().unwrap();
        for _ in 0..100 {
            let view = repo.assemble_item(item.clone()).await.unwrap();
            let feed = view.feeds[0].name.as_str();
            let tag = view.info.tags[0].as_str();
            assert_eq!(feed.to_lowercase(), tag, "mixed snapshot");
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
    }

    #[test]
    fn assemble_appends_slug_to_both_urls() {
        let view = assemble(raw_item("Kaguya-sama: Love is War"), vec![raw_feed()], vec![]);
        let feed = &view.feeds[0];
        assert_eq!(feed.url, "https://site-a.com/kaguya-sama-love-is-war");
        assert_eq!(feed.chapter_url, "https://site-a.com/chapters/kaguya-sama-love-is-war");
        assert_eq!(feed.name, "Site A");
        assert_eq!(feed.chapter_limiter, "/ch-");
    }

    #[test]
    fn assemble_defaults_missing_payload_to_empty() {
        let view = assemble(raw_item("Manga One"), vec![], vec![]);
        assert_eq!(view.last_update, "");
        assert_eq!(view.info, ItemInfo::default());
        assert!(view.feeds.is_empty());
    }

    #[test]
    fn assemble_keeps_recorded_payload() {
        let item = Item {
            description: Some("Pirates.".to_string()),
            cover: Some("https://img.example/op.jpg".to_string()),
            last_update: Some("2026-10-01T12:00:00Z".to_string()),
            ..raw_item("One Piece")
        };
        let view = assemble(item, vec![], vec!["Action".to_string()]);
        assert_eq!(view.last_update, "2026-10-01T12:00:00Z");
        assert_eq!(view.info.description, "Pirates.");
        assert_eq!(view.info.cover, "https://img.example/op.jpg");
        assert_eq!(view.info.tags, vec!["Action"]);
        assert_eq!(view.reference_id, 123);
        assert!(!view.alert);
    }

    #[test]
    fn view_serializes_with_nested_info() {
        let view = assemble(raw_item("Manga One"), vec![raw_feed()], vec!["Drama".to_string()]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["feeds"][0]["url"], "https://site-a.com/manga-one");
        assert_eq!(json["info"]["tags"][0], "Drama");
        assert_eq!(json["last_update"], "");
    }
}
