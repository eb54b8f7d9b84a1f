//! On-disk catalog: data survives closing and reopening the handle.

use mangashelf::models::{NewFeed, NewItem};
use mangashelf::Repository;
use tempfile::TempDir;

#[tokio::test]
async fn test_reopened_catalog_keeps_items_links_and_tags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db");

    let repo = Repository::open(&path).await.unwrap();
    let feed = repo
        .create_feed(NewFeed {
            name: "Site A".into(),
            url: "https://site-a.com/".into(),
            chapter_url: "https://site-a.com/chapters/".into(),
            chapter_limiter: String::new(),
        })
        .await
        .unwrap();
    repo.create_item(NewItem {
        feed_ids: vec![feed],
        tags: vec!["Action".into()],
        ..NewItem::new(1, "Manga One", "Chapter 1")
    })
    .await
    .unwrap();
    repo.close().await.unwrap();

    let repo = Repository::open(&path).await.unwrap();
    let view = repo.get_item_view_by_name("Manga One").await.unwrap().unwrap();
    assert_eq!(view.feeds[0].url, "https://site-a.com/manga-one");
    assert_eq!(view.info.tags, vec!["Action"]);
    repo.close().await.unwrap();
}

#[tokio::test]
async fn test_deleted_ids_are_not_reused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.db");

    let repo = Repository::open(&path).await.unwrap();
    let first = repo.create_item(NewItem::new(1, "Manga One", "1")).await.unwrap();
    repo.delete_item("Manga One").await.unwrap();
    repo.close().await.unwrap();

    let repo = Repository::open(&path).await.unwrap();
    let second = repo.create_item(NewItem::new(2, "Manga Two", "1")).await.unwrap();
    assert!(second > first);
    assert!(repo.tags_for_item(first).await.unwrap().is_empty());
}
