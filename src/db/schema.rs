pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- items table
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reference_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    position TEXT NOT NULL,
    alert INTEGER NOT NULL DEFAULT 1,
    description TEXT,
    cover TEXT,
    last_update TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);

-- feeds table
CREATE TABLE IF NOT EXISTS feeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    chapter_url TEXT NOT NULL,
    chapter_limiter TEXT NOT NULL DEFAULT ''
);

-- item_feed_links table (no cascade: cleanup is done explicitly)
CREATE TABLE IF NOT EXISTS item_feed_links (
    item_id INTEGER NOT NULL REFERENCES items(id),
    feed_id INTEGER NOT NULL REFERENCES feeds(id),
    PRIMARY KEY (item_id, feed_id)
);

CREATE INDEX IF NOT EXISTS idx_item_feed_links_feed_id ON item_feed_links(feed_id);

-- tags table
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- item_tag_links table
CREATE TABLE IF NOT EXISTS item_tag_links (
    item_id INTEGER NOT NULL REFERENCES items(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (item_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_item_tag_links_tag_id ON item_tag_links(tag_id);
"#;
