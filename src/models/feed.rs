use serde::{Deserialize, Serialize};

/// A site hosting one or more items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub chapter_url: String,
    pub chapter_limiter: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFeed {
    pub name: String,
    pub url: String,
    pub chapter_url: String,
    #[serde(default)]
    pub chapter_limiter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
