use serde::{Deserialize, Serialize};

/// Alert flag applied when a new item does not say otherwise.
pub const DEFAULT_ALERT: bool = true;

/// A tracked manga as stored, without its relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub reference_id: i64,
    pub name: String,
    pub position: String,
    pub alert: bool,
    pub description: Option<String>,
    pub cover: Option<String>,
    /// Only set by `Repository::update_position`.
    pub last_update: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewItem {
    pub reference_id: i64,
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub alert: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub feed_ids: Vec<i64>,
}

impl NewItem {
    pub fn new(reference_id: i64, name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            reference_id,
            name: name.into(),
            position: position.into(),
            ..Default::default()
        }
    }

    pub fn alert(&self) -> bool {
        self.alert.unwrap_or(DEFAULT_ALERT)
    }
}
