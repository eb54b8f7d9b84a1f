use serde::{Deserialize, Serialize};

use super::Feed;

/// The client-facing shape of an item: its feeds carry deep links to the
/// item instead of the site's generic urls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: i64,
    pub reference_id: i64,
    pub name: String,
    pub position: String,
    pub alert: bool,
    /// Empty when the position was never updated.
    pub last_update: String,
    pub feeds: Vec<Feed>,
    pub info: ItemInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub description: String,
    pub cover: String,
    pub tags: Vec<String>,
}
