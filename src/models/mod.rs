mod feed;
mod item;
mod view;

pub use feed::{Feed, NewFeed, Tag};
pub use item::{Item, NewItem, DEFAULT_ALERT};
pub use view::{ItemInfo, ItemView};
