mod catalog;
mod relations;
mod repository;
mod schema;
mod views;

pub use repository::Repository;
pub use views::assemble;
