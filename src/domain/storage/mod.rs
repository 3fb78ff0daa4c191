//! Storage domain - generic persistence abstraction shared by all repositories

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::{field_equals, merge_fields, Storage};
