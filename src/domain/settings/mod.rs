//! Site settings domain

mod entity;
mod repository;

pub use entity::{ModerationPolicy, SettingsKey, SiteSettings, SETTINGS_KEY};
pub use repository::SettingsRepository;

#[cfg(test)]
pub use repository::MockSettingsRepository;
