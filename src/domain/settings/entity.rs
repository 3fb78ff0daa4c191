//! Site-wide settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::CommentStatus;
use crate::domain::storage::{StorageEntity, StorageKey};

/// Key of the single settings row
pub const SETTINGS_KEY: &str = "site";

/// Settings are a singleton keyed by a fixed name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsKey(String);

impl Default for SettingsKey {
    fn default() -> Self {
        Self(SETTINGS_KEY.to_string())
    }
}

impl StorageKey for SettingsKey {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// How newly submitted comments are moderated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModerationPolicy {
    /// Comments wait for approval before they are shown
    #[default]
    #[serde(rename = "pre_moderation")]
    Pre,
    /// Comments are shown immediately and may be removed later
    #[serde(rename = "post_moderation")]
    Post,
}

impl ModerationPolicy {
    /// Status assigned to a freshly submitted comment
    pub fn initial_status(&self) -> CommentStatus {
        match self {
            Self::Pre => CommentStatus::Pending,
            Self::Post => CommentStatus::Approved,
        }
    }
}

/// Site-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(skip, default)]
    key: SettingsKey,
    #[serde(default)]
    pub site_title: Option<String>,
    #[serde(default)]
    pub comment_mode: ModerationPolicy,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            key: SettingsKey::default(),
            site_title: None,
            comment_mode: ModerationPolicy::default(),
            updated_at: Utc::now(),
        }
    }
}

impl SiteSettings {
    pub fn new(site_title: Option<String>, comment_mode: ModerationPolicy) -> Self {
        Self {
            site_title,
            comment_mode,
            ..Self::default()
        }
    }
}

impl StorageEntity for SiteSettings {
    type Key = SettingsKey;

    fn key(&self) -> &Self::Key {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_wire_names() {
        assert_eq!(
            serde_json::to_string(&ModerationPolicy::Post).unwrap(),
            "\"post_moderation\""
        );
        let policy: ModerationPolicy = serde_json::from_str("\"pre_moderation\"").unwrap();
        assert_eq!(policy, ModerationPolicy::Pre);
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(ModerationPolicy::Pre.initial_status(), CommentStatus::Pending);
        assert_eq!(ModerationPolicy::Post.initial_status(), CommentStatus::Approved);
    }

    #[test]
    fn test_missing_settings_default_to_pre_moderation() {
        let settings: SiteSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.comment_mode, ModerationPolicy::Pre);
        assert!(settings.site_title.is_none());
    }
}
