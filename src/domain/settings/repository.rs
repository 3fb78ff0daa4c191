//! Settings repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{ModerationPolicy, SiteSettings};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for the site settings singleton
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync + Debug {
    /// Current settings, defaults when nothing has been saved
    async fn get_settings(&self) -> Result<SiteSettings, DomainError>;

    /// Replace the stored settings
    async fn save(&self, settings: SiteSettings) -> Result<SiteSettings, DomainError>;

    /// Current moderation policy
    async fn get_moderation_policy(&self) -> Result<ModerationPolicy, DomainError> {
        Ok(self.get_settings().await?.comment_mode)
    }
}
