//! Comment submission pipeline stages

use std::fmt;

/// Steps a comment submission passes through, in order
///
/// A failure at any stage terminates the submission with an
/// [`AccessError`](super::AccessError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubmissionStage {
    Received,
    /// Idempotency key looked up or reserved
    KeyChecked,
    RateChecked,
    Validated,
    HumanVerified,
    Persisted,
    Responded,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::KeyChecked => "key_checked",
            Self::RateChecked => "rate_checked",
            Self::Validated => "validated",
            Self::HumanVerified => "human_verified",
            Self::Persisted => "persisted",
            Self::Responded => "responded",
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
