//! Request-level access control types

mod error;
mod stage;

pub use error::AccessError;
pub use stage::SubmissionStage;
