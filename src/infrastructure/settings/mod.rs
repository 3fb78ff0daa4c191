//! Site settings infrastructure implementations

mod repository;

pub use repository::StorageSettingsRepository;
