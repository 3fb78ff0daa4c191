//! Content infrastructure implementations

mod repository;

pub use repository::StorageContentRepository;
