//! Comment infrastructure implementations

mod repository;

pub use repository::StorageCommentRepository;
