//! Cache domain - shared key/value store used for counters and reservations

mod repository;

pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::{MockCache, StalledCache};
