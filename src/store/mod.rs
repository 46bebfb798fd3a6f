//! Session store implementations

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::{ContextStore, SessionStore};

#[cfg(feature = "redis-store")]
mod redis_store;

#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;
