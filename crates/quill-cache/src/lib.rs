//! Cache backends for Quill.
//!
//! Every backend implements [`quill_core::cache::Cache`]. [`CacheProvider`]
//! picks one at startup so the rest of the program stays monomorphic.

mod memory;
mod provider;
mod redis_cache;

pub mod error;

pub use error::{Error, Result};
pub use memory::MemoryCache;
pub use provider::CacheProvider;
pub use redis_cache::RedisCache;
