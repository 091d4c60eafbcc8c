//! 缓存

mod moka_cache;
mod role_list_cache;

pub use moka_cache::{MokaCache, MokaCacheConfig};
pub use role_list_cache::RoleListCache;
