pub mod cache;

pub use cache::RedisDirectoryCache;
