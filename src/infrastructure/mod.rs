//! Infrastructure layer - external concerns

pub mod database;
pub mod storage;

pub use database::{init_database, DatabaseConfig, PoolConfig, SeaOrmSubscriptionRepository};
pub use storage::InMemorySubscriptionRepository;
