//! # Subscription Aggregator
//!
//! Records which online services users subscribe to, for how much and over
//! which months, and totals subscription cost over optional filters.
//!
//! ## Architecture
//!
//! - **domain**: Period value type, subscription model, cost filter, store trait
//! - **application**: Subscription service, request/response shapes, validation
//! - **infrastructure**: SeaORM (PostgreSQL/SQLite) and in-memory stores
//! - **interfaces**: REST API with Swagger documentation
//! - **support**: Errors and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{
    init_database, DatabaseConfig, InMemorySubscriptionRepository, SeaOrmSubscriptionRepository,
};

// Re-export API router
pub use interfaces::http::create_api_router;
