//! Subscription aggregate
//!
//! Contains the Subscription record, patch and filter types, and the store interface.

pub mod filter;
pub mod model;
pub mod repository;

pub use filter::{CostFilter, CostPredicate};
pub use model::{ensure_valid_range, NewSubscription, Subscription, SubscriptionPatch};
pub use repository::SubscriptionRepository;
