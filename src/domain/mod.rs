pub mod period;
pub mod subscription;

// Re-export commonly used types
pub use period::{Period, PeriodFormatError};
pub use subscription::{
    ensure_valid_range, CostFilter, CostPredicate, NewSubscription, Subscription,
    SubscriptionPatch, SubscriptionRepository,
};

// Re-export DomainError from support for convenience
pub use crate::support::errors::{DomainError, DomainResult};
