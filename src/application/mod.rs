pub mod subscriptions;

// Re-export key types for convenience
pub use subscriptions::{
    CreateSubscriptionRequest, SharedSubscriptionService, SubscriptionResponse,
    SubscriptionService, TotalCostQuery, TotalCostResponse, UpdateSubscriptionRequest,
};
