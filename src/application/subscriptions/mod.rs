//! Subscriptions module — lifecycle use-cases and cost totals
//!
//! Contains the `SubscriptionService` plus the request/response shapes and
//! the validation rules applied to them at the edge.

pub mod dto;
pub mod service;
pub mod validation;

pub use dto::{
    CreateSubscriptionRequest, SubscriptionResponse, TotalCostQuery, TotalCostResponse,
    UpdateSubscriptionRequest,
};
pub use service::{SharedSubscriptionService, SubscriptionService};
pub use validation::{classify, validate_request};
