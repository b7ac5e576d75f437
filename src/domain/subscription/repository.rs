//! Subscription store interface

use async_trait::async_trait;
use uuid::Uuid;

use super::filter::CostFilter;
use super::model::{NewSubscription, Subscription, SubscriptionPatch};
use crate::domain::DomainResult;

/// Durable persistence and aggregation for subscriptions.
///
/// Updates are last-write-wins: there is no version check between a read and
/// a later [`update`](Self::update) of the same id.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persists a new record and returns its freshly assigned id.
    ///
    /// Fails with `AlreadyExists` when another record has the same
    /// user, service name and start period.
    async fn create(&self, subscription: NewSubscription) -> DomainResult<Uuid>;

    /// Fails with `NotFound` when no record has this id.
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Subscription>;

    /// Every record, in insertion order.
    async fn find_all(&self) -> DomainResult<Vec<Subscription>>;

    /// Writes only the fields present in `patch` and returns the stored result.
    async fn update(&self, id: Uuid, patch: SubscriptionPatch) -> DomainResult<Subscription>;

    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Sum of prices over records matching every predicate of `filter`.
    async fn sum_price(&self, filter: &CostFilter) -> DomainResult<i64>;

    /// Cheap liveness probe used by the health endpoint.
    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}
