//! Subscription service — application-layer orchestration
//!
//! Requests from the HTTP layer arrive already validated (see
//! [`super::validation`]). Every rule runs again here so direct callers
//! cannot store what the extractors would reject.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{
    CreateSubscriptionRequest, SubscriptionResponse, TotalCostQuery, TotalCostResponse,
    UpdateSubscriptionRequest,
};
use super::validation::validate_request;
use crate::domain::{
    ensure_valid_range, CostFilter, DomainError, DomainResult, NewSubscription,
    SubscriptionPatch, SubscriptionRepository,
};

/// Subscription service — generic over the store so it works with both the
/// SeaORM and the in-memory implementation.
pub struct SubscriptionService<R: SubscriptionRepository + ?Sized> {
    repo: Arc<R>,
}

pub type SharedSubscriptionService = Arc<SubscriptionService<dyn SubscriptionRepository>>;

impl<R: SubscriptionRepository + ?Sized> SubscriptionService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub async fn create_subscription(
        &self,
        req: CreateSubscriptionRequest,
    ) -> DomainResult<SubscriptionResponse> {
        validate_request(&req)?;
        let candidate = NewSubscription::from(req);
        ensure_valid_range(candidate.start_period, candidate.end_period)?;

        let id = self.repo.create(candidate.clone()).await?;
        info!(
            "Subscription created: {} ({} for user {})",
            id, candidate.service_name, candidate.user_id
        );

        Ok(candidate.into_subscription(id).into())
    }

    pub async fn get_subscription(&self, id: Uuid) -> DomainResult<SubscriptionResponse> {
        let subscription = self.repo.find_by_id(id).await?;
        Ok(subscription.into())
    }

    pub async fn list_subscriptions(&self) -> DomainResult<Vec<SubscriptionResponse>> {
        let subscriptions = self.repo.find_all().await?;
        debug!("Listing {} subscriptions", subscriptions.len());
        Ok(subscriptions.into_iter().map(Into::into).collect())
    }

    /// Applies a partial update.
    ///
    /// The existing record is read first so the resulting date range can be
    /// checked; the write itself only touches the patched columns. Two
    /// concurrent updates of the same id both succeed and the later write wins.
    pub async fn update_subscription(
        &self,
        id: Uuid,
        req: UpdateSubscriptionRequest,
    ) -> DomainResult<SubscriptionResponse> {
        validate_request(&req)?;
        let patch = SubscriptionPatch::from(req);
        if patch.is_empty() {
            return Err(DomainError::EmptyPatch);
        }

        let mut current = self.repo.find_by_id(id).await?;
        current.apply(&patch);
        ensure_valid_range(current.start_period, current.end_period)?;

        let updated = self.repo.update(id, patch).await?;
        info!("Subscription updated: {}", id);
        Ok(updated.into())
    }

    pub async fn delete_subscription(&self, id: Uuid) -> DomainResult<()> {
        self.repo.delete(id).await?;
        info!("Subscription deleted: {}", id);
        Ok(())
    }

    pub async fn total_cost(&self, query: TotalCostQuery) -> DomainResult<TotalCostResponse> {
        validate_request(&query)?;
        let filter = CostFilter::from(query);
        let total_cost = self.repo.sum_price(&filter).await?;
        debug!("Total cost {} for {:?}", total_cost, filter);
        Ok(TotalCostResponse { total_cost })
    }
}
