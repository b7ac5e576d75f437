//! Subscription domain entity

use uuid::Uuid;

use crate::domain::period::Period;
use crate::domain::{DomainError, DomainResult};

/// Fails with [`DomainError::InvalidDateRange`] when `end` precedes `start`.
pub fn ensure_valid_range(start: Period, end: Option<Period>) -> DomainResult<()> {
    match end {
        Some(end) if end < start => Err(DomainError::InvalidDateRange),
        _ => Ok(()),
    }
}

/// A persisted subscription record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    /// Monthly price in whole currency units
    pub price: i64,
    pub user_id: Uuid,
    pub start_period: Period,
    /// `None` means the subscription is ongoing
    pub end_period: Option<Period>,
}

impl Subscription {
    /// Applies the fields present in `patch`, leaving the rest untouched.
    ///
    /// Does not check the date range; callers decide what to do with the result.
    pub fn apply(&mut self, patch: &SubscriptionPatch) {
        if let Some(name) = &patch.service_name {
            self.service_name = name.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(end) = patch.end_period {
            self.end_period = Some(end);
        }
    }

    pub fn has_valid_range(&self) -> bool {
        ensure_valid_range(self.start_period, self.end_period).is_ok()
    }
}

/// Candidate record, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    pub start_period: Period,
    pub end_period: Option<Period>,
}

impl NewSubscription {
    pub fn into_subscription(self, id: Uuid) -> Subscription {
        Subscription {
            id,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_period: self.start_period,
            end_period: self.end_period,
        }
    }
}

/// Sparse update intent.
///
/// `user_id` and `start_period` are deliberately absent: they never change
/// after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    pub end_period: Option<Period>,
}

impl SubscriptionPatch {
    pub fn is_empty(&self) -> bool {
        self.service_name.is_none() && self.price.is_none() && self.end_period.is_none()
    }
}
