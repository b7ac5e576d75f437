//! Cost filter and its predicate list
//!
//! Every field of [`CostFilter`] is optional. [`CostFilter::predicates`]
//! turns the filter into a conjunction holding one [`CostPredicate`] per
//! supplied field and nothing for absent ones. Stores either evaluate the list
//! in memory or translate each predicate into a SQL condition.

use uuid::Uuid;

use super::model::Subscription;
use crate::domain::period::Period;
use crate::support::errors::{DomainError, DomainResult};

/// Narrows which subscriptions contribute to a cost total
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostFilter {
    pub user_id: Option<Uuid>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
    /// Inclusive lower bound on the subscription start
    pub start_period: Option<Period>,
    /// Inclusive upper bound on the subscription end
    pub end_period: Option<Period>,
}

/// A single conjunct of a cost query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostPredicate {
    UserIs(Uuid),
    /// Holds the needle already lowercased
    ServiceNameContains(String),
    StartsOnOrAfter(Period),
    /// Ongoing subscriptions (no end) never satisfy this predicate
    EndsOnOrBefore(Period),
}

impl CostPredicate {
    pub fn matches(&self, subscription: &Subscription) -> bool {
        match self {
            Self::UserIs(user_id) => subscription.user_id == *user_id,
            Self::ServiceNameContains(needle) => subscription
                .service_name
                .to_lowercase()
                .contains(needle.as_str()),
            Self::StartsOnOrAfter(bound) => subscription.start_period >= *bound,
            Self::EndsOnOrBefore(bound) => subscription
                .end_period
                .is_some_and(|end| end <= *bound),
        }
    }
}

impl CostFilter {
    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }

    /// Builds the conjunction for this filter.
    pub fn predicates(&self) -> Vec<CostPredicate> {
        let mut predicates = Vec::new();

        if let Some(user_id) = self.user_id {
            predicates.push(CostPredicate::UserIs(user_id));
        }
        if let Some(name) = &self.service_name {
            predicates.push(CostPredicate::ServiceNameContains(name.to_lowercase()));
        }
        if let Some(start) = self.start_period {
            predicates.push(CostPredicate::StartsOnOrAfter(start));
        }
        if let Some(end) = self.end_period {
            predicates.push(CostPredicate::EndsOnOrBefore(end));
        }

        predicates
    }

    /// Evaluates the conjunction against one record. An empty filter matches everything.
    pub fn matches(&self, subscription: &Subscription) -> bool {
        self.predicates().iter().all(|p| p.matches(subscription))
    }

    /// Sums prices of the matching records. A sum past `i64::MAX` is a
    /// storage error, as it is for the SQL aggregate.
    pub fn total<'a, I>(&self, subscriptions: I) -> DomainResult<i64>
    where
        I: IntoIterator<Item = &'a Subscription>,
    {
        let predicates = self.predicates();
        subscriptions
            .into_iter()
            .filter(|s| predicates.iter().all(|p| p.matches(s)))
            .try_fold(0i64, |acc, s| acc.checked_add(s.price))
            .ok_or_else(|| DomainError::Storage("total cost overflows a 64-bit integer".to_string()))
    }
}
