//! In-memory subscription store

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{
    CostFilter, DomainError, DomainResult, NewSubscription, Period, Subscription,
    SubscriptionPatch, SubscriptionRepository,
};

type NaturalKey = (Uuid, String, Period);

fn natural_key(s: &Subscription) -> NaturalKey {
    (s.user_id, s.service_name.clone(), s.start_period)
}

fn duplicate(key: &NaturalKey) -> DomainError {
    DomainError::AlreadyExists(format!(
        "Subscription {} for user {} starting {}",
        key.1, key.0, key.2
    ))
}

struct Record {
    seq: u64,
    subscription: Subscription,
}

/// In-memory store for development and testing.
///
/// Lock order is natural keys before records.
pub struct InMemorySubscriptionRepository {
    records: DashMap<Uuid, Record>,
    keys: DashMap<NaturalKey, Uuid>,
    sequence: AtomicU64,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            keys: DashMap::new(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemorySubscriptionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create(&self, new: NewSubscription) -> DomainResult<Uuid> {
        let id = Uuid::new_v4();
        let subscription = new.into_subscription(id);
        let key = natural_key(&subscription);

        match self.keys.entry(key) {
            Entry::Occupied(entry) => Err(duplicate(entry.key())),
            Entry::Vacant(entry) => {
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                self.records.insert(id, Record { seq, subscription });
                entry.insert(id);
                Ok(id)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Subscription> {
        self.records
            .get(&id)
            .map(|r| r.subscription.clone())
            .ok_or_else(|| DomainError::subscription_not_found(id))
    }

    async fn find_all(&self) -> DomainResult<Vec<Subscription>> {
        let mut all: Vec<(u64, Subscription)> = self
            .records
            .iter()
            .map(|r| (r.seq, r.subscription.clone()))
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        Ok(all.into_iter().map(|(_, s)| s).collect())
    }

    async fn update(&self, id: Uuid, patch: SubscriptionPatch) -> DomainResult<Subscription> {
        loop {
            let current = self.find_by_id(id).await?;
            let old_key = natural_key(&current);

            let mut next = current;
            next.apply(&patch);
            let new_key = natural_key(&next);

            // A renamed subscription claims its new natural key first
            let renamed = new_key != old_key;
            if renamed {
                match self.keys.entry(new_key.clone()) {
                    Entry::Occupied(entry) if *entry.get() == id => {
                        // Another rename of this id holds the key; wait for it to land
                        drop(entry);
                        tokio::task::yield_now().await;
                        continue;
                    }
                    Entry::Occupied(entry) => return Err(duplicate(entry.key())),
                    Entry::Vacant(entry) => {
                        entry.insert(id);
                    }
                }
            }

            let updated = match self.records.get_mut(&id) {
                // The key may have moved since the snapshot; claim again from the fresh state
                Some(record) if natural_key(&record.subscription) != old_key => None,
                Some(mut record) => {
                    record.subscription.apply(&patch);
                    Some(Ok(record.subscription.clone()))
                }
                None => Some(Err(DomainError::subscription_not_found(id))),
            };

            match updated {
                Some(Ok(subscription)) => {
                    if renamed {
                        self.keys.remove_if(&old_key, |_, owner| *owner == id);
                    }
                    return Ok(subscription);
                }
                Some(Err(e)) => {
                    if renamed {
                        self.keys.remove_if(&new_key, |_, owner| *owner == id);
                    }
                    return Err(e);
                }
                None => {
                    if renamed {
                        self.keys.remove_if(&new_key, |_, owner| *owner == id);
                    }
                }
            }
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let (_, record) = self
            .records
            .remove(&id)
            .ok_or_else(|| DomainError::subscription_not_found(id))?;
        self.keys
            .remove_if(&natural_key(&record.subscription), |_, owner| *owner == id);
        Ok(())
    }

    async fn sum_price(&self, filter: &CostFilter) -> DomainResult<i64> {
        let snapshot: Vec<Subscription> = self
            .records
            .iter()
            .map(|r| r.subscription.clone())
            .collect();
        filter.total(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn new_sub(user_id: Uuid, name: &str, price: i64) -> NewSubscription {
        NewSubscription {
            service_name: name.into(),
            price,
            user_id,
            start_period: period("01-2024"),
            end_period: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let repo = InMemorySubscriptionRepository::new();
        let user = Uuid::new_v4();
        let a = repo.create(new_sub(user, "Netflix", 299)).await.unwrap();
        let b = repo.create(new_sub(user, "Spotify", 169)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.find_by_id(a).await.unwrap().price, 299);
    }

    #[tokio::test]
    async fn duplicate_natural_key_is_rejected() {
        let repo = InMemorySubscriptionRepository::new();
        let user = Uuid::new_v4();
        repo.create(new_sub(user, "Netflix", 299)).await.unwrap();

        let err = repo.create(new_sub(user, "Netflix", 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
        assert_eq!(repo.len(), 1);

        // Same service for another user is fine
        repo.create(new_sub(Uuid::new_v4(), "Netflix", 299))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rename_into_taken_key_is_rejected() {
        let repo = InMemorySubscriptionRepository::new();
        let user = Uuid::new_v4();
        repo.create(new_sub(user, "Netflix", 299)).await.unwrap();
        let spotify = repo.create(new_sub(user, "Spotify", 169)).await.unwrap();

        let patch = SubscriptionPatch {
            service_name: Some("Netflix".into()),
            ..Default::default()
        };
        let err = repo.update(spotify, patch).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
        assert_eq!(repo.find_by_id(spotify).await.unwrap().service_name, "Spotify");
    }

    #[tokio::test]
    async fn rename_frees_old_key() {
        let repo = InMemorySubscriptionRepository::new();
        let user = Uuid::new_v4();
        let id = repo.create(new_sub(user, "Netflix", 299)).await.unwrap();

        let patch = SubscriptionPatch {
            service_name: Some("Netflix Premium".into()),
            ..Default::default()
        };
        let updated = repo.update(id, patch).await.unwrap();
        assert_eq!(updated.service_name, "Netflix Premium");
        assert_eq!(updated.price, 299);

        repo.create(new_sub(user, "Netflix", 299)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_frees_key_and_reports_missing() {
        let repo = InMemorySubscriptionRepository::new();
        let user = Uuid::new_v4();
        let id = repo.create(new_sub(user, "Netflix", 299)).await.unwrap();

        repo.delete(id).await.unwrap();
        assert!(repo.is_empty());
        assert!(matches!(
            repo.delete(id).await,
            Err(DomainError::NotFound { .. })
        ));
        repo.create(new_sub(user, "Netflix", 299)).await.unwrap();
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let repo = InMemorySubscriptionRepository::new();
        let user = Uuid::new_v4();
        let mut ids = Vec::new();
        for name in ["c", "a", "b", "d"] {
            ids.push(repo.create(new_sub(user, name, 1)).await.unwrap());
        }
        let listed: Vec<Uuid> = repo.find_all().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn sum_price_uses_filter() {
        let repo = InMemorySubscriptionRepository::new();
        let alice = Uuid::new_v4();
        repo.create(new_sub(alice, "Netflix", 299)).await.unwrap();
        repo.create(new_sub(alice, "Spotify", 169)).await.unwrap();
        repo.create(new_sub(Uuid::new_v4(), "Netflix", 299)).await.unwrap();

        assert_eq!(repo.sum_price(&CostFilter::default()).await.unwrap(), 767);
        let filter = CostFilter {
            user_id: Some(alice),
            service_name: Some("FLIX".into()),
            ..Default::default()
        };
        assert_eq!(repo.sum_price(&filter).await.unwrap(), 299);
    }

    #[tokio::test]
    async fn concurrent_creates_of_same_key_admit_one() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let user = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.create(new_sub(user, "Netflix", 299)).await
            }));
        }

        let mut created = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_renames_leave_one_key_claimed() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let user = Uuid::new_v4();
        let id = repo.create(new_sub(user, "Netflix", 299)).await.unwrap();

        let names: Vec<String> = (0..16).map(|i| format!("Service {}", i)).collect();
        let mut handles = Vec::new();
        for name in names.clone() {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let patch = SubscriptionPatch {
                    service_name: Some(name),
                    ..Default::default()
                };
                repo.update(id, patch).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let final_name = repo.find_by_id(id).await.unwrap().service_name;
        assert_eq!(repo.keys.len(), 1);

        // Every name but the final one is free again
        let mut all_names = names;
        all_names.push("Netflix".to_string());
        for name in &all_names {
            let result = repo.create(new_sub(user, name, 1)).await;
            if *name == final_name {
                assert!(matches!(result, Err(DomainError::AlreadyExists(_))));
            } else {
                assert!(result.is_ok(), "{} should be free", name);
            }
        }
    }

    #[tokio::test]
    async fn overflowing_sum_is_a_storage_error() {
        let repo = InMemorySubscriptionRepository::new();
        repo.create(new_sub(Uuid::new_v4(), "Netflix", i64::MAX)).await.unwrap();
        repo.create(new_sub(Uuid::new_v4(), "Netflix", i64::MAX)).await.unwrap();
        assert!(matches!(
            repo.sum_price(&CostFilter::default()).await,
            Err(DomainError::Storage(_))
        ));
    }
}
