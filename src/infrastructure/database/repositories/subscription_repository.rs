//! SeaORM implementation of SubscriptionRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Unchanged,
};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    CostFilter, CostPredicate, DomainError, DomainResult, NewSubscription, Period, Subscription,
    SubscriptionPatch, SubscriptionRepository,
};
use crate::infrastructure::database::entities::subscription;

// ── Conversion helpers ──────────────────────────────────────────

fn db_err(e: DbErr) -> DomainError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
        return DomainError::AlreadyExists(format!("Subscription: {}", detail));
    }
    DomainError::Storage(e.to_string())
}

fn entity_to_domain(m: subscription::Model) -> Subscription {
    Subscription {
        id: m.id,
        service_name: m.service_name,
        price: m.price,
        user_id: m.user_id,
        start_period: Period::from_date(m.start_date),
        end_period: m.end_date.map(Period::from_date),
    }
}

/// Escapes LIKE wildcards so the needle matches literally.
fn like_literal(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn predicate_condition(predicate: &CostPredicate) -> SimpleExpr {
    use subscription::Column;

    match predicate {
        CostPredicate::UserIs(user_id) => Column::UserId.eq(*user_id),
        CostPredicate::ServiceNameContains(needle) => {
            Expr::expr(Func::lower(Expr::col(Column::ServiceName)))
                .like(LikeExpr::new(like_literal(needle)).escape('\\'))
        }
        CostPredicate::StartsOnOrAfter(bound) => Column::StartDate.gte(bound.first_day()),
        CostPredicate::EndsOnOrBefore(bound) => Column::EndDate
            .is_not_null()
            .and(Column::EndDate.lte(bound.first_day())),
    }
}

fn filter_condition(filter: &CostFilter) -> Condition {
    filter
        .predicates()
        .iter()
        .fold(Condition::all(), |cond, p| cond.add(predicate_condition(p)))
}

// ── SeaOrmSubscriptionRepository ────────────────────────────────

pub struct SeaOrmSubscriptionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionRepository for SeaOrmSubscriptionRepository {
    async fn create(&self, s: NewSubscription) -> DomainResult<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = subscription::ActiveModel {
            id: Set(id),
            service_name: Set(s.service_name),
            price: Set(s.price),
            user_id: Set(s.user_id),
            start_date: Set(s.start_period.first_day()),
            end_date: Set(s.end_period.map(|p| p.first_day())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        subscription::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(db_err)?;
        debug!("Subscription row inserted: {}", id);
        Ok(id)
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Subscription> {
        subscription::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(entity_to_domain)
            .ok_or_else(|| DomainError::subscription_not_found(id))
    }

    async fn find_all(&self) -> DomainResult<Vec<Subscription>> {
        let models = subscription::Entity::find()
            .order_by_asc(subscription::Column::CreatedAt)
            .order_by_asc(subscription::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn update(&self, id: Uuid, patch: SubscriptionPatch) -> DomainResult<Subscription> {
        let mut model = subscription::ActiveModel {
            id: Unchanged(id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = patch.service_name {
            model.service_name = Set(name);
        }
        if let Some(price) = patch.price {
            model.price = Set(price);
        }
        if let Some(end) = patch.end_period {
            model.end_date = Set(Some(end.first_day()));
        }

        match model.update(&self.db).await {
            Ok(updated) => Ok(entity_to_domain(updated)),
            Err(DbErr::RecordNotUpdated) => Err(DomainError::subscription_not_found(id)),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = subscription::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::subscription_not_found(id));
        }
        Ok(())
    }

    async fn sum_price(&self, filter: &CostFilter) -> DomainResult<i64> {
        let total = Func::cast_as(
            Func::coalesce([
                Expr::col(subscription::Column::Price).sum(),
                Expr::val(0i64).into(),
            ]),
            Alias::new("BIGINT"),
        );

        let sum = subscription::Entity::find()
            .select_only()
            .column_as(SimpleExpr::from(total), "total")
            .filter(filter_condition(filter))
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(sum.unwrap_or(0))
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db.ping().await.map_err(db_err)
    }
}
