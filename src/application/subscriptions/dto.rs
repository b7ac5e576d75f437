//! Subscription request and response shapes
//!
//! These are the transport-facing types: JSON bodies and query strings use
//! them directly, with periods written as `MM-YYYY`.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::validation::{
    validate_create_range, validate_filter_range, validate_patch_not_empty,
};
use crate::domain::{CostFilter, NewSubscription, Period, Subscription, SubscriptionPatch};

/// Rejects an explicit JSON `null` instead of reading it as "not supplied".
///
/// Used together with `#[serde(default)]`, so a missing key still yields `None`.
fn reject_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Create subscription request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_range", skip_on_field_errors = false))]
pub struct CreateSubscriptionRequest {
    #[validate(length(min = 1, max = 255, message = "service name is required"))]
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[validate(range(min = 0, message = "price must be non-negative"))]
    #[schema(example = 400)]
    pub price: i64,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: Period,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<Period>,
}

impl From<CreateSubscriptionRequest> for NewSubscription {
    fn from(req: CreateSubscriptionRequest) -> Self {
        Self {
            service_name: req.service_name,
            price: req.price,
            user_id: req.user_id,
            start_period: req.start_date,
            end_period: req.end_date,
        }
    }
}

/// Partial update request. User and start date cannot change.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_patch_not_empty", skip_on_field_errors = false))]
pub struct UpdateSubscriptionRequest {
    #[serde(default, deserialize_with = "reject_null")]
    #[validate(length(min = 1, max = 255, message = "service name cannot be empty"))]
    pub service_name: Option<String>,
    #[serde(default, deserialize_with = "reject_null")]
    #[validate(range(min = 0, message = "price must be non-negative"))]
    pub price: Option<i64>,
    #[serde(default, deserialize_with = "reject_null")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<Period>,
}

impl From<UpdateSubscriptionRequest> for SubscriptionPatch {
    fn from(req: UpdateSubscriptionRequest) -> Self {
        Self {
            service_name: req.service_name,
            price: req.price,
            end_period: req.end_date,
        }
    }
}

/// Total cost filters; every parameter is optional
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[validate(schema(function = "validate_filter_range", skip_on_field_errors = false))]
#[into_params(parameter_in = Query)]
pub struct TotalCostQuery {
    /// Only subscriptions of this user
    pub user_id: Option<Uuid>,
    /// Case-insensitive partial match on the service name
    #[validate(length(min = 1, message = "service name cannot be empty"))]
    pub service_name: Option<String>,
    /// Subscriptions starting on or after this month (MM-YYYY)
    #[param(value_type = Option<String>, example = "01-2025")]
    pub start_date: Option<Period>,
    /// Subscriptions ending on or before this month (MM-YYYY)
    #[param(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<Period>,
}

impl From<TotalCostQuery> for CostFilter {
    fn from(q: TotalCostQuery) -> Self {
        Self {
            user_id: q.user_id,
            service_name: q.service_name,
            start_period: q.start_date,
            end_period: q.end_date,
        }
    }
}

/// Subscription as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "07-2025")]
    pub start_date: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "12-2025")]
    pub end_date: Option<Period>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(s: Subscription) -> Self {
        Self {
            id: s.id,
            service_name: s.service_name,
            price: s.price,
            user_id: s.user_id,
            start_date: s.start_period,
            end_date: s.end_period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TotalCostResponse {
    pub total_cost: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_reads_json_field_names() {
        let user = Uuid::new_v4();
        let json = serde_json::json!({
            "service_name": "Yandex Plus",
            "price": 400,
            "user_id": user,
            "start_date": "07-2025"
        });

        let req: CreateSubscriptionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.service_name, "Yandex Plus");
        assert_eq!(req.price, 400);
        assert_eq!(req.user_id, user);
        assert_eq!(req.start_date.to_string(), "07-2025");
        assert!(req.end_date.is_none());
    }

    #[test]
    fn create_request_rejects_malformed_period() {
        let json = serde_json::json!({
            "service_name": "Netflix",
            "price": 1,
            "user_id": Uuid::new_v4(),
            "start_date": "2025-07"
        });
        assert!(serde_json::from_value::<CreateSubscriptionRequest>(json).is_err());
    }

    #[test]
    fn patch_distinguishes_missing_from_null() {
        let missing: UpdateSubscriptionRequest =
            serde_json::from_value(serde_json::json!({ "price": 10 })).unwrap();
        assert_eq!(missing.price, Some(10));
        assert!(missing.end_date.is_none());
        assert!(missing.service_name.is_none());

        let null = serde_json::from_value::<UpdateSubscriptionRequest>(
            serde_json::json!({ "end_date": null }),
        );
        assert!(null.is_err());
    }

    #[test]
    fn response_omits_absent_end_date() {
        let resp = SubscriptionResponse {
            id: Uuid::nil(),
            service_name: "Netflix".into(),
            price: 299,
            user_id: Uuid::nil(),
            start_date: "01-2024".parse().unwrap(),
            end_date: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["start_date"], "01-2024");
        assert!(json.get("end_date").is_none());
        assert_eq!(json["price"], 299);
    }

    #[test]
    fn total_cost_serializes_with_snake_case_key() {
        let json = serde_json::to_value(TotalCostResponse { total_cost: 1398 }).unwrap();
        assert_eq!(json, serde_json::json!({ "total_cost": 1398 }));
    }

    #[test]
    fn query_maps_to_cost_filter() {
        let user = Uuid::new_v4();
        let filter = CostFilter::from(TotalCostQuery {
            user_id: Some(user),
            service_name: Some("net".into()),
            start_date: Some("01-2024".parse().unwrap()),
            end_date: None,
        });
        assert_eq!(filter.user_id, Some(user));
        assert_eq!(filter.service_name.as_deref(), Some("net"));
        assert_eq!(filter.start_period.map(|p| p.to_string()).as_deref(), Some("01-2024"));
        assert!(filter.end_period.is_none());
    }
}
