//! Subscription REST API handlers

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::subscriptions::{
    CreateSubscriptionRequest, SharedSubscriptionService, SubscriptionResponse, TotalCostQuery,
    TotalCostResponse, UpdateSubscriptionRequest,
};
use crate::interfaces::http::common::{
    error_response, ApiError, ApiPath, ApiResponse, ApiResult, ValidatedJson, ValidatedQuery,
};

/// State shared by the subscription routes
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub service: SharedSubscriptionService,
}

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Malformed JSON"),
        (status = 409, description = "Same user, service and start month already exist"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_subscription(
    State(state): State<SubscriptionAppState>,
    ValidatedJson(req): ValidatedJson<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscriptionResponse>>), ApiError> {
    state
        .service
        .create_subscription(req)
        .await
        .map(|created| (StatusCode::CREATED, Json(ApiResponse::success(created))))
        .map_err(error_response)
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "Subscriptions",
    responses(
        (status = 200, description = "All subscriptions in creation order", body = ApiResponse<Vec<SubscriptionResponse>>)
    )
)]
pub async fn list_subscriptions(
    State(state): State<SubscriptionAppState>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    match state.service.list_subscriptions().await {
        Ok(list) => Ok(Json(ApiResponse::success(list))),
        Err(e) => Err(error_response(e)),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription details", body = ApiResponse<SubscriptionResponse>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_subscription(
    State(state): State<SubscriptionAppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<SubscriptionResponse> {
    match state.service.get_subscription(id).await {
        Ok(found) => Ok(Json(ApiResponse::success(found))),
        Err(e) => Err(error_response(e)),
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<SubscriptionResponse>),
        (status = 400, description = "Malformed JSON or explicit null"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Rename collides with another subscription"),
        (status = 422, description = "Validation failed, empty patch or end before start")
    )
)]
pub async fn update_subscription(
    State(state): State<SubscriptionAppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateSubscriptionRequest>,
) -> ApiResult<SubscriptionResponse> {
    match state.service.update_subscription(id, req).await {
        Ok(updated) => Ok(Json(ApiResponse::success(updated))),
        Err(e) => Err(error_response(e)),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_subscription(
    State(state): State<SubscriptionAppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_subscription(id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/total-cost",
    tag = "Subscriptions",
    params(TotalCostQuery),
    responses(
        (status = 200, description = "Sum of matching prices", body = ApiResponse<TotalCostResponse>),
        (status = 400, description = "Malformed query"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn total_cost(
    State(state): State<SubscriptionAppState>,
    ValidatedQuery(query): ValidatedQuery<TotalCostQuery>,
) -> ApiResult<TotalCostResponse> {
    match state.service.total_cost(query).await {
        Ok(total) => Ok(Json(ApiResponse::success(total))),
        Err(e) => Err(error_response(e)),
    }
}
