//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::subscriptions::{
    CreateSubscriptionRequest, SharedSubscriptionService, SubscriptionResponse,
    TotalCostResponse, UpdateSubscriptionRequest,
};
use crate::interfaces::http::modules::health::{self, ComponentHealth, HealthResponse, HealthState};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::subscriptions::{self, SubscriptionAppState};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Subscriptions
        subscriptions::create_subscription,
        subscriptions::list_subscriptions,
        subscriptions::get_subscription,
        subscriptions::update_subscription,
        subscriptions::delete_subscription,
        subscriptions::total_cost,
    ),
    components(
        schemas(
            HealthResponse,
            ComponentHealth,
            CreateSubscriptionRequest,
            UpdateSubscriptionRequest,
            SubscriptionResponse,
            TotalCostResponse,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Subscriptions", description = "Subscription lifecycle and total cost over a filter"),
    ),
    info(
        title = "Subscription Aggregator API",
        version = "1.0.0",
        description = "REST API for recording user subscriptions and totalling their cost"
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(service: SharedSubscriptionService) -> Router {
    let health_state = HealthState {
        repo: Arc::clone(service.repository()),
        started_at: Arc::new(Instant::now()),
    };
    let subscription_state = SubscriptionAppState { service };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The static total-cost segment takes priority over the {id} capture
    let subscription_routes = Router::new()
        .route(
            "/api/v1/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/api/v1/subscriptions/total-cost",
            get(subscriptions::total_cost),
        )
        .route(
            "/api/v1/subscriptions/{id}",
            get(subscriptions::get_subscription)
                .patch(subscriptions::update_subscription)
                .delete(subscriptions::delete_subscription),
        )
        .with_state(subscription_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(health_routes)
        .merge(subscription_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
}
