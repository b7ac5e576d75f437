//! Validated JSON and query extractors for Axum
//!
//! `ValidatedJson<T>` and `ValidatedQuery<T>` work like `axum::Json<T>` and
//! `axum::extract::Query<T>`, but additionally run
//! `validator::Validate::validate()` on the deserialized value.
//! `ApiPath<T>` wraps `axum::extract::Path<T>` so a malformed segment is
//! answered inside the same JSON envelope.
//! Malformed input yields 400; failed rules are collapsed into a
//! [`DomainError`](crate::domain::DomainError) and answered with 422.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{error_response, ApiResponse};
use crate::application::subscriptions::classify;

/// An extractor that deserializes a JSON body and validates it.
///
/// ```ignore
/// async fn handler(ValidatedJson(body): ValidatedJson<CreateSubscriptionRequest>) {
///     // `body` is guaranteed to pass validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

/// An extractor that deserializes the query string and validates it.
pub struct ValidatedQuery<T>(pub T);

/// Path parameters with a JSON error body on rejection.
pub struct ApiPath<T>(pub T);

/// Error type for validated extraction failures.
pub enum ValidationRejection {
    /// JSON parsing failed.
    JsonError(JsonRejection),
    /// Query string parsing failed.
    QueryError(QueryRejection),
    /// Path parameter parsing failed.
    PathError(PathRejection),
    /// Validation failed.
    ValidationError(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        match self {
            Self::JsonError(rejection) => {
                let body = ApiResponse::<()>::error(format!("Invalid JSON: {}", rejection.body_text()));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::QueryError(rejection) => {
                let body =
                    ApiResponse::<()>::error(format!("Invalid query: {}", rejection.body_text()));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::PathError(rejection) => {
                let body =
                    ApiResponse::<()>::error(format!("Invalid path: {}", rejection.body_text()));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::ValidationError(errors) => error_response(classify(&errors)).into_response(),
        }
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidationRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::QueryError)?;

        value
            .validate()
            .map_err(ValidationRejection::ValidationError)?;

        Ok(ValidatedQuery(value))
    }
}

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::PathError)?;
        Ok(ApiPath(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use validator::Validate;

    use crate::application::subscriptions::{TotalCostQuery, UpdateSubscriptionRequest};

    #[derive(Debug, Deserialize, Validate)]
    struct TestBody {
        #[validate(length(min = 1, max = 10))]
        name: String,
        #[validate(range(min = 0))]
        price: i64,
    }

    async fn handler(ValidatedJson(_body): ValidatedJson<TestBody>) -> &'static str {
        "ok"
    }

    async fn patch_handler(
        ValidatedJson(_body): ValidatedJson<UpdateSubscriptionRequest>,
    ) -> &'static str {
        "ok"
    }

    async fn query_handler(ValidatedQuery(_q): ValidatedQuery<TotalCostQuery>) -> &'static str {
        "ok"
    }

    async fn path_handler(ApiPath(_id): ApiPath<uuid::Uuid>) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/items/{id}", get(path_handler))
            .route("/test", post(handler))
            .route("/patch", post(patch_handler))
            .route("/query", get(query_handler))
    }

    async fn send(req: Request<Body>) -> axum::http::Response<Body> {
        use tower::Service;
        let mut svc = app().into_service();
        svc.call(req).await.unwrap()
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get_uri(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn error_text(resp: axum::http::Response<Body>) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn valid_body_returns_ok() {
        let resp = send(json_post("/test", serde_json::json!({"name": "Alice", "price": 30}))).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_json_returns_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/test")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let resp = send(req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validation_failure_returns_422() {
        let resp = send(json_post("/test", serde_json::json!({"name": "", "price": -1}))).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = error_text(resp).await;
        assert!(text.contains("name"));
        assert!(text.contains("price"));
    }

    #[tokio::test]
    async fn empty_patch_returns_422() {
        let resp = send(json_post("/patch", serde_json::json!({}))).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error_text(resp).await.contains("at least one field"));
    }

    #[tokio::test]
    async fn null_in_patch_returns_400() {
        let resp = send(json_post("/patch", serde_json::json!({"end_date": null}))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_is_parsed_and_validated() {
        let resp = send(get_uri("/query")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(get_uri("/query?service_name=net&start_date=01-2024")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(get_uri("/query?start_date=06-2024&end_date=05-2024")).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error_text(resp).await.contains("Invalid date range"));
    }

    #[tokio::test]
    async fn malformed_query_returns_400() {
        let resp = send(get_uri("/query?start_date=2024-01")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(get_uri("/query?user_id=not-a-uuid")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_path_returns_400_envelope() {
        let resp = send(get_uri(&format!("/items/{}", uuid::Uuid::new_v4()))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(get_uri("/items/not-a-uuid")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_text(resp).await.starts_with("Invalid path"));
    }
}
