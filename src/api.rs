// CNPJ Registry - REST API
// Router and handlers for the lookup server (bin/server.rs)

use crate::error::ResolveError;
use crate::record::CompanyRecord;
use crate::registry_id::RegistryId;
use crate::resolver::Resolver;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub registry_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub registry_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub registry_id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Maps resolver failures onto HTTP statuses: bad input is the caller's
/// fault (400), a failed lookup is upstream's (502)
pub struct ApiError(ResolveError);

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ResolveError::RejectedInput { .. } => StatusCode::BAD_REQUEST,
            ResolveError::ProviderFailure(_) => StatusCode::BAD_GATEWAY,
            ResolveError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/companies/resolve - Resolve a registry id (store first, then provider)
async fn resolve_company(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<CompanyRecord>>, ApiError> {
    let record = state.resolver.resolve(&request.registry_id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// GET /api/companies - All stored companies
async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CompanyRecord>>>, ApiError> {
    let records = state.resolver.list().await?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/validate?registry_id=... - Check digits only, no lookup
async fn validate_registry_id(Query(query): Query<ValidateQuery>) -> impl IntoResponse {
    let response = match RegistryId::parse(&query.registry_id) {
        Ok(id) => ValidateResponse {
            registry_id: query.registry_id.clone(),
            valid: true,
            digits: Some(id.digits().to_string()),
            formatted: Some(id.formatted()),
            reason: None,
        },
        Err(reason) => ValidateResponse {
            registry_id: query.registry_id.clone(),
            valid: false,
            digits: None,
            formatted: None,
            reason: Some(reason.to_string()),
        },
    };

    Json(ApiResponse::ok(response))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/companies", get(list_companies))
        .route("/companies/resolve", post(resolve_company))
        .route("/validate", get(validate_registry_id))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::LookupProvider;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StaticProvider {
        fail: bool,
    }

    #[async_trait]
    impl LookupProvider for StaticProvider {
        async fn lookup(&self, digits: &str) -> Result<CompanyRecord, ProviderError> {
            if self.fail {
                return Err(ProviderError::Status {
                    status: 500,
                    body: "upstream down".to_string(),
                });
            }
            let mut record = CompanyRecord::new(digits);
            record.name = "ACME".to_string();
            Ok(record)
        }
    }

    fn app(fail: bool) -> Router {
        let resolver = Resolver::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StaticProvider { fail }),
        );
        router(AppState { resolver })
    }

    fn resolve_request(registry_id: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/companies/resolve")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "registry_id": registry_id }).to_string(),
            ))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(false)
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"], "OK");
    }

    #[tokio::test]
    async fn test_resolve_ok() {
        let response = app(false)
            .oneshot(resolve_request("11.222.333/0001-81"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["registry_id"], "11.222.333/0001-81");
        assert_eq!(json["data"]["name"], "ACME");
    }

    #[tokio::test]
    async fn test_resolve_invalid_is_bad_request() {
        let response = app(false)
            .oneshot(resolve_request("11.222.333/0001-00"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("invalid registry id"));
    }

    #[tokio::test]
    async fn test_resolve_provider_failure_is_bad_gateway() {
        let response = app(true)
            .oneshot(resolve_request("11.222.333/0001-81"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_list_after_resolve() {
        let app = app(false);

        app.clone()
            .oneshot(resolve_request("11.444.777/0001-61"))
            .await
            .unwrap();

        let response = app
            .oneshot(Request::get("/api/companies").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["registry_id"], "11.444.777/0001-61");
    }

    #[tokio::test]
    async fn test_validate_endpoint() {
        let response = app(false)
            .oneshot(
                Request::get("/api/validate?registry_id=11.222.333%2F0001-81")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["data"]["valid"], true);
        assert_eq!(json["data"]["digits"], "11222333000181");

        let response = app(false)
            .oneshot(
                Request::get("/api/validate?registry_id=11222333000181")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["data"]["valid"], false);
        assert!(json["data"]["reason"].is_string());
    }
}
