//! HTTP surface for the inference pipeline
//!
//! A single `POST /predict` route plus a health probe. The pipeline is
//! shared read-only across handlers; the only mutation a request can cause is
//! the encoder-domain extension, which the registry guards itself.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::InferenceError;
use crate::pipeline::{InferencePipeline, RawAttributes};

/// Origin allowed by default (local frontend)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Body of `POST /predict`; keys keep the dataset's column names
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionRequest {
    #[serde(rename = "Preferred_Cuisine")]
    pub preferred_cuisine: String,
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Physical_Activity_Level")]
    pub physical_activity_level: String,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Disease_Type")]
    pub disease_type: String,
}

impl From<PredictionRequest> for RawAttributes {
    fn from(req: PredictionRequest) -> Self {
        RawAttributes::new()
            .with("Preferred_Cuisine", req.preferred_cuisine)
            .with("Age", req.age)
            .with("Physical_Activity_Level", req.physical_activity_level)
            .with("BMI", req.bmi)
            .with("Disease_Type", req.disease_type)
    }
}

/// Successful prediction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionResponse {
    pub recommended_diet: String,
}

/// Error body, `{"detail": "..."}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Service health and model shape
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub features: Vec<String>,
    pub classes: Vec<String>,
}

/// Failure of a single prediction request; rendered as HTTP 500
pub struct ApiError(InferenceError);

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "prediction failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<InferencePipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<InferencePipeline>) -> Self {
        Self { pipeline }
    }
}

async fn predict_diet(
    State(state): State<AppState>,
    Json(req): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let raw = RawAttributes::from(req);
    let recommended_diet = state.pipeline.predict(&raw)?;
    tracing::debug!(diet = %recommended_diet, "prediction served");
    Ok(Json(PredictionResponse { recommended_diet }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        features: state.pipeline.feature_subset().names().to_vec(),
        classes: state.pipeline.classifier().classes().to_vec(),
    })
}

/// CORS policy: listed origins, credentials allowed, methods and headers mirrored
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the application router
pub fn router(pipeline: Arc<InferencePipeline>, origins: &[String]) -> Result<Router> {
    Ok(Router::new()
        .route("/predict", post(predict_diet))
        .route("/health", get(health))
        .layer(cors_layer(origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(pipeline)))
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "Preferred_Cuisine": "Mexican",
        "Age": 38,
        "Physical_Activity_Level": "Active",
        "BMI": 24.5,
        "Disease_Type": "None"
    }"#;

    #[test]
    fn test_request_reads_dataset_column_keys() {
        let req: PredictionRequest = serde_json::from_str(BODY).unwrap();

        assert_eq!(req.preferred_cuisine, "Mexican");
        assert_eq!(req.age, 38);
        assert_eq!(req.physical_activity_level, "Active");
        assert_eq!(req.bmi, 24.5);
        assert_eq!(req.disease_type, "None");
    }

    #[test]
    fn test_request_converts_to_column_named_attributes() {
        let req: PredictionRequest = serde_json::from_str(BODY).unwrap();
        let expected = RawAttributes::new()
            .with("Preferred_Cuisine", "Mexican")
            .with("Age", 38i64)
            .with("Physical_Activity_Level", "Active")
            .with("BMI", 24.5)
            .with("Disease_Type", "None");

        assert_eq!(RawAttributes::from(req), expected);
    }

    #[test]
    fn test_request_serializes_back_to_column_keys() {
        let req: PredictionRequest = serde_json::from_str(BODY).unwrap();
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["Preferred_Cuisine"], "Mexican");
        assert_eq!(json["BMI"], 24.5);
        assert!(json.get("preferred_cuisine").is_none());
    }

    #[test]
    fn test_snake_case_keys_are_rejected() {
        let body = r#"{"preferred_cuisine": "Mexican", "age": 38,
            "physical_activity_level": "Active", "bmi": 24.5, "disease_type": "None"}"#;
        assert!(serde_json::from_str::<PredictionRequest>(body).is_err());
    }
}
