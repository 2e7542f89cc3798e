use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::dtos::{HealthStatus, PaymentIntentResult, PaymentRequest};
use crate::error::{PaymentError, ValidatedJson};
use crate::handler::PaymentIntentService;

/// Largest request body the form may post.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub const LANDING_PAGE: &str = "EventCoverage.html";
pub const THANK_YOU_PAGE: &str = "thank-you.html";

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentIntentService>,
}

impl AppState {
    pub fn new(payments: PaymentIntentService) -> Self {
        Self {
            payments: Arc::new(payments),
        }
    }
}

pub fn create_router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/health", get(health))
        .route_service("/", ServeFile::new(public_dir.join(LANDING_PAGE)))
        .route_service(
            "/thank-you.html",
            ServeFile::new(public_dir.join(THANK_YOU_PAGE)),
        )
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn create_payment_intent(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PaymentRequest>,
) -> Result<Json<PaymentIntentResult>, PaymentError> {
    state.payments.create_payment_intent(request).await.map(Json)
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}
