use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use event_coverage_payments::config::{PaymentPolicy, ProcessorPolicy};
use event_coverage_payments::handler::PaymentIntentService;
use event_coverage_payments::processor::{
    CreatedPaymentIntent, NewPaymentIntent, PaymentProcessor, ProcessorError,
};
use event_coverage_payments::routes::{create_router, AppState};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Stands in for Stripe: records every intent it is asked to create.
#[derive(Default)]
pub struct FakeProcessor {
    pub calls: Mutex<Vec<NewPaymentIntent>>,
    pub failure: Mutex<Option<ProcessorError>>,
}

impl FakeProcessor {
    pub fn failing(err: ProcessorError) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(err)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> Result<CreatedPaymentIntent, ProcessorError> {
        self.calls.lock().unwrap().push(intent.clone());
        if let Some(err) = self.failure.lock().unwrap().take() {
            return Err(err);
        }
        Ok(CreatedPaymentIntent {
            id: "pi_3Nx".to_string(),
            client_secret: "pi_3Nx_secret_Qw9".to_string(),
        })
    }
}

pub fn app(processor: Arc<FakeProcessor>, public_dir: &Path) -> Router {
    let service = PaymentIntentService::new(
        processor,
        PaymentPolicy::default(),
        ProcessorPolicy::default(),
    );
    create_router(AppState::new(service), public_dir)
}

pub async fn post_json(app: Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
