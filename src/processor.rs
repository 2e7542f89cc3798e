use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stripe::{Client, CreatePaymentIntent, Currency, PaymentIntent, StripeError};
use thiserror::Error;
use tracing::warn;

use crate::config::ProcessorPolicy;

/// Everything the processor needs to open a payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentIntent {
    pub amount: i64,
    pub currency: Currency,
    pub metadata: HashMap<String, String>,
    pub receipt_email: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("payment processor rejected the request: {0}")]
    Rejected(String),
    #[error("could not reach the payment processor: {0}")]
    Transport(String),
    #[error("payment processor did not answer within {0:?}")]
    Timeout(Duration),
    #[error("payment intent {0} came back without a client secret")]
    MissingClientSecret(String),
}

impl ProcessorError {
    /// Whether a second attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProcessorError::Transport(_) | ProcessorError::Timeout(_))
    }
}

impl From<StripeError> for ProcessorError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::ClientError(_) | StripeError::Timeout => {
                ProcessorError::Transport(err.to_string())
            }
            other => ProcessorError::Rejected(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> Result<CreatedPaymentIntent, ProcessorError>;
}

pub struct StripeProcessor {
    client: Arc<Client>,
}

impl StripeProcessor {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> Result<CreatedPaymentIntent, ProcessorError> {
        let mut params = CreatePaymentIntent::new(intent.amount, intent.currency);
        params.metadata = Some(intent.metadata.clone());
        params.receipt_email = intent.receipt_email.as_deref();
        params.description = Some(intent.description.as_str());

        let created = PaymentIntent::create(&self.client, params).await?;
        let id = created.id.to_string();
        match created.client_secret {
            Some(client_secret) => Ok(CreatedPaymentIntent { id, client_secret }),
            None => Err(ProcessorError::MissingClientSecret(id)),
        }
    }
}

/// Runs one creation call under `policy`: every attempt is bounded by the
/// timeout, and only transient failures are retried.
pub async fn create_with_policy(
    processor: &dyn PaymentProcessor,
    intent: &NewPaymentIntent,
    policy: &ProcessorPolicy,
) -> Result<CreatedPaymentIntent, ProcessorError> {
    let mut attempt = 0;
    loop {
        let result =
            match tokio::time::timeout(policy.timeout, processor.create_payment_intent(intent))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProcessorError::Timeout(policy.timeout)),
            };

        match result {
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(attempt, "retrying payment intent creation after: {err}");
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails with the queued errors first, then succeeds.
    struct Scripted {
        failures: Mutex<Vec<ProcessorError>>,
        calls: AtomicU32,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn new(failures: Vec<ProcessorError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: AtomicU32::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl PaymentProcessor for Scripted {
        async fn create_payment_intent(
            &self,
            _intent: &NewPaymentIntent,
        ) -> Result<CreatedPaymentIntent, ProcessorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(CreatedPaymentIntent {
                id: "pi_123".to_string(),
                client_secret: "pi_123_secret_abc".to_string(),
            })
        }
    }

    fn intent() -> NewPaymentIntent {
        NewPaymentIntent {
            amount: 5000,
            currency: Currency::USD,
            metadata: HashMap::new(),
            receipt_email: None,
            description: "Event Coverage Package".to_string(),
        }
    }

    fn policy(max_retries: u32) -> ProcessorPolicy {
        ProcessorPolicy {
            timeout: Duration::from_millis(50),
            max_retries,
        }
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let processor = Scripted::new(vec![ProcessorError::Transport("reset".into())]);
        let err = create_with_policy(&processor, &intent(), &ProcessorPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::Transport(_)));
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failure_once() {
        let processor = Scripted::new(vec![ProcessorError::Transport("reset".into())]);
        let created = create_with_policy(&processor, &intent(), &policy(1))
            .await
            .unwrap();
        assert_eq!(created.client_secret, "pi_123_secret_abc");
        assert_eq!(processor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn never_retries_rejections() {
        let processor = Scripted::new(vec![ProcessorError::Rejected("card_declined".into())]);
        let err = create_with_policy(&processor, &intent(), &policy(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::Rejected(_)));
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_processor_times_out() {
        let mut processor = Scripted::new(vec![]);
        processor.delay = Some(Duration::from_secs(60));
        let err = create_with_policy(&processor, &intent(), &policy(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(err.is_transient());
    }
}
