use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::{PaymentPolicy, ProcessorPolicy};
use crate::dtos::{PaymentIntentResult, PaymentRequest};
use crate::error::PaymentError;
use crate::money::format_dollars;
use crate::processor::{create_with_policy, NewPaymentIntent, PaymentProcessor};

/// Longest value Stripe accepts for a metadata entry.
pub const MAX_METADATA_VALUE_CHARS: usize = 500;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

const DESCRIPTION_PREFIX: &str = "Event Coverage Package";

pub struct PaymentIntentService {
    processor: Arc<dyn PaymentProcessor>,
    payment: PaymentPolicy,
    policy: ProcessorPolicy,
}

impl PaymentIntentService {
    pub fn new(
        processor: Arc<dyn PaymentProcessor>,
        payment: PaymentPolicy,
        policy: ProcessorPolicy,
    ) -> Self {
        Self {
            processor,
            payment,
            policy,
        }
    }

    /// Validates the request and opens a payment intent for it, returning
    /// only the client secret the browser needs to finish paying.
    pub async fn create_payment_intent(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentIntentResult, PaymentError> {
        validate_amount(request.amount, &self.payment)?;

        let receipt_email = clean_text(request.email.as_deref(), MAX_METADATA_VALUE_CHARS);
        let intent = NewPaymentIntent {
            amount: request.amount,
            currency: self.payment.currency,
            metadata: build_metadata(&request),
            receipt_email: receipt_email.clone(),
            description: build_description(&request),
        };

        match create_with_policy(self.processor.as_ref(), &intent, &self.policy).await {
            Ok(created) => {
                info!(
                    "Payment intent created: {} for {}",
                    created.id,
                    receipt_email.as_deref().unwrap_or("<no email>")
                );
                Ok(PaymentIntentResult {
                    client_secret: created.client_secret,
                })
            }
            Err(err) => {
                error!("Error creating payment intent: {err:?}");
                Err(PaymentError::from(err))
            }
        }
    }
}

pub fn validate_amount(amount: i64, policy: &PaymentPolicy) -> Result<(), PaymentError> {
    if amount < policy.min_amount {
        return Err(PaymentError::AmountTooLow);
    }
    if amount > policy.max_amount {
        return Err(PaymentError::AmountTooHigh);
    }
    Ok(())
}

/// Metadata attached to the payment intent so the booking can be matched up
/// from the Stripe dashboard. Fields the form left blank are omitted.
pub fn build_metadata(request: &PaymentRequest) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            metadata.insert(key.to_string(), value);
        }
    };
    let text = |value: &Option<String>| clean_text(value.as_deref(), MAX_METADATA_VALUE_CHARS);

    put("customer_name", text(&request.name));
    put("customer_email", text(&request.email));
    put("customer_phone", text(&request.phone));
    put("event_title", text(&request.event_title));
    put("venue_name", text(&request.venue_name));
    put("event_date", text(&request.event_date));
    put("event_location", text(&request.location));

    let start = text(&request.start_time);
    let end = text(&request.end_time);
    if start.is_some() || end.is_some() {
        let times = format!(
            "{} - {}",
            start.unwrap_or_default(),
            end.unwrap_or_default()
        );
        put("event_times", clean_text(Some(times.as_str()), MAX_METADATA_VALUE_CHARS));
    }

    put(
        "notes",
        Some(text(&request.notes).unwrap_or_else(|| "None".to_string())),
    );
    put("package_total", request.total_package_price.map(format_dollars));
    put("payment_amount", Some(format_dollars(request.amount)));
    put("remaining_balance", request.remaining_balance.map(format_dollars));

    metadata
}

/// Human-readable line shown on the Stripe receipt, e.g.
/// `Event Coverage Package - Spring Gala at Grand Hall`.
pub fn build_description(request: &PaymentRequest) -> String {
    let mut description = DESCRIPTION_PREFIX.to_string();
    if let Some(title) = clean_text(request.event_title.as_deref(), MAX_METADATA_VALUE_CHARS) {
        description.push_str(" - ");
        description.push_str(&title);
    }
    if let Some(venue) = clean_text(request.venue_name.as_deref(), MAX_METADATA_VALUE_CHARS) {
        description.push_str(" at ");
        description.push_str(&venue);
    }
    truncate_chars(&description, MAX_DESCRIPTION_CHARS).to_string()
}

/// Trims surrounding whitespace and caps the length. Blank input yields `None`.
fn clean_text(value: Option<&str>, max_chars: usize) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(truncate_chars(trimmed, max_chars).trim_end().to_string())
}

fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}
