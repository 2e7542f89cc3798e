/// Body of `POST /create-payment-intent`, as submitted by the booking form.
///
/// Only `amount` is required. Everything else is free-form and ends up in the
/// payment intent metadata.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_title: Option<String>,
    pub venue_name: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub total_package_price: Option<i64>,
    pub remaining_balance: Option<i64>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResult {
    pub client_secret: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "OK",
            message: "Server is running",
        }
    }
}
