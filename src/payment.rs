//! Hosted-checkout payments.
//!
//! A payment is created on the API, which answers with a checkout URL on the
//! payment gateway. The user completes the payment in a browser while the
//! flow polls the API for the transaction's status.
//!
//! ```text
//! Idle -> Initiated -> Pending -> Confirmed
//!                  \          \-> Failed
//!                   \-> Failed
//! ```

use crate::api::{self, ApiClient};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub amount: f64,
    pub description: String,
    pub email: String,
    pub tx_ref: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentState {
    Idle,
    /// Creation request sent, no answer yet.
    Initiated { tx_ref: String },
    /// Waiting for the user to finish at the gateway.
    Pending {
        tx_ref: String,
        checkout_url: String,
        started: Instant,
        last_poll: Option<Instant>,
    },
    Confirmed { tx_ref: String },
    Failed { reason: String },
}

/// Transaction reference unique enough for one client: millisecond clock
/// plus six random digits.
pub fn new_tx_ref() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("tx-{millis}-{suffix:06}")
}

/// First non-blank string under `keys`, looking in `data` before the top
/// level so an envelope status never masks the payment's own.
fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    let lookup = |v: &'a Value| {
        keys.iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
    };
    value.get("data").and_then(lookup).or_else(|| lookup(value))
}

/// Finds the gateway URL in a payment creation response.
pub fn checkout_url(response: &Value) -> Option<String> {
    field(response, &["checkout_url", "checkoutUrl"]).map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Paid,
    Declined,
    Waiting,
}

fn verdict(response: &Value) -> Verdict {
    let status = field(response, &["status", "paymentStatus"])
        .unwrap_or_default()
        .to_ascii_lowercase();
    match status.as_str() {
        "success" | "successful" | "completed" | "paid" => Verdict::Paid,
        "failed" | "cancelled" | "canceled" => Verdict::Declined,
        _ => Verdict::Waiting,
    }
}

pub struct PaymentFlow {
    state: PaymentState,
    poll_interval: Duration,
    timeout: Duration,
}

impl PaymentFlow {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            state: PaymentState::Idle,
            poll_interval,
            timeout,
        }
    }

    pub fn state(&self) -> &PaymentState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = PaymentState::Idle;
    }

    /// Creates the payment and moves to `Pending` when the API hands back a
    /// checkout URL. Anything else ends in `Failed`.
    pub fn initiate(&mut self, api: &ApiClient, request: PaymentRequest) -> &PaymentState {
        self.initiate_at(api, request, Instant::now())
    }

    fn initiate_at(
        &mut self,
        api: &ApiClient,
        request: PaymentRequest,
        now: Instant,
    ) -> &PaymentState {
        let tx_ref = request.tx_ref.clone();
        self.state = PaymentState::Initiated {
            tx_ref: tx_ref.clone(),
        };
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => {
                self.state = PaymentState::Failed {
                    reason: e.to_string(),
                };
                return &self.state;
            }
        };
        self.state = match api.post("/payments", body) {
            Ok(response) => match checkout_url(&response) {
                Some(url) => {
                    info!(%tx_ref, "payment created, waiting for checkout");
                    PaymentState::Pending {
                        tx_ref,
                        checkout_url: url,
                        started: now,
                        last_poll: None,
                    }
                }
                None => {
                    warn!(%tx_ref, "payment response had no checkout url");
                    PaymentState::Failed {
                        reason: "Payment gateway did not return a checkout link".to_string(),
                    }
                }
            },
            Err(e) => PaymentState::Failed {
                reason: e.to_string(),
            },
        };
        &self.state
    }

    /// Polls the verification endpoint if a poll is due. Called on every
    /// tick of the payment screen.
    pub fn poll(&mut self, api: &ApiClient) -> &PaymentState {
        self.poll_at(api, Instant::now())
    }

    fn poll_at(&mut self, api: &ApiClient, now: Instant) -> &PaymentState {
        let PaymentState::Pending {
            tx_ref,
            started,
            last_poll,
            ..
        } = &mut self.state
        else {
            return &self.state;
        };

        if now.saturating_duration_since(*started) >= self.timeout {
            warn!(%tx_ref, "payment not confirmed before timeout");
            self.state = PaymentState::Failed {
                reason: "Payment was not confirmed in time".to_string(),
            };
            return &self.state;
        }
        if let Some(last) = last_poll {
            if now.saturating_duration_since(*last) < self.poll_interval {
                return &self.state;
            }
        }
        *last_poll = Some(now);

        let tx_ref = tx_ref.clone();
        let path = format!("/payments/verify/{}", api::encode_component(&tx_ref));
        match api.get(&path) {
            Ok(response) => match verdict(&response) {
                Verdict::Paid => {
                    info!(%tx_ref, "payment confirmed");
                    self.state = PaymentState::Confirmed { tx_ref };
                }
                Verdict::Declined => {
                    info!(%tx_ref, "payment declined");
                    self.state = PaymentState::Failed {
                        reason: "Payment was declined or cancelled".to_string(),
                    };
                }
                Verdict::Waiting => debug!(%tx_ref, "payment still pending"),
            },
            Err(e) => warn!(%tx_ref, error = %e, "payment verification failed, will retry"),
        }
        &self.state
    }
}
