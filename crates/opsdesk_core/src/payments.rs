//! Client for the internal payments endpoint.
//!
//! # Responsibility
//! - Fetch pre-shaped payment records from `GET {base}/api/payments`.
//! - Accept both the bare-array and the `{"payments": [...]}` body shapes.

use crate::model::payment::PaymentRecord;
use log::{error, info};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

pub const PAYMENTS_ENDPOINT: &str = "/api/payments";

#[derive(Debug)]
pub enum PaymentsError {
    Http(reqwest::Error),
    Status { status: u16, url: String },
    Parse(serde_json::Error),
}

impl Display for PaymentsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "payments request failed: {err}"),
            Self::Status { status, url } => {
                write!(f, "payments endpoint `{url}` answered with status {status}")
            }
            Self::Parse(err) => write!(f, "payments response is malformed: {err}"),
        }
    }
}

impl Error for PaymentsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for PaymentsError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for PaymentsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Source of payment records.
pub trait PaymentsSource {
    fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, PaymentsError>;
}

impl PaymentsSource for Vec<PaymentRecord> {
    fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, PaymentsError> {
        Ok(self.clone())
    }
}

/// Blocking HTTP source.
pub struct HttpPaymentsSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpPaymentsSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PaymentsError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: payments_url(base_url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PaymentsSource for HttpPaymentsSource {
    fn fetch_payments(&self) -> Result<Vec<PaymentRecord>, PaymentsError> {
        let started_at = Instant::now();
        let response = self.client.get(&self.url).send().map_err(|err| {
            error!(
                "event=payments_fetch module=payments status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            PaymentsError::Http(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "event=payments_fetch module=payments status=error http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(PaymentsError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text()?;
        let records = parse_payments(&body)?;
        info!(
            "event=payments_fetch module=payments status=ok records={} duration_ms={}",
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaymentsBody {
    Bare(Vec<PaymentRecord>),
    Wrapped { payments: Vec<PaymentRecord> },
}

/// Parses a payments response body.
pub fn parse_payments(body: &str) -> Result<Vec<PaymentRecord>, PaymentsError> {
    let parsed: PaymentsBody = serde_json::from_str(body)?;
    Ok(match parsed {
        PaymentsBody::Bare(records) => records,
        PaymentsBody::Wrapped { payments } => payments,
    })
}

fn payments_url(base_url: &str) -> String {
    format!("{}{PAYMENTS_ENDPOINT}", base_url.trim_end_matches('/'))
}
