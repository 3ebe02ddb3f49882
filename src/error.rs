// Error taxonomy: config and registration errors are fatal, delivery errors
// are contained within a single cycle.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("delivery failed: {0}")]
    DeliveryFailed(#[from] DeliveryError),
}

/// Why a single delivery attempt failed. Consumed by the retry combinator in
/// `backend`; never escalates past a cycle.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("unparseable response body: {0}")]
    BadBody(String),

    #[error("backend reported failure: {0}")]
    Rejected(String),
}
