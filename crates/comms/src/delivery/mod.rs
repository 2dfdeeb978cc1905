//! External delivery channels (email, SMS, in-app).

pub mod email;
pub mod inapp;
pub mod sms;

/// Error type for channel delivery failures.
///
/// The display form of these errors is what ends up (truncated) in a failed
/// record's `error_message`, so each variant carries the provider detail.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// SMTP transport, address, or message-build failure.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// SMS gateway transport failure or non-success provider response.
    #[error("SMS gateway error: {0}")]
    Gateway(String),

    /// The in-app notification could not be stored for the staff recipient.
    #[error("Notification sink error: {0}")]
    Sink(String),
}
