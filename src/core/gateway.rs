//! Payment gateway boundary
//!
//! The ledger only consumes the provider's request/response contract: open a
//! payment session for an order id and amount, get back a token and a URL the
//! payer is redirected to. Confirmation arrives later through the webhook.

use crate::types::OrderId;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default sandbox redirect base
pub const DEFAULT_REDIRECT_BASE: &str = "https://app.sandbox.payments.local/snap/v2/vtweb";

/// Request to open a payment session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub order_id: OrderId,
    /// Amount the payer is charged, in the smallest currency unit
    pub gross_amount: u64,
}

/// Session opened by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub token: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Provider answered but refused the request
    #[error("provider rejected session: {0}")]
    Rejected(String),

    /// Provider could not be reached
    #[error("provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment session for one order
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, GatewayError>;
}

/// How the sandbox gateway answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxMode {
    /// Open sessions immediately
    Approve,
    /// Refuse every request with the given message
    Reject(String),
    /// Fail every request as if the provider could not be reached
    Unreachable(String),
    /// Wait before answering, to exercise caller timeouts
    Stall(Duration),
}

/// In-process stand-in for the provider
///
/// Issues ULID tokens and redirect URLs of the form `{base}/{token}`.
#[derive(Debug, Clone)]
pub struct SandboxGateway {
    redirect_base: String,
    mode: SandboxMode,
}

impl SandboxGateway {
    pub fn new(redirect_base: impl Into<String>) -> Self {
        Self {
            redirect_base: redirect_base.into(),
            mode: SandboxMode::Approve,
        }
    }

    pub fn with_mode(mut self, mode: SandboxMode) -> Self {
        self.mode = mode;
        self
    }

    fn open_session(&self) -> PaymentSession {
        let token = ulid::Ulid::new().to_string();
        let redirect_url = format!("{}/{}", self.redirect_base.trim_end_matches('/'), token);
        PaymentSession {
            token,
            redirect_url,
        }
    }
}

impl Default for SandboxGateway {
    fn default() -> Self {
        Self::new(DEFAULT_REDIRECT_BASE)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, GatewayError> {
        match &self.mode {
            SandboxMode::Approve => {}
            SandboxMode::Reject(message) => return Err(GatewayError::Rejected(message.clone())),
            SandboxMode::Unreachable(message) => {
                return Err(GatewayError::Transport(message.clone()))
            }
            SandboxMode::Stall(delay) => tokio::time::sleep(*delay).await,
        }

        let session = self.open_session();
        debug!(order_id = %request.order_id, amount = request.gross_amount, token = %session.token, "Sandbox session opened");
        Ok(session)
    }
}
