//! Top-up initiation
//!
//! Opening a top-up records a `Pending` deposit transaction first and then
//! asks the payment gateway for a session, bounded by a timeout. A gateway
//! failure or timeout leaves the transaction pending; it is settled or failed
//! later by a webhook, never by this module.

use crate::core::clock::Clock;
use crate::core::deposit_store::DepositStore;
use crate::core::gateway::{PaymentGateway, SessionRequest};
use crate::core::traits::BalanceLedger;
use crate::types::{LedgerError, OrderId, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What the payer needs to complete a top-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopUpSession {
    pub order_id: OrderId,
    pub token: String,
    pub redirect_url: String,
}

/// Issues `ORDER-{user}-{n}` order ids
///
/// `n` is process-wide and strictly increasing, seeded from the Unix time at
/// construction, so ids stay unique across users and across restarts that
/// are at least a second apart.
#[derive(Debug)]
pub struct OrderIdGenerator {
    next: AtomicU64,
}

impl OrderIdGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    pub fn from_clock(clock: &dyn Clock) -> Self {
        let seed = u64::try_from(clock.now().timestamp()).unwrap_or_default();
        Self::new(seed)
    }

    pub fn next_for(&self, user: UserId) -> OrderId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        OrderId::new(format!("ORDER-{}-{}", user, n))
    }
}

pub struct TopUpService {
    deposits: Arc<DepositStore>,
    ledger: Arc<dyn BalanceLedger>,
    gateway: Arc<dyn PaymentGateway>,
    order_ids: OrderIdGenerator,
    timeout: Duration,
}

impl TopUpService {
    pub fn new(
        deposits: Arc<DepositStore>,
        ledger: Arc<dyn BalanceLedger>,
        gateway: Arc<dyn PaymentGateway>,
        order_ids: OrderIdGenerator,
        timeout: Duration,
    ) -> Self {
        Self {
            deposits,
            ledger,
            gateway,
            order_ids,
            timeout,
        }
    }

    /// Start a top-up with a freshly generated order id
    pub async fn initiate(&self, user: UserId, amount: u64) -> Result<TopUpSession, LedgerError> {
        self.validate(user, amount)?;
        let order_id = self.order_ids.next_for(user);
        self.open(user, amount, order_id).await
    }

    /// Start a top-up under a caller-chosen order id
    ///
    /// # Returns
    ///
    /// * `Ok(TopUpSession)` - Session opened, transaction pending
    /// * `Err(LedgerError::InvalidAmount)` - `amount` is zero
    /// * `Err(LedgerError::AccountNotFound)` - Unknown user
    /// * `Err(LedgerError::DuplicateOrder)` - Order id already used
    /// * `Err(LedgerError::GatewayUnavailable)` - Provider failed or timed
    ///   out; the transaction was recorded and stays pending
    pub async fn initiate_with_order_id(
        &self,
        user: UserId,
        amount: u64,
        order_id: OrderId,
    ) -> Result<TopUpSession, LedgerError> {
        self.validate(user, amount)?;
        self.open(user, amount, order_id).await
    }

    fn validate(&self, user: UserId, amount: u64) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::invalid_amount(amount, "top-up"));
        }
        self.ledger.account(user).map(|_| ())
    }

    async fn open(
        &self,
        user: UserId,
        amount: u64,
        order_id: OrderId,
    ) -> Result<TopUpSession, LedgerError> {
        self.deposits.insert_pending(user, order_id.clone(), amount)?;

        let request = SessionRequest {
            order_id: order_id.clone(),
            gross_amount: amount,
        };

        let session = match tokio::time::timeout(self.timeout, self.gateway.create_session(&request)).await {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => {
                warn!(order_id = %order_id, user, error = %err, "Gateway refused top-up, left pending");
                return Err(LedgerError::gateway_unavailable(err));
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(order_id = %order_id, user, timeout_ms, "Gateway timed out, left pending");
                return Err(LedgerError::gateway_unavailable(format!(
                    "timed out after {} ms",
                    timeout_ms
                )));
            }
        };

        self.deposits.attach_payment_ref(&order_id, session.token.clone())?;
        info!(order_id = %order_id, user, amount, "Top-up initiated");

        Ok(TopUpSession {
            order_id,
            token: session.token,
            redirect_url: session.redirect_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gateway::{SandboxGateway, SandboxMode};
    use crate::core::ledger::Ledger;
    use crate::types::DepositStatus;
    use rstest::rstest;

    fn service(mode: SandboxMode, timeout: Duration) -> (Arc<DepositStore>, Arc<Ledger>, TopUpService) {
        let deposits = Arc::new(DepositStore::new());
        let ledger = Arc::new(Ledger::new());
        ledger.open_account(1, 0).unwrap();
        let gateway = Arc::new(SandboxGateway::new("https://pay.example").with_mode(mode));
        let service = TopUpService::new(
            deposits.clone(),
            ledger.clone(),
            gateway,
            OrderIdGenerator::new(100),
            timeout,
        );
        (deposits, ledger, service)
    }

    #[test]
    fn test_order_id_generator_shape() {
        let ids = OrderIdGenerator::new(100);

        assert_eq!(ids.next_for(1), OrderId::from("ORDER-1-100"));
        assert_eq!(ids.next_for(2), OrderId::from("ORDER-2-101"));
    }

    #[tokio::test]
    async fn test_initiate_records_pending_with_payment_ref() {
        let (deposits, ledger, service) = service(SandboxMode::Approve, Duration::from_secs(1));

        let session = service.initiate(1, 20000).await.unwrap();

        assert_eq!(session.order_id, OrderId::from("ORDER-1-100"));
        assert!(session.redirect_url.ends_with(&session.token));
        let tx = deposits.get(&session.order_id).unwrap();
        assert_eq!(tx.status, DepositStatus::Pending);
        assert_eq!(tx.amount, 20000);
        assert_eq!(tx.payment_ref, Some(session.token));
        // Nothing is credited until the webhook settles it
        assert_eq!(ledger.get(1).unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_initiate_rejects_zero_amount_and_unknown_user() {
        let (deposits, _, service) = service(SandboxMode::Approve, Duration::from_secs(1));

        assert_eq!(
            service.initiate(1, 0).await,
            Err(LedgerError::invalid_amount(0, "top-up"))
        );
        assert_eq!(
            service.initiate(9, 100).await,
            Err(LedgerError::account_not_found(9))
        );
        assert!(deposits.all_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_pinned_order_id() {
        let (_, _, service) = service(SandboxMode::Approve, Duration::from_secs(1));
        let order = OrderId::from("ORDER-1-7");

        service.initiate_with_order_id(1, 100, order.clone()).await.unwrap();
        let result = service.initiate_with_order_id(1, 100, order.clone()).await;

        assert_eq!(result, Err(LedgerError::duplicate_order(&order)));
    }

    #[rstest]
    #[case::rejected(
        SandboxMode::Reject("merchant disabled".to_string()),
        "Payment gateway unavailable: provider rejected session: merchant disabled"
    )]
    #[case::unreachable(
        SandboxMode::Unreachable("connection refused".to_string()),
        "Payment gateway unavailable: provider unreachable: connection refused"
    )]
    #[tokio::test]
    async fn test_gateway_failure_leaves_pending(#[case] mode: SandboxMode, #[case] message: &str) {
        let (deposits, ledger, service) = service(mode, Duration::from_secs(1));

        let result = service.initiate(1, 5000).await;

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), message);
        let tx = deposits.get(&OrderId::from("ORDER-1-100")).unwrap();
        assert_eq!(tx.status, DepositStatus::Pending);
        assert!(tx.payment_ref.is_none());
        assert_eq!(ledger.get(1).unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_gateway_timeout_leaves_pending() {
        let (deposits, _, service) = service(
            SandboxMode::Stall(Duration::from_secs(5)),
            Duration::from_millis(20),
        );

        let result = service.initiate(1, 5000).await;

        assert_eq!(
            result,
            Err(LedgerError::gateway_unavailable("timed out after 20 ms"))
        );
        assert_eq!(
            deposits.get(&OrderId::from("ORDER-1-100")).unwrap().status,
            DepositStatus::Pending
        );
    }
}
