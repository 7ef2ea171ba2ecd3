//! Payment provider seam.
//!
//! A real storefront submits payments to an external provider through
//! [`PaymentGateway`]; the shipped implementation stands in for that
//! provider with a fixed processing delay and an unconditional approval.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use rand::Rng;
use thiserror::Error;

use decal::checkout::{CardDetails, PaymentMethod};

/// Instrument details forwarded to the provider.
#[derive(Debug, Clone)]
pub enum PaymentInstrument {
    /// Captured card fields, forwarded unvalidated.
    Card(CardDetails),
    /// Redirect flow; the wallet provider collects its own details.
    ExternalWallet,
}

/// Successful provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Provider order reference, e.g. `STK-482910`.
    pub order_id: String,
}

/// Errors from the payment provider boundary.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The provider declined the payment.
    #[error("payment declined: {0}")]
    Declined(String),

    /// The provider could not be reached.
    #[error("payment provider unavailable")]
    Unavailable,
}

/// Boundary to a payment provider.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a payment for authorization.
    async fn submit_payment(
        &self,
        method: PaymentMethod,
        amount_minor: u64,
        instrument: &PaymentInstrument,
    ) -> Result<PaymentReceipt, PaymentError>;
}

/// Stand-in provider: waits out a fixed processing delay and approves
/// every payment with a fresh order reference.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentGateway {
    processing_delay: Duration,
}

impl SimulatedPaymentGateway {
    /// Gateway round-trip latency the simulation stands in for.
    pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(2_500);

    /// Create a provider with the given processing delay.
    #[must_use]
    pub fn new(processing_delay: Duration) -> Self {
        Self { processing_delay }
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROCESSING_DELAY)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn submit_payment(
        &self,
        method: PaymentMethod,
        amount_minor: u64,
        _instrument: &PaymentInstrument,
    ) -> Result<PaymentReceipt, PaymentError> {
        tokio::time::sleep(self.processing_delay).await;

        let order_id = format!("STK-{}", rand::thread_rng().gen_range(100_000..1_000_000));

        tracing::info!(%order_id, amount_minor, ?method, "simulated payment approved");

        Ok(PaymentReceipt { order_id })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn simulated_provider_always_approves() -> TestResult {
        let provider = SimulatedPaymentGateway::default();

        let receipt = provider
            .submit_payment(PaymentMethod::Card, 14_97, &PaymentInstrument::ExternalWallet)
            .await?;

        let reference = receipt
            .order_id
            .strip_prefix("STK-")
            .ok_or("order id should start with STK-")?;

        assert_eq!(reference.len(), 6);
        assert!(
            reference.chars().all(|c| c.is_ascii_digit()),
            "order reference should be numeric: {reference}"
        );

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_orders_get_distinct_references() -> TestResult {
        let provider = SimulatedPaymentGateway::new(Duration::from_millis(1));

        let first = provider
            .submit_payment(PaymentMethod::Card, 4_99, &PaymentInstrument::ExternalWallet)
            .await?;
        let second = provider
            .submit_payment(
                PaymentMethod::ExternalWallet,
                9_98,
                &PaymentInstrument::ExternalWallet,
            )
            .await?;

        // Six random digits collide rarely; a flake here would repeat on
        // one in a million runs.
        assert_ne!(first.order_id, second.order_id);

        Ok(())
    }
}
