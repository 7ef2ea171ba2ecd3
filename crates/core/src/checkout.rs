//! Checkout
//!
//! The checkout session drives a cart through ordered phases with
//! explicit, result-returning transitions. Invalid transitions leave the
//! session untouched, and every method takes `&mut self`, so at most one
//! transition is in flight per session.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroize;

use crate::cart::Cart;

/// Phase of an in-progress purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Browsing the cart contents.
    #[default]
    Cart,
    /// Capturing the payment instrument.
    PaymentDetails,
    /// Awaiting the payment provider.
    Processing,
    /// Payment approved; confirmation on display.
    Success,
    /// Payment declined by the provider.
    Failed,
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutPhase::Cart => "cart",
            CheckoutPhase::PaymentDetails => "payment-details",
            CheckoutPhase::Processing => "processing",
            CheckoutPhase::Success => "success",
            CheckoutPhase::Failed => "failed",
        };

        f.write_str(name)
    }
}

/// Payment instrument chosen for the purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Card payment captured in-page.
    #[default]
    Card,
    /// Redirect to an external wallet provider.
    ExternalWallet,
}

/// Captured card fields.
///
/// Not validated here: format, expiry and check-digit rules belong to a
/// real payment provider behind the payment seam. The fields are never
/// kept beyond the session; the buffers are zeroized on drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardDetails {
    /// Cardholder name as printed.
    pub holder: String,
    /// Primary account number.
    pub number: String,
    /// Expiry in `MM/YY` form.
    pub expiry: String,
    /// Card verification code.
    pub cvc: String,
}

impl Drop for CardDetails {
    fn drop(&mut self) {
        self.holder.zeroize();
        self.number.zeroize();
        self.expiry.zeroize();
        self.cvc.zeroize();
    }
}

/// Errors from checkout transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Payment cannot start while the cart is empty.
    #[error("cannot proceed to payment with an empty cart")]
    EmptyCart,

    /// The requested transition is not available from the current phase.
    #[error("invalid checkout transition from the {0} phase")]
    InvalidTransition(CheckoutPhase),
}

/// Transient state tracking progress through the payment phases.
#[derive(Debug, Default)]
pub struct CheckoutSession {
    phase: CheckoutPhase,
    method: PaymentMethod,
    card: Option<CardDetails>,
}

impl CheckoutSession {
    /// Create a session in the initial `Cart` phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Chosen payment instrument.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Captured card fields, if any.
    #[must_use]
    pub fn card(&self) -> Option<&CardDetails> {
        self.card.as_ref()
    }

    /// Choose the payment instrument.
    pub fn select_method(&mut self, method: PaymentMethod) {
        self.method = method;
    }

    /// Capture card fields for a card payment.
    pub fn set_card(&mut self, card: CardDetails) {
        self.card = Some(card);
    }

    /// Move from `Cart` to `PaymentDetails`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when the cart has no items, or
    /// [`CheckoutError::InvalidTransition`] outside the `Cart` phase.
    /// Neither the session nor the cart changes on error.
    pub fn begin_payment(&mut self, cart: &Cart) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::Cart {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.phase = CheckoutPhase::PaymentDetails;

        Ok(())
    }

    /// Return from `PaymentDetails` to `Cart` without submitting.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside
    /// `PaymentDetails`.
    pub fn back_to_cart(&mut self) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::PaymentDetails {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        self.phase = CheckoutPhase::Cart;

        Ok(())
    }

    /// Submit the captured instrument: `PaymentDetails` to `Processing`.
    ///
    /// The captured fields are forwarded as-is; validation is the payment
    /// provider's concern.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside
    /// `PaymentDetails`.
    pub fn submit_payment(&mut self) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::PaymentDetails {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        self.phase = CheckoutPhase::Processing;

        Ok(())
    }

    /// Provider approved: `Processing` to `Success`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside `Processing`.
    pub fn complete(&mut self) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::Processing {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        self.phase = CheckoutPhase::Success;

        Ok(())
    }

    /// Provider declined: `Processing` to `Failed`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside `Processing`.
    pub fn fail(&mut self) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::Processing {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        self.phase = CheckoutPhase::Failed;

        Ok(())
    }

    /// Return to the instrument form after a decline.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside `Failed`.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::Failed {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        self.phase = CheckoutPhase::PaymentDetails;

        Ok(())
    }

    /// Finish the cycle: `Success` back to `Cart`.
    ///
    /// Empties the cart, discards the captured instrument (zeroized on
    /// drop) and resets the method to its default.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside `Success`.
    pub fn reset(&mut self, cart: &mut Cart) -> Result<(), CheckoutError> {
        if self.phase != CheckoutPhase::Success {
            return Err(CheckoutError::InvalidTransition(self.phase));
        }

        cart.clear();
        self.card = None;
        self.method = PaymentMethod::default();
        self.phase = CheckoutPhase::Cart;

        Ok(())
    }
}
