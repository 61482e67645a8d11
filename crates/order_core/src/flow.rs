use std::time::Duration;

use thiserror::Error;

/// How long the simulated payment "gateway" takes before reporting success.
pub const PAYMENT_SIMULATION_DELAY: Duration = Duration::from_millis(1000);

/// How long the post-payment confirmation message stays on screen before the
/// flow returns to `Idle` and the persisted receipt is cleared.
pub const CONFIRMATION_DISPLAY_WINDOW: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPhase {
    #[default]
    Idle,
    Paying {
        amount: u64,
    },
    Completed {
        amount: u64,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("a payment is already in progress")]
    PaymentInProgress,
}

/// Linear payment state machine: `Idle -> Paying -> Completed -> Idle`.
///
/// The flow itself is pure; the two timed transitions (payment delay,
/// confirmation window) are driven by whoever owns the timers. That keeps
/// every transition unit-testable without clocks.
#[derive(Debug, Default)]
pub struct OrderFlow {
    phase: OrderPhase,
}

impl OrderFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> OrderPhase {
        self.phase
    }

    pub fn is_paying(&self) -> bool {
        matches!(self.phase, OrderPhase::Paying { .. })
    }

    /// Captures the cart total and enters `Paying`. Refuses on an empty cart
    /// and while a payment is already in flight (double-submission guard).
    pub fn begin_payment(&mut self, total: u64, cart_is_empty: bool) -> Result<u64, PaymentError> {
        if self.is_paying() {
            return Err(PaymentError::PaymentInProgress);
        }
        if cart_is_empty {
            return Err(PaymentError::EmptyCart);
        }
        self.phase = OrderPhase::Paying { amount: total };
        Ok(total)
    }

    /// `Paying -> Completed`. Returns the captured amount, or `None` when no
    /// payment was in flight (stale timer after teardown).
    pub fn complete_payment(&mut self) -> Option<u64> {
        match self.phase {
            OrderPhase::Paying { amount } => {
                self.phase = OrderPhase::Completed { amount };
                Some(amount)
            }
            _ => None,
        }
    }

    /// `Completed -> Idle` once the display window elapses. Returns whether a
    /// confirmation was actually dismissed.
    pub fn dismiss_confirmation(&mut self) -> bool {
        match self.phase {
            OrderPhase::Completed { .. } => {
                self.phase = OrderPhase::Idle;
                true
            }
            _ => false,
        }
    }

    /// Startup recovery: a persisted receipt puts the flow straight into
    /// `Completed` so the confirmation message survives a restart.
    pub fn restore_completed(&mut self, amount: u64) {
        self.phase = OrderPhase::Completed { amount };
    }
}
