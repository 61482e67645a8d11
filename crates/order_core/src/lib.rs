use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{CartLine, ItemId, MenuItem, OrderReceipt};
use tracing::info;

pub mod cart;
pub mod flow;

pub use cart::CartService;
pub use flow::{
    OrderFlow, OrderPhase, PaymentError, CONFIRMATION_DISPLAY_WINDOW, PAYMENT_SIMULATION_DELAY,
};

/// Persistence seam for cart and receipt state. Implemented by the SQLite
/// blob store in the `storage` crate and by in-memory doubles in tests.
#[async_trait]
pub trait OrderStateStore: Send + Sync {
    async fn load_cart(&self) -> Result<Vec<CartLine>>;
    async fn save_cart(&self, lines: &[CartLine]) -> Result<()>;
    async fn clear_cart(&self) -> Result<()>;
    async fn save_receipt(&self, receipt: OrderReceipt) -> Result<()>;
    async fn load_receipt(&self) -> Result<Option<OrderReceipt>>;
    async fn clear_receipt(&self) -> Result<()>;
}

/// Cart Store plus Order Flow behind one surface, sharing one state store.
/// Views dispatch every mutation here; none of them touch storage keys
/// directly.
pub struct OrderSession {
    cart: CartService,
    flow: OrderFlow,
    store: Arc<dyn OrderStateStore>,
}

impl OrderSession {
    pub fn new(store: Arc<dyn OrderStateStore>) -> Self {
        Self {
            cart: CartService::new(store.clone()),
            flow: OrderFlow::new(),
            store,
        }
    }

    /// Startup recovery: loads the persisted cart, and if a receipt is still
    /// present (the app restarted mid confirmation window) re-enters
    /// `Completed` so the message is shown again for a full window.
    pub async fn hydrate(&mut self) -> Result<()> {
        self.cart.hydrate().await?;
        if let Some(receipt) = self.store.load_receipt().await? {
            self.flow.restore_completed(receipt.amount);
            info!(amount = receipt.amount, "restored completed order");
        }
        Ok(())
    }

    pub fn cart(&self) -> &CartService {
        &self.cart
    }

    pub fn phase(&self) -> OrderPhase {
        self.flow.phase()
    }

    pub async fn add_item(&mut self, item: &MenuItem) -> Result<()> {
        self.cart.add_item(item).await
    }

    pub async fn decrement(&mut self, id: &ItemId) -> Result<()> {
        self.cart.decrement(id).await
    }

    pub async fn remove_flat(&mut self, index: usize) -> Result<()> {
        self.cart.remove_flat(index).await
    }

    pub async fn clear_cart(&mut self) -> Result<()> {
        self.cart.clear().await
    }

    /// Guarded `Idle -> Paying` transition capturing the current total.
    /// The caller owns the simulation timer; on elapse it must call
    /// [`OrderSession::complete_payment`].
    pub fn begin_payment(&mut self) -> Result<u64, PaymentError> {
        self.flow
            .begin_payment(self.cart.total(), self.cart.is_empty())
    }

    /// `Paying -> Completed`: persists the receipt, then clears the cart.
    /// Returns the paid amount, or `None` when no payment was in flight.
    pub async fn complete_payment(&mut self) -> Result<Option<u64>> {
        let Some(amount) = self.flow.complete_payment() else {
            return Ok(None);
        };
        self.store.save_receipt(OrderReceipt { amount }).await?;
        self.cart.clear().await?;
        info!(amount, "payment completed");
        Ok(Some(amount))
    }

    /// `Completed -> Idle` once the display window elapses; clears the
    /// persisted receipt. Returns whether a confirmation was dismissed.
    pub async fn dismiss_confirmation(&mut self) -> Result<bool> {
        if !self.flow.dismiss_confirmation() {
            return Ok(false);
        }
        self.store.clear_receipt().await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
