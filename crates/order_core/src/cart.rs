use std::sync::Arc;

use anyhow::Result;
use shared::domain::{CartLine, ItemId, MenuItem};
use tracing::debug;

use crate::OrderStateStore;

/// Client-local cart over an injected persistence seam.
///
/// The canonical representation is quantity-aggregated: one line per distinct
/// item id. The flat one-entry-per-instance projection some views render is
/// derived on demand and never persisted, so the two cannot drift.
///
/// Every mutation updates memory and then rewrites the persisted blob before
/// returning (write-through); a reader reacting to storage never observes a
/// torn state.
pub struct CartService {
    store: Arc<dyn OrderStateStore>,
    lines: Vec<CartLine>,
}

impl CartService {
    pub fn new(store: Arc<dyn OrderStateStore>) -> Self {
        Self {
            store,
            lines: Vec::new(),
        }
    }

    /// Replaces in-memory state with the persisted cart. A malformed or
    /// absent blob hydrates to an empty cart.
    pub async fn hydrate(&mut self) -> Result<()> {
        self.lines = self.store.load_cart().await?;
        debug!(lines = self.lines.len(), "cart hydrated");
        Ok(())
    }

    /// Increments the quantity of an existing line or inserts a new line with
    /// quantity 1. Always succeeds (modulo persistence errors).
    pub async fn add_item(&mut self, item: &MenuItem) -> Result<()> {
        match self.lines.iter_mut().find(|line| line.item.id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                item: item.clone(),
                quantity: 1,
            }),
        }
        self.persist().await
    }

    /// Decrements the line matching `id` by one; at quantity 1 the line is
    /// removed. Absent ids are a no-op.
    pub async fn decrement(&mut self, id: &ItemId) -> Result<()> {
        let Some(position) = self.lines.iter().position(|line| &line.item.id == id) else {
            return Ok(());
        };
        if self.lines[position].quantity <= 1 {
            self.lines.remove(position);
        } else {
            self.lines[position].quantity -= 1;
        }
        self.persist().await
    }

    /// Flat-projection removal: deletes the `index`-th individual item
    /// instance, which decrements the line owning that instance. Out-of-range
    /// indices are a no-op, never a panic.
    pub async fn remove_flat(&mut self, index: usize) -> Result<()> {
        let mut remaining = index;
        let mut owner = None;
        for (position, line) in self.lines.iter().enumerate() {
            let instances = line.quantity as usize;
            if remaining < instances {
                owner = Some(position);
                break;
            }
            remaining -= instances;
        }
        let Some(position) = owner else {
            return Ok(());
        };
        if self.lines[position].quantity <= 1 {
            self.lines.remove(position);
        } else {
            self.lines[position].quantity -= 1;
        }
        self.persist().await
    }

    /// Empties the cart unconditionally. Callers that treat this as
    /// destructive (the cart view) must confirm with the user first.
    pub async fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        self.persist().await
    }

    /// Sum of price x quantity over all lines. Recomputed on every call.
    pub fn total(&self) -> u64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// One entry per item instance, in line order. Derived, never stored.
    pub fn flat_lines(&self) -> Vec<MenuItem> {
        self.lines
            .iter()
            .flat_map(|line| std::iter::repeat(line.item.clone()).take(line.quantity as usize))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of item instances across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    async fn persist(&self) -> Result<()> {
        if self.lines.is_empty() {
            self.store.clear_cart().await
        } else {
            self.store.save_cart(&self.lines).await
        }
    }
}
