//! Backend-to-UI events for the desktop controller.

use shared::domain::{CartLine, ItemId, MenuItem};

/// Decoded RGBA pixels for a downloaded menu image, ready to become an egui
/// texture on the UI thread.
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Both projections of the cart plus the recomputed total, mirrored to the
/// views after every mutation. Views hold no authoritative cart state.
#[derive(Clone)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub flat: Vec<MenuItem>,
    pub total: u64,
}

pub enum UiEvent {
    Info(String),
    MenuLoaded(Vec<MenuItem>),
    MenuUnavailable,
    CartUpdated(CartSnapshot),
    StateHydrated {
        cart: CartSnapshot,
        completed_amount: Option<u64>,
    },
    PaymentStarted,
    PaymentRejected(String),
    PaymentCompleted {
        amount: u64,
    },
    ConfirmationDismissed,
    MenuImageLoaded {
        item_id: ItemId,
        image: PreviewImage,
    },
    MenuImageFailed {
        item_id: ItemId,
    },
    BackendFailure(String),
}
