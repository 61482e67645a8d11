//! Backend commands queued from UI to backend worker.
//!
//! `PaymentDelayElapsed` and `ConfirmationWindowElapsed` come from the view's
//! timer deadlines rather than button handlers, so every state transition
//! still runs on the single backend command loop.

use shared::domain::{ItemId, MenuItem};

pub enum BackendCommand {
    FetchMenu,
    AddItem {
        item: MenuItem,
    },
    DecrementItem {
        item_id: ItemId,
    },
    RemoveFlatLine {
        index: usize,
    },
    ClearCart,
    BeginPayment,
    PaymentDelayElapsed,
    ConfirmationWindowElapsed,
    FetchMenuImage {
        item_id: ItemId,
        url: String,
    },
}
