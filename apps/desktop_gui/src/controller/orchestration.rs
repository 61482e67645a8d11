//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::FetchMenu => "fetch_menu",
        BackendCommand::AddItem { .. } => "add_item",
        BackendCommand::DecrementItem { .. } => "decrement_item",
        BackendCommand::RemoveFlatLine { .. } => "remove_flat_line",
        BackendCommand::ClearCart => "clear_cart",
        BackendCommand::BeginPayment => "begin_payment",
        BackendCommand::PaymentDelayElapsed => "payment_delay_elapsed",
        BackendCommand::ConfirmationWindowElapsed => "confirmation_window_elapsed",
        BackendCommand::FetchMenuImage { .. } => "fetch_menu_image",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend command processor disconnected; restart the app".to_string();
        }
    }
}
