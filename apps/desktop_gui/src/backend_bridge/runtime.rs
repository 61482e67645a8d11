//! Backend worker: owns the tokio runtime, the blob store, the menu client,
//! and the order session, and turns queued commands into UI events.
//!
//! The command loop is the single place where state mutates; each command
//! runs to completion before the next one starts, so persisted storage is
//! never touched by two in-flight operations. The loop ends when the UI
//! drops its command sender (view teardown).

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use image::GenericImageView;
use menu_client::MenuClient;
use order_core::{OrderPhase, OrderSession, PaymentError};
use storage::Storage;
use tracing::{debug, error, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::{CartSnapshot, PreviewImage, UiEvent};

const MENU_IMAGE_MAX_DIMENSION: f32 = 240.0;

pub fn spawn(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::BackendFailure(format!(
                    "failed to build backend runtime: {err}"
                )));
                error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(settings, cmd_rx, ui_tx));
    });
}

async fn run(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let storage = match Storage::new(&settings.database_url).await {
        Ok(storage) => storage,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::BackendFailure(format!(
                "failed to open local storage: {err}"
            )));
            error!("failed to open local storage: {err}");
            return;
        }
    };
    let menu = MenuClient::new(settings.menu_api_url, settings.menu_api_key);
    let mut session = OrderSession::new(Arc::new(storage));

    // Startup recovery: rehydrate the persisted cart, and if the app went
    // down mid confirmation window, surface the completed order again. The
    // view restarts the display timer from the hydration event.
    match session.hydrate().await {
        Ok(()) => {
            let completed_amount = match session.phase() {
                OrderPhase::Completed { amount } => Some(amount),
                _ => None,
            };
            let _ = ui_tx.try_send(UiEvent::StateHydrated {
                cart: snapshot(&session),
                completed_amount,
            });
        }
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::BackendFailure(format!(
                "failed to restore persisted state: {err}"
            )));
            error!("failed to restore persisted state: {err}");
        }
    }

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::FetchMenu => match menu.fetch_menu().await {
                Ok(items) => {
                    let _ = ui_tx.try_send(UiEvent::MenuLoaded(items));
                }
                Err(err) => {
                    // No retry; the menu view shows its empty state.
                    error!("menu fetch failed: {err}");
                    let _ = ui_tx.try_send(UiEvent::MenuUnavailable);
                }
            },
            BackendCommand::AddItem { item } => {
                let result = session.add_item(&item).await;
                report_cart_mutation(&ui_tx, &session, result);
            }
            BackendCommand::DecrementItem { item_id } => {
                let result = session.decrement(&item_id).await;
                report_cart_mutation(&ui_tx, &session, result);
            }
            BackendCommand::RemoveFlatLine { index } => {
                let result = session.remove_flat(index).await;
                report_cart_mutation(&ui_tx, &session, result);
            }
            BackendCommand::ClearCart => {
                let result = session.clear_cart().await;
                report_cart_mutation(&ui_tx, &session, result);
            }
            BackendCommand::BeginPayment => match session.begin_payment() {
                Ok(amount) => {
                    debug!(amount, "payment simulation started");
                    let _ = ui_tx.try_send(UiEvent::PaymentStarted);
                }
                Err(PaymentError::PaymentInProgress) => {
                    // Double submission; the first payment keeps running.
                    debug!("ignored pay request while payment in progress");
                }
                Err(err @ PaymentError::EmptyCart) => {
                    let _ = ui_tx.try_send(UiEvent::PaymentRejected(err.to_string()));
                }
            },
            BackendCommand::PaymentDelayElapsed => match session.complete_payment().await {
                Ok(Some(amount)) => {
                    let _ = ui_tx.try_send(UiEvent::PaymentCompleted { amount });
                    let _ = ui_tx.try_send(UiEvent::CartUpdated(snapshot(&session)));
                }
                Ok(None) => {}
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::BackendFailure(format!(
                        "failed to finalize payment: {err}"
                    )));
                    error!("failed to finalize payment: {err}");
                }
            },
            BackendCommand::ConfirmationWindowElapsed => {
                match session.dismiss_confirmation().await {
                    Ok(true) => {
                        let _ = ui_tx.try_send(UiEvent::ConfirmationDismissed);
                    }
                    Ok(false) => {}
                    Err(err) => {
                        let _ = ui_tx.try_send(UiEvent::BackendFailure(format!(
                            "failed to clear confirmation: {err}"
                        )));
                        error!("failed to clear confirmation: {err}");
                    }
                }
            }
            BackendCommand::FetchMenuImage { item_id, url } => {
                match menu.fetch_image_bytes(&url).await {
                    Ok(bytes) => match decode_preview(&bytes) {
                        Some(image) => {
                            let _ = ui_tx.try_send(UiEvent::MenuImageLoaded { item_id, image });
                        }
                        None => {
                            warn!(item = item_id.as_str(), "failed to decode menu image");
                            let _ = ui_tx.try_send(UiEvent::MenuImageFailed { item_id });
                        }
                    },
                    Err(err) => {
                        warn!(item = item_id.as_str(), "failed to download menu image: {err}");
                        let _ = ui_tx.try_send(UiEvent::MenuImageFailed { item_id });
                    }
                }
            }
        }
    }
}

fn report_cart_mutation(
    ui_tx: &Sender<UiEvent>,
    session: &OrderSession,
    result: anyhow::Result<()>,
) {
    match result {
        Ok(()) => {
            let _ = ui_tx.try_send(UiEvent::CartUpdated(snapshot(session)));
        }
        Err(err) => {
            error!("cart mutation failed: {err}");
            let _ = ui_tx.try_send(UiEvent::BackendFailure(format!("cart update failed: {err}")));
        }
    }
}

fn snapshot(session: &OrderSession) -> CartSnapshot {
    CartSnapshot {
        lines: session.cart().lines().to_vec(),
        flat: session.cart().flat_lines(),
        total: session.cart().total(),
    }
}

fn decode_preview(bytes: &[u8]) -> Option<PreviewImage> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let (orig_w, orig_h) = decoded.dimensions();
    let scale = (MENU_IMAGE_MAX_DIMENSION / (orig_w.max(orig_h) as f32)).min(1.0);
    let resized = if scale < 1.0 {
        decoded.resize(
            (orig_w as f32 * scale).max(1.0) as u32,
            (orig_h as f32 * scale).max(1.0) as u32,
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };
    let rgba = resized.to_rgba8();
    Some(PreviewImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
    })
}
