use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

mod backend_bridge;
mod config;
mod controller;

use backend_bridge::commands::BackendCommand;
use controller::events::{PreviewImage, UiEvent};
use controller::orchestration::dispatch_backend_command;
use crossbeam_channel::{bounded, Receiver, Sender};
use eframe::egui;
use order_core::{CONFIRMATION_DISPLAY_WINDOW, PAYMENT_SIMULATION_DELAY};
use shared::domain::{CartLine, ItemId, MenuItem};

const SOCIAL_FACEBOOK_URL: &str = "https://www.facebook.com/bestnepalifood";
const SOCIAL_INSTAGRAM_URL: &str = "https://www.instagram.com/bestnepalifood";
const SOCIAL_EMAIL_URL: &str = "mailto:hello@bestnepalifood.example";

// Drinks are not served by the content API; a fixed card is enough.
const DRINKS: &[(&str, &str, u64)] = &[
    ("drink-chiya", "Milk Chiya", 300),
    ("drink-lassi", "Sweet Lassi", 450),
    ("drink-butter-tea", "Butter Tea", 400),
    ("drink-gorkha", "Gorkha Beer", 600),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppView {
    Menu,
    Cart,
    Gallery,
    Drinks,
}

impl AppView {
    fn label(self) -> &'static str {
        match self {
            AppView::Menu => "Menu",
            AppView::Cart => "Cart",
            AppView::Gallery => "Gallery",
            AppView::Drinks => "Drinks",
        }
    }
}

enum MenuImageState {
    Loading,
    Ready {
        image: PreviewImage,
        texture: Option<egui::TextureHandle>,
    },
    Failed,
}

fn format_price(amount: u64) -> String {
    format!("\u{a5}{amount}")
}

fn scaled_size(width: usize, height: usize, max_dimension: f32) -> egui::Vec2 {
    let (width, height) = (width.max(1) as f32, height.max(1) as f32);
    let scale = (max_dimension / width.max(height)).min(1.0);
    egui::vec2(width * scale, height * scale)
}

struct DeskApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    view: AppView,
    menu: Vec<MenuItem>,
    menu_note: Option<String>,

    // Mirrors of the backend cart; never mutated locally.
    cart_lines: Vec<CartLine>,
    flat_cart: Vec<MenuItem>,
    cart_total: u64,

    paying: bool,
    completed_amount: Option<u64>,

    // View-owned timers: dropped with the view, which is the only
    // cancellation path either of them has.
    payment_deadline: Option<Instant>,
    confirmation_deadline: Option<Instant>,

    images: HashMap<ItemId, MenuImageState>,
    confirm_clear_open: bool,
    status: String,
}

impl DeskApp {
    fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            view: AppView::Menu,
            menu: Vec::new(),
            menu_note: None,
            cart_lines: Vec::new(),
            flat_cart: Vec::new(),
            cart_total: 0,
            paying: false,
            completed_amount: None,
            payment_deadline: None,
            confirmation_deadline: None,
            images: HashMap::new(),
            confirm_clear_open: false,
            status: "Loading menu...".to_string(),
        };
        // One-shot menu read on view initialization.
        app.dispatch(BackendCommand::FetchMenu);
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::MenuLoaded(items) => {
                    self.menu = items;
                    self.menu_note = None;
                    self.status = format!("Menu loaded ({} items)", self.menu.len());
                }
                UiEvent::MenuUnavailable => {
                    self.menu_note = Some("The menu could not be loaded.".to_string());
                    self.status = "Menu is unavailable".to_string();
                }
                UiEvent::CartUpdated(cart) => {
                    self.cart_lines = cart.lines;
                    self.flat_cart = cart.flat;
                    self.cart_total = cart.total;
                }
                UiEvent::StateHydrated {
                    cart,
                    completed_amount,
                } => {
                    self.cart_lines = cart.lines;
                    self.flat_cart = cart.flat;
                    self.cart_total = cart.total;
                    self.completed_amount = completed_amount;
                    if completed_amount.is_some() {
                        // Restart the full display window after a reload.
                        self.confirmation_deadline =
                            Some(Instant::now() + CONFIRMATION_DISPLAY_WINDOW);
                        self.status = "Welcome back! Your last order went through.".to_string();
                    }
                }
                UiEvent::PaymentStarted => {
                    self.paying = true;
                    self.payment_deadline = Some(Instant::now() + PAYMENT_SIMULATION_DELAY);
                    self.status = "Processing payment...".to_string();
                }
                UiEvent::PaymentRejected(reason) => {
                    self.paying = false;
                    self.status = format!("Payment refused: {reason}");
                }
                UiEvent::PaymentCompleted { amount } => {
                    self.paying = false;
                    self.completed_amount = Some(amount);
                    self.confirmation_deadline = Some(Instant::now() + CONFIRMATION_DISPLAY_WINDOW);
                    self.status = format!("Payment of {} complete", format_price(amount));
                    // Send the user back to the menu so the confirmation
                    // message is in view.
                    self.view = AppView::Menu;
                }
                UiEvent::ConfirmationDismissed => {
                    self.completed_amount = None;
                    self.confirmation_deadline = None;
                }
                UiEvent::MenuImageLoaded { item_id, image } => {
                    self.images.insert(
                        item_id,
                        MenuImageState::Ready {
                            image,
                            texture: None,
                        },
                    );
                }
                UiEvent::MenuImageFailed { item_id } => {
                    self.images.insert(item_id, MenuImageState::Failed);
                }
                UiEvent::BackendFailure(message) => {
                    self.status = format!("Error: {message}");
                }
            }
        }
    }

    fn request_image(&mut self, item: &MenuItem) {
        let Some(image) = &item.image else {
            return;
        };
        if self.images.contains_key(&item.id) {
            return;
        }
        self.images.insert(item.id.clone(), MenuImageState::Loading);
        let cmd = BackendCommand::FetchMenuImage {
            item_id: item.id.clone(),
            url: image.url.clone(),
        };
        self.dispatch(cmd);
    }

    fn render_image_thumb(&mut self, ui: &mut egui::Ui, item_id: &ItemId, max_dimension: f32) {
        match self.images.get_mut(item_id) {
            Some(MenuImageState::Ready { image, texture }) => {
                if texture.is_none() {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    *texture = Some(ui.ctx().load_texture(
                        format!("menu-image:{}", item_id.as_str()),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
                if let Some(texture) = texture.as_ref() {
                    let size = scaled_size(image.width, image.height, max_dimension);
                    ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                }
            }
            Some(MenuImageState::Loading) => {
                ui.spinner();
            }
            Some(MenuImageState::Failed) => {
                ui.weak("image unavailable");
            }
            None => {}
        }
    }

    fn show_top_nav(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_nav").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Best Nepali Food");
                ui.separator();
                for view in [
                    AppView::Menu,
                    AppView::Cart,
                    AppView::Gallery,
                    AppView::Drinks,
                ] {
                    let label = if view == AppView::Cart {
                        format!("{} ({})", view.label(), self.flat_cart.len())
                    } else {
                        view.label().to_string()
                    };
                    if ui.selectable_label(self.view == view, label).clicked() {
                        self.view = view;
                    }
                }
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small("Status:");
                ui.small(egui::RichText::new(&self.status).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Email").clicked() {
                        self.open_link(SOCIAL_EMAIL_URL);
                    }
                    if ui.small_button("Instagram").clicked() {
                        self.open_link(SOCIAL_INSTAGRAM_URL);
                    }
                    if ui.small_button("Facebook").clicked() {
                        self.open_link(SOCIAL_FACEBOOK_URL);
                    }
                });
            });
        });
    }

    fn show_menu_view(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("order_status_panel")
            .default_width(300.0)
            .show(ctx, |ui| self.render_order_status(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Menu");
            ui.add_space(4.0);
            if self.menu.is_empty() {
                let note = self
                    .menu_note
                    .clone()
                    .unwrap_or_else(|| "No menu items.".to_string());
                ui.label(note);
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for item in self.menu.clone() {
                    self.request_image(&item);
                    ui.horizontal(|ui| {
                        self.render_image_thumb(ui, &item.id, 96.0);
                        ui.vertical(|ui| {
                            ui.strong(format!("{} \u{2014} {}", item.name, format_price(item.price)));
                            if let Some(comment) = &item.comment {
                                ui.weak(comment);
                            }
                            if ui.button("Add to cart").clicked() {
                                self.dispatch(BackendCommand::AddItem { item: item.clone() });
                            }
                        });
                    });
                    ui.separator();
                }
            });
        });
    }

    fn render_order_status(&mut self, ui: &mut egui::Ui) {
        ui.heading("Order status");
        ui.add_space(4.0);

        if let Some(amount) = self.completed_amount {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.strong("Thank you for your order!");
                ui.label(format!("Paid: {}", format_price(amount)));
                ui.label("We look forward to serving you again.");
            });
            return;
        }

        if self.cart_lines.is_empty() {
            ui.label("No orders yet.");
            return;
        }

        for line in self.cart_lines.clone() {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{} \u{2014} {} \u{d7} {}",
                    line.item.name,
                    format_price(line.item.price),
                    line.quantity
                ));
                if ui.small_button("Remove one").clicked() {
                    self.dispatch(BackendCommand::DecrementItem {
                        item_id: line.item.id.clone(),
                    });
                }
            });
        }

        ui.separator();
        ui.strong(format!("Total: {}", format_price(self.cart_total)));
        let pay_label = if self.paying { "Paying..." } else { "Pay" };
        if ui
            .add_enabled(!self.paying, egui::Button::new(pay_label))
            .clicked()
        {
            self.dispatch(BackendCommand::BeginPayment);
        }
    }

    fn show_cart_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Cart");
            ui.add_space(4.0);

            if self.flat_cart.is_empty() {
                ui.label("Your cart is empty.");
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for (index, item) in self.flat_cart.clone().into_iter().enumerate() {
                    ui.horizontal(|ui| {
                        self.render_image_thumb(ui, &item.id, 60.0);
                        ui.vertical(|ui| {
                            ui.label(&item.name);
                            ui.weak(format_price(item.price));
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("\u{2715} Remove").clicked() {
                                self.dispatch(BackendCommand::RemoveFlatLine { index });
                            }
                        });
                    });
                    ui.separator();
                }
            });

            ui.strong(format!("Total: {}", format_price(self.cart_total)));
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("Cancel all").clicked() {
                    self.confirm_clear_open = true;
                }
                let pay_label = if self.paying { "Paying..." } else { "Pay" };
                if ui
                    .add_enabled(!self.paying, egui::Button::new(pay_label))
                    .clicked()
                {
                    self.dispatch(BackendCommand::BeginPayment);
                }
            });
        });
    }

    fn show_gallery_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Gallery");
            ui.add_space(4.0);

            let items: Vec<MenuItem> = self
                .menu
                .iter()
                .filter(|item| item.image.is_some())
                .cloned()
                .collect();
            if items.is_empty() {
                ui.label("No photos yet.");
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for item in items {
                        self.request_image(&item);
                        ui.vertical(|ui| {
                            self.render_image_thumb(ui, &item.id, 200.0);
                            ui.small(&item.name);
                        });
                    }
                });
            });
        });
    }

    fn show_drinks_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Drinks");
            ui.add_space(4.0);

            for (id, name, price) in DRINKS {
                ui.horizontal(|ui| {
                    ui.strong(format!("{} \u{2014} {}", name, format_price(*price)));
                    if ui.button("Add to cart").clicked() {
                        self.dispatch(BackendCommand::AddItem {
                            item: MenuItem {
                                id: (*id).into(),
                                name: (*name).to_string(),
                                price: *price,
                                comment: None,
                                image: None,
                            },
                        });
                    }
                });
                ui.separator();
            }
        });
    }

    fn show_clear_confirmation(&mut self, ctx: &egui::Context) {
        if !self.confirm_clear_open {
            return;
        }

        let mut window_open = true;
        let mut clear_requested = false;
        let mut keep_requested = false;
        egui::Window::new("Cancel all orders?")
            .open(&mut window_open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Really cancel every order in the cart? This cannot be undone.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel everything").clicked() {
                        clear_requested = true;
                    }
                    if ui.button("Keep my order").clicked() {
                        keep_requested = true;
                    }
                });
            });

        if clear_requested {
            self.dispatch(BackendCommand::ClearCart);
            self.status = "Cart cleared".to_string();
        }
        if clear_requested || keep_requested || !window_open {
            self.confirm_clear_open = false;
        }
    }

    fn open_link(&mut self, target: &str) {
        #[cfg(target_os = "windows")]
        let result = std::process::Command::new("cmd")
            .args(["/C", "start", "", target])
            .spawn();

        #[cfg(target_os = "macos")]
        let result = std::process::Command::new("open").arg(target).spawn();

        #[cfg(all(unix, not(target_os = "macos")))]
        let result = std::process::Command::new("xdg-open").arg(target).spawn();

        if let Err(err) = result {
            self.status = format!("Failed to open link: {err}");
        }
    }

    fn tick_deadlines(&mut self) {
        let now = Instant::now();
        if self.payment_deadline.is_some_and(|deadline| now >= deadline) {
            self.payment_deadline = None;
            self.dispatch(BackendCommand::PaymentDelayElapsed);
        }
        if self
            .confirmation_deadline
            .is_some_and(|deadline| now >= deadline)
        {
            self.confirmation_deadline = None;
            self.dispatch(BackendCommand::ConfirmationWindowElapsed);
        }
    }
}

impl eframe::App for DeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.tick_deadlines();

        self.show_top_nav(ctx);
        self.show_status_bar(ctx);
        match self.view {
            AppView::Menu => self.show_menu_view(ctx),
            AppView::Cart => self.show_cart_view(ctx),
            AppView::Gallery => self.show_gallery_view(ctx),
            AppView::Drinks => self.show_drinks_view(ctx),
        }
        self.show_clear_confirmation(ctx);

        // Backend events arrive between input frames; keep polling.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = config::load_settings();
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::spawn(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Best Nepali Food")
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Best Nepali Food",
        options,
        Box::new(|_cc| Ok(Box::new(DeskApp::new(cmd_tx, ui_rx)))),
    )
}
