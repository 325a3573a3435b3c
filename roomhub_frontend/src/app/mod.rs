use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::Result;
use eframe::egui::{self, Context};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::feed::{RoomFeed, SentinelWatch};
use crate::media::{FfmpegThumbnailer, ObjectUrlStore, ThumbnailExtractor};
use crate::models::RoomFilters;
use crate::session::{AuthSession, LoadingController};

mod images;
mod messages;
mod spawners;
mod state;
mod tasks;
mod ui;

use images::ImageCache;
use messages::AppMessage;
use state::{DashboardState, FilterForm, SettingsState, ViewState};

/// Everything the views and workers share: configuration, the HTTP client
/// and the process-wide registries.
#[derive(Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub session: AuthSession,
    pub loading: LoadingController,
    pub object_urls: ObjectUrlStore,
    pub thumbnails: Arc<dyn ThumbnailExtractor>,
}

impl AppContext {
    pub fn from_config(config: ClientConfig, session: AuthSession) -> Result<Self> {
        let api = ApiClient::new(
            config.api_url.clone(),
            session.clone(),
            config.request_timeout,
        )?;
        let object_urls = ObjectUrlStore::new();
        let thumbnails: Arc<dyn ThumbnailExtractor> =
            Arc::new(FfmpegThumbnailer::new(object_urls.clone()));
        Ok(Self {
            config,
            api,
            session,
            loading: LoadingController::new(),
            object_urls,
            thumbnails,
        })
    }
}

pub struct RoomhubApp {
    ctx: AppContext,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
    view: ViewState,
    view_epoch: u64,
    feed: RoomFeed,
    filter_form: FilterForm,
    sentinel: SentinelWatch,
    dashboard: DashboardState,
    settings: SettingsState,
    images: ImageCache,
    info_banner: Option<String>,
    form_counter: u64,
}

impl RoomhubApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, ctx: AppContext) -> Self {
        let (tx, rx) = mpsc::channel();
        let settings = SettingsState {
            api_url: ctx.api.base_url().to_string(),
            token: ctx.session.token().unwrap_or_default(),
            error: None,
        };
        let feed = RoomFeed::new(RoomFilters::default(), ctx.config.page_size);

        let mut app = Self {
            ctx,
            tx,
            rx,
            view: ViewState::Feed,
            view_epoch: 0,
            feed,
            filter_form: FilterForm::default(),
            sentinel: SentinelWatch::default(),
            dashboard: DashboardState::default(),
            settings,
            images: ImageCache::default(),
            info_banner: None,
            form_counter: 0,
        };
        app.spawn_next_page();
        app
    }

    /// Switches the visible view. Leaving a listing form drops its draft and
    /// with it every preview URL the form created.
    pub(super) fn navigate(&mut self, view: ViewState) {
        self.view = view;
        self.view_epoch += 1;
    }

    fn render_top_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Roomhub");
                ui.separator();
                if ui.selectable_label(matches!(self.view, ViewState::Feed), "Rooms").clicked() {
                    self.navigate(ViewState::Feed);
                }
                if ui
                    .selectable_label(matches!(self.view, ViewState::Dashboard), "My listings")
                    .clicked()
                {
                    self.navigate(ViewState::Dashboard);
                    if !self.dashboard.loaded {
                        self.spawn_load_my_rooms();
                    }
                }
                if ui.button("List a room").clicked() {
                    self.open_new_listing();
                }
                if ui
                    .selectable_label(matches!(self.view, ViewState::Settings), "Settings")
                    .clicked()
                {
                    self.navigate(ViewState::Settings);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.ctx.session.is_signed_in() {
                        ui.weak("signed in");
                    } else {
                        ui.weak("browsing anonymously");
                    }
                    if self.ctx.loading.is_busy() {
                        ui.spinner();
                    }
                });
            });

            if let Some(message) = self.info_banner.clone() {
                let mut dismiss = false;
                egui::Frame::group(ui.style())
                    .fill(ui.visuals().extreme_bg_color)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(message.as_str());
                            if ui.button("Dismiss").clicked() {
                                dismiss = true;
                            }
                        });
                    });
                if dismiss {
                    self.info_banner = None;
                }
            }
        });
    }
}

impl eframe::App for RoomhubApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        messages::process_messages(self);
        self.images.prune_released(&self.ctx.object_urls);

        self.render_top_bar(ctx);

        // Views that own state are taken out of `self` while they render so
        // they can call back into the app; navigation during the frame wins.
        let epoch = self.view_epoch;
        let mut view = std::mem::replace(&mut self.view, ViewState::Feed);
        egui::CentralPanel::default().show(ctx, |ui| match &mut view {
            ViewState::Feed => self.render_feed(ui),
            ViewState::Room(state) => self.render_room(ui, state),
            ViewState::Dashboard => self.render_dashboard(ui),
            ViewState::Form(form) => self.render_listing_form(ui, form),
            ViewState::Settings => self.render_settings(ui),
        });
        if self.view_epoch == epoch {
            self.view = view;
        }

        self.pump_image_queue();

        // Workers report back through the channel; keep polling while any run.
        if self.ctx.loading.is_busy() || self.images.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
