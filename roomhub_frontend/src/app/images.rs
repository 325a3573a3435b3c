use std::collections::{HashMap, HashSet, VecDeque};

use eframe::egui::{self, TextureHandle};

use super::state::LoadedImage;
use super::{tasks, RoomhubApp};
use crate::media::object_url::is_object_url;
use crate::media::ObjectUrlStore;

// Maximum number of concurrent image loads to avoid flooding the backend
const MAX_CONCURRENT_DOWNLOADS: usize = 4;

pub enum ImageSlot {
    Ready(TextureHandle),
    Loading,
    Failed(String),
}

/// Decoded textures keyed by URL, fed by a bounded download queue.
#[derive(Default)]
pub struct ImageCache {
    textures: HashMap<String, TextureHandle>,
    pending: HashMap<String, LoadedImage>,
    loading: HashSet<String>,
    errors: HashMap<String, String>,
    queue: VecDeque<String>,
    active: usize,
}

impl ImageCache {
    fn slot(&mut self, ctx: &egui::Context, url: &str) -> ImageSlot {
        if let Some(texture) = self.textures.get(url) {
            return ImageSlot::Ready(texture.clone());
        }
        if let Some(pending) = self.pending.remove(url) {
            let color = egui::ColorImage::from_rgba_unmultiplied(pending.size, &pending.pixels);
            let texture = ctx.load_texture(url, color, egui::TextureOptions::default());
            self.textures.insert(url.to_string(), texture.clone());
            return ImageSlot::Ready(texture);
        }
        if let Some(err) = self.errors.get(url) {
            return ImageSlot::Failed(err.clone());
        }
        if self.loading.insert(url.to_string()) {
            self.queue.push_back(url.to_string());
        }
        ImageSlot::Loading
    }

    fn next_download(&mut self) -> Option<String> {
        if self.active >= MAX_CONCURRENT_DOWNLOADS {
            return None;
        }
        let url = self.queue.pop_front()?;
        self.active += 1;
        Some(url)
    }

    pub fn is_busy(&self) -> bool {
        self.active > 0 || !self.queue.is_empty()
    }

    pub fn finish(&mut self, url: String, result: Result<LoadedImage, String>) {
        self.active = self.active.saturating_sub(1);
        self.loading.remove(&url);
        match result {
            Ok(image) => {
                self.pending.insert(url, image);
            }
            Err(err) => {
                log::warn!("failed to load image {url}: {err}");
                self.errors.insert(url, err);
            }
        }
    }

    /// Shows an image scaled into `max_size`, or a placeholder while it loads.
    pub fn show(&mut self, ui: &mut egui::Ui, url: &str, max_size: egui::Vec2) -> egui::Response {
        match self.slot(ui.ctx(), url) {
            ImageSlot::Ready(texture) => ui.add(
                egui::Image::new(&texture)
                    .max_size(max_size)
                    .maintain_aspect_ratio(true),
            ),
            ImageSlot::Loading => placeholder(ui, max_size, |ui| {
                ui.spinner();
            }),
            ImageSlot::Failed(err) => placeholder(ui, max_size, |ui| {
                ui.weak("🖼 unavailable");
            })
            .on_hover_text(err),
        }
    }

    /// Drops textures whose object URL has been revoked.
    pub fn prune_released(&mut self, store: &ObjectUrlStore) {
        let released = |url: &String| is_object_url(url) && store.resolve(url).is_none();
        self.textures.retain(|url, _| !released(url));
        self.pending.retain(|url, _| !released(url));
        self.errors.retain(|url, _| !released(url));
    }
}

impl RoomhubApp {
    pub(super) fn pump_image_queue(&mut self) {
        while let Some(url) = self.images.next_download() {
            tasks::load_image(
                self.ctx.api.clone(),
                self.ctx.object_urls.clone(),
                self.tx.clone(),
                url,
            );
        }
    }

    pub(super) fn show_image(
        &mut self,
        ui: &mut egui::Ui,
        url: &str,
        max_size: egui::Vec2,
    ) -> egui::Response {
        self.images.show(ui, url, max_size)
    }
}

pub(super) fn placeholder(
    ui: &mut egui::Ui,
    size: egui::Vec2,
    add_contents: impl FnOnce(&mut egui::Ui),
) -> egui::Response {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(4.0)
        .show(ui, |ui| {
            ui.set_min_size(size);
            ui.set_max_size(size);
            ui.centered_and_justified(add_contents);
        })
        .response
}
