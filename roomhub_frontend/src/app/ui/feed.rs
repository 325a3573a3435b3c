use eframe::egui::{self, Color32, RichText};

use crate::api::ApiClient;
use crate::feed::FeedEnd;
use crate::models::{RoomSummary, CAMPUSES, PRICE_BRACKETS, ROOM_TYPES};

use super::super::images::{placeholder, ImageCache};
use super::super::RoomhubApp;
use super::{format_price, format_timestamp};

const CARD_THUMB: egui::Vec2 = egui::vec2(160.0, 110.0);

impl RoomhubApp {
    pub(crate) fn render_feed(&mut self, ui: &mut egui::Ui) {
        self.render_filter_bar(ui);
        ui.separator();

        let sentinel = self.feed.sentinel_index();
        let generation = self.feed.generation();
        let mut room_to_open: Option<String> = None;
        let mut load_more = false;
        let mut reload = false;

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let api = &self.ctx.api;
                for (index, room) in self.feed.items().iter().enumerate() {
                    let card = egui::Frame::group(ui.style())
                        .fill(ui.visuals().extreme_bg_color)
                        .inner_margin(egui::vec2(12.0, 8.0))
                        .show(ui, |ui| room_card(ui, &mut self.images, api, room));
                    if card.inner {
                        room_to_open = Some(room.id.clone());
                    }
                    if sentinel == Some(index) {
                        let visible = ui.is_rect_visible(card.response.rect);
                        if self.sentinel.observe(generation, index, visible) {
                            load_more = true;
                        }
                    }
                }

                ui.add_space(8.0);
                if self.feed.is_loading() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading rooms…");
                    });
                }
                match self.feed.end() {
                    Some(FeedEnd::Failed(err)) => {
                        ui.colored_label(
                            Color32::LIGHT_RED,
                            format!("Could not load rooms: {err}"),
                        );
                        reload = ui.button("Reload").clicked();
                    }
                    Some(_) if self.feed.items().is_empty() => {
                        ui.label("No rooms match these filters.");
                    }
                    Some(_) => {
                        ui.weak(match self.feed.total() {
                            Some(total) => format!("That's all {total} rooms."),
                            None => "No more rooms.".to_string(),
                        });
                    }
                    None => {}
                }
            });

        if load_more {
            self.spawn_next_page();
        }
        if reload {
            self.restart_feed();
        }
        if let Some(room_id) = room_to_open {
            self.open_room(room_id);
        }
    }

    fn render_filter_bar(&mut self, ui: &mut egui::Ui) {
        let mut apply = false;
        ui.horizontal_wrapped(|ui| {
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.filter_form.search)
                    .hint_text("Search rooms")
                    .desired_width(220.0),
            );
            if search.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                apply = true;
            }

            apply |= filter_combo(
                ui,
                "campus_filter",
                "Any campus",
                &mut self.filter_form.campus,
                CAMPUSES.iter().map(|c| (*c, *c)),
            );
            apply |= filter_combo(
                ui,
                "room_type_filter",
                "Any type",
                &mut self.filter_form.room_type,
                ROOM_TYPES.iter().map(|t| (*t, *t)),
            );
            apply |= filter_combo(
                ui,
                "price_filter",
                "Any price",
                &mut self.filter_form.price_range,
                PRICE_BRACKETS.iter().copied(),
            );

            if ui.button("Search").clicked() {
                apply = true;
            }
            if ui.button("Clear").clicked() {
                self.filter_form = Default::default();
                apply = true;
            }
        });
        if apply {
            self.apply_filters();
        }
    }

}

/// Returns true when the card was clicked.
fn room_card(
    ui: &mut egui::Ui,
    images: &mut ImageCache,
    api: &ApiClient,
    room: &RoomSummary,
) -> bool {
    let mut open = false;
    ui.horizontal(|ui| {
        match room.images.first() {
            Some(url) => {
                let url = api.resolve_media_url(url);
                let thumb = images.show(ui, &url, CARD_THUMB);
                if thumb.interact(egui::Sense::click()).clicked() {
                    open = true;
                }
            }
            None => {
                placeholder(ui, CARD_THUMB, |ui| {
                    ui.weak("No photos");
                });
            }
        }
        ui.vertical(|ui| {
            let title = if room.title.is_empty() {
                "(untitled room)"
            } else {
                &room.title
            };
            if ui.link(RichText::new(title).strong().size(16.0)).clicked() {
                open = true;
            }
            ui.label(format!("{} · {}", room.campus, room.location));
            if !room.room_type.is_empty() {
                ui.label(&room.room_type);
            }
            ui.label(RichText::new(format!("{} / year", format_price(room.price))).strong());
            if let Some(created) = &room.created_at {
                ui.weak(format!("Listed {}", format_timestamp(created)));
            }
        });
    });
    open
}

/// ComboBox over `(value, label)` options with an "any" entry mapped to the
/// empty string. Returns true when the selection changed.
fn filter_combo<'a>(
    ui: &mut egui::Ui,
    id: &str,
    any_label: &str,
    selected: &mut String,
    options: impl Iterator<Item = (&'a str, &'a str)>,
) -> bool {
    let options: Vec<(&str, &str)> = options.collect();
    let current = options
        .iter()
        .find(|(value, _)| *value == selected.as_str())
        .map(|(_, label)| *label)
        .unwrap_or(any_label);
    let before = selected.clone();
    egui::ComboBox::from_id_salt(id)
        .selected_text(current)
        .show_ui(ui, |ui| {
            ui.selectable_value(selected, String::new(), any_label);
            for (value, label) in &options {
                ui.selectable_value(selected, value.to_string(), *label);
            }
        });
    *selected != before
}
