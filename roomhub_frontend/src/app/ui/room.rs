use eframe::egui::{self, Color32, RichText};

use crate::media::Poster;

use super::super::images::placeholder;
use super::super::state::{RoomViewState, ViewState};
use super::super::RoomhubApp;
use super::{format_price, format_timestamp};

const GALLERY_TILE: egui::Vec2 = egui::vec2(240.0, 170.0);

impl RoomhubApp {
    pub(crate) fn render_room(&mut self, ui: &mut egui::Ui, state: &mut RoomViewState) {
        if ui.button("← Back to rooms").clicked() {
            self.navigate(ViewState::Feed);
            return;
        }
        ui.separator();

        if state.is_loading {
            ui.add(egui::Spinner::new());
            return;
        }
        if let Some(err) = &state.error {
            ui.colored_label(Color32::LIGHT_RED, err);
            if ui.button("Retry").clicked() {
                self.open_room(state.room_id.clone());
            }
            return;
        }
        let Some(room) = state.room.clone() else {
            return;
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.heading(&room.title);
                ui.horizontal(|ui| {
                    let price = format!("{} / year", format_price(room.price));
                    ui.label(RichText::new(price).strong());
                    ui.separator();
                    ui.label(&room.campus);
                    if !room.location.is_empty() {
                        ui.label(format!("· {}", room.location));
                    }
                    if !room.room_type.is_empty() {
                        ui.separator();
                        ui.label(&room.room_type);
                    }
                });
                if let Some(created) = &room.created_at {
                    ui.weak(format!("Listed {}", format_timestamp(created)));
                }

                if !room.description.is_empty() {
                    ui.add_space(8.0);
                    ui.label(&room.description);
                }

                if !room.amenities.is_empty() {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Amenities").strong());
                    ui.horizontal_wrapped(|ui| {
                        for amenity in &room.amenities {
                            egui::Frame::none()
                                .fill(ui.visuals().faint_bg_color)
                                .rounding(8.0)
                                .inner_margin(egui::vec2(8.0, 2.0))
                                .show(ui, |ui| ui.label(amenity));
                        }
                    });
                }

                if !room.images.is_empty() {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Photos").strong());
                    ui.horizontal_wrapped(|ui| {
                        for url in &room.images {
                            let url = self.ctx.api.resolve_media_url(url);
                            self.show_image(ui, &url, GALLERY_TILE);
                        }
                    });
                }

                if !room.videos.is_empty() {
                    ui.add_space(8.0);
                    ui.label(RichText::new("Videos").strong());
                    ui.horizontal_wrapped(|ui| {
                        for url in &room.videos {
                            let remote = self.ctx.api.resolve_media_url(url);
                            ui.vertical(|ui| {
                                match state.posters.get(url) {
                                    Some(Poster::Ready(poster)) => {
                                        let poster = poster.as_str().to_string();
                                        self.show_image(ui, &poster, GALLERY_TILE);
                                    }
                                    Some(Poster::Placeholder(_)) => {
                                        placeholder(ui, GALLERY_TILE, |ui| {
                                            ui.weak("🎬 preview unavailable");
                                        });
                                    }
                                    Some(Poster::Pending) | None => {
                                        placeholder(ui, GALLERY_TILE, |ui| {
                                            ui.spinner();
                                        });
                                    }
                                }
                                ui.hyperlink_to("Open video", remote);
                            });
                        }
                    });
                }

                if let Some(agent) = &room.agent {
                    ui.add_space(8.0);
                    ui.separator();
                    ui.label(RichText::new("Listed by").strong());
                    ui.label(&agent.name);
                    if let Some(phone) = &agent.phone {
                        ui.label(format!("Phone: {phone}"));
                    }
                    if let Some(email) = &agent.email {
                        ui.hyperlink_to(email, format!("mailto:{email}"));
                    }
                }
            });
    }
}
