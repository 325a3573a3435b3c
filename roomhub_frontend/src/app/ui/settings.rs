use eframe::egui;

use crate::config::{format_limit, DEFAULT_API_URL};
use crate::media::MediaKind;

use super::super::state::ViewState;
use super::super::RoomhubApp;

impl RoomhubApp {
    pub(crate) fn render_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("⚙ Settings");
        ui.add_space(20.0);

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.group(|ui| {
                ui.heading("API Configuration");
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    ui.label("Backend URL:");
                    ui.text_edit_singleline(&mut self.settings.api_url);
                });

                ui.add_space(5.0);

                ui.horizontal(|ui| {
                    if ui.button("Apply Changes").clicked() {
                        match self.ctx.api.set_base_url(self.settings.api_url.clone()) {
                            Ok(()) => {
                                self.settings.api_url = self.ctx.api.base_url().to_string();
                                self.settings.error = None;
                                self.info_banner = Some("API URL updated successfully".into());
                                self.dashboard.loaded = false;
                                self.restart_feed();
                                self.navigate(ViewState::Feed);
                            }
                            Err(err) => {
                                self.settings.error = Some(format!("Failed to update URL: {err}"));
                            }
                        }
                    }

                    if ui.button("Reset to Default").clicked() {
                        self.settings.api_url = DEFAULT_API_URL.to_string();
                    }
                });
            });

            ui.add_space(20.0);

            ui.group(|ui| {
                ui.heading("Agent token");
                ui.add_space(10.0);
                ui.label("Paste the bearer token issued by the backend to manage your listings.");

                ui.horizontal(|ui| {
                    ui.label("Token:");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.settings.token)
                            .password(true)
                            .desired_width(320.0),
                    );
                });

                ui.horizontal(|ui| {
                    if ui.button("Save token").clicked() {
                        match self.ctx.session.set_token(self.settings.token.clone()) {
                            Ok(()) => {
                                self.settings.error = None;
                                self.dashboard.loaded = false;
                                self.info_banner = Some(if self.ctx.session.is_signed_in() {
                                    "Token saved".into()
                                } else {
                                    "Token cleared".into()
                                });
                            }
                            Err(err) => self.settings.error = Some(format!("{err:#}")),
                        }
                    }
                    if ui.button("Sign out").clicked() {
                        self.settings.token.clear();
                        match self.ctx.session.clear() {
                            Ok(()) => {
                                self.settings.error = None;
                                self.dashboard = Default::default();
                                self.info_banner = Some("Signed out".into());
                            }
                            Err(err) => self.settings.error = Some(format!("{err:#}")),
                        }
                    }
                });
            });

            if let Some(err) = &self.settings.error {
                ui.add_space(10.0);
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }

            ui.add_space(20.0);

            ui.group(|ui| {
                ui.heading("Upload limits");
                ui.add_space(10.0);
                let limits = self.ctx.config.media;
                egui::Grid::new("limits_grid")
                    .num_columns(2)
                    .spacing([40.0, 4.0])
                    .striped(true)
                    .show(ui, |ui| {
                        for (kind, count) in [
                            (MediaKind::Image, limits.max_images),
                            (MediaKind::Video, limits.max_videos),
                        ] {
                            ui.label(egui::RichText::new(format!("{kind}s")).strong());
                            ui.label(format!(
                                "{} · up to {} each · {count} per room",
                                kind.allowed_formats(),
                                format_limit(kind.max_bytes(&limits))
                            ));
                            ui.end_row();
                        }
                    });
                ui.label(
                    egui::RichText::new("Set ROOMHUB_MAX_* environment variables to change these.")
                        .small()
                        .color(egui::Color32::GRAY),
                );
            });
        });
    }
}
