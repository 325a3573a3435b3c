use eframe::egui::{self, Color32, RichText};

use crate::config::format_limit;
use crate::media::validate::sniff_mime;
use crate::media::{MediaKind, Poster, RawFile};
use crate::models::{CAMPUSES, ROOM_TYPES};

use super::super::images::placeholder;
use super::super::messages::PosterOwner;
use super::super::state::{ListingFormState, ViewState};
use super::super::RoomhubApp;

const PREVIEW_TILE: egui::Vec2 = egui::vec2(140.0, 100.0);

struct TileInfo {
    id: String,
    name: String,
    byte_size: u64,
    image_url: Option<String>,
    pending: bool,
}

impl RoomhubApp {
    pub(crate) fn render_listing_form(&mut self, ui: &mut egui::Ui, form: &mut ListingFormState) {
        self.accept_dropped_files(ui.ctx(), form);

        ui.horizontal(|ui| {
            if ui.button("← Cancel").clicked() {
                self.navigate(ViewState::Dashboard);
            }
            ui.heading(if form.editing.is_some() {
                "Edit listing"
            } else {
                "New listing"
            });
        });
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                egui::Grid::new("listing_fields")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Title");
                        ui.text_edit_singleline(&mut form.title);
                        ui.end_row();

                        ui.label("Campus");
                        choice_combo(ui, "form_campus", &mut form.campus, CAMPUSES);
                        ui.end_row();

                        ui.label("Location");
                        ui.text_edit_singleline(&mut form.location);
                        ui.end_row();

                        ui.label("Price (₦ / year)");
                        ui.text_edit_singleline(&mut form.price);
                        ui.end_row();

                        ui.label("Room type");
                        choice_combo(ui, "form_room_type", &mut form.room_type, ROOM_TYPES);
                        ui.end_row();

                        ui.label("Amenities");
                        ui.add(
                            egui::TextEdit::singleline(&mut form.amenities)
                                .hint_text("Comma separated, e.g. Wi-Fi, Water"),
                        );
                        ui.end_row();
                    });

                ui.label("Description");
                ui.add(
                    egui::TextEdit::multiline(&mut form.description)
                        .desired_rows(5)
                        .desired_width(f32::INFINITY),
                );

                ui.add_space(8.0);
                self.render_media_section(ui, form, MediaKind::Image);
                ui.add_space(8.0);
                self.render_media_section(ui, form, MediaKind::Video);

                if !form.draft.messages().is_empty() {
                    ui.add_space(6.0);
                    let mut dismiss = false;
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        for message in form.draft.messages() {
                            ui.colored_label(Color32::from_rgb(230, 160, 60), message);
                        }
                        dismiss = ui.small_button("Dismiss").clicked();
                    });
                    if dismiss {
                        form.draft.clear_messages();
                    }
                }

                ui.add_space(8.0);
                if let Some(err) = &form.error {
                    ui.colored_label(Color32::LIGHT_RED, err);
                }
                ui.horizontal(|ui| {
                    let label = if form.editing.is_some() {
                        "Save changes"
                    } else {
                        "Publish listing"
                    };
                    if ui
                        .add_enabled(!form.submitting, egui::Button::new(label))
                        .clicked()
                    {
                        self.spawn_save_listing(form);
                    }
                    if form.submitting {
                        ui.spinner();
                        ui.label("Uploading…");
                    }
                });
            });
    }

    fn render_media_section(
        &mut self,
        ui: &mut egui::Ui,
        form: &mut ListingFormState,
        kind: MediaKind,
    ) {
        let limits = *form.draft.limits();
        let count = form.draft.count(kind);
        let capacity = form.draft.capacity(kind);

        ui.horizontal(|ui| {
            let title = match kind {
                MediaKind::Image => "Photos",
                MediaKind::Video => "Videos",
            };
            ui.label(RichText::new(title).strong());
            ui.weak(format!(
                "{count}/{capacity} · {} · up to {} each",
                kind.allowed_formats(),
                format_limit(kind.max_bytes(&limits))
            ));
        });

        let tiles: Vec<TileInfo> = form
            .draft
            .entries(kind)
            .map(|entry| {
                let (image_url, pending) = match kind {
                    MediaKind::Image if entry.is_existing() => {
                        (Some(self.ctx.api.resolve_media_url(entry.preview_url())), false)
                    }
                    MediaKind::Image => (Some(entry.preview_url().to_string()), false),
                    MediaKind::Video => match form.draft.poster(&entry.id) {
                        Some(Poster::Ready(url)) => (Some(url.as_str().to_string()), false),
                        Some(Poster::Pending) => (None, true),
                        Some(Poster::Placeholder(_)) | None => (None, false),
                    },
                };
                TileInfo {
                    id: entry.id.clone(),
                    name: entry.display_name.clone(),
                    byte_size: entry.byte_size,
                    image_url,
                    pending,
                }
            })
            .collect();

        let mut remove: Option<String> = None;
        ui.horizontal_wrapped(|ui| {
            for tile in &tiles {
                ui.vertical(|ui| {
                    match (&tile.image_url, tile.pending) {
                        (Some(url), _) => {
                            self.show_image(ui, url, PREVIEW_TILE);
                        }
                        (None, true) => {
                            placeholder(ui, PREVIEW_TILE, |ui| {
                                ui.spinner();
                            });
                        }
                        (None, false) => {
                            placeholder(ui, PREVIEW_TILE, |ui| {
                                ui.weak("🎬");
                            });
                        }
                    }
                    ui.horizontal(|ui| {
                        let caption = if tile.byte_size > 0 {
                            format!("{} ({})", tile.name, format_limit(tile.byte_size))
                        } else {
                            tile.name.clone()
                        };
                        ui.add(egui::Label::new(RichText::new(caption).small()).truncate());
                        if ui.small_button("✖").on_hover_text("Remove").clicked() {
                            remove = Some(tile.id.clone());
                        }
                    });
                });
            }
        });
        if let Some(entry_id) = remove {
            form.draft.remove(&entry_id);
        }

        ui.horizontal(|ui| {
            let label = match kind {
                MediaKind::Image => "Add photos…",
                MediaKind::Video => "Add videos…",
            };
            let can_add = count < capacity && !form.picking;
            if ui.add_enabled(can_add, egui::Button::new(label)).clicked() {
                self.spawn_pick_files(form, kind);
            }
            if form.picking {
                ui.spinner();
            }
            ui.weak("or drop files onto the window");
        });
    }

    /// Routes files dropped on the window into the open form.
    fn accept_dropped_files(&mut self, ctx: &egui::Context, form: &mut ListingFormState) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        let mut files = Vec::new();
        let mut paths = Vec::new();
        for file in dropped {
            match (file.bytes, file.path) {
                (Some(bytes), path) => {
                    let name = if file.name.is_empty() {
                        path.as_deref()
                            .and_then(|p| p.file_name())
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default()
                    } else {
                        file.name
                    };
                    let mime = sniff_mime(&name, &bytes);
                    files.push(RawFile::new(name, mime, bytes));
                }
                (None, Some(path)) => paths.push(path),
                (None, None) => {}
            }
        }
        if !files.is_empty() {
            let jobs = form.draft.add_mixed(files);
            self.spawn_posters(PosterOwner::Form(form.form_id), jobs);
        }
        self.spawn_read_dropped(form, paths);
    }
}

fn choice_combo(ui: &mut egui::Ui, id: &str, selected: &mut String, options: &[&str]) {
    let text = if selected.is_empty() {
        "Choose…".to_string()
    } else {
        selected.clone()
    };
    egui::ComboBox::from_id_salt(id)
        .selected_text(text)
        .show_ui(ui, |ui| {
            for option in options {
                ui.selectable_value(selected, option.to_string(), *option);
            }
        });
}
