use eframe::egui::{self, Color32, RichText};
use egui_extras::{Column, TableBuilder};

use super::super::RoomhubApp;
use super::{format_price, format_timestamp};

enum RowAction {
    Edit(String),
    AskDelete(String),
    ConfirmDelete(String),
    CancelDelete,
}

impl RoomhubApp {
    pub(crate) fn render_dashboard(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("My listings");
            if ui.button("New listing").clicked() {
                self.open_new_listing();
            }
            if ui.button("Refresh").clicked() {
                self.spawn_load_my_rooms();
            }
        });
        if !self.ctx.session.is_signed_in() {
            ui.weak("Add your agent token under Settings to manage listings.");
        }
        if let Some(err) = &self.dashboard.error {
            ui.colored_label(Color32::LIGHT_RED, err);
        }
        ui.separator();

        if self.dashboard.is_loading && self.dashboard.rooms.is_empty() {
            ui.add(egui::Spinner::new());
            return;
        }
        if self.dashboard.loaded && self.dashboard.rooms.is_empty() {
            ui.label("You have no listings yet.");
            return;
        }

        let mut action: Option<RowAction> = None;
        let confirm = self.dashboard.confirm_delete.clone();
        let deleting = self.dashboard.deleting.clone();
        let opening = self.dashboard.opening_for_edit.clone();

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::remainder().at_least(180.0))
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(90.0))
            .column(Column::auto().at_least(160.0))
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Title");
                });
                header.col(|ui| {
                    ui.strong("Campus");
                });
                header.col(|ui| {
                    ui.strong("Price");
                });
                header.col(|ui| {
                    ui.strong("Listed");
                });
                header.col(|ui| {
                    ui.strong("");
                });
            })
            .body(|mut body| {
                for room in &self.dashboard.rooms {
                    body.row(26.0, |mut row| {
                        row.col(|ui| {
                            ui.label(RichText::new(&room.title).strong());
                        });
                        row.col(|ui| {
                            ui.label(&room.campus);
                        });
                        row.col(|ui| {
                            ui.label(format_price(room.price));
                        });
                        row.col(|ui| {
                            let listed = room.created_at.as_deref().map(format_timestamp);
                            ui.label(listed.unwrap_or_default());
                        });
                        row.col(|ui| {
                            if deleting.as_deref() == Some(room.id.as_str()) {
                                ui.spinner();
                                ui.label("Deleting…");
                            } else if confirm.as_deref() == Some(room.id.as_str()) {
                                ui.label("Delete?");
                                if ui.button("Yes").clicked() {
                                    action = Some(RowAction::ConfirmDelete(room.id.clone()));
                                }
                                if ui.button("No").clicked() {
                                    action = Some(RowAction::CancelDelete);
                                }
                            } else {
                                let busy = opening.is_some();
                                if ui.add_enabled(!busy, egui::Button::new("Edit")).clicked() {
                                    action = Some(RowAction::Edit(room.id.clone()));
                                }
                                if opening.as_deref() == Some(room.id.as_str()) {
                                    ui.spinner();
                                }
                                if ui.button("Delete").clicked() {
                                    action = Some(RowAction::AskDelete(room.id.clone()));
                                }
                            }
                        });
                    });
                }
            });

        match action {
            Some(RowAction::Edit(room_id)) => self.spawn_open_for_edit(room_id),
            Some(RowAction::AskDelete(room_id)) => self.dashboard.confirm_delete = Some(room_id),
            Some(RowAction::ConfirmDelete(room_id)) => {
                self.dashboard.confirm_delete = None;
                self.spawn_delete_room(room_id);
            }
            Some(RowAction::CancelDelete) => self.dashboard.confirm_delete = None,
            None => {}
        }
    }
}
