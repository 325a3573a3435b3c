use std::path::PathBuf;

use super::messages::PosterOwner;
use super::state::{ListingFormState, RoomLoadPurpose, RoomViewState, ViewState};
use super::tasks;
use super::RoomhubApp;
use crate::media::{MediaKind, PosterJob};

impl RoomhubApp {
    /// Dispatches the next feed page unless one is already in flight or the
    /// current generation has ended.
    pub(super) fn spawn_next_page(&mut self) {
        let Some(request) = self.feed.request_next_page() else {
            return;
        };
        log::info!(
            "requesting room page {} (generation {})",
            request.page,
            request.generation
        );
        tasks::load_rooms_page(
            self.ctx.api.clone(),
            self.tx.clone(),
            request,
            self.ctx.loading.begin(),
        );
    }

    /// New generation with the same filters, e.g. after a listing changed.
    pub(super) fn restart_feed(&mut self) {
        self.feed.restart();
        self.sentinel.reset();
        self.spawn_next_page();
    }

    pub(super) fn apply_filters(&mut self) {
        if self.feed.set_filters(self.filter_form.to_filters()) {
            self.sentinel.reset();
            self.spawn_next_page();
        }
    }

    pub(super) fn open_room(&mut self, room_id: String) {
        self.navigate(ViewState::Room(RoomViewState::new(room_id.clone())));
        tasks::load_room(
            self.ctx.api.clone(),
            self.tx.clone(),
            room_id,
            RoomLoadPurpose::View,
            self.ctx.loading.begin(),
        );
    }

    pub(super) fn spawn_load_my_rooms(&mut self) {
        if self.dashboard.is_loading {
            return;
        }
        self.dashboard.is_loading = true;
        self.dashboard.error = None;
        tasks::load_my_rooms(self.ctx.api.clone(), self.tx.clone(), self.ctx.loading.begin());
    }

    pub(super) fn spawn_open_for_edit(&mut self, room_id: String) {
        if self.dashboard.opening_for_edit.is_some() {
            return;
        }
        self.dashboard.opening_for_edit = Some(room_id.clone());
        tasks::load_room(
            self.ctx.api.clone(),
            self.tx.clone(),
            room_id,
            RoomLoadPurpose::Edit,
            self.ctx.loading.begin(),
        );
    }

    pub(super) fn spawn_delete_room(&mut self, room_id: String) {
        if self.dashboard.deleting.is_some() {
            return;
        }
        self.dashboard.deleting = Some(room_id.clone());
        self.dashboard.error = None;
        tasks::delete_room(
            self.ctx.api.clone(),
            self.tx.clone(),
            room_id,
            self.ctx.loading.begin(),
        );
    }

    pub(super) fn open_new_listing(&mut self) {
        let form_id = self.next_form_id();
        self.navigate(ViewState::Form(ListingFormState::blank(
            form_id,
            self.ctx.config.media,
            self.ctx.object_urls.clone(),
        )));
    }

    pub(super) fn spawn_save_listing(&mut self, form: &mut ListingFormState) {
        if form.submitting {
            return;
        }
        let input = match form.to_input() {
            Ok(input) => input,
            Err(message) => {
                form.error = Some(message);
                return;
            }
        };
        form.submitting = true;
        form.error = None;
        tasks::save_room(
            self.ctx.api.clone(),
            self.tx.clone(),
            form.editing.clone(),
            input,
            form.draft.upload_bundle(),
            self.ctx.loading.begin(),
        );
    }

    pub(super) fn spawn_pick_files(&mut self, form: &mut ListingFormState, kind: MediaKind) {
        if form.picking {
            return;
        }
        form.picking = true;
        tasks::pick_files(self.tx.clone(), form.form_id, kind, *form.draft.limits());
    }

    pub(super) fn spawn_read_dropped(&mut self, form: &ListingFormState, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        tasks::read_dropped(
            self.tx.clone(),
            form.form_id,
            paths,
            *form.draft.limits(),
            self.ctx.loading.begin(),
        );
    }

    pub(super) fn spawn_posters(&mut self, owner: PosterOwner, jobs: Vec<PosterJob>) {
        if jobs.is_empty() {
            return;
        }
        tasks::extract_posters(
            self.ctx.thumbnails.clone(),
            self.tx.clone(),
            owner,
            jobs,
            self.ctx.loading.begin(),
        );
    }

    pub(super) fn next_form_id(&mut self) -> u64 {
        self.form_counter += 1;
        self.form_counter
    }
}
