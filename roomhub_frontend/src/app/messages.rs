use log::{error, info, warn};

use crate::feed::{FeedFetchError, PageOutcome};
use crate::media::validate::DiskIntake;
use crate::media::{MediaKind, ObjectUrl, Poster, ThumbnailError, ThumbnailSource};
use crate::models::{RoomDetail, RoomSummary, SearchRoomsResponse};

use super::state::{ListingFormState, LoadedImage, RoomLoadPurpose, ViewState};
use super::RoomhubApp;

/// Who asked for a poster, so late results can be matched or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterOwner {
    Form(u64),
    Room(String),
}

pub enum AppMessage {
    RoomsPageLoaded {
        generation: u64,
        result: Result<SearchRoomsResponse, FeedFetchError>,
    },
    RoomLoaded {
        room_id: String,
        purpose: RoomLoadPurpose,
        result: Result<RoomDetail, anyhow::Error>,
    },
    MyRoomsLoaded(Result<Vec<RoomSummary>, anyhow::Error>),
    RoomSaved {
        room_id: Option<String>,
        result: Result<RoomDetail, anyhow::Error>,
    },
    RoomDeleted {
        room_id: String,
        result: Result<(), anyhow::Error>,
    },
    PosterReady {
        owner: PosterOwner,
        entry_id: String,
        result: Result<ObjectUrl, ThumbnailError>,
    },
    /// Files read off disk for a form. `kind` is `None` for window drops.
    FilesPicked {
        form_id: u64,
        kind: Option<MediaKind>,
        intake: DiskIntake,
    },
    ImageLoaded {
        url: String,
        result: Result<LoadedImage, String>,
    },
}

pub(super) fn process_messages(app: &mut RoomhubApp) {
    while let Ok(message) = app.rx.try_recv() {
        match message {
            AppMessage::RoomsPageLoaded { generation, result } => {
                if let PageOutcome::Ended(end) = app.feed.apply_page(generation, result) {
                    info!("room feed generation {generation} ended: {end:?}");
                }
            }
            AppMessage::RoomLoaded {
                room_id,
                purpose: RoomLoadPurpose::View,
                result,
            } => handle_room_for_view(app, room_id, result),
            AppMessage::RoomLoaded {
                room_id,
                purpose: RoomLoadPurpose::Edit,
                result,
            } => handle_room_for_edit(app, room_id, result),
            AppMessage::MyRoomsLoaded(result) => {
                app.dashboard.is_loading = false;
                app.dashboard.loaded = true;
                match result {
                    Ok(rooms) => {
                        app.dashboard.rooms = rooms;
                        app.dashboard.error = None;
                    }
                    Err(err) => app.dashboard.error = Some(format!("{err:#}")),
                }
            }
            AppMessage::RoomSaved { room_id, result } => handle_room_saved(app, room_id, result),
            AppMessage::RoomDeleted { room_id, result } => {
                if app.dashboard.deleting.as_deref() == Some(room_id.as_str()) {
                    app.dashboard.deleting = None;
                }
                match result {
                    Ok(()) => {
                        app.dashboard.rooms.retain(|room| room.id != room_id);
                        app.info_banner = Some("Listing deleted".into());
                        app.restart_feed();
                    }
                    Err(err) => {
                        error!("failed to delete room {room_id}: {err:#}");
                        app.dashboard.error = Some(format!("{err:#}"));
                    }
                }
            }
            AppMessage::PosterReady {
                owner,
                entry_id,
                result,
            } => handle_poster(app, owner, entry_id, result),
            AppMessage::FilesPicked {
                form_id,
                kind,
                intake,
            } => {
                for failure in &intake.failures {
                    warn!("could not read file: {failure}");
                }
                let jobs = match &mut app.view {
                    ViewState::Form(form) if form.form_id == form_id => {
                        if kind.is_some() {
                            form.picking = false;
                        }
                        Some(form.draft.add_from_disk(kind, intake))
                    }
                    _ => None,
                };
                if let Some(jobs) = jobs {
                    app.spawn_posters(PosterOwner::Form(form_id), jobs);
                }
            }
            AppMessage::ImageLoaded { url, result } => app.images.finish(url, result),
        }
    }
}

fn handle_room_for_view(
    app: &mut RoomhubApp,
    room_id: String,
    result: Result<RoomDetail, anyhow::Error>,
) {
    let ViewState::Room(state) = &mut app.view else {
        return;
    };
    if state.room_id != room_id {
        return;
    }
    state.is_loading = false;
    match result {
        Ok(room) => {
            let jobs: Vec<_> = room
                .videos
                .iter()
                .map(|url| {
                    state.posters.insert(url.clone(), Poster::Pending);
                    crate::media::PosterJob {
                        entry_id: url.clone(),
                        source: ThumbnailSource::Remote(app.ctx.api.resolve_media_url(url)),
                    }
                })
                .collect();
            state.room = Some(room);
            app.spawn_posters(PosterOwner::Room(room_id), jobs);
        }
        Err(err) => state.error = Some(format!("{err:#}")),
    }
}

fn handle_room_for_edit(
    app: &mut RoomhubApp,
    room_id: String,
    result: Result<RoomDetail, anyhow::Error>,
) {
    if app.dashboard.opening_for_edit.as_deref() != Some(room_id.as_str()) {
        return;
    }
    app.dashboard.opening_for_edit = None;
    match result {
        Ok(room) => {
            let form_id = app.next_form_id();
            let (form, jobs) = ListingFormState::editing(
                form_id,
                &room,
                app.ctx.config.media,
                app.ctx.object_urls.clone(),
            );
            let jobs = jobs
                .into_iter()
                .map(|mut job| {
                    if let ThumbnailSource::Remote(url) = &job.source {
                        job.source = ThumbnailSource::Remote(app.ctx.api.resolve_media_url(url));
                    }
                    job
                })
                .collect();
            app.navigate(ViewState::Form(form));
            app.spawn_posters(PosterOwner::Form(form_id), jobs);
        }
        Err(err) => app.dashboard.error = Some(format!("{err:#}")),
    }
}

fn handle_room_saved(
    app: &mut RoomhubApp,
    room_id: Option<String>,
    result: Result<RoomDetail, anyhow::Error>,
) {
    let ViewState::Form(form) = &mut app.view else {
        return;
    };
    if form.editing != room_id {
        return;
    }
    form.submitting = false;
    match result {
        Ok(room) => {
            info!("saved listing {}", room.id);
            app.info_banner = Some(format!("Saved \"{}\"", room.title));
            app.navigate(ViewState::Dashboard);
            app.spawn_load_my_rooms();
            app.restart_feed();
        }
        Err(err) => {
            error!("failed to save listing: {err:#}");
            form.error = Some(format!("{err:#}"));
        }
    }
}

fn handle_poster(
    app: &mut RoomhubApp,
    owner: PosterOwner,
    entry_id: String,
    result: Result<ObjectUrl, ThumbnailError>,
) {
    match (&owner, &mut app.view) {
        (PosterOwner::Form(form_id), ViewState::Form(form)) if form.form_id == *form_id => {
            form.draft.apply_poster(&entry_id, result);
        }
        (PosterOwner::Room(room_id), ViewState::Room(state)) if state.room_id == *room_id => {
            if state.posters.contains_key(&entry_id) {
                state.posters.insert(entry_id, Poster::from_result(result));
            }
        }
        // The view that asked is gone; dropping the result releases its URL.
        _ => log::debug!("discarding poster {entry_id} for closed view {owner:?}"),
    }
}
