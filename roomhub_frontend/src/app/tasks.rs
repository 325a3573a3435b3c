use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use log::error;

use crate::api::ApiClient;
use crate::config::MediaLimits;
use crate::feed::PageRequest;
use crate::media::validate::read_paths;
use crate::media::{MediaKind, ObjectUrlStore, PosterJob, ThumbnailExtractor, UploadBundle};
use crate::models::RoomInput;
use crate::session::LoadingGuard;

use super::messages::{AppMessage, PosterOwner};
use super::state::{LoadedImage, RoomLoadPurpose};

pub fn load_rooms_page(
    client: ApiClient,
    tx: Sender<AppMessage>,
    request: PageRequest,
    guard: LoadingGuard,
) {
    thread::spawn(move || {
        let _guard = guard;
        let result = client.search_rooms(&request.filters, request.page, request.limit);
        let message = AppMessage::RoomsPageLoaded {
            generation: request.generation,
            result,
        };
        if tx.send(message).is_err() {
            error!("failed to send RoomsPageLoaded message");
        }
    });
}

pub fn load_room(
    client: ApiClient,
    tx: Sender<AppMessage>,
    room_id: String,
    purpose: RoomLoadPurpose,
    guard: LoadingGuard,
) {
    thread::spawn(move || {
        let _guard = guard;
        let result = client.get_room(&room_id);
        let message = AppMessage::RoomLoaded {
            room_id,
            purpose,
            result,
        };
        if tx.send(message).is_err() {
            error!("failed to send RoomLoaded message");
        }
    });
}

pub fn load_my_rooms(client: ApiClient, tx: Sender<AppMessage>, guard: LoadingGuard) {
    thread::spawn(move || {
        let _guard = guard;
        let result = client.list_my_rooms();
        if tx.send(AppMessage::MyRoomsLoaded(result)).is_err() {
            error!("failed to send MyRoomsLoaded message");
        }
    });
}

pub fn save_room(
    client: ApiClient,
    tx: Sender<AppMessage>,
    room_id: Option<String>,
    input: RoomInput,
    media: UploadBundle,
    guard: LoadingGuard,
) {
    thread::spawn(move || {
        let _guard = guard;
        log::info!(
            "uploading listing with {} new images and {} new videos",
            media.images.len(),
            media.videos.len()
        );
        let result = match &room_id {
            Some(id) => client.update_room(id, &input, &media),
            None => client.create_room(&input, &media),
        };
        if tx.send(AppMessage::RoomSaved { room_id, result }).is_err() {
            error!("failed to send RoomSaved message");
        }
    });
}

pub fn delete_room(
    client: ApiClient,
    tx: Sender<AppMessage>,
    room_id: String,
    guard: LoadingGuard,
) {
    thread::spawn(move || {
        let _guard = guard;
        let result = client.delete_room(&room_id);
        if tx.send(AppMessage::RoomDeleted { room_id, result }).is_err() {
            error!("failed to send RoomDeleted message");
        }
    });
}

/// Runs poster jobs one after another on a single worker.
pub fn extract_posters(
    extractor: Arc<dyn ThumbnailExtractor>,
    tx: Sender<AppMessage>,
    owner: PosterOwner,
    jobs: Vec<PosterJob>,
    guard: LoadingGuard,
) {
    if jobs.is_empty() {
        return;
    }
    thread::spawn(move || {
        let _guard = guard;
        for job in jobs {
            let result = extractor.extract(&job.source);
            let message = AppMessage::PosterReady {
                owner: owner.clone(),
                entry_id: job.entry_id,
                result,
            };
            if tx.send(message).is_err() {
                error!("failed to send PosterReady message");
                return;
            }
        }
    });
}

pub fn pick_files(tx: Sender<AppMessage>, form_id: u64, kind: MediaKind, limits: MediaLimits) {
    thread::spawn(move || {
        let label = match kind {
            MediaKind::Image => "Images",
            MediaKind::Video => "Videos",
        };
        let picked = rfd::FileDialog::new()
            .add_filter(label, kind.picker_extensions())
            .pick_files()
            .unwrap_or_default();
        let message = AppMessage::FilesPicked {
            form_id,
            kind: Some(kind),
            intake: read_paths(&picked, Some(kind), &limits),
        };
        if tx.send(message).is_err() {
            error!("failed to send FilesPicked message");
        }
    });
}

/// Reads files dropped on the window by path. Each is filed by its extension.
pub fn read_dropped(
    tx: Sender<AppMessage>,
    form_id: u64,
    paths: Vec<PathBuf>,
    limits: MediaLimits,
    guard: LoadingGuard,
) {
    thread::spawn(move || {
        let _guard = guard;
        let message = AppMessage::FilesPicked {
            form_id,
            kind: None,
            intake: read_paths(&paths, None, &limits),
        };
        if tx.send(message).is_err() {
            error!("failed to send FilesPicked message");
        }
    });
}

/// Loads and decodes an image for display. `blob:` URLs come from the local
/// store, anything else is downloaded.
pub fn load_image(client: ApiClient, store: ObjectUrlStore, tx: Sender<AppMessage>, url: String) {
    thread::spawn(move || {
        let result = (|| {
            let bytes = if crate::media::object_url::is_object_url(&url) {
                store
                    .resolve(&url)
                    .map(|blob| blob.bytes.to_vec())
                    .ok_or_else(|| "preview was released".to_string())?
            } else {
                client.fetch_bytes(&url).map_err(|e| format!("Download error: {e}"))?
            };
            let dyn_img = image::load_from_memory(&bytes)
                .map_err(|e| format!("Image decode error: {e}"))?;
            let rgba = dyn_img.to_rgba8();
            let size = [dyn_img.width() as usize, dyn_img.height() as usize];
            Ok(LoadedImage {
                size,
                pixels: rgba.into_raw(),
            })
        })();

        if tx.send(AppMessage::ImageLoaded { url, result }).is_err() {
            error!("failed to send ImageLoaded message");
        }
    });
}
