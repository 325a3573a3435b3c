use std::collections::HashMap;

use super::object_url::{ObjectUrl, ObjectUrlStore};
use super::thumbnail::{Poster, ThumbnailError, ThumbnailSource};
use super::validate::{validate_files, DiskIntake, MediaEntry, MediaKind, RawFile};
use crate::config::MediaLimits;

/// A poster job the caller should run off the UI thread.
#[derive(Debug, Clone)]
pub struct PosterJob {
    pub entry_id: String,
    pub source: ThumbnailSource,
}

/// What a listing form hands to the network layer on submit.
#[derive(Debug, Clone, Default)]
pub struct UploadBundle {
    pub images: Vec<RawFile>,
    pub videos: Vec<RawFile>,
    pub retained_images: Vec<String>,
    pub retained_videos: Vec<String>,
}

/// Media attached to one listing form: new uploads plus items already stored
/// on the backend, with poster state for every video.
///
/// Dropping the draft releases every object URL it owns.
pub struct MediaDraft {
    limits: MediaLimits,
    store: ObjectUrlStore,
    entries: Vec<MediaEntry>,
    posters: HashMap<String, Poster>,
    messages: Vec<String>,
}

impl MediaDraft {
    pub fn new(limits: MediaLimits, store: ObjectUrlStore) -> Self {
        Self {
            limits,
            store,
            entries: Vec::new(),
            posters: HashMap::new(),
            messages: Vec::new(),
        }
    }

    /// Seeds the draft from a stored room. Returns poster jobs for the
    /// existing videos.
    pub fn with_existing(
        limits: MediaLimits,
        store: ObjectUrlStore,
        images: &[String],
        videos: &[String],
    ) -> (Self, Vec<PosterJob>) {
        let mut draft = Self::new(limits, store);
        let mut jobs = Vec::new();
        for (index, url) in images.iter().enumerate() {
            draft.entries.push(MediaEntry::existing(MediaKind::Image, index, url.clone()));
        }
        for (index, url) in videos.iter().enumerate() {
            let entry = MediaEntry::existing(MediaKind::Video, index, url.clone());
            jobs.push(PosterJob {
                entry_id: entry.id.clone(),
                source: ThumbnailSource::Remote(url.clone()),
            });
            draft.posters.insert(entry.id.clone(), Poster::Pending);
            draft.entries.push(entry);
        }
        (draft, jobs)
    }

    pub fn limits(&self) -> &MediaLimits {
        &self.limits
    }

    pub fn capacity(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Image => self.limits.max_images,
            MediaKind::Video => self.limits.max_videos,
        }
    }

    pub fn count(&self, kind: MediaKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub fn entries(&self, kind: MediaKind) -> impl Iterator<Item = &MediaEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn poster(&self, entry_id: &str) -> Option<&Poster> {
        self.posters.get(entry_id)
    }

    /// Per-file messages from the latest intake (rejections and overflow).
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Validates and adds a batch. Accepted files beyond the per-room soft
    /// limit are skipped with a message; new videos get a pending poster and
    /// a job.
    pub fn add_files(&mut self, kind: MediaKind, files: Vec<RawFile>) -> Vec<PosterJob> {
        self.messages.clear();
        self.intake(kind, files)
    }

    /// Intake for a mixed batch such as a window drop: `video/*` files go to
    /// the videos, everything else is validated as an image.
    pub fn add_mixed(&mut self, files: Vec<RawFile>) -> Vec<PosterJob> {
        self.messages.clear();
        self.intake_mixed(files)
    }

    /// Intake for files read off disk. Files refused before reading keep
    /// their message; with no `kind` the batch is split like
    /// [`MediaDraft::add_mixed`].
    pub fn add_from_disk(&mut self, kind: Option<MediaKind>, disk: DiskIntake) -> Vec<PosterJob> {
        self.messages.clear();
        self.messages
            .extend(disk.rejected.iter().map(|rejection| rejection.to_string()));
        self.messages.extend(disk.failures);
        match kind {
            Some(kind) => self.intake(kind, disk.files),
            None => self.intake_mixed(disk.files),
        }
    }

    fn intake_mixed(&mut self, files: Vec<RawFile>) -> Vec<PosterJob> {
        let (videos, images): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|file| MediaKind::for_mime(&file.mime) == MediaKind::Video);
        let mut jobs = Vec::new();
        if !images.is_empty() {
            jobs.extend(self.intake(MediaKind::Image, images));
        }
        if !videos.is_empty() {
            jobs.extend(self.intake(MediaKind::Video, videos));
        }
        jobs
    }

    fn intake(&mut self, kind: MediaKind, files: Vec<RawFile>) -> Vec<PosterJob> {
        let outcome = validate_files(kind, files, &self.limits, &self.store);
        self.messages
            .extend(outcome.rejected.iter().map(|rejection| rejection.to_string()));

        let capacity = self.capacity(kind);
        let mut free = capacity.saturating_sub(self.count(kind));
        let mut jobs = Vec::new();
        for entry in outcome.accepted {
            if free == 0 {
                self.messages.push(format!(
                    "{} was not added: a room can have at most {} {}s",
                    entry.display_name, capacity, kind
                ));
                continue;
            }
            free -= 1;
            if kind == MediaKind::Video {
                if let Some(file) = &entry.source {
                    jobs.push(PosterJob {
                        entry_id: entry.id.clone(),
                        source: ThumbnailSource::File(file.clone()),
                    });
                }
                self.posters.insert(entry.id.clone(), Poster::Pending);
            }
            self.entries.push(entry);
        }
        jobs
    }

    /// Removes an entry, releasing its preview URL and any poster.
    pub fn remove(&mut self, entry_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != entry_id);
        self.posters.remove(entry_id);
        self.entries.len() != before
    }

    /// Records a finished poster job. Results for entries removed in the
    /// meantime are dropped, which releases their URL.
    pub fn apply_poster(
        &mut self,
        entry_id: &str,
        result: Result<ObjectUrl, ThumbnailError>,
    ) -> bool {
        if !self.entries.iter().any(|entry| entry.id == entry_id) {
            log::debug!("discarding poster for removed entry {entry_id}");
            return false;
        }
        self.posters.insert(entry_id.to_string(), Poster::from_result(result));
        true
    }

    pub fn upload_bundle(&self) -> UploadBundle {
        let mut bundle = UploadBundle::default();
        for entry in &self.entries {
            match (entry.kind, &entry.source) {
                (MediaKind::Image, Some(file)) => bundle.images.push(file.clone()),
                (MediaKind::Video, Some(file)) => bundle.videos.push(file.clone()),
                (MediaKind::Image, None) => {
                    bundle.retained_images.push(entry.preview_url().to_string())
                }
                (MediaKind::Video, None) => {
                    bundle.retained_videos.push(entry.preview_url().to_string())
                }
            }
        }
        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ValidationRejection;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn png(name: &str) -> RawFile {
        RawFile::new(name, "image/png", vec![1u8; 16])
    }

    fn mp4(name: &str) -> RawFile {
        RawFile::new(name, "video/mp4", vec![2u8; 16])
    }

    #[test]
    fn removing_an_entry_releases_its_url() {
        let store = ObjectUrlStore::new();
        let mut draft = MediaDraft::new(MediaLimits::default(), store.clone());
        draft.add_files(MediaKind::Image, vec![png("a.png"), png("b.png")]);
        assert_eq!(store.live_count(), 2);

        let id = draft.entries(MediaKind::Image).next().expect("entry").id.clone();
        assert!(draft.remove(&id));
        assert_eq!(store.live_count(), 1);
        assert!(!draft.remove(&id));
    }

    #[test]
    fn dropping_the_draft_releases_everything() {
        let store = ObjectUrlStore::new();
        {
            let mut draft = MediaDraft::new(MediaLimits::default(), store.clone());
            draft.add_files(MediaKind::Image, vec![png("a.png")]);
            let jobs = draft.add_files(MediaKind::Video, vec![mp4("tour.mp4")]);
            let poster = store.create("image/jpeg", Arc::from(vec![9u8]));
            assert!(draft.apply_poster(&jobs[0].entry_id, Ok(poster)));
            assert_eq!(store.live_count(), 3);
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn repeated_select_and_remove_does_not_grow_the_store() {
        let store = ObjectUrlStore::new();
        let mut draft = MediaDraft::new(MediaLimits::default(), store.clone());
        for round in 0..20 {
            draft.add_files(MediaKind::Image, vec![png(&format!("{round}.png"))]);
            let id = draft.entries(MediaKind::Image).next().expect("entry").id.clone();
            draft.remove(&id);
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn videos_get_pending_posters_and_jobs() {
        let mut draft = MediaDraft::new(MediaLimits::default(), ObjectUrlStore::new());
        let jobs = draft.add_files(MediaKind::Video, vec![mp4("tour.mp4")]);
        assert_eq!(jobs.len(), 1);
        assert!(matches!(jobs[0].source, ThumbnailSource::File(_)));
        assert!(matches!(draft.poster(&jobs[0].entry_id), Some(Poster::Pending)));
    }

    #[test]
    fn failed_poster_becomes_placeholder() {
        let mut draft = MediaDraft::new(MediaLimits::default(), ObjectUrlStore::new());
        let jobs = draft.add_files(MediaKind::Video, vec![mp4("tour.mp4")]);
        draft.apply_poster(&jobs[0].entry_id, Err(ThumbnailError::Decode("corrupt".into())));
        assert!(matches!(draft.poster(&jobs[0].entry_id), Some(Poster::Placeholder(_))));
        assert_eq!(draft.upload_bundle().videos.len(), 1);
    }

    #[test]
    fn late_poster_for_removed_entry_is_released() {
        let store = ObjectUrlStore::new();
        let mut draft = MediaDraft::new(MediaLimits::default(), store.clone());
        let jobs = draft.add_files(MediaKind::Video, vec![mp4("tour.mp4")]);
        draft.remove(&jobs[0].entry_id);
        assert_eq!(store.live_count(), 0);

        let late = store.create("image/jpeg", Arc::from(vec![9u8]));
        assert!(!draft.apply_poster(&jobs[0].entry_id, Ok(late)));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn mixed_batch_is_split_by_mime_and_keeps_all_messages() {
        let store = ObjectUrlStore::new();
        let mut draft = MediaDraft::new(MediaLimits::default(), store.clone());
        let jobs = draft.add_mixed(vec![
            png("kitchen.png"),
            mp4("walkthrough.mp4"),
            RawFile::new("notes.pdf", "application/pdf", vec![0u8; 4]),
            RawFile::new("old.flv", "video/x-flv", vec![0u8; 4]),
        ]);
        assert_eq!(jobs.len(), 1);
        assert_eq!(draft.count(MediaKind::Image), 1);
        assert_eq!(draft.count(MediaKind::Video), 1);
        assert_eq!(draft.messages().len(), 2);
        assert!(draft.messages()[0].starts_with("notes.pdf"));
        assert!(draft.messages()[1].starts_with("old.flv"));
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn disk_intake_keeps_pre_read_rejections_ahead_of_validation() {
        let store = ObjectUrlStore::new();
        let mut draft = MediaDraft::new(MediaLimits::default(), store.clone());
        draft.add_files(MediaKind::Image, vec![RawFile::new("x.gif", "image/gif", vec![0u8; 4])]);
        let disk = DiskIntake {
            files: vec![png("porch.png"), mp4("tour.mp4")],
            rejected: vec![ValidationRejection::TooLarge {
                file_name: "huge.mov".into(),
                kind: MediaKind::Video,
                limit: "15 MB".into(),
            }],
            failures: vec!["failed to read /tmp/gone.png".into()],
        };
        let jobs = draft.add_from_disk(None, disk);
        assert_eq!(jobs.len(), 1);
        assert_eq!(draft.count(MediaKind::Image), 1);
        assert_eq!(draft.count(MediaKind::Video), 1);
        assert_eq!(
            draft.messages(),
            &[
                "huge.mov exceeds the 15 MB limit for videos".to_string(),
                "failed to read /tmp/gone.png".to_string(),
            ]
        );
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn soft_count_limit_skips_overflow_with_message() {
        let limits = MediaLimits {
            max_videos: 1,
            ..MediaLimits::default()
        };
        let store = ObjectUrlStore::new();
        let mut draft = MediaDraft::new(limits, store.clone());
        let jobs = draft.add_files(MediaKind::Video, vec![mp4("one.mp4"), mp4("two.mp4")]);
        assert_eq!(jobs.len(), 1);
        assert_eq!(draft.count(MediaKind::Video), 1);
        assert_eq!(store.live_count(), 1);
        assert_eq!(
            draft.messages(),
            &["two.mp4 was not added: a room can have at most 1 videos".to_string()]
        );
    }

    #[test]
    fn rejected_files_leave_the_rest_of_the_batch() {
        let mut draft = MediaDraft::new(MediaLimits::default(), ObjectUrlStore::new());
        let bad = RawFile::new("floorplan.gif", "image/gif", vec![0u8; 4]);
        draft.add_files(MediaKind::Image, vec![bad, png("ok.png")]);
        assert_eq!(draft.count(MediaKind::Image), 1);
        assert_eq!(draft.messages().len(), 1);
        assert!(draft.messages()[0].starts_with("floorplan.gif"));
    }

    #[test]
    fn existing_media_is_retained_on_upload() {
        let images = vec![
            "https://cdn/r/1.jpg".to_string(),
            "https://cdn/r/2.jpg".to_string(),
        ];
        let videos = vec!["https://cdn/r/tour.mp4".to_string()];
        let (mut draft, jobs) = MediaDraft::with_existing(
            MediaLimits::default(),
            ObjectUrlStore::new(),
            &images,
            &videos,
        );
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].entry_id, "existing-video-0");

        let ids: Vec<_> = draft.entries(MediaKind::Image).map(|entry| entry.id.clone()).collect();
        assert_eq!(ids, vec!["existing-image-0", "existing-image-1"]);

        draft.remove("existing-image-0");
        draft.add_files(MediaKind::Image, vec![png("new.png")]);
        let bundle = draft.upload_bundle();
        assert_eq!(bundle.retained_images, vec!["https://cdn/r/2.jpg".to_string()]);
        assert_eq!(bundle.retained_videos, videos);
        assert_eq!(bundle.images.len(), 1);
        assert_eq!(bundle.images[0].name, "new.png");
    }
}
