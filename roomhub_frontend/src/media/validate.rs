use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use uuid::Uuid;

use super::object_url::{ObjectUrl, ObjectUrlStore};
use crate::config::{format_limit, MediaLimits};

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];
const VIDEO_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/mov",
    "video/quicktime",
    "video/avi",
    "video/x-msvideo",
    "video/webm",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn allowed_mime_types(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_MIME_TYPES,
            MediaKind::Video => VIDEO_MIME_TYPES,
        }
    }

    /// Human-readable allowed set, quoted in rejection messages.
    pub fn allowed_formats(self) -> &'static str {
        match self {
            MediaKind::Image => "JPEG, JPG, PNG, WEBP",
            MediaKind::Video => "MP4, MOV, AVI, WEBM",
        }
    }

    /// Extensions offered by the native file picker.
    pub fn picker_extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => &["jpg", "jpeg", "png", "webp"],
            MediaKind::Video => &["mp4", "mov", "avi", "webm"],
        }
    }

    pub fn max_bytes(self, limits: &MediaLimits) -> u64 {
        match self {
            MediaKind::Image => limits.max_image_bytes,
            MediaKind::Video => limits.max_video_bytes,
        }
    }

    /// Kind a file of unknown destination is validated as: `video/*` goes to
    /// the videos, everything else to the images.
    pub fn for_mime(mime: &str) -> Self {
        if normalize_mime(mime).starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn accepts(self, mime: &str) -> bool {
        let mime = normalize_mime(mime);
        self.allowed_mime_types().contains(&mime.as_str())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file picked or dropped by the user, held fully in memory.
#[derive(Clone)]
pub struct RawFile {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for RawFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl RawFile {
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, taking its MIME type from the content and
    /// falling back to the extension when the content is not recognised.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = file_name_of(path);
        let mime = sniff_mime(&name, &bytes);
        Ok(Self::new(name, mime, bytes))
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Files read from disk for one intake, plus those refused before reading.
#[derive(Debug, Default)]
pub struct DiskIntake {
    pub files: Vec<RawFile>,
    pub rejected: Vec<ValidationRejection>,
    pub failures: Vec<String>,
}

/// Reads `paths` for intake as `kind`, or as the kind their extension
/// suggests when `kind` is `None`. A file whose on-disk size is already over
/// the ceiling is rejected from its metadata and never read.
pub fn read_paths(paths: &[PathBuf], kind: Option<MediaKind>, limits: &MediaLimits) -> DiskIntake {
    let mut intake = DiskIntake::default();
    for path in paths {
        let name = file_name_of(path);
        let kind = kind.unwrap_or_else(|| MediaKind::for_mime(&sniff_mime(&name, &[])));
        let max = kind.max_bytes(limits);
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > max => {
                let rejection = ValidationRejection::TooLarge {
                    file_name: name,
                    kind,
                    limit: format_limit(max),
                };
                log::warn!("rejected {} before reading: {rejection}", rejection.file_name());
                intake.rejected.push(rejection);
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                intake
                    .failures
                    .push(format!("failed to read {}: {err}", path.display()));
                continue;
            }
        }
        match RawFile::from_path(path) {
            Ok(file) => intake.files.push(file),
            Err(err) => intake.failures.push(format!("{err:#}")),
        }
    }
    intake
}

pub fn sniff_mime(name: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn normalize_mime(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationRejection {
    #[error("{file_name} is not a supported {kind} format ({mime}). Allowed formats: {allowed}")]
    UnsupportedType {
        file_name: String,
        mime: String,
        kind: MediaKind,
        allowed: &'static str,
    },
    #[error("{file_name} exceeds the {limit} limit for {kind}s")]
    TooLarge {
        file_name: String,
        kind: MediaKind,
        limit: String,
    },
}

impl ValidationRejection {
    pub fn file_name(&self) -> &str {
        match self {
            ValidationRejection::UnsupportedType { file_name, .. }
            | ValidationRejection::TooLarge { file_name, .. } => file_name,
        }
    }
}

enum Preview {
    Object(ObjectUrl),
    Remote(String),
}

/// A validated, previewable image or video: either a new upload or an item
/// already stored on the backend.
pub struct MediaEntry {
    pub id: String,
    pub kind: MediaKind,
    pub source: Option<RawFile>,
    pub display_name: String,
    pub byte_size: u64,
    preview: Preview,
}

impl MediaEntry {
    fn from_upload(kind: MediaKind, file: RawFile, url: ObjectUrl) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            display_name: file.name.clone(),
            byte_size: file.len(),
            source: Some(file),
            preview: Preview::Object(url),
        }
    }

    /// Wraps a URL from a stored room record. The id is derived from the
    /// position so the same record always yields the same ids.
    pub fn existing(kind: MediaKind, index: usize, url: impl Into<String>) -> Self {
        let url = url.into();
        let display_name = url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(url.as_str())
            .to_string();
        Self {
            id: format!("existing-{}-{index}", kind.as_str()),
            kind,
            source: None,
            display_name,
            byte_size: 0,
            preview: Preview::Remote(url),
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self.preview, Preview::Remote(_))
    }

    pub fn preview_url(&self) -> &str {
        match &self.preview {
            Preview::Object(url) => url.as_str(),
            Preview::Remote(url) => url,
        }
    }
}

impl fmt::Debug for MediaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("display_name", &self.display_name)
            .field("byte_size", &self.byte_size)
            .field("preview_url", &self.preview_url())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<MediaEntry>,
    pub rejected: Vec<ValidationRejection>,
}

pub fn check_file(
    kind: MediaKind,
    file: &RawFile,
    limits: &MediaLimits,
) -> Result<(), ValidationRejection> {
    if !kind.accepts(&file.mime) {
        return Err(ValidationRejection::UnsupportedType {
            file_name: file.name.clone(),
            mime: file.mime.clone(),
            kind,
            allowed: kind.allowed_formats(),
        });
    }
    let max = kind.max_bytes(limits);
    if file.len() > max {
        return Err(ValidationRejection::TooLarge {
            file_name: file.name.clone(),
            kind,
            limit: format_limit(max),
        });
    }
    Ok(())
}

/// Splits a batch into accepted entries and per-file rejections. A rejected
/// file never affects the rest of the batch.
pub fn validate_files(
    kind: MediaKind,
    files: Vec<RawFile>,
    limits: &MediaLimits,
    store: &ObjectUrlStore,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for file in files {
        match check_file(kind, &file, limits) {
            Ok(()) => {
                let url = store.create(file.mime.clone(), file.bytes.clone());
                outcome.accepted.push(MediaEntry::from_upload(kind, file, url));
            }
            Err(rejection) => {
                log::warn!("rejected {}: {}", rejection.file_name(), rejection);
                outcome.rejected.push(rejection);
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(name: &str, mime: &str, len: usize) -> RawFile {
        RawFile::new(name, mime, vec![7u8; len])
    }

    #[test]
    fn rejects_unknown_types_naming_the_file() {
        let store = ObjectUrlStore::new();
        let limits = MediaLimits::default();
        let outcome = validate_files(
            MediaKind::Image,
            vec![file("notes.pdf", "application/pdf", 10), file("clip.mp4", "video/mp4", 10)],
            &limits,
            &store,
        );
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected.len(), 2);
        for rejection in &outcome.rejected {
            let message = rejection.to_string();
            assert!(message.contains(rejection.file_name()), "{message}");
            assert!(message.contains("JPEG, JPG, PNG, WEBP"), "{message}");
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn accepted_entries_carry_size_and_resolvable_preview() {
        let store = ObjectUrlStore::new();
        let limits = MediaLimits::default();
        let outcome = validate_files(
            MediaKind::Image,
            vec![file("room.png", "image/png", 2048), file("hall.webp", "image/webp", 1)],
            &limits,
            &store,
        );
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.accepted.len(), 2);

        let entry = &outcome.accepted[0];
        assert_eq!(entry.byte_size, 2048);
        assert_eq!(entry.display_name, "room.png");
        assert!(!entry.is_existing());
        let blob = store.resolve(entry.preview_url()).expect("preview resolves");
        assert_eq!(blob.bytes.len(), 2048);
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn oversize_files_name_the_limit() {
        let store = ObjectUrlStore::new();
        let limits = MediaLimits {
            max_video_bytes: 1024 * 1024,
            ..MediaLimits::default()
        };
        let outcome = validate_files(
            MediaKind::Video,
            vec![
                file("tour.mp4", "video/mp4", 1024 * 1024 + 1),
                file("ok.webm", "video/webm", 1024 * 1024),
            ],
            &limits,
            &store,
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].display_name, "ok.webm");
        assert_eq!(
            outcome.rejected[0].to_string(),
            "tour.mp4 exceeds the 1 MB limit for videos"
        );
    }

    #[test]
    fn type_check_runs_before_size_check() {
        let limits = MediaLimits::default();
        let huge_gif = file("big.gif", "image/gif", 11 * 1024 * 1024);
        let err = check_file(MediaKind::Image, &huge_gif, &limits).unwrap_err();
        assert!(matches!(err, ValidationRejection::UnsupportedType { .. }));
    }

    #[test]
    fn mime_aliases_and_parameters_are_accepted() {
        assert!(MediaKind::Video.accepts("video/quicktime"));
        assert!(MediaKind::Video.accepts("video/x-msvideo"));
        assert!(MediaKind::Video.accepts("video/webm; codecs=vp9"));
        assert!(MediaKind::Image.accepts("IMAGE/JPEG"));
        assert!(!MediaKind::Image.accepts("image/gif"));
    }

    #[test]
    fn existing_entries_use_positional_ids() {
        let url = "https://cdn.example.com/rooms/tour.mp4";
        let entry = MediaEntry::existing(MediaKind::Video, 2, url);
        assert_eq!(entry.id, "existing-video-2");
        assert_eq!(entry.display_name, "tour.mp4");
        assert_eq!(entry.preview_url(), "https://cdn.example.com/rooms/tour.mp4");
        assert!(entry.is_existing());
        assert!(entry.source.is_none());
    }

    #[test]
    fn oversize_paths_are_rejected_from_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let huge = dir.path().join("walkthrough.mp4");
        // Sparse 4 GiB file: reading it would allocate the whole thing.
        std::fs::File::create(&huge)
            .and_then(|f| f.set_len(4 * 1024 * 1024 * 1024))
            .expect("sparse file");
        let small = dir.path().join("front.png");
        std::fs::write(&small, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).expect("write");

        let intake = read_paths(&[huge, small], None, &MediaLimits::default());
        assert_eq!(intake.files.len(), 1);
        assert_eq!(intake.files[0].name, "front.png");
        assert_eq!(intake.files[0].mime, "image/png");
        assert_eq!(
            intake.rejected,
            vec![ValidationRejection::TooLarge {
                file_name: "walkthrough.mp4".into(),
                kind: MediaKind::Video,
                limit: "15 MB".into(),
            }]
        );
        assert!(intake.failures.is_empty());
    }

    #[test]
    fn explicit_kind_sets_the_pre_read_ceiling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("poster.mp4");
        std::fs::write(&path, vec![0u8; 64]).expect("write");
        let limits = MediaLimits {
            max_image_bytes: 16,
            ..MediaLimits::default()
        };
        let intake = read_paths(&[path.clone()], Some(MediaKind::Image), &limits);
        assert!(intake.files.is_empty());
        assert_eq!(intake.rejected.len(), 1);

        let missing = dir.path().join("gone.png");
        let intake = read_paths(&[missing], None, &limits);
        assert!(intake.rejected.is_empty());
        assert_eq!(intake.failures.len(), 1);
    }

    #[test]
    fn sniffing_falls_back_to_extension() {
        assert_eq!(sniff_mime("walkthrough.MOV", b"not a real header"), "video/quicktime");
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_mime("mislabelled.jpg", &png_header), "image/png");
        assert_eq!(sniff_mime("README", b"plain"), "application/octet-stream");
    }
}
