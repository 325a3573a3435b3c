//! Media intake: validation, object URLs, poster frames and per-form drafts.

pub mod draft;
pub mod object_url;
pub mod thumbnail;
pub mod validate;

pub use draft::{MediaDraft, PosterJob, UploadBundle};
pub use object_url::{ObjectUrl, ObjectUrlStore};
pub use thumbnail::{FfmpegThumbnailer, Poster, ThumbnailError, ThumbnailExtractor, ThumbnailSource};
pub use validate::{MediaEntry, MediaKind, RawFile, ValidationRejection};
