use std::io::Write;
use std::path::Path;
use std::sync::Once;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use thiserror::Error;

use super::object_url::{ObjectUrl, ObjectUrlStore};
use super::validate::RawFile;

/// JPEG quality used for poster frames (0.8 on a 0..1 scale).
pub const POSTER_JPEG_QUALITY: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThumbnailError {
    #[error("could not decode video: {0}")]
    Decode(String),
    #[error("could not encode poster frame: {0}")]
    Encode(String),
    #[error("could not stage video for decoding: {0}")]
    Io(String),
}

/// Where the video to thumbnail comes from.
#[derive(Debug, Clone)]
pub enum ThumbnailSource {
    File(RawFile),
    Remote(String),
}

impl ThumbnailSource {
    pub fn describe(&self) -> &str {
        match self {
            ThumbnailSource::File(file) => &file.name,
            ThumbnailSource::Remote(url) => url,
        }
    }
}

/// Produces one still image for a video. Implementations perform no retries:
/// a failure is final for that source.
pub trait ThumbnailExtractor: Send + Sync {
    fn extract(&self, source: &ThumbnailSource) -> Result<ObjectUrl, ThumbnailError>;
}

/// Poster state for one video as the UI sees it.
#[derive(Debug)]
pub enum Poster {
    Pending,
    Ready(ObjectUrl),
    Placeholder(String),
}

impl Poster {
    pub fn from_result(result: Result<ObjectUrl, ThumbnailError>) -> Self {
        match result {
            Ok(url) => Poster::Ready(url),
            Err(err) => Poster::Placeholder(err.to_string()),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Poster::Ready(url) => Some(url.as_str()),
            _ => None,
        }
    }
}

/// Seek target for the poster frame: a tenth of the way in, capped at one
/// second so leading black frames are skipped even on very short clips.
pub fn seek_offset(duration_secs: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0.0;
    }
    (duration_secs * 0.1).min(1.0)
}

fn init_ffmpeg() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Err(err) = ffmpeg::init() {
            log::error!("ffmpeg init failed: {err}");
        }
        ffmpeg::format::network::init();
    });
}

/// FFmpeg-backed extractor: decodes the frame at [`seek_offset`] at native
/// resolution and stores it as a JPEG object URL.
#[derive(Clone)]
pub struct FfmpegThumbnailer {
    store: ObjectUrlStore,
    quality: u8,
}

impl FfmpegThumbnailer {
    pub fn new(store: ObjectUrlStore) -> Self {
        Self {
            store,
            quality: POSTER_JPEG_QUALITY,
        }
    }
}

impl ThumbnailExtractor for FfmpegThumbnailer {
    fn extract(&self, source: &ThumbnailSource) -> Result<ObjectUrl, ThumbnailError> {
        init_ffmpeg();
        let jpeg = match source {
            ThumbnailSource::File(file) => {
                // The temp file is the decoder's only handle on the bytes and
                // is removed when it drops, on both paths.
                let staged = stage_to_temp_file(file)?;
                decode_poster(staged.path(), self.quality)
            }
            ThumbnailSource::Remote(url) => decode_poster(Path::new(url), self.quality),
        };
        match jpeg {
            Ok(bytes) => {
                log::info!(
                    "poster frame ready for {} ({} bytes)",
                    source.describe(),
                    bytes.len()
                );
                Ok(self.store.create("image/jpeg", bytes.into()))
            }
            Err(err) => {
                log::warn!("poster extraction failed for {}: {err}", source.describe());
                Err(err)
            }
        }
    }
}

fn stage_to_temp_file(file: &RawFile) -> Result<tempfile::NamedTempFile, ThumbnailError> {
    let suffix = Path::new(&file.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let mut staged = tempfile::Builder::new()
        .prefix("roomhub-poster-")
        .suffix(&suffix)
        .tempfile()
        .map_err(|err| ThumbnailError::Io(err.to_string()))?;
    staged
        .write_all(&file.bytes)
        .and_then(|_| staged.flush())
        .map_err(|err| ThumbnailError::Io(err.to_string()))?;
    Ok(staged)
}

fn decode_poster(location: &Path, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    let decode_err = |err: ffmpeg::Error| ThumbnailError::Decode(err.to_string());

    let mut ictx = ffmpeg::format::input(location).map_err(decode_err)?;

    let (stream_index, time_base, stream_secs, parameters) = {
        let stream = ictx
            .streams()
            .best(Type::Video)
            .ok_or_else(|| ThumbnailError::Decode("no video stream".into()))?;
        let tb = stream.time_base();
        let tb_secs = tb.numerator() as f64 / tb.denominator().max(1) as f64;
        (stream.index(), tb_secs, stream.duration() as f64 * tb_secs, stream.parameters())
    };

    let container_secs = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
    let duration = if container_secs > 0.0 { container_secs } else { stream_secs };
    let target = seek_offset(duration);

    let mut decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
        .and_then(|ctx| ctx.decoder().video())
        .map_err(decode_err)?;

    if target > 0.0 {
        let seek_ts = (target * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
        // Backward seek lands on the keyframe before the target; frames in
        // between are skipped by the timestamp check below.
        if let Err(err) = ictx.seek(seek_ts, ..=seek_ts) {
            log::warn!("seek to {target:.3}s failed for {}: {err}", location.display());
        }
    }

    let mut chosen: Option<ffmpeg::util::frame::video::Video> = None;
    let mut packet = ffmpeg::Packet::empty();
    'read: loop {
        match packet.read(&mut ictx) {
            Ok(()) => {}
            Err(ffmpeg::Error::Eof) => break,
            Err(err) => return Err(decode_err(err)),
        }
        if packet.stream() != stream_index {
            continue;
        }
        if decoder.send_packet(&packet).is_err() {
            continue;
        }
        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            let at = decoded.timestamp().map(|pts| pts as f64 * time_base);
            let reached = at.map_or(true, |secs| secs + 1e-3 >= target);
            chosen = Some(decoded.clone());
            if reached {
                break 'read;
            }
        }
    }

    if chosen.is_none() {
        let _ = decoder.send_eof();
        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        if decoder.receive_frame(&mut decoded).is_ok() {
            chosen = Some(decoded);
        }
    }

    let frame = chosen.ok_or_else(|| ThumbnailError::Decode("no frame decoded".into()))?;
    encode_jpeg(&frame, quality)
}

fn encode_jpeg(
    frame: &ffmpeg::util::frame::video::Video,
    quality: u8,
) -> Result<Vec<u8>, ThumbnailError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(ThumbnailError::Encode("frame has no pixels".into()));
    }
    let mut scaler = SwsContext::get(
        frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        Flags::BILINEAR,
    )
    .map_err(|err| ThumbnailError::Encode(err.to_string()))?;
    let mut rgb = ffmpeg::util::frame::video::Video::empty();
    scaler
        .run(frame, &mut rgb)
        .map_err(|err| ThumbnailError::Encode(err.to_string()))?;

    // Copy visible pixels only; rows carry stride padding.
    let stride = rgb.stride(0);
    let row_bytes = width as usize * 3;
    let raw = rgb.data(0);
    let pixels: Vec<u8> = (0..height as usize)
        .flat_map(|row| &raw[row * stride..row * stride + row_bytes])
        .copied()
        .collect();

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(&pixels, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|err| ThumbnailError::Encode(err.to_string()))?;
    if jpeg.is_empty() {
        return Err(ThumbnailError::Encode("encoder produced no data".into()));
    }
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_offset_is_a_tenth_capped_at_one_second() {
        assert!((seek_offset(0.5) - 0.05).abs() < 1e-9);
        assert_eq!(seek_offset(30.0), 1.0);
        assert_eq!(seek_offset(10.0), 1.0);
        assert!((seek_offset(4.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn unknown_durations_seek_to_start() {
        assert_eq!(seek_offset(0.0), 0.0);
        assert_eq!(seek_offset(-3.0), 0.0);
        assert_eq!(seek_offset(f64::NAN), 0.0);
        assert_eq!(seek_offset(f64::INFINITY), 0.0);
    }

    fn yuv_frame(width: u32, height: u32) -> ffmpeg::util::frame::video::Video {
        let mut frame = ffmpeg::util::frame::video::Video::new(Pixel::YUV420P, width, height);
        for plane in 0..3 {
            let stride = frame.stride(plane);
            let data = frame.data_mut(plane);
            for (index, byte) in data.iter_mut().enumerate() {
                *byte = if plane == 0 {
                    ((index % stride) * 4 % 256) as u8
                } else {
                    128
                };
            }
        }
        frame
    }

    #[test]
    fn decoded_frame_becomes_a_native_size_jpeg() {
        init_ffmpeg();
        let frame = yuv_frame(62, 46);

        let jpeg = encode_jpeg(&frame, POSTER_JPEG_QUALITY).expect("encode");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!((decoded.width(), decoded.height()), (62, 46));
    }

    #[test]
    fn empty_frame_is_an_encode_error() {
        let frame = ffmpeg::util::frame::video::Video::empty();
        assert!(matches!(
            encode_jpeg(&frame, POSTER_JPEG_QUALITY),
            Err(ThumbnailError::Encode(_))
        ));
    }

    #[test]
    fn undecodable_file_falls_back_to_placeholder() {
        let store = ObjectUrlStore::new();
        let extractor = FfmpegThumbnailer::new(store.clone());
        let garbage = RawFile::new("broken.mp4", "video/mp4", vec![0u8; 512]);

        let result = extractor.extract(&ThumbnailSource::File(garbage));
        assert!(matches!(result, Err(ThumbnailError::Decode(_))));

        let poster = Poster::from_result(result);
        assert!(matches!(poster, Poster::Placeholder(_)));
        assert!(poster.url().is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn unreachable_remote_source_is_a_decode_error() {
        let extractor = FfmpegThumbnailer::new(ObjectUrlStore::new());
        let missing = std::env::temp_dir().join("roomhub-definitely-missing-video.mp4");
        let result = extractor.extract(&ThumbnailSource::Remote(missing.display().to_string()));
        assert!(matches!(result, Err(ThumbnailError::Decode(_))));
    }
}
