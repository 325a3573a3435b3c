use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub media: MediaLimits,
    pub session_file: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_url =
            non_blank_var("ROOMHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let page_size = parse_var("ROOMHUB_PAGE_SIZE")
            .filter(|size: &u32| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let session_file = non_blank_var("ROOMHUB_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file);
        Self {
            api_url,
            page_size,
            request_timeout: Duration::from_secs(15),
            media: MediaLimits::from_env(),
            session_file,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(15),
            media: MediaLimits::default(),
            session_file: default_session_file(),
        }
    }
}

/// Size and count envelope applied to media before it ever leaves the client.
///
/// Count limits are soft: the backend enforces its own, these only keep the
/// form from offering more slots than the server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLimits {
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
    pub max_images: usize,
    pub max_videos: usize,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: 10 * MIB,
            max_video_bytes: 15 * MIB,
            max_images: 10,
            max_videos: 3,
        }
    }
}

impl MediaLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_image_bytes: parse_var("ROOMHUB_MAX_IMAGE_BYTES")
                .unwrap_or(defaults.max_image_bytes),
            max_video_bytes: parse_var("ROOMHUB_MAX_VIDEO_BYTES")
                .unwrap_or(defaults.max_video_bytes),
            max_images: parse_var("ROOMHUB_MAX_IMAGES").unwrap_or(defaults.max_images),
            max_videos: parse_var("ROOMHUB_MAX_VIDEOS").unwrap_or(defaults.max_videos),
        }
    }
}

fn default_session_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roomhub")
        .join("session.json")
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    non_blank_var(key).and_then(|raw| raw.parse().ok())
}

/// Renders a byte count the way limit messages quote it ("10 MB", "1.5 MB").
pub fn format_limit(bytes: u64) -> String {
    if bytes >= MIB {
        let mb = bytes as f64 / MIB as f64;
        if mb.fract() == 0.0 {
            format!("{} MB", mb as u64)
        } else {
            format!("{:.1} MB", mb)
        }
    } else if bytes >= 1024 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_product_envelope() {
        let limits = MediaLimits::default();
        assert_eq!(limits.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.max_video_bytes, 15 * 1024 * 1024);
        assert_eq!(limits.max_images, 10);
        assert_eq!(limits.max_videos, 3);
    }

    #[test]
    fn limits_render_in_megabytes() {
        assert_eq!(format_limit(10 * MIB), "10 MB");
        assert_eq!(format_limit(MIB + MIB / 2), "1.5 MB");
        assert_eq!(format_limit(2048), "2 KB");
        assert_eq!(format_limit(12), "12 bytes");
    }
}
