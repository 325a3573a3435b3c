use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, Url};

use crate::feed::FeedFetchError;
use crate::media::{RawFile, UploadBundle};
use crate::models::{
    RoomDetail, RoomEnvelope, RoomFilters, RoomInput, RoomListEnvelope, RoomSummary,
    SearchRoomsResponse,
};
use crate::session::AuthSession;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    session: AuthSession,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: AuthSession,
        timeout: Duration,
    ) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        self.base_url = sanitize_base_url(base_url.into())?;
        Ok(())
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn search_rooms(
        &self,
        filters: &RoomFilters,
        page: u32,
        limit: u32,
    ) -> Result<SearchRoomsResponse, FeedFetchError> {
        let mut url = self
            .url("/rooms/search")
            .map_err(|err| FeedFetchError::Transport(err.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(filters.query_pairs(page, limit));
        let response = self
            .request(Method::GET, url)
            .send()
            .and_then(Response::error_for_status)
            .map_err(|err| FeedFetchError::Transport(err.to_string()))?;
        let body = response
            .text()
            .map_err(|err| FeedFetchError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| FeedFetchError::Decode(err.to_string()))
    }

    pub fn get_room(&self, room_id: &str) -> Result<RoomDetail> {
        let url = self.url(&format!("/rooms/{room_id}"))?;
        let response = self
            .request(Method::GET, url)
            .send()
            .with_context(|| format!("failed to fetch room {room_id}"))?
            .error_for_status()?;
        let envelope: RoomEnvelope = response.json().context("failed to parse room record")?;
        Ok(envelope.into_room())
    }

    pub fn list_my_rooms(&self) -> Result<Vec<RoomSummary>> {
        let url = self.url("/rooms/agent/mine")?;
        let response = self
            .request(Method::GET, url)
            .send()
            .context("failed to fetch agent rooms")?
            .error_for_status()?;
        let envelope: RoomListEnvelope = response.json().context("failed to parse agent rooms")?;
        Ok(envelope.into_rooms())
    }

    pub fn create_room(&self, input: &RoomInput, media: &UploadBundle) -> Result<RoomDetail> {
        let url = self.url("/rooms")?;
        let form = listing_form(input, media)?;
        let response = self.request(Method::POST, url).multipart(form).send()?;
        let envelope: RoomEnvelope = read_success(response, "creating room")?
            .json()
            .context("failed to parse created room")?;
        Ok(envelope.into_room())
    }

    pub fn update_room(
        &self,
        room_id: &str,
        input: &RoomInput,
        media: &UploadBundle,
    ) -> Result<RoomDetail> {
        let url = self.url(&format!("/rooms/{room_id}"))?;
        let mut form = listing_form(input, media)?;
        for retained in &media.retained_images {
            form = form.text("existingImages", retained.clone());
        }
        for retained in &media.retained_videos {
            form = form.text("existingVideos", retained.clone());
        }
        let response = self.request(Method::PUT, url).multipart(form).send()?;
        let envelope: RoomEnvelope = read_success(response, &format!("updating room {room_id}"))?
            .json()
            .context("failed to parse updated room")?;
        Ok(envelope.into_room())
    }

    pub fn delete_room(&self, room_id: &str) -> Result<()> {
        let url = self.url(&format!("/rooms/{room_id}"))?;
        let response = self.request(Method::DELETE, url).send()?;
        read_success(response, &format!("deleting room {room_id}"))?;
        Ok(())
    }

    /// Downloads a media URL as stored on a room record. Relative URLs are
    /// resolved against the API base. The session token only goes to the
    /// API's own origin; external storage hosts get an anonymous request.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(&self.resolve_media_url(url)).context("invalid media URL")?;
        let builder = if self.is_api_origin(&url) {
            self.request(Method::GET, url)
        } else {
            self.client.request(Method::GET, url)
        };
        let response = builder.send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }

    fn is_api_origin(&self, url: &Url) -> bool {
        Url::parse(&self.base_url)
            .map(|base| base.origin() == url.origin())
            .unwrap_or(false)
    }

    pub fn resolve_media_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .context("invalid base URL")
    }
}

fn listing_form(input: &RoomInput, media: &UploadBundle) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in input.text_fields() {
        form = form.text(key, value);
    }
    for file in &media.images {
        form = form.part("images", file_part(file)?);
    }
    for file in &media.videos {
        form = form.part("videos", file_part(file)?);
    }
    Ok(form)
}

fn file_part(file: &RawFile) -> Result<Part> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.mime)
        .with_context(|| format!("invalid MIME type for {}", file.name))
}

fn read_success(response: Response, action: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .unwrap_or_else(|_| "Unable to read body".to_string());
    bail!("API returned error {action}: {status} - {body}");
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    base = base.trim().to_string();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    let _ = Url::parse(&base).context("invalid base URL")?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, AuthSession::in_memory(), Duration::from_secs(1)).expect("client")
    }

    #[test]
    fn base_url_is_normalised() {
        assert_eq!(client("localhost:5000/api/").base_url(), "http://localhost:5000/api");
        assert_eq!(client("https://rooms.example.com").base_url(), "https://rooms.example.com");
    }

    #[test]
    fn endpoint_paths_keep_the_base_prefix() {
        let api = client("http://localhost:5000/api");
        let url = api.url("/rooms/search").expect("url");
        assert_eq!(url.as_str(), "http://localhost:5000/api/rooms/search");
    }

    #[test]
    fn only_the_api_origin_counts_as_first_party() {
        let api = client("http://localhost:5000/api");
        let own = Url::parse("http://localhost:5000/uploads/a.jpg").expect("url");
        let other_port = Url::parse("http://localhost:5001/uploads/a.jpg").expect("url");
        let cdn = Url::parse("https://res.cloudinary.com/demo/a.jpg").expect("url");
        assert!(api.is_api_origin(&own));
        assert!(!api.is_api_origin(&other_port));
        assert!(!api.is_api_origin(&cdn));
    }

    #[test]
    fn media_urls_resolve_against_base() {
        let api = client("http://localhost:5000/api");
        assert_eq!(
            api.resolve_media_url("/uploads/a.jpg"),
            "http://localhost:5000/api/uploads/a.jpg"
        );
        assert_eq!(
            api.resolve_media_url("https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }
}
