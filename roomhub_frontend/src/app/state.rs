use std::collections::HashMap;

use crate::config::MediaLimits;
use crate::media::{MediaDraft, ObjectUrlStore, Poster, PosterJob};
use crate::models::{RoomDetail, RoomFilters, RoomInput, RoomSummary};

pub enum ViewState {
    Feed,
    Room(RoomViewState),
    Dashboard,
    Form(ListingFormState),
    Settings,
}

/// Editable copy of the feed filters; the feed only sees it once it changes.
#[derive(Default, Clone, PartialEq)]
pub struct FilterForm {
    pub search: String,
    pub campus: String,
    pub room_type: String,
    pub price_range: String,
}

impl FilterForm {
    pub fn to_filters(&self) -> RoomFilters {
        RoomFilters {
            search: self.search.trim().to_string(),
            campus: self.campus.clone(),
            room_type: self.room_type.clone(),
            price_range: self.price_range.clone(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoomLoadPurpose {
    View,
    Edit,
}

pub struct RoomViewState {
    pub room_id: String,
    pub room: Option<RoomDetail>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Video posters keyed by video URL.
    pub posters: HashMap<String, Poster>,
}

impl RoomViewState {
    pub fn new(room_id: String) -> Self {
        Self {
            room_id,
            room: None,
            is_loading: true,
            error: None,
            posters: HashMap::new(),
        }
    }
}

#[derive(Default)]
pub struct DashboardState {
    pub rooms: Vec<RoomSummary>,
    pub is_loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
    pub confirm_delete: Option<String>,
    pub deleting: Option<String>,
    pub opening_for_edit: Option<String>,
}

pub struct ListingFormState {
    pub form_id: u64,
    pub editing: Option<String>,
    pub title: String,
    pub description: String,
    pub campus: String,
    pub location: String,
    pub price: String,
    pub room_type: String,
    pub amenities: String,
    pub draft: MediaDraft,
    pub picking: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

impl ListingFormState {
    pub fn blank(form_id: u64, limits: MediaLimits, store: ObjectUrlStore) -> Self {
        Self {
            form_id,
            editing: None,
            title: String::new(),
            description: String::new(),
            campus: String::new(),
            location: String::new(),
            price: String::new(),
            room_type: String::new(),
            amenities: String::new(),
            draft: MediaDraft::new(limits, store),
            picking: false,
            submitting: false,
            error: None,
        }
    }

    /// Seeds the form from a stored room and returns poster jobs for its
    /// videos.
    pub fn editing(
        form_id: u64,
        room: &RoomDetail,
        limits: MediaLimits,
        store: ObjectUrlStore,
    ) -> (Self, Vec<PosterJob>) {
        let (draft, jobs) = MediaDraft::with_existing(limits, store, &room.images, &room.videos);
        let state = Self {
            form_id,
            editing: Some(room.id.clone()),
            title: room.title.clone(),
            description: room.description.clone(),
            campus: room.campus.clone(),
            location: room.location.clone(),
            price: format_price_input(room.price),
            room_type: room.room_type.clone(),
            amenities: room.amenities.join(", "),
            draft,
            picking: false,
            submitting: false,
            error: None,
        };
        (state, jobs)
    }

    pub fn to_input(&self) -> Result<RoomInput, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title cannot be empty".into());
        }
        let price: f64 = self
            .price
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| "Price must be a number".to_string())?;
        if price < 0.0 {
            return Err("Price cannot be negative".into());
        }
        if self.campus.trim().is_empty() {
            return Err("Choose a campus".into());
        }
        let amenities = self
            .amenities
            .split(',')
            .map(str::trim)
            .filter(|amenity| !amenity.is_empty())
            .map(str::to_string)
            .collect();
        Ok(RoomInput {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            campus: self.campus.trim().to_string(),
            location: self.location.trim().to_string(),
            price,
            room_type: self.room_type.clone(),
            amenities,
        })
    }
}

fn format_price_input(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        price.to_string()
    }
}

#[derive(Default)]
pub struct SettingsState {
    pub api_url: String,
    pub token: String,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct LoadedImage {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}
