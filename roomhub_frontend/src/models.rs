use serde::{Deserialize, Deserializer, Serialize};

pub const CAMPUSES: &[&str] = &[
    "University of Lagos",
    "University of Ibadan",
    "Obafemi Awolowo University",
    "University of Nigeria, Nsukka",
    "Covenant University",
];

pub const ROOM_TYPES: &[&str] = &["Single", "Shared", "Self-contained", "Apartment"];

/// Price brackets as the search endpoint expects them.
pub const PRICE_BRACKETS: &[(&str, &str)] = &[
    ("0-100000", "Under ₦100k"),
    ("100000-250000", "₦100k - ₦250k"),
    ("250000-500000", "₦250k - ₦500k"),
    ("500000+", "Above ₦500k"),
];

/// Room keys arrive as `_id` from the document store or as `id` from
/// serializers that rename it. `_id` wins when a payload carries both.
fn room_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    struct Keys {
        #[serde(rename = "_id")]
        mongo_id: Option<String>,
        id: Option<String>,
    }

    let keys = Keys::deserialize(deserializer)?;
    keys.mongo_id
        .or(keys.id)
        .ok_or_else(|| serde::de::Error::missing_field("_id"))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    #[serde(flatten, deserialize_with = "room_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub campus: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub room_type: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    #[serde(flatten, deserialize_with = "room_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub campus: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub room_type: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub agent: Option<AgentContact>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One page of search results. `rooms` is optional on the wire: an absent
/// collection is treated as the end of the results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRoomsResponse {
    #[serde(default)]
    pub rooms: Option<Vec<RoomSummary>>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RoomEnvelope {
    Wrapped { room: RoomDetail },
    Bare(RoomDetail),
}

impl RoomEnvelope {
    pub(crate) fn into_room(self) -> RoomDetail {
        match self {
            RoomEnvelope::Wrapped { room } | RoomEnvelope::Bare(room) => room,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RoomListEnvelope {
    Wrapped { rooms: Vec<RoomSummary> },
    Bare(Vec<RoomSummary>),
}

impl RoomListEnvelope {
    pub(crate) fn into_rooms(self) -> Vec<RoomSummary> {
        match self {
            RoomListEnvelope::Wrapped { rooms } | RoomListEnvelope::Bare(rooms) => rooms,
        }
    }
}

/// The filter set that scopes one feed generation. Empty strings mean
/// "any" and are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RoomFilters {
    pub search: String,
    pub campus: String,
    pub room_type: String,
    pub price_range: String,
}

impl RoomFilters {
    pub fn query_pairs(&self, page: u32, limit: u32) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        for (key, value) in [
            ("search", &self.search),
            ("campus", &self.campus),
            ("roomType", &self.room_type),
            ("priceRange", &self.price_range),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                pairs.push((key, value.to_string()));
            }
        }
        pairs.push(("page", page.to_string()));
        pairs.push(("limit", limit.to_string()));
        pairs
    }
}

/// Text fields of a listing as sent in create/update multipart bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomInput {
    pub title: String,
    pub description: String,
    pub campus: String,
    pub location: String,
    pub price: f64,
    pub room_type: String,
    pub amenities: Vec<String>,
}

impl RoomInput {
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("campus", self.campus.clone()),
            ("location", self.location.clone()),
            ("price", self.price.to_string()),
            ("roomType", self.room_type.clone()),
        ];
        fields.extend(self.amenities.iter().map(|amenity| ("amenities", amenity.clone())));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_filters_are_left_out_of_the_query() {
        let filters = RoomFilters {
            campus: "University of Lagos".into(),
            search: "  ".into(),
            ..RoomFilters::default()
        };
        assert_eq!(
            filters.query_pairs(1, 10),
            vec![
                ("campus", "University of Lagos".to_string()),
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
            ]
        );
    }

    #[test]
    fn search_response_tolerates_missing_rooms() {
        let page: SearchRoomsResponse = serde_json::from_str(r#"{"total": 0}"#).expect("parse");
        assert!(page.rooms.is_none());

        let page: SearchRoomsResponse = serde_json::from_str(
            r#"{
                "rooms": [
                    {"_id": "r1", "title": "Bright single", "price": 150000, "roomType": "Single"}
                ],
                "total": 1
            }"#,
        )
        .expect("parse");
        let rooms = page.rooms.expect("rooms");
        assert_eq!(rooms[0].id, "r1");
        assert_eq!(rooms[0].room_type, "Single");
        assert_eq!(rooms[0].price, 150000.0);
    }

    #[test]
    fn room_detail_accepts_wrapped_and_bare_records() {
        let room = r#"{
            "id": "r2",
            "title": "Shared flat",
            "images": ["a.jpg"],
            "videos": ["v.mp4"],
            "amenities": ["Wi-Fi"]
        }"#;
        let bare: RoomEnvelope = serde_json::from_str(room).expect("bare");
        let wrapped: RoomEnvelope =
            serde_json::from_str(&format!(r#"{{"room": {room}}}"#)).expect("wrapped");
        assert_eq!(bare.into_room(), wrapped.into_room());
    }

    #[test]
    fn document_key_wins_when_both_ids_are_sent() {
        let summary: RoomSummary = serde_json::from_str(
            r#"{"_id": "64f1c0", "id": "legacy-7", "title": "Annex room", "price": 80000}"#,
        )
        .expect("both keys");
        assert_eq!(summary.id, "64f1c0");

        let detail: RoomDetail =
            serde_json::from_str(r#"{"id": "legacy-7", "title": "Annex room"}"#).expect("id only");
        assert_eq!(detail.id, "legacy-7");

        let detail: RoomDetail = serde_json::from_str(
            r#"{"_id": "64f1c0", "id": "legacy-7", "title": "Annex room", "videos": ["v.mp4"]}"#,
        )
        .expect("detail with both keys");
        assert_eq!(detail.id, "64f1c0");
        assert_eq!(detail.videos, vec!["v.mp4".to_string()]);

        let missing = serde_json::from_str::<RoomSummary>(r#"{"title": "No key"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn amenities_repeat_in_text_fields() {
        let input = RoomInput {
            title: "Quiet room".into(),
            price: 90000.0,
            amenities: vec!["Wi-Fi".into(), "Water".into()],
            ..RoomInput::default()
        };
        let fields = input.text_fields();
        let amenities: Vec<_> = fields.iter().filter(|(key, _)| *key == "amenities").collect();
        assert_eq!(amenities.len(), 2);
        assert!(fields.contains(&("price", "90000".to_string())));
    }
}
