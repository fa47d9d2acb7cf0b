use serde::{Deserialize, Serialize};

/// Star ratings run from 1 to 5. A fresh draft carries 0 until the user picks one.
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub type PinId = String;

pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// A point on the map in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub long: f64,
}

impl LatLng {
    pub fn new(lat: f64, long: f64) -> Self {
        LatLng { lat, long }
    }
}

/// A place review as stored by the server.
///
/// The wire format keeps the field names the pins API has always used
/// (`_id`, `desc`, `lat`, `long`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    #[serde(rename = "_id", alias = "id")]
    pub id: PinId,
    pub username: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub rating: u8,
    pub lat: f64,
    pub long: f64,
    pub created_at: String,
}

impl Pin {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.long)
    }
}

/// Body of `POST /pins`. Title and description are sent as `null` when the
/// user never typed into them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPin {
    pub username: String,
    pub title: Option<String>,
    pub desc: Option<String>,
    pub rating: u8,
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
}
