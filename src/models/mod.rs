use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::session::Session;

/// Kind of property a place is listed as
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Cabin,
    /// Anything the backend sends that we don't have a variant for
    Other(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Cabin => "cabin",
            PropertyType::Other(value) => value,
        }
    }
}

impl From<&str> for PropertyType {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "apartment" => PropertyType::Apartment,
            "house" => PropertyType::House,
            "villa" => PropertyType::Villa,
            "cabin" => PropertyType::Cabin,
            _ => PropertyType::Other(value.to_string()),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PropertyType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PropertyType::from(raw.as_str()))
    }
}

/// Amenity that can be attached to any number of places
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Amenity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// How a place refers to one of its amenities.
///
/// Listing endpoints return bare names, detail endpoints full objects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmenityRef {
    Name(String),
    Full(Amenity),
}

impl AmenityRef {
    pub fn name(&self) -> &str {
        match self {
            AmenityRef::Name(name) => name,
            AmenityRef::Full(amenity) => &amenity.name,
        }
    }
}

/// A review left by a user on a place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// 1 to 5
    pub rating: u8,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Core listing model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub amenities: Vec<AmenityRef>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Place {
    /// Case-insensitive, like the names kept in filter criteria
    pub fn has_amenity(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.amenities
            .iter()
            .any(|amenity| amenity.name().trim().to_lowercase() == wanted)
    }

    /// Mean review rating, `None` when nobody reviewed the place yet
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(f64::from(sum) / self.reviews.len() as f64)
    }
}

/// A registered user (host or guest)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub places: Vec<Place>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// What the backend answers to a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Session {
            token: response.access_token,
            user_id: response.user_id,
        }
    }
}

/// Body of `POST /users`
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Body of `POST /places`
#[derive(Debug, Clone, Serialize)]
pub struct NewPlace {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    pub owner_id: String,
    /// Amenity ids
    pub amenities: Vec<String>,
}

/// Body of `POST /amenities`
#[derive(Debug, Clone, Serialize)]
pub struct NewAmenity {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Problems caught before a payload ever leaves the client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Review text is required")]
    EmptyText,

    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),
}

fn check_rating(rating: u8) -> Result<(), ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ValidationError::RatingOutOfRange(rating))
    }
}

/// Body of `POST /reviews`
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub text: String,
    pub rating: u8,
    pub place_id: String,
    pub user_id: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        check_rating(self.rating)
    }
}

/// Body of `PUT /reviews/{id}`; only the fields that are set get sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl ReviewUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                return Err(ValidationError::EmptyText);
            }
        }
        match self.rating {
            Some(rating) => check_rating(rating),
            None => Ok(()),
        }
    }
}
