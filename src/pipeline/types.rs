use crate::models::PropertyType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Filter criteria chosen on the results page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Minimum nightly price
    pub min_price: Option<f64>,
    /// Maximum nightly price
    pub max_price: Option<f64>,
    /// Minimum number of bedrooms
    pub min_bedrooms: Option<u32>,
    pub property_type: Option<PropertyType>,
    /// Every one of these must be on the place
    #[serde(default)]
    pub amenities: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_bedrooms.is_none()
            && self.property_type.is_none()
            && self.amenities.is_empty()
    }

    pub fn min_price(mut self, value: f64) -> Self {
        self.min_price = Some(value);
        self
    }

    pub fn max_price(mut self, value: f64) -> Self {
        self.max_price = Some(value);
        self
    }

    pub fn min_bedrooms(mut self, value: u32) -> Self {
        self.min_bedrooms = Some(value);
        self
    }

    pub fn property_type(mut self, value: PropertyType) -> Self {
        self.property_type = Some(value);
        self
    }

    /// Amenity names are stored lowercased, matching is case-insensitive
    pub fn amenity(mut self, name: impl AsRef<str>) -> Self {
        self.require_amenity(name.as_ref());
        self
    }

    pub fn require_amenity(&mut self, name: &str) {
        self.amenities.insert(normalize_amenity(name));
    }

    /// Add the amenity if missing, remove it if present
    pub fn toggle_amenity(&mut self, name: &str) {
        let name = normalize_amenity(name);
        if !self.amenities.remove(&name) {
            self.amenities.insert(name);
        }
    }

    /// Criteria that narrow at least as much as both inputs.
    ///
    /// Numeric bounds keep the tighter value. If both sides name a
    /// different property type, `other` wins.
    pub fn union(&self, other: &FilterCriteria) -> FilterCriteria {
        FilterCriteria {
            min_price: tighter(self.min_price, other.min_price, f64::max),
            max_price: tighter(self.max_price, other.max_price, f64::min),
            min_bedrooms: tighter(self.min_bedrooms, other.min_bedrooms, u32::max),
            property_type: other.property_type.clone().or_else(|| self.property_type.clone()),
            amenities: self
                .amenities
                .iter()
                .chain(&other.amenities)
                .map(|name| normalize_amenity(name))
                .collect(),
        }
    }
}

pub fn normalize_amenity(name: &str) -> String {
    name.trim().to_lowercase()
}

fn tighter<T>(a: Option<T>, b: Option<T>, pick: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

/// Featured-places tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Newest first
    New,
    /// Reviewed places, best mean rating first
    TopRated,
    /// Most reviewed first
    Popular,
    /// More than three amenities
    Unique,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::New,
        Category::TopRated,
        Category::Popular,
        Category::Unique,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::New => "new",
            Category::TopRated => "top-rated",
            Category::Popular => "popular",
            Category::Unique => "unique",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Category::New),
            "top-rated" | "top_rated" | "toprated" => Ok(Category::TopRated),
            "popular" => Ok(Category::Popular),
            "unique" => Ok(Category::Unique),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}
