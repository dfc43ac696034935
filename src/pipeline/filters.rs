use crate::models::Place;
use crate::pipeline::types::FilterCriteria;

/// Narrow `collection` by every criterion that is set.
///
/// Unset criteria never exclude anything. A place missing the field a set
/// criterion compares against is excluded.
pub fn apply_filters(collection: &[Place], criteria: &FilterCriteria) -> Vec<Place> {
    collection
        .iter()
        .filter(|place| matches(place, criteria))
        .cloned()
        .collect()
}

/// Whether a single place passes all the set criteria
pub fn matches(place: &Place, criteria: &FilterCriteria) -> bool {
    if let Some(min) = criteria.min_price {
        if !place.price.is_some_and(|price| price >= min) {
            return false;
        }
    }

    if let Some(max) = criteria.max_price {
        if !place.price.is_some_and(|price| price <= max) {
            return false;
        }
    }

    if let Some(min) = criteria.min_bedrooms {
        if !place.bedrooms.is_some_and(|bedrooms| bedrooms >= min) {
            return false;
        }
    }

    if let Some(wanted) = &criteria.property_type {
        if place.property_type.as_ref() != Some(wanted) {
            return false;
        }
    }

    criteria
        .amenities
        .iter()
        .all(|name| place.has_amenity(name))
}
