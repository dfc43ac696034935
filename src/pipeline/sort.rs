use crate::models::Place;
use crate::pipeline::types::Category;
use std::cmp::{Ordering, Reverse};
use tracing::debug;

/// Order (and for some tabs, narrow) places for a featured tab.
/// An unknown category leaves the collection as it is.
pub fn sort_by_category(collection: &[Place], category: &str) -> Vec<Place> {
    match category.parse::<Category>() {
        Ok(category) => apply_category(collection.to_vec(), category),
        Err(e) => {
            debug!("{}, leaving order unchanged", e);
            collection.to_vec()
        }
    }
}

/// All sorts are stable, ties keep their incoming order.
pub fn apply_category(mut places: Vec<Place>, category: Category) -> Vec<Place> {
    match category {
        Category::New => {
            // None sorts below any timestamp, so undated places end up last
            places.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            places
        }
        Category::TopRated => {
            let mut rated: Vec<(f64, Place)> = places
                .into_iter()
                .filter_map(|place| place.average_rating().map(|avg| (avg, place)))
                .collect();
            rated.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
            rated.into_iter().map(|(_, place)| place).collect()
        }
        Category::Popular => {
            places.sort_by_key(|place| Reverse(place.reviews.len()));
            places
        }
        Category::Unique => {
            places.retain(|place| place.amenities.len() > 3);
            places
        }
    }
}

/// A category view capped at `limit` places
pub fn featured(collection: &[Place], category: Category, limit: usize) -> Vec<Place> {
    let mut places = apply_category(collection.to_vec(), category);
    places.truncate(limit);
    places
}
