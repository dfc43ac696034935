use crate::models::Place;

/// Keep places whose title or description contains `query`, ignoring case.
/// A blank query keeps everything.
pub fn apply_text_search(collection: &[Place], query: &str) -> Vec<Place> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return collection.to_vec();
    }

    collection
        .iter()
        .filter(|place| {
            place.title.to_lowercase().contains(&needle)
                || place.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
