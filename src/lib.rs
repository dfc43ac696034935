pub mod config;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod session;

pub use gateway::{ApiClient, ApiError, ApiErrorKind, SessionGuard};
pub use models::{Amenity, Place, PropertyType, Review, User};
pub use pipeline::{Category, FilterCriteria, PlaceResults};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
