pub mod client;
pub mod error;
pub mod guard;
pub mod http;
pub mod traits;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind};
pub use guard::SessionGuard;
pub use http::ReqwestTransport;
pub use traits::Transport;
pub use types::{ApiRequest, ApiResponse, ClientConfig};
