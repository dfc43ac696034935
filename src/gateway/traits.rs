use crate::gateway::types::{ApiRequest, ApiResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for whatever actually moves bytes to the backend.
/// The client builds requests and interprets responses; a transport only sends them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request. `Err` means no response was received at all.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}
