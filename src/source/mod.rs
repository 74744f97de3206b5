//! Stream resolution collaborator.

mod dto;
pub mod http;

use async_trait::async_trait;

use crate::domain::{StreamRef, StreamUrls};
use crate::error::ResolveError;

pub use http::{HttpStreamResolver, ResolverConfig};

/// Looks up a playable audio URL plus ordered backups. No retries at this boundary.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve(&self, stream: &StreamRef) -> Result<StreamUrls, ResolveError>;
}
