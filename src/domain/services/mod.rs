//! Catalog services
pub mod combinator;
pub mod matcher;
pub mod normalizer;
pub mod report;
pub mod synchronizer;

use std::future::Future;
use std::time::Duration;
use crate::StoreError;

/// Bounds a single store call; an elapsed call becomes [`StoreError::Timeout`].
pub async fn timed<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(limit, call).await.unwrap_or(Err(StoreError::Timeout(limit)))
}
