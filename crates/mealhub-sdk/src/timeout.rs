use std::future::Future;
use std::time::Duration;

use mealhub_store::{StoreError, StoreResult};

/// Run one external call under `limit`, reporting expiry as
/// [`StoreError::Timeout`]. Dropping the inner future cancels the call.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(
            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}
