use async_trait::async_trait;

use crate::reading::Reading;

/// One category of external reading.
///
/// Implementations recover every per-call error into `Reading::Failure` and
/// enforce their own timeout.
#[async_trait]
pub trait Source: Send + Sync {
    type Output: Send + 'static;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Reading<Self::Output>;
}
