//! Timeout helpers for background calls
//!
//! Background steps are bounded so they stay genuinely non-blocking; a call
//! that runs past its bound degrades to "unknown" instead of failing the flow.

use std::{future::Future, time::Duration};
use tokio::time::timeout;

/// Error type for bounded operations
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),

    /// Operation finished with its own error
    #[error("{0}")]
    Inner(E),
}

/// Run a fallible future with a deadline
///
/// # Example
///
/// ```
/// use fortune_cookie::timeouts::{with_timeout, TimeoutError};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let result: Result<u8, TimeoutError<std::io::Error>> =
///     with_timeout(Duration::from_millis(50), async { Ok(7) }).await;
/// assert_eq!(result.unwrap(), 7);
/// # }
/// ```
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Elapsed(duration)),
    }
}
