use crate::utils::error::CustomError;
use std::future::Future;
use std::time::Duration;

const READ_ATTEMPTS: usize = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);

/// Retry a read-only store operation with exponential backoff.
///
/// Only queries go through here; multi-step mutations fail as a whole and
/// the caller retries the logical operation instead.
pub async fn with_read_retry<T, F, Fut>(op: F) -> Result<T, CustomError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, mongodb::error::Error>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut last_error = String::new();

    for attempt in 1..=READ_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = e.to_string();
                if attempt < READ_ATTEMPTS {
                    log::warn!(
                        "store read failed (attempt {}/{}): {}",
                        attempt,
                        READ_ATTEMPTS,
                        last_error
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    Err(CustomError::StoreUnavailable(last_error))
}
