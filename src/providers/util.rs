use anyhow::{Error, anyhow};
use reqwest::Response;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Sends a request with retries on transport errors and 5xx responses.
///
/// # Parameters
/// - `operation`: Closure returning the request future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// The first response that is not a server error, or the last error once all
/// attempts are used up. 4xx responses are returned as-is for the caller to report.
pub async fn with_retry<F, Fut>(mut operation: F, retries: usize, delay_ms: u64) -> Result<Response, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        let err = match operation().await {
            Ok(response) if !response.status().is_server_error() => return Ok(response),
            Ok(response) => anyhow!(
                "Server error {} from {}",
                response.status(),
                response.url()
            ),
            Err(e) => Error::from(e),
        };

        if attempt > retries {
            return Err(err);
        }
        debug!(
            "Attempt {}/{} failed: {}. Retrying...",
            attempt, retries, err
        );
        attempt += 1;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Reads the body of a response, turning non-success statuses into errors that carry the body.
pub async fn read_success_body(response: Response, what: &str) -> Result<String, Error> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(anyhow!("{what} failed with status {status}: {body}"));
    }
    Ok(body)
}
