use std::future::Future;
use std::time::Duration;

/// Polls `check` until it returns true or two seconds pass.
///
/// Asynchronously published events are handled on spawned tasks, so effects
/// show up some time after `publish` returns.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if check().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
