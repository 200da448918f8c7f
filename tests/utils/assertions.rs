use std::future::Future;
use std::time::Duration;

use signal_relay::{RoomEvent, Subscription};

const WAIT: Duration = Duration::from_secs(1);

/// Waits for the next event on a subscription, failing the test on timeout
pub async fn expect_event(subscription: &mut Subscription) -> RoomEvent {
    match tokio::time::timeout(WAIT, subscription.recv()).await {
        Ok(Some(event)) => event,
        Ok(None) => panic!("{} stream ended unexpectedly", subscription.identity()),
        Err(_) => panic!("{} received no event", subscription.identity()),
    }
}

/// Asserts nothing arrives for a short while
#[allow(dead_code)]
pub async fn expect_no_event(subscription: &mut Subscription) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(event) = subscription.try_recv() {
        panic!(
            "{} received unexpected event {:?}",
            subscription.identity(),
            event
        );
    }
}

/// Asserts the subscription's stream has ended
#[allow(dead_code)]
pub async fn expect_stream_end(subscription: &mut Subscription) {
    match tokio::time::timeout(WAIT, subscription.recv()).await {
        Ok(None) => {}
        Ok(Some(event)) => panic!("expected end of stream, got {:?}", event),
        Err(_) => panic!("stream did not end"),
    }
}

/// Polls a condition until it holds or a second has passed
#[allow(dead_code)]
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
