//! Integration Tests: Concurrent Commands
//!
//! Two clicks on two devices are independent units of work: a slow device
//! must not hold up a fast one, and results come back in completion order.

use super::mock_vendor::{credentials, MockVendor, Reply};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use switchbot_cloud::{CloudConfig, CommandResult, DeviceDescriptor, Dispatcher, TransportCause};
use tokio::sync::mpsc;

const SLOW: Duration = Duration::from_millis(800);

async fn mock_with_slow_device() -> MockVendor {
    let mut replies = HashMap::new();
    replies.insert("SLOW".to_string(), Reply::success().after(SLOW));
    MockVendor::start_with(replies, Reply::success()).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fast_device_is_not_blocked_by_slow_one() {
    let mock = mock_with_slow_device().await;
    let dispatcher = Dispatcher::new(&credentials(), CloudConfig::local(mock.base_url.clone())).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let started = Instant::now();
    dispatcher.invoke_into(DeviceDescriptor::native("SLOW", "Heater", "turnOn"), tx.clone());
    dispatcher.invoke_into(DeviceDescriptor::native("FAST", "Lamp", "turnOn"), tx);

    let first = rx.recv().await.unwrap();
    let first_at = started.elapsed();
    let second = rx.recv().await.unwrap();
    let total = started.elapsed();

    assert_eq!(first.result, CommandResult::Success { device_id: "FAST".into() });
    assert_eq!(second.result, CommandResult::Success { device_id: "SLOW".into() });
    assert!(first_at < SLOW, "fast device waited {:?}", first_at);
    assert!(total < SLOW * 2, "calls ran serially: {:?}", total);
    assert_eq!(mock.hits(), 2);

    // channel closes once both tasks have delivered
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_hung_device_times_out_while_other_succeeds() {
    let mut replies = HashMap::new();
    replies.insert("HUNG".to_string(), Reply::hang());
    let mock = MockVendor::start_with(replies, Reply::success()).await;

    let config = CloudConfig::local(mock.base_url.clone()).with_timeout(Duration::from_millis(400));
    let dispatcher = Dispatcher::new(&credentials(), config).unwrap();

    let hung = dispatcher.invoke(DeviceDescriptor::native("HUNG", "Plug", "turnOff"));
    let ok = dispatcher.invoke(DeviceDescriptor::native("OK", "Lamp", "turnOff"));

    let (hung, ok) = tokio::join!(hung, ok);

    assert_eq!(
        hung.unwrap(),
        CommandResult::TransportError {
            device_id: "HUNG".into(),
            cause: TransportCause::Timeout,
        }
    );
    assert!(ok.unwrap().is_success());
}

#[tokio::test]
async fn test_same_device_twice_is_not_deduplicated() {
    let mock = MockVendor::start(Reply::success()).await;
    let dispatcher = Dispatcher::new(&credentials(), CloudConfig::local(mock.base_url.clone())).unwrap();
    let lamp = DeviceDescriptor::native("D1", "Lamp", "turnOn");

    let (a, b) = tokio::join!(dispatcher.invoke(lamp.clone()), dispatcher.invoke(lamp));

    assert!(a.unwrap().is_success());
    assert!(b.unwrap().is_success());
    assert_eq!(mock.hits(), 2);
}
