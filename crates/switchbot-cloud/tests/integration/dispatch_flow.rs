//! Integration Tests: Single Command Flow
//!
//! One invocation against the mock endpoint, from signing through
//! classification.

use super::mock_vendor::{credentials, MockVendor, Reply, TOKEN};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use switchbot_cloud::{
    CloudConfig, CommandBody, CommandResult, Credentials, DeviceDescriptor, Dispatcher,
    SignatureEncoding, TransportCause,
};

fn turn_on() -> DeviceDescriptor {
    DeviceDescriptor::new("D1", "Desk Lamp", "turnOn", "command", "default")
}

fn dispatcher(mock: &MockVendor) -> Dispatcher {
    Dispatcher::new(&credentials(), CloudConfig::local(mock.base_url.clone())).expect("dispatcher")
}

#[tokio::test]
async fn test_success_round_trip() {
    let mock = MockVendor::start(Reply::success()).await;

    let result = dispatcher(&mock).execute(&turn_on()).await;

    assert_eq!(result, CommandResult::Success { device_id: "D1".into() });
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn test_wire_format_seen_by_vendor() {
    let mock = MockVendor::start(Reply::success()).await;

    dispatcher(&mock).execute(&turn_on()).await;

    let captured = mock.captured();
    assert_eq!(captured.len(), 1);

    let request = &captured[0];
    assert_eq!(request.device_id, "D1");
    assert_eq!(request.headers["authorization"], TOKEN);
    assert!(request.headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert!(request.headers["t"].to_str().unwrap().parse::<i64>().is_ok());
    assert!(!request.headers["nonce"].is_empty());
    assert_eq!(
        request.body,
        Some(CommandBody {
            command: "turnOn".into(),
            parameter: "default".into(),
            command_type: "command".into(),
        })
    );
}

#[tokio::test]
async fn test_vendor_error_code() {
    let mock = MockVendor::start(Reply::json(
        200,
        json!({"statusCode": 190, "message": "Device not found"}),
    ))
    .await;

    let result = dispatcher(&mock).execute(&turn_on()).await;

    assert_eq!(
        result,
        CommandResult::ApiError {
            device_id: "D1".into(),
            code: 190,
            message: "Device not found".into(),
        }
    );
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let mock = MockVendor::start(Reply::success()).await;
    let dispatcher = Dispatcher::new(
        &Credentials::new(TOKEN, "not-the-secret"),
        CloudConfig::local(mock.base_url.clone()),
    )
    .unwrap();

    let result = dispatcher.execute(&turn_on()).await;

    assert_eq!(
        result,
        CommandResult::ApiError {
            device_id: "D1".into(),
            code: 401,
            message: "Unauthorized".into(),
        }
    );
}

#[tokio::test]
async fn test_uppercase_signature_is_rejected_by_reference_vendor() {
    let mock = MockVendor::start(Reply::success()).await;
    let mut config = CloudConfig::local(mock.base_url.clone());
    config.signature_encoding = SignatureEncoding::Uppercase;

    let result = Dispatcher::new(&credentials(), config).unwrap().execute(&turn_on()).await;

    assert_eq!(result.kind(), "api_error");
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn test_server_error() {
    let mock = MockVendor::start(Reply {
        status: 500,
        body: "upstream exploded".into(),
        delay: Duration::ZERO,
    })
    .await;

    let result = dispatcher(&mock).execute(&turn_on()).await;

    assert_eq!(
        result,
        CommandResult::ApiError {
            device_id: "D1".into(),
            code: 500,
            message: "unexpected response".into(),
        }
    );
}

#[tokio::test]
async fn test_timeout() {
    let mock = MockVendor::start(Reply::hang()).await;
    let config = CloudConfig::local(mock.base_url.clone()).with_timeout(Duration::from_millis(300));
    let dispatcher = Dispatcher::new(&credentials(), config).unwrap();

    let started = std::time::Instant::now();
    let result = dispatcher.execute(&turn_on()).await;

    assert_eq!(
        result,
        CommandResult::TransportError {
            device_id: "D1".into(),
            cause: TransportCause::Timeout,
        }
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_missing_command_sends_nothing() {
    let mock = MockVendor::start(Reply::success()).await;
    let descriptor = DeviceDescriptor::new("D1", "Desk Lamp", "", "command", "default");

    let result = dispatcher(&mock).invoke(descriptor).await.unwrap();

    assert_eq!(result.kind(), "config_defect");
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn test_every_attempt_is_freshly_signed() {
    let mock = MockVendor::start(Reply::success()).await;
    let dispatcher = dispatcher(&mock);

    dispatcher.execute(&turn_on()).await;
    dispatcher.execute(&turn_on()).await;

    let captured = mock.captured();
    assert_eq!(captured.len(), 2);
    assert_ne!(captured[0].headers["nonce"], captured[1].headers["nonce"]);
    assert_ne!(captured[0].headers["sign"], captured[1].headers["sign"]);
}
