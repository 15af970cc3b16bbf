//! End-to-end session establishment against the simulator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bmclink_client::Client;
use bmclink_harness::Simulator;
use bmclink_proto::payloads::chassis::ChassisControl;
use bmclink_proto::{Command, CompletionCode, NetFn};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

async fn start() -> Simulator {
    init_logging();
    let mut simulator = Simulator::bind("127.0.0.1:0").await.expect("bind simulator");
    simulator.run();
    simulator
}

fn client_for(simulator: &Simulator) -> Client {
    let mut connection = simulator.new_connection();
    connection.username = "vmware".to_string();
    connection.password = "cow".to_string();
    Client::new(connection)
}

#[tokio::test]
async fn md5_handshake_reaches_ready_state() {
    let simulator = start().await;
    let mut client = client_for(&simulator);

    client.open().await.expect("handshake should complete");

    let device = client.device_id().await.expect("device id");
    assert_eq!(0x51, device.ipmi_version);

    client.close().await.expect("close");
}

#[tokio::test]
async fn session_id_is_username_digest() {
    let simulator = start().await;

    let expected = {
        let mut hasher = adler2::Adler32::new();
        hasher.write_slice(b"vmware");
        hasher.checksum()
    };
    assert_ne!(0, expected);

    let seen = Arc::new(AtomicU32::new(0));
    let capture = Arc::clone(&seen);
    simulator.set_handler(NetFn::CHASSIS, Command::CHASSIS_CONTROL, move |message| {
        capture.store(message.session.session_id.get(), Ordering::SeqCst);
        Box::new(CompletionCode::COMPLETED)
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");
    client.control(ChassisControl::PowerCycle).await.expect("control");
    client.close().await.expect("close");

    assert_eq!(expected, seen.load(Ordering::SeqCst));
}

#[tokio::test]
async fn requester_identity_propagates_to_handlers() {
    let simulator = start().await;

    let seen = Arc::new(std::sync::Mutex::new(None));
    let capture = Arc::clone(&seen);
    simulator.set_handler(NetFn::CHASSIS, Command::CHASSIS_CONTROL, move |message| {
        *capture.lock().unwrap() = message.requester.clone();
        Box::new(CompletionCode::COMPLETED)
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");
    client.control(ChassisControl::PowerUp).await.expect("control");
    client.close().await.expect("close");

    assert_eq!(Some("vmware".to_string()), *seen.lock().unwrap());
}

#[tokio::test]
async fn injected_error_code_reaches_caller_unchanged() {
    let simulator = start().await;
    simulator.set_handler(NetFn::CHASSIS, Command::CHASSIS_CONTROL, |_| {
        Box::new(CompletionCode::UNSPECIFIED)
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    let err = client.control(ChassisControl::PowerDown).await.unwrap_err();
    assert_eq!(err, CompletionCode::UNSPECIFIED);

    client.close().await.expect("close");
}

#[tokio::test]
async fn unknown_command_is_invalid() {
    let simulator = start().await;
    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    let request = bmclink_proto::Request::new(NetFn::APP, Command(0xfe), &());
    let err = client.send::<CompletionCode>(&request).await.unwrap_err();
    assert_eq!(err, CompletionCode::INVALID_COMMAND);

    client.close().await.expect("close");
}
