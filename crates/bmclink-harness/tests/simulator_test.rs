//! Simulator behavior: built-ins, handler overrides, boot-option store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bmclink_client::Client;
use bmclink_harness::Simulator;
use bmclink_proto::payloads::app::DeviceIdResponse;
use bmclink_proto::payloads::chassis::{
    BOOT_PARAM_BOOT_FLAGS, BootDevice, ChassisControl,
};
use bmclink_proto::{Command, CompletionCode, NetFn};

async fn start() -> Simulator {
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
async fn chassis_status_reports_power_on() {
    let simulator = start().await;
    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    let status = client.chassis_status().await.expect("status");
    assert!(status.is_power_on());
    assert_eq!("on", status.to_string());

    client.close().await.expect("close");
}

#[tokio::test]
async fn boot_options_round_trip_through_store() {
    let simulator = start().await;
    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    client.set_boot_device(BootDevice::Pxe).await.expect("set boot device");

    let flags = client.boot_options(BOOT_PARAM_BOOT_FLAGS).await.expect("get boot options");
    assert_eq!(0x01, flags.version);
    assert_eq!(BOOT_PARAM_BOOT_FLAGS, flags.param);
    assert_eq!([0x80, 0x04, 0x00, 0x00, 0x00], flags.data.as_slice());
    assert_eq!(Some(BootDevice::Pxe), flags.boot_device_selector());

    client.close().await.expect("close");
}

#[tokio::test]
async fn handler_override_replaces_builtin() {
    let simulator = start().await;
    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    for manufacturer in [674u16, 11] {
        simulator.set_handler(NetFn::APP, Command::GET_DEVICE_ID, move |_| {
            Box::new(DeviceIdResponse {
                completion_code: CompletionCode::COMPLETED,
                manufacturer_id: manufacturer.into(),
                ..Default::default()
            })
        });

        let device = client.device_id().await.expect("device id");
        assert_eq!(manufacturer, device.manufacturer_id.get());
    }

    client.close().await.expect("close");
}

#[tokio::test]
async fn failing_handlers_surface_through_compound_operations() {
    let simulator = start().await;
    for command in [Command::CHASSIS_CONTROL, Command::SET_SYSTEM_BOOT_OPTIONS] {
        simulator.set_handler(NetFn::CHASSIS, command, |_| {
            Box::new(CompletionCode::UNSPECIFIED)
        });
    }

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    let err = client.set_boot_device(BootDevice::Pxe).await.unwrap_err();
    assert_eq!(err, CompletionCode::UNSPECIFIED);

    let err = client.control(ChassisControl::PowerCycle).await.unwrap_err();
    assert_eq!(err, CompletionCode::UNSPECIFIED);

    // Replace the failing handlers; both operations recover.
    let called_control = Arc::new(AtomicBool::new(false));
    let called_options = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&called_control);
    simulator.set_handler(NetFn::CHASSIS, Command::CHASSIS_CONTROL, move |message| {
        flag.store(true, Ordering::SeqCst);
        assert_eq!(Some("vmware"), message.requester.as_deref());
        Box::new(CompletionCode::COMPLETED)
    });

    let flag = Arc::clone(&called_options);
    simulator.set_handler(NetFn::CHASSIS, Command::SET_SYSTEM_BOOT_OPTIONS, move |message| {
        flag.store(true, Ordering::SeqCst);
        assert_eq!(Some("vmware"), message.requester.as_deref());
        Box::new(CompletionCode::COMPLETED)
    });

    client.set_boot_device(BootDevice::Pxe).await.expect("set boot device");
    assert!(called_options.load(Ordering::SeqCst));

    client.control(ChassisControl::PowerCycle).await.expect("control");
    assert!(called_control.load(Ordering::SeqCst));

    client.close().await.expect("close");
}
