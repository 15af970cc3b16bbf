//! Client façade driven end-to-end over the LAN transport.

use std::sync::{Arc, Mutex};

use bmclink_client::Client;
use bmclink_harness::Simulator;
use bmclink_proto::codec::Response;
use bmclink_proto::payloads::chassis::BootDevice;
use bmclink_proto::payloads::dcmi::{
    GetMcIdResponse, GetMcIdRequest, SetMcIdRequest, SetMcIdResponse,
};
use bmclink_proto::payloads::user::{
    GetUserNameRequest, GetUserNameResponse, SetUserNameRequest,
};
use bmclink_proto::{Command, CompletionCode, Encode, NetFn};

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
async fn open_identify_close() {
    let simulator = start().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let capture = Arc::clone(&seen);
    simulator.set_handler(NetFn::CHASSIS, Command::CHASSIS_IDENTIFY, move |message| {
        capture.lock().unwrap().push(message.data.clone());
        Box::new(CompletionCode::COMPLETED)
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    client.identify(15, false).await.expect("identify");
    client.identify(0, true).await.expect("identify forced");
    client.close().await.expect("close");

    let calls = seen.lock().unwrap();
    assert_eq!(2, calls.len());
    assert_eq!([15, 0], calls[0].as_slice());
    assert_eq!([0, 1], calls[1].as_slice());
}

#[tokio::test]
async fn set_boot_device_emits_safe_write_sequence() {
    let simulator = start().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let capture = Arc::clone(&seen);
    simulator.set_handler(NetFn::CHASSIS, Command::SET_SYSTEM_BOOT_OPTIONS, move |message| {
        capture.lock().unwrap().push(message.data.clone());
        Box::new(CompletionCode::COMPLETED)
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");
    client.set_boot_device(BootDevice::Pxe).await.expect("set boot device");
    client.close().await.expect("close");

    let calls = seen.lock().unwrap();
    let expected: Vec<Vec<u8>> = vec![
        vec![0x00, 0x01],                         // set-in-progress
        vec![0x01, 0x01, 0x01],                   // info-ack
        vec![0x05, 0x80, 0x04, 0x00, 0x00, 0x00], // boot flags: valid, pxe
        vec![0x00, 0x02],                         // commit-write
        vec![0x00, 0x00],                         // set-complete
    ];
    assert_eq!(expected, *calls);
}

#[tokio::test]
async fn set_boot_device_efi_sets_the_efi_flag() {
    let simulator = start().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let capture = Arc::clone(&seen);
    simulator.set_handler(NetFn::CHASSIS, Command::SET_SYSTEM_BOOT_OPTIONS, move |message| {
        capture.lock().unwrap().push(message.data.clone());
        Box::new(CompletionCode::COMPLETED)
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");
    client.set_boot_device_efi(BootDevice::Cdrom, true).await.expect("set boot device");
    client.close().await.expect("close");

    let calls = seen.lock().unwrap();
    assert_eq!(vec![0x05, 0xa0, 0x14, 0x00, 0x00, 0x00], calls[2]);
}

#[tokio::test]
async fn set_boot_device_skips_progress_envelope_when_unsupported() {
    let simulator = start().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let capture = Arc::clone(&seen);
    simulator.set_handler(NetFn::CHASSIS, Command::SET_SYSTEM_BOOT_OPTIONS, move |message| {
        capture.lock().unwrap().push(message.data.clone());
        // the progress parameter is not supported on this BMC
        if message.data.first() == Some(&0x00) {
            Box::new(CompletionCode::INVALID_PACKET) as Box<dyn Encode + Send>
        } else {
            Box::new(CompletionCode::COMPLETED)
        }
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");
    client.set_boot_device(BootDevice::Disk).await.expect("set boot device");
    client.close().await.expect("close");

    let calls = seen.lock().unwrap();
    let expected: Vec<Vec<u8>> = vec![
        vec![0x00, 0x01],                         // rejected set-in-progress
        vec![0x01, 0x01, 0x01],                   // info-ack
        vec![0x05, 0x80, 0x08, 0x00, 0x00, 0x00], // boot flags: valid, disk
    ];
    assert_eq!(expected, *calls);
}

#[tokio::test]
async fn username_round_trip_through_custom_handlers() {
    let simulator = start().await;

    let store: Arc<Mutex<std::collections::HashMap<u8, String>>> =
        Arc::new(Mutex::new(std::collections::HashMap::new()));

    let set_store = Arc::clone(&store);
    simulator.set_handler(NetFn::APP, Command::SET_USER_NAME, move |message| {
        match SetUserNameRequest::parse(&message.data) {
            Ok(request) => {
                set_store.lock().unwrap().insert(request.user_id, request.username);
                Box::new(CompletionCode::COMPLETED) as Box<dyn Encode + Send>
            }
            Err(_) => Box::new(CompletionCode::INVALID_PACKET),
        }
    });

    let get_store = Arc::clone(&store);
    simulator.set_handler(NetFn::APP, Command::GET_USER_NAME, move |message| {
        match GetUserNameRequest::parse(&message.data) {
            Ok(request) => {
                let username =
                    get_store.lock().unwrap().get(&request.user_id).cloned().unwrap_or_default();
                Box::new(GetUserNameResponse {
                    completion_code: CompletionCode::COMPLETED,
                    username,
                }) as Box<dyn Encode + Send>
            }
            Err(_) => Box::new(CompletionCode::INVALID_PACKET),
        }
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    client.set_username(2, "operator").await.expect("set username");
    assert_eq!("operator", client.get_username(2).await.expect("get username"));
    assert_eq!("", client.get_username(3).await.expect("get unset slot"));

    client.close().await.expect("close");
}

#[tokio::test]
async fn mc_id_string_round_trip_through_custom_handlers() {
    let simulator = start().await;

    let stored: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));

    let set_stored = Arc::clone(&stored);
    simulator.set_handler(NetFn::DCMI, Command::SET_MC_ID_STRING, move |message| {
        match SetMcIdRequest::parse(&message.data) {
            Ok(request) => {
                let written = request.num_bytes;
                *set_stored.lock().unwrap() = request.data;
                Box::new(SetMcIdResponse {
                    completion_code: CompletionCode::COMPLETED,
                    group_extension_id: request.group_extension_id,
                    last_offset_written: written,
                }) as Box<dyn Encode + Send>
            }
            Err(_) => Box::new(CompletionCode::INVALID_PACKET),
        }
    });

    let get_stored = Arc::clone(&stored);
    simulator.set_handler(NetFn::DCMI, Command::GET_MC_ID_STRING, move |message| {
        match GetMcIdRequest::parse(&message.data) {
            Ok(request) => {
                let data = get_stored.lock().unwrap().clone();
                Box::new(GetMcIdResponse {
                    completion_code: CompletionCode::COMPLETED,
                    group_extension_id: request.group_extension_id,
                    num_bytes: data.len() as u8,
                    data,
                }) as Box<dyn Encode + Send>
            }
            Err(_) => Box::new(CompletionCode::INVALID_PACKET),
        }
    });

    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    client.set_mc_id_string("abcdefghijkl").await.expect("set mc id");
    assert_eq!("abcdefghijkl", client.get_mc_id_string().await.expect("get mc id"));

    client.close().await.expect("close");
}

#[tokio::test]
async fn generic_send_decodes_typed_responses() {
    let simulator = start().await;
    let mut client = client_for(&simulator);
    client.open().await.expect("handshake");

    // A bare completion code is itself a valid response type.
    let request = bmclink_proto::Request::new(NetFn::APP, Command::CLOSE_SESSION, &());
    let code: CompletionCode = client.send(&request).await.expect("send");
    assert_eq!(code, code.completion_code());
    assert!(code.is_success());

    client.close().await.expect("close");
}
