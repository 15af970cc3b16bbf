//! Subprocess transport against a fake helper executable.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

use bmclink_client::{Client, Connection, Error, Interface};

/// Materialize an executable shell script standing in for `ipmitool`.
fn fake_helper(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("fake-ipmitool");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write helper");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod helper");
    path
}

fn client_with(path: PathBuf, interface: Interface) -> Client {
    Client::new(Connection {
        hostname: "bmc.example".to_string(),
        port: Some(1623),
        username: "root".to_string(),
        password: "calvin".to_string(),
        interface,
        path: Some(path),
    })
}

#[tokio::test]
async fn device_id_parses_helper_hex_output() {
    let dir = TempDir::new().expect("tempdir");
    // Device ID reply without the completion code the helper consumed.
    let helper = fake_helper(&dir, r#"echo " 20 01 03 16 51 00 bf 02 57 01""#);

    let mut client = client_with(helper, Interface::Lanplus);
    client.open().await.expect("open is a no-op");

    let device = client.device_id().await.expect("device id");
    assert_eq!(0x51, device.ipmi_version);
    assert_eq!(0x20, device.device_id);
    assert_eq!(0x02bf, device.manufacturer_id.get());
    assert_eq!(0x0157, device.product_id.get());

    client.close().await.expect("close is a no-op");
}

#[tokio::test]
async fn lan_interface_with_path_also_uses_the_helper() {
    let dir = TempDir::new().expect("tempdir");
    let helper = fake_helper(&dir, r#"echo " 20 01 03 16 51 00 bf 02 57 01""#);

    let mut client = client_with(helper, Interface::Lan);
    let device = client.device_id().await.expect("device id");
    assert_eq!(0x51, device.ipmi_version);
}

#[tokio::test]
async fn helper_arguments_carry_flags_and_hex_bytes() {
    let dir = TempDir::new().expect("tempdir");
    let args_file = dir.path().join("args");
    let helper = fake_helper(
        &dir,
        &format!("echo \"$@\" > {}\necho \"\"", args_file.display()),
    );

    let mut client = client_with(helper, Interface::Lanplus);
    let request = bmclink_proto::Request::new(
        bmclink_proto::NetFn::DCMI,
        bmclink_proto::Command::GET_MC_ID_STRING,
        &bmclink_proto::payloads::dcmi::GetMcIdRequest::new(0, 0x10),
    );
    let _: bmclink_proto::CompletionCode =
        client.send(&request).await.expect("empty reply decodes as success");

    let recorded = fs::read_to_string(&args_file).expect("read recorded args");
    assert_eq!(
        "-H bmc.example -U root -P calvin -I lanplus -p 1623 raw 0x2c 0x09 0xdc 0x00 0x10",
        recorded.trim(),
    );
}

#[tokio::test]
async fn helper_failure_surfaces_stderr() {
    let dir = TempDir::new().expect("tempdir");
    let helper = fake_helper(&dir, "echo 'Unable to establish LAN session' >&2\nexit 1");

    let mut client = client_with(helper, Interface::Lanplus);
    let err = client.device_id().await.unwrap_err();

    match err {
        Error::Tool { status, stderr } => {
            assert!(!status.success());
            assert_eq!("Unable to establish LAN session", stderr);
        }
        other => panic!("expected tool error, got {other:?}"),
    }
}

#[tokio::test]
async fn garbage_helper_output_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let helper = fake_helper(&dir, "echo 'not hex at all'");

    let mut client = client_with(helper, Interface::Lanplus);
    let err = client.device_id().await.unwrap_err();
    assert!(matches!(err, Error::InvalidHex(_)));
}

#[tokio::test]
async fn missing_helper_is_an_io_error() {
    let mut client = client_with(PathBuf::from("/nonexistent/ipmitool"), Interface::Lanplus);
    let err = client.device_id().await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
