//! Fuzz target for the catalogue response decoders.
//!
//! Every decoder must reject malformed data with an error, never panic —
//! including the variable-length records that read their own length fields.

#![no_main]

use libfuzzer_sys::fuzz_target;

use bmclink_proto::Response;
use bmclink_proto::payloads::app::{
    ActivateSessionResponse, AuthCapabilitiesResponse, DeviceIdResponse,
    SessionChallengeResponse, SessionPrivilegeLevelResponse,
};
use bmclink_proto::payloads::chassis::{ChassisStatusResponse, SystemBootOptionsResponse};
use bmclink_proto::payloads::dcmi::{GetMcIdResponse, SetMcIdResponse};
use bmclink_proto::payloads::user::GetUserNameResponse;

fuzz_target!(|data: &[u8]| {
    let _ = DeviceIdResponse::decode(data);
    let _ = AuthCapabilitiesResponse::decode(data);
    let _ = SessionChallengeResponse::decode(data);
    let _ = ActivateSessionResponse::decode(data);
    let _ = SessionPrivilegeLevelResponse::decode(data);
    let _ = ChassisStatusResponse::decode(data);
    let _ = SystemBootOptionsResponse::decode(data);
    let _ = GetUserNameResponse::decode(data);
    let _ = GetMcIdResponse::decode(data);
    let _ = SetMcIdResponse::decode(data);
});
