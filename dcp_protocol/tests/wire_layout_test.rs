//! Byte-level checks of the frame layout. The offsets are frozen by the
//! deployed client population; any change here is a wire break.

use dcp_protocol::frame::{
    CMD_ERROR, HEADER_SIZE, MAX_DATA_SIZE, SOF_CLIENT, SOF_SERVER, STEP_INFO, SW_VERSION,
};
use dcp_protocol::status::STATUS_LEN;
use dcp_protocol::{DcpErrorCode, Frame, Header, StatusBits};

#[test]
fn header_field_offsets() {
    let frame = Frame::request("NTX-ARM6", 0x01020304, 320, vec![0xAA; 8]);
    let bytes = frame.encode();

    assert_eq!(bytes.len(), HEADER_SIZE + 8);
    assert_eq!(&bytes[0..8], b"NTX-ARM6");
    assert_eq!(bytes[8], 0, "robot name is NUL padded");
    assert_eq!(&bytes[20..26], SW_VERSION.as_bytes());
    assert_eq!(bytes[32], STEP_INFO);
    assert_eq!(bytes[33], SOF_CLIENT);
    assert_eq!(&bytes[34..38], &0x01020304i32.to_le_bytes());
    assert_eq!(&bytes[38..42], &8u32.to_le_bytes());
    assert_eq!(&bytes[42..52], &[0u8; STATUS_LEN]);
    assert_eq!(&bytes[52..56], &320i32.to_le_bytes());
    assert_eq!(&bytes[56..], &[0xAA; 8]);
}

#[test]
fn response_carries_status_and_server_sof() {
    let status = StatusBits {
        running: true,
        ready: true,
        ..Default::default()
    };
    let frame = Frame::response("NTX-ARM6", 42, 30, status.pack(), vec![1]);
    let bytes = frame.encode();

    assert_eq!(bytes[33], SOF_SERVER);
    let decoded = Header::decode(&bytes).unwrap();
    assert_eq!(StatusBits::unpack(&decoded.reserved), status);
    assert_eq!(decoded.invoke_id, 42);
}

#[test]
fn error_frame_layout() {
    let frame = Frame::error(
        "NTX-ARM6",
        13,
        StatusBits::default().pack(),
        DcpErrorCode::RobotMovingState,
    );
    assert_eq!(frame.header.cmd, CMD_ERROR);
    assert_eq!(frame.header.data_length, 4);
    assert_eq!(frame.payload, 13i32.to_le_bytes().to_vec());
    assert_eq!(frame.header.invoke_id, 13);
}

#[test]
fn validation_failures_map_to_fixed_reasons() {
    let frame = Frame::request("NTX-ARM6", 1, 0, Vec::new());

    let mut header = frame.header.clone();
    header.robot_name = "SOMETHING".to_string();
    assert_eq!(
        header.validate("NTX-ARM6"),
        Err(DcpErrorCode::NoMatchedRobot)
    );

    let mut header = frame.header.clone();
    header.step_info = 0x07;
    assert_eq!(header.validate("NTX-ARM6"), Err(DcpErrorCode::NoMatchedStep));

    let mut header = frame.header.clone();
    header.data_length = (MAX_DATA_SIZE + 1) as u32;
    assert_eq!(header.validate("NTX-ARM6"), Err(DcpErrorCode::OverDataSize));

    assert!(frame.header.validate("NTX-ARM6").is_ok());
}

#[test]
fn accumulation_handles_coalesced_frames() {
    let first = Frame::request("NTX-ARM6", 1, 30, Vec::new());
    let second = Frame::request("NTX-ARM6", 2, 31, vec![5, 6, 7]);
    let mut buf = first.encode();
    buf.extend_from_slice(&second.encode());

    let taken = Frame::take_from(&mut buf).unwrap().unwrap();
    assert_eq!(taken.header.invoke_id, 1);
    let taken = Frame::take_from(&mut buf).unwrap().unwrap();
    assert_eq!(taken.header.invoke_id, 2);
    assert_eq!(taken.payload, vec![5, 6, 7]);
    assert!(Frame::take_from(&mut buf).unwrap().is_none());
}
