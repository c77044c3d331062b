//! Frame layout and codec.
//!
//! Every DCP message, request or response, is one frame: a fixed 56-byte
//! header followed by `data_length` payload bytes. All multi-byte integers
//! are little-endian.
//!
//! ```text
//! ┌────────────┬────────────┬──────┬──────┬──────────┬──────────┬──────────┬──────────┐
//! │ robot_name │ sw_version │ step │ sof  │ invoke_id│ data_len │ reserved │ cmd      │
//! │ 20 bytes   │ 12 bytes   │ 1    │ 1    │ i32 LE   │ u32 LE   │ 10 bytes │ i32 LE   │
//! └────────────┴────────────┴──────┴──────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Requests and responses share the layout; the only asymmetry is the
//! 10-byte reserved field, which the server overwrites with a freshly packed
//! status bit-vector on every response it sends.

use crate::errors::{DcpError, DcpErrorCode};
use crate::status::STATUS_LEN;

/// Fixed width of the NUL-padded robot name field.
pub const ROBOT_NAME_LEN: usize = 20;
/// Fixed width of the NUL-padded software version field.
pub const SW_VERSION_LEN: usize = 12;
/// Total header size, command code included.
pub const HEADER_SIZE: usize = 56;
/// Hard cap on `data_length`; larger values are answered with an
/// over-data-size error frame.
pub const MAX_DATA_SIZE: usize = 200;

/// Software version stamped into every server response.
pub const SW_VERSION: &str = "v3.1.2";
/// Protocol step constant. A request carrying anything else gets a
/// no-matching-step error.
pub const STEP_INFO: u8 = 0x02;
/// Source-of-frame marker on client requests.
pub const SOF_CLIENT: u8 = 0x34;
/// Source-of-frame marker on server responses.
pub const SOF_SERVER: u8 = 0x12;

/// Command code reserved for error responses.
pub const CMD_ERROR: i32 = 9999;

/// Decoded frame header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub robot_name: String,
    pub sw_version: String,
    pub step_info: u8,
    pub source_of_frame: u8,
    /// Opaque client correlation token, echoed verbatim in the response.
    pub invoke_id: i32,
    pub data_length: u32,
    /// Status bit-vector on responses; ignored on requests.
    pub reserved: [u8; STATUS_LEN],
    pub cmd: i32,
}

impl Header {
    /// Decodes a header from the first [`HEADER_SIZE`] bytes of `buf`.
    ///
    /// Only structural decoding happens here; name/step/size validation is
    /// a separate step so the caller can still echo the invoke id and
    /// command code in its error frame.
    pub fn decode(buf: &[u8]) -> Result<Header, DcpError> {
        if buf.len() < HEADER_SIZE {
            return Err(DcpError::Decode(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                buf.len()
            )));
        }
        let mut reserved = [0u8; STATUS_LEN];
        reserved.copy_from_slice(&buf[42..52]);
        Ok(Header {
            robot_name: fixed_ascii_to_string(&buf[0..20]),
            sw_version: fixed_ascii_to_string(&buf[20..32]),
            step_info: buf[32],
            source_of_frame: buf[33],
            invoke_id: i32::from_le_bytes([buf[34], buf[35], buf[36], buf[37]]),
            data_length: u32::from_le_bytes([buf[38], buf[39], buf[40], buf[41]]),
            reserved,
            cmd: i32::from_le_bytes([buf[52], buf[53], buf[54], buf[55]]),
        })
    }

    /// Checks a decoded request header against the configured robot model.
    /// Returns the protocol error code a mismatch must be answered with.
    pub fn validate(&self, expected_robot: &str) -> Result<(), DcpErrorCode> {
        if self.robot_name != expected_robot {
            return Err(DcpErrorCode::NoMatchedRobot);
        }
        if self.step_info != STEP_INFO {
            return Err(DcpErrorCode::NoMatchedStep);
        }
        if self.data_length as usize > MAX_DATA_SIZE {
            return Err(DcpErrorCode::OverDataSize);
        }
        Ok(())
    }

    /// Encodes the header into its 56-byte wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        write_fixed_ascii(&mut buf[0..20], &self.robot_name);
        write_fixed_ascii(&mut buf[20..32], &self.sw_version);
        buf[32] = self.step_info;
        buf[33] = self.source_of_frame;
        buf[34..38].copy_from_slice(&self.invoke_id.to_le_bytes());
        buf[38..42].copy_from_slice(&self.data_length.to_le_bytes());
        buf[42..52].copy_from_slice(&self.reserved);
        buf[52..56].copy_from_slice(&self.cmd.to_le_bytes());
        buf
    }
}

/// A complete frame: header plus payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Builds a client request frame. Used by test clients and the example
    /// binary; the server never sends requests.
    pub fn request(robot_name: &str, invoke_id: i32, cmd: i32, payload: Vec<u8>) -> Frame {
        Frame {
            header: Header {
                robot_name: robot_name.to_string(),
                sw_version: SW_VERSION.to_string(),
                step_info: STEP_INFO,
                source_of_frame: SOF_CLIENT,
                invoke_id,
                data_length: payload.len() as u32,
                reserved: [0u8; STATUS_LEN],
                cmd,
            },
            payload,
        }
    }

    /// Builds a server response frame carrying `payload` and the freshly
    /// packed `status` field.
    pub fn response(
        robot_name: &str,
        invoke_id: i32,
        cmd: i32,
        status: [u8; STATUS_LEN],
        payload: Vec<u8>,
    ) -> Frame {
        Frame {
            header: Header {
                robot_name: robot_name.to_string(),
                sw_version: SW_VERSION.to_string(),
                step_info: STEP_INFO,
                source_of_frame: SOF_SERVER,
                invoke_id,
                data_length: payload.len() as u32,
                reserved: status,
                cmd,
            },
            payload,
        }
    }

    /// Builds an error response: command code [`CMD_ERROR`], payload the
    /// 4-byte numeric reason. Error frames carry the status field like any
    /// other response.
    pub fn error(
        robot_name: &str,
        invoke_id: i32,
        status: [u8; STATUS_LEN],
        code: DcpErrorCode,
    ) -> Frame {
        let reason = u32::from(code) as i32;
        Frame::response(
            robot_name,
            invoke_id,
            CMD_ERROR,
            status,
            reason.to_le_bytes().to_vec(),
        )
    }

    /// Serializes header and payload into one buffer ready for the socket.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Splits a fully accumulated frame off the front of `buf`, if one is
    /// complete. Returns `Ok(None)` while more bytes are needed.
    ///
    /// The caller owns read timeouts; this only inspects the buffer.
    pub fn take_from(buf: &mut Vec<u8>) -> Result<Option<Frame>, DcpError> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }
        let header = Header::decode(buf)?;
        let total = HEADER_SIZE + header.data_length as usize;
        // An oversized data_length is reported by Header::validate; here it
        // only matters that we never wait for more than the protocol allows.
        if header.data_length as usize <= MAX_DATA_SIZE && buf.len() < total {
            return Ok(None);
        }
        let taken = total.min(buf.len()).max(HEADER_SIZE);
        let frame_bytes: Vec<u8> = buf.drain(..taken).collect();
        tracing::trace!(
            cmd = header.cmd,
            invoke_id = header.invoke_id,
            len = taken,
            "frame complete"
        );
        Ok(Some(Frame {
            header,
            payload: frame_bytes[HEADER_SIZE..].to_vec(),
        }))
    }
}

fn fixed_ascii_to_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn write_fixed_ascii(field: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(field.len());
    field[..n].copy_from_slice(&bytes[..n]);
}
