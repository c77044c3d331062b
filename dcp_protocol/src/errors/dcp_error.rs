use int_enum::IntEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Errors raised inside the server process while handling DCP traffic.
///
/// These never cross the wire as-is; the connection loop converts them into
/// error frames carrying a [`DcpErrorCode`] where a client is still
/// reachable.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum DcpError {
    Decode(String),
    Encode(String),
    ErrorCode(DcpErrorCode),
    FailedToSend(String),
    FailedToReceive(String),
    Disconnected,
    Backend(String),
}

impl Error for DcpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for DcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DcpError::Decode(ref msg) => write!(f, "decode error: {}", msg),
            DcpError::Encode(ref msg) => write!(f, "encode error: {}", msg),
            DcpError::ErrorCode(ref code) => write!(f, "protocol error: {}", code.message()),
            DcpError::FailedToSend(ref msg) => write!(f, "send error: {}", msg),
            DcpError::FailedToReceive(ref msg) => write!(f, "receive error: {}", msg),
            DcpError::Disconnected => write!(f, "peer disconnected"),
            DcpError::Backend(ref msg) => write!(f, "backend error: {}", msg),
        }
    }
}

/// Numeric error reasons carried in the payload of an error frame.
///
/// The values are part of the frozen wire contract.
#[repr(u32)]
#[derive(Debug, Serialize, Deserialize, IntEnum, Clone, Copy, PartialEq, Eq)]
pub enum DcpErrorCode {
    None = 0,
    NoMatchedRobot = 1,
    NoMatchedStep = 2,
    HeaderFormat = 3,
    OverDataSize = 4,
    NotSupportCommand = 5,
    UnknownCommand = 6,
    UnknownData = 7,
    ProcessFailed = 8,
    ParseFailed = 9,
    NoMatchedParameter = 10,
    NoMatchedDataSize = 11,
    WrongAsciiFormat = 12,
    RobotMovingState = 13,
    RobotProgramRunning = 14,
    RobotMoveFailed = 15,
    NoDefaultProgram = 16,
    NoCurrentProgram = 17,
    CurrentProgramState = 18,
    EmergencyState = 19,
    RobotState = 20,
    ProgramLoadFailed = 21,
    DirectVariableInvalidAddress = 22,
    DirectVariableInvalidFormat = 23,
    DirectVariableRefnumLimit = 24,
    ConnectionException = 600,
    ConnectionTimeout = 601,
}

impl DcpErrorCode {
    pub fn message(&self) -> &str {
        match self {
            DcpErrorCode::None => "No error.",
            DcpErrorCode::NoMatchedRobot => "No matching robot.",
            DcpErrorCode::NoMatchedStep => "No matching step.",
            DcpErrorCode::HeaderFormat => "Invalid header format.",
            DcpErrorCode::OverDataSize => "Over data size.",
            DcpErrorCode::NotSupportCommand => "Command not supported.",
            DcpErrorCode::UnknownCommand => "Unknown command.",
            DcpErrorCode::UnknownData => "Unknown data.",
            DcpErrorCode::ProcessFailed => "Processing failed.",
            DcpErrorCode::ParseFailed => "Parse failed.",
            DcpErrorCode::NoMatchedParameter => "No matching parameter.",
            DcpErrorCode::NoMatchedDataSize => "No matching data size.",
            DcpErrorCode::WrongAsciiFormat => "Wrong ASCII format.",
            DcpErrorCode::RobotMovingState => "Robot is moving.",
            DcpErrorCode::RobotProgramRunning => "Robot program is running.",
            DcpErrorCode::RobotMoveFailed => "Robot move failed.",
            DcpErrorCode::NoDefaultProgram => "No default program.",
            DcpErrorCode::NoCurrentProgram => "No current program.",
            DcpErrorCode::CurrentProgramState => "Invalid current program state.",
            DcpErrorCode::EmergencyState => "Robot is in emergency state.",
            DcpErrorCode::RobotState => "Invalid robot state.",
            DcpErrorCode::ProgramLoadFailed => "Program load failed.",
            DcpErrorCode::DirectVariableInvalidAddress => "Direct variable address invalid.",
            DcpErrorCode::DirectVariableInvalidFormat => "Direct variable format invalid.",
            DcpErrorCode::DirectVariableRefnumLimit => "Direct variable refnum limit exceeded.",
            DcpErrorCode::ConnectionException => "Connection exception.",
            DcpErrorCode::ConnectionTimeout => "Connection timeout.",
        }
    }
}
