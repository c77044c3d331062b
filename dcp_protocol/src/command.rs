//! The DCP command code space.
//!
//! Codes are process-wide constants shared with every deployed teaching
//! client, so the numeric values are frozen. Gaps in the numbering are
//! historical and must stay gaps.

use int_enum::IntEnum;

/// Every command code the server understands.
///
/// An incoming `cmd` field that fails conversion is answered with an
/// unknown-command error frame; codes that convert but sit in
/// [`CommandCode::is_unsupported`] are answered with not-supported.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntEnum)]
pub enum CommandCode {
    Check = 0,
    EmergencyStop = 1,
    ResetRobot = 2,
    SetServo = 3,
    SetBrake = 4,
    Stop = 5,
    // Named-move execution was disabled when program handling moved into
    // the backend controller; the code is kept reserved.
    ExecuteMoveCommand = 6,
    MoveHome = 7,
    MoveZero = 8,
    JointMoveTo = 9,
    JointMoveBy = 10,
    TaskMoveTo = 11,
    TaskMoveBy = 12,
    MoveCircle = 13,

    StartCurrentProgram = 14,
    PauseCurrentProgram = 15,
    ResumeCurrentProgram = 16,
    StopCurrentProgram = 17,
    StartDefaultProgram = 18,
    RegisterDefaultProgram = 19,
    GetRegisteredDefaultProgram = 20,

    IsRobotRunning = 30,
    IsReady = 31,
    IsEmergencyStopped = 32,
    IsCollided = 33,
    IsErrorState = 34,
    IsBusy = 35,
    IsMoveFinished = 36,
    IsHome = 37,
    IsZero = 38,
    IsResetting = 39,

    IsDirectTeaching = 60,
    IsTeaching = 61,
    IsProgramRunning = 62,
    IsProgramPaused = 63,
    IsPendantConnected = 64,

    StartDirectTeaching = 80,
    FinishDirectTeaching = 81,
    SetTeleopMode = 82,
    TeleopMoveJoint = 83,
    TeleopMoveTask = 84,

    JointPushWaypoint = 90,
    JointPopWaypoint = 91,
    JointClearWaypoint = 92,
    JointExecuteWaypoints = 94,
    TaskPushWaypoint = 95,
    TaskPopWaypoint = 96,
    TaskClearWaypoint = 97,
    TaskExecuteWaypoints = 99,

    SetDefaultTcp = 100,
    ResetDefaultTcp = 101,
    SetCompensationTcp = 102,
    ResetCompensationTcp = 103,
    SetRefFrame = 104,
    ResetRefFrame = 105,
    SetCollisionLevel = 106,
    SetJointBoundary = 107,
    SetTaskBoundary = 108,
    SetJointWaypointTime = 111,
    SetTaskWaypointTime = 112,
    SetTaskBaseMode = 113,
    SetSpeedRatio = 114,
    SetJointBlendRadius = 116,
    SetTaskBlendRadius = 117,

    SetJointSpeedLevel = 120,
    SetTaskSpeedLevel = 121,
    SetJointAccelLevel = 122,
    SetTaskAccelLevel = 123,
    SetJointBlendType = 124,
    SetTaskBlendType = 125,
    SetCircleAngle = 126,
    SetCircleSpeedRatio = 127,
    SetCircleAccelRatio = 128,

    GetDefaultTcp = 200,
    GetCompensationTcp = 201,
    GetRefFrame = 202,
    GetCollisionLevel = 203,
    GetJointBoundary = 204,
    GetTaskBoundary = 205,
    GetSpeedRatio = 206,
    GetJointWaypointTime = 207,
    GetTaskWaypointTime = 208,
    GetTaskBaseMode = 209,
    GetJointBlendRadius = 212,
    GetTaskBlendRadius = 213,
    GetJointSpeedLevel = 214,
    GetTaskSpeedLevel = 215,
    GetJointAccelLevel = 216,
    GetTaskAccelLevel = 217,
    GetJointBlendType = 218,
    GetTaskBlendType = 219,

    GetRunningTime = 300,
    GetControlMode = 301,
    GetJointServoState = 302,
    GetJointPosition = 320,
    GetJointVelocity = 321,
    GetTaskPosition = 322,
    GetTaskVelocity = 323,
    GetTorque = 324,
    GetInverseKinematics = 325,
    GetLastEmergencyInfo = 380,

    GetDigitalInput = 400,
    GetDigitalInputs = 401,
    SetDigitalOutput = 402,
    SetDigitalOutputs = 403,
    GetAnalogInput = 404,
    SetAnalogOutput = 405,
    GetDigitalOutput = 406,
    GetDigitalOutputs = 407,
    GetAnalogOutput = 408,

    GetFtSensorRobotRaw = 420,
    GetFtSensorControlBoxRaw = 421,

    ReadDirectVariable = 500,
    ReadDirectVariables = 501,
    WriteDirectVariable = 502,
    WriteDirectVariables = 503,

    SetSyncMode = 700,
    ForExtended = 800,
    ForStreaming = 801,

    SendKeyCommand = 9996,
    ReadMemory = 9997,
    WriteMemory = 9998,
    Error = 9999,
}

impl CommandCode {
    /// Intentionally disabled features. These decode fine but are always
    /// answered with a not-supported error and never touch state.
    pub fn is_unsupported(self) -> bool {
        matches!(
            self,
            CommandCode::ExecuteMoveCommand
                | CommandCode::SetSyncMode
                | CommandCode::ForExtended
                | CommandCode::ForStreaming
                | CommandCode::SendKeyCommand
                | CommandCode::ReadMemory
                | CommandCode::WriteMemory
        )
    }

    /// Motion commands that must be rejected while the backend reports the
    /// robot in motion.
    pub fn is_motion(self) -> bool {
        matches!(
            self,
            CommandCode::MoveHome
                | CommandCode::MoveZero
                | CommandCode::JointMoveTo
                | CommandCode::JointMoveBy
                | CommandCode::TaskMoveTo
                | CommandCode::TaskMoveBy
                | CommandCode::MoveCircle
                | CommandCode::TeleopMoveJoint
                | CommandCode::TeleopMoveTask
        )
    }
}
